//! Round trip statistics of an established connection.

use crate::Error;

/// Largest round trip and retransmission timeout observed on a connection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RttStats {
    /// Maximum observed round trip time in milliseconds
    pub max_rtt_ms: u32,
    /// Maximum observed retransmission timeout in milliseconds
    pub max_rto_ms: u32,
}

impl RttStats {
    fn merge(&mut self, other: RttStats) {
        self.max_rtt_ms = self.max_rtt_ms.max(other.max_rtt_ms);
        self.max_rto_ms = self.max_rto_ms.max(other.max_rto_ms);
    }
}

/// Source of round trip statistics for a control connection
#[cfg_attr(any(test, feature = "mockall"), mockall::automock)]
pub trait ConnectionStats: Send + Sync {
    /// Returns the maxima observed so far
    fn rtt_stats(&self) -> Result<RttStats, Error>;
}

#[cfg(target_os = "linux")]
pub use linux::TcpInfoStats;

#[cfg(target_os = "linux")]
mod linux {
    use std::{
        io,
        os::unix::io::{AsFd, AsRawFd, OwnedFd},
    };

    use parking_lot::Mutex;
    use tokio::net::TcpStream;

    use super::{ConnectionStats, RttStats};
    use crate::Error;

    /// Reads `TCP_INFO` from the kernel and keeps the largest values seen.
    ///
    /// Holds its own duplicate of the socket descriptor, so the stream itself
    /// stays free for reading and writing.
    pub struct TcpInfoStats {
        fd: OwnedFd,
        observed: Mutex<RttStats>,
    }

    impl TcpInfoStats {
        pub fn new(stream: &TcpStream) -> io::Result<Self> {
            Ok(Self {
                fd: stream.as_fd().try_clone_to_owned()?,
                observed: Mutex::new(RttStats::default()),
            })
        }

        fn sample(&self) -> io::Result<RttStats> {
            // SAFETY: tcp_info is plain old data, all zeroes is a valid value.
            let mut info: libc::tcp_info = unsafe { std::mem::zeroed() };
            let mut len = std::mem::size_of::<libc::tcp_info>() as libc::socklen_t;
            // SAFETY: `info` and `len` outlive the call and `len` holds the size of
            // `info`, so the kernel writes at most that many bytes. `self.fd` is
            // owned, so the descriptor is open for the duration of the call.
            let ret = unsafe {
                libc::getsockopt(
                    self.fd.as_raw_fd(),
                    libc::IPPROTO_TCP,
                    libc::TCP_INFO,
                    &mut info as *mut libc::tcp_info as *mut libc::c_void,
                    &mut len,
                )
            };
            if ret != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(RttStats {
                max_rtt_ms: info.tcpi_rtt / 1000,
                max_rto_ms: info.tcpi_rto / 1000,
            })
        }
    }

    impl ConnectionStats for TcpInfoStats {
        fn rtt_stats(&self) -> Result<RttStats, Error> {
            let current = self.sample()?;
            let mut observed = self.observed.lock();
            observed.merge(current);
            Ok(*observed)
        }
    }

}

/// Placeholder for platforms without `TCP_INFO` support
pub struct Unsupported;

impl ConnectionStats for Unsupported {
    fn rtt_stats(&self) -> Result<RttStats, Error> {
        Err(Error::StatsUnsupported)
    }
}
