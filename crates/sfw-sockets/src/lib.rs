//! Socket helpers used by the firewall probes.

mod connect;
mod error;
mod listener;
mod resolve;

pub mod socket_params;
pub mod stats;

pub use connect::connect;
pub use error::Error;
pub use listener::{bind_listener, ProbeListener};
pub use resolve::resolve;
pub use socket_params::{SocketBufSizes, TcpParams};
pub use stats::{ConnectionStats, RttStats, Unsupported as UnsupportedStats};

#[cfg(target_os = "linux")]
pub use stats::TcpInfoStats;

#[cfg(any(test, feature = "mockall"))]
pub use stats::MockConnectionStats;
