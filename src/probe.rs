//! Direct-connect probe: wait for the peer to connect to an ephemeral
//! listener and check what it sends.

use std::time::{Duration, Instant};

use sfw_proto::read_msg;
use sfw_sockets::bind_listener;
use sfw_utils::{sfw_log_debug, sfw_log_info, sfw_log_warn};
use tokio::{net::TcpListener, time::timeout};

use crate::{
    result::{check_payload, ProbeOutcome},
    Error, SfwConfig, TestResult,
};

/// Ephemeral listening socket that lives for a single probe.
///
/// [ProbeEndpoint::wait] consumes the endpoint, so the listener and any
/// accepted connection are closed once the verdict is known.
#[derive(Debug)]
pub struct ProbeEndpoint {
    listener: TcpListener,
    port: u16,
    max_msg_len: usize,
}

impl ProbeEndpoint {
    /// Binds a new listener on an auto-assigned port
    pub fn open(config: &SfwConfig) -> Result<Self, Error> {
        let probe = bind_listener(config.ip_stack, &config.tcp_params()).map_err(Error::Listen)?;
        sfw_log_info!("  -- port: {}", probe.port);
        Ok(Self {
            listener: probe.listener,
            port: probe.port,
            max_msg_len: config.max_message_len,
        })
    }

    /// Port published to the peer
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits at most `deadline` for one inbound connection carrying the
    /// verification payload.
    pub async fn wait(self, deadline: Duration) -> TestResult {
        let outcome = self.observe(deadline).await;
        sfw_log_debug!("Probe on port {} finished: {:?}", self.port, outcome);
        outcome.into()
    }

    async fn observe(&self, deadline: Duration) -> ProbeOutcome {
        let started = Instant::now();

        let mut stream = match timeout(deadline, self.listener.accept()).await {
            Err(_) => {
                sfw_log_info!(
                    "Simple firewall test: no connection for {} seconds",
                    deadline.as_secs()
                );
                return ProbeOutcome::NoConnection;
            }
            Ok(Err(e)) => {
                sfw_log_warn!("Simple firewall test: accept exited with error: {}", e);
                return ProbeOutcome::WaitFailed;
            }
            Ok(Ok((stream, from))) => {
                sfw_log_debug!("Probe connection from {}", from);
                stream
            }
        };

        let remaining = deadline.saturating_sub(started.elapsed());
        match timeout(remaining, read_msg(&mut stream, self.max_msg_len)).await {
            Ok(Ok(msg)) => check_payload(&msg),
            Ok(Err(e)) => {
                sfw_log_warn!("Simple firewall test: unrecognized message: {}", e);
                ProbeOutcome::Malformed
            }
            Err(_) => {
                sfw_log_warn!("Simple firewall test: connection arrived without a message");
                ProbeOutcome::Malformed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfw_proto::{write_msg, MessageType};
    use rstest::rstest;
    use sfw_test::{assert_elapsed, LOOPBACK};
    use sfw_utils::IpStack;
    use std::net::SocketAddr;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
    };

    fn config() -> SfwConfig {
        SfwConfig {
            ip_stack: IpStack::IPv4,
            ..Default::default()
        }
    }

    async fn send_raw(port: u16, bytes: Vec<u8>) {
        let mut stream = TcpStream::connect(SocketAddr::new(LOOPBACK, port))
            .await
            .unwrap();
        stream.write_all(&bytes).await.unwrap();
    }

    async fn send_msg(port: u16, kind: MessageType, payload: &[u8]) {
        let mut stream = TcpStream::connect(SocketAddr::new(LOOPBACK, port))
            .await
            .unwrap();
        write_msg(&mut stream, kind, payload).await.unwrap();
    }

    #[tokio::test]
    async fn exact_payload_means_no_firewall() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let port = endpoint.port();
        let (result, _) = tokio::join!(
            endpoint.wait(Duration::from_secs(2)),
            send_msg(port, MessageType::TestMsg, b"Simple firewall test")
        );
        assert_eq!(TestResult::NoFirewall, result);
    }

    #[tokio::test]
    async fn short_payload_is_unknown() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let port = endpoint.port();
        let (result, _) = tokio::join!(
            endpoint.wait(Duration::from_secs(2)),
            send_msg(port, MessageType::TestMsg, b"Simple firewall tst")
        );
        assert_eq!(TestResult::Unknown, result);
    }

    #[tokio::test]
    async fn wrong_type_is_unknown() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let port = endpoint.port();
        let (result, _) = tokio::join!(
            endpoint.wait(Duration::from_secs(2)),
            send_msg(port, MessageType::TestStart, b"Simple firewall test")
        );
        assert_eq!(TestResult::Unknown, result);
    }

    #[tokio::test]
    async fn garbage_frame_is_unknown() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let port = endpoint.port();
        let (result, _) = tokio::join!(
            endpoint.wait(Duration::from_secs(2)),
            send_raw(port, vec![0xee, 0, 1, 0])
        );
        assert_eq!(TestResult::Unknown, result);
    }

    #[tokio::test]
    async fn silent_connection_is_unknown_within_deadline() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let target = SocketAddr::new(LOOPBACK, endpoint.port());
        let _silent = TcpStream::connect(target).await.unwrap();

        let start = Instant::now();
        let result = endpoint.wait(Duration::from_millis(300)).await;
        assert_eq!(TestResult::Unknown, result);
        assert_elapsed!(start, Duration::from_millis(300), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn no_connection_is_possible_firewall() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let start = Instant::now();
        let result = endpoint.wait(Duration::from_millis(300)).await;
        assert_eq!(TestResult::Possible, result);
        assert_elapsed!(start, Duration::from_millis(300), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn listener_is_closed_after_wait() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let target = SocketAddr::new(LOOPBACK, endpoint.port());
        assert_eq!(
            TestResult::Possible,
            endpoint.wait(Duration::from_millis(10)).await
        );
        assert!(TcpStream::connect(target).await.is_err());
    }

    #[tokio::test]
    async fn connection_queued_before_wait_is_seen() {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        send_msg(endpoint.port(), MessageType::TestMsg, b"Simple firewall test").await;
        assert_eq!(
            TestResult::NoFirewall,
            endpoint.wait(Duration::from_secs(1)).await
        );
    }

    #[rstest]
    #[case(MessageType::TestMsg, b"Simple firewall test", TestResult::NoFirewall)]
    #[case(MessageType::TestMsg, b"Simple firewall tst", TestResult::Unknown)]
    #[case(MessageType::TestStart, b"Simple firewall test", TestResult::Unknown)]
    #[tokio::test]
    async fn sockets_are_closed_after_verdict(
        #[case] kind: MessageType,
        #[case] payload: &[u8],
        #[case] expected: TestResult,
    ) {
        let endpoint = ProbeEndpoint::open(&config()).unwrap();
        let target = SocketAddr::new(LOOPBACK, endpoint.port());
        let mut client = TcpStream::connect(target).await.unwrap();
        write_msg(&mut client, kind, payload).await.unwrap();

        assert_eq!(expected, endpoint.wait(Duration::from_secs(2)).await);

        let mut buf = [0_u8; 1];
        let read = timeout(Duration::from_secs(1), client.read(&mut buf))
            .await
            .unwrap();
        assert_eq!(0, read.unwrap());
        assert!(TcpStream::connect(target).await.is_err());
    }
}
