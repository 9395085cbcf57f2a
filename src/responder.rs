//! Responder (server) side of the simple firewall test.

use std::{net::SocketAddr, sync::Arc};

use sfw_proto::{ControlChannel, MessageType};
use sfw_sockets::ConnectionStats;
use sfw_utils::{sfw_log_error, sfw_log_info};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    announce::{port_from_msg, recv_expected, PeerAnnouncement},
    opposite::{OppositeProbe, ProbeConnector, TcpProbeConnector},
    session::{ActiveTest, ActiveTestGuard, TestTracker},
    timeout::{deadline, test_time},
    Error, ProbeEndpoint, SfwConfig, TestResult,
};

/// Drives the responder's side of the message exchange
pub struct Responder {
    config: SfwConfig,
    connector: Arc<dyn ProbeConnector>,
    tracker: Arc<dyn TestTracker>,
}

impl Responder {
    pub fn new(config: SfwConfig, tracker: Arc<dyn TestTracker>) -> Self {
        let connector = Arc::new(TcpProbeConnector::new(config.tcp_params()));
        Self {
            config,
            connector,
            tracker,
        }
    }

    /// Replaces the connector used for the opposite-direction probe
    pub fn with_connector(mut self, connector: Arc<dyn ProbeConnector>) -> Self {
        self.connector = connector;
        self
    }

    /// Runs one test over `ctl`.
    ///
    /// `stats` describes the connection underneath `ctl` and sizes the probe
    /// deadline. Returns the verdict for the tester-to-responder direction,
    /// or `None` when the test is disabled.
    pub async fn run<S>(
        &self,
        ctl: &mut ControlChannel<S>,
        stats: &dyn ConnectionStats,
    ) -> Result<Option<TestResult>, Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if !self.config.enabled {
            return Ok(None);
        }

        let _active = ActiveTestGuard::enter(self.tracker.as_ref(), ActiveTest::SimpleFirewall);
        sfw_log_info!(" <-- Simple firewall test -->");

        let rtt = stats.rtt_stats().map_err(|e| {
            sfw_log_error!("Simple firewall test: Cannot find connection");
            Error::ConnectionStats(e)
        })?;
        let timeout_secs = test_time(rtt, self.config.fallback_test_time_secs);
        let endpoint = ProbeEndpoint::open(&self.config)?;
        sfw_log_info!("  -- time: {}", timeout_secs);

        let announcement = PeerAnnouncement {
            port: endpoint.port(),
            timeout_secs,
        };
        ctl.send(MessageType::TestPrepare, announcement.to_string().as_bytes())
            .await?;

        let msg = recv_expected(ctl, MessageType::TestMsg).await?;
        let tester_port = port_from_msg(&msg)?;

        let tester_ip = match ctl.peer_ip() {
            Some(ip) => ip,
            None => {
                sfw_log_error!("Unable to resolve server address");
                ctl.send(MessageType::TestFinalize, b"").await?;
                sfw_log_info!(" <-------------------------->");
                return Err(Error::PeerAddress);
            }
        };
        let target = SocketAddr::new(tester_ip, tester_port);
        sfw_log_info!("  -- oport: {}", tester_port);

        let wait_for = deadline(timeout_secs, self.config.grace_secs);
        ctl.send(MessageType::TestStart, b"").await?;
        let opposite = OppositeProbe::spawn(self.connector.clone(), target, wait_for);

        let result = endpoint.wait(wait_for).await;
        ctl.send(MessageType::TestMsg, result.code().as_bytes()).await?;

        opposite.finished().await;
        ctl.send(MessageType::TestFinalize, b"").await?;
        sfw_log_info!(" <-------------------------->");

        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{opposite::SendOutcome, session::CurrentTest, MockTestTracker};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use sfw_proto::{write_msg, Message};
    use sfw_sockets::{MockConnectionStats, RttStats};
    use sfw_test::{assert_elapsed, LOOPBACK};
    use sfw_utils::IpStack;
    use std::time::{Duration, Instant};
    use tokio::{
        io::{duplex, DuplexStream},
        net::TcpStream,
    };

    fn config() -> SfwConfig {
        SfwConfig {
            ip_stack: IpStack::IPv4,
            grace_secs: 0,
            ..Default::default()
        }
    }

    fn stats(max_rtt_ms: u32, max_rto_ms: u32) -> MockConnectionStats {
        let mut stats = MockConnectionStats::new();
        stats.expect_rtt_stats().returning(move || {
            Ok(RttStats {
                max_rtt_ms,
                max_rto_ms,
            })
        });
        stats
    }

    fn channels() -> (ControlChannel<DuplexStream>, ControlChannel<DuplexStream>) {
        let (a, b) = duplex(1024);
        (
            ControlChannel::new(a, Some(LOOPBACK)),
            ControlChannel::new(b, Some(LOOPBACK)),
        )
    }

    /// Connector that takes a while and records when it finished
    struct SlowConnector {
        delay: Duration,
        finished_at: Mutex<Option<Instant>>,
    }

    #[async_trait]
    impl ProbeConnector for SlowConnector {
        async fn probe(&self, _target: SocketAddr, _deadline: Duration) -> SendOutcome {
            tokio::time::sleep(self.delay).await;
            *self.finished_at.lock() = Some(Instant::now());
            SendOutcome::Failed
        }
    }

    #[tokio::test]
    async fn disabled_test_sends_nothing() {
        let (mut ctl, mut peer) = channels();
        let responder = Responder::new(
            SfwConfig {
                enabled: false,
                ..config()
            },
            Arc::new(MockTestTracker::new()),
        );

        assert_eq!(None, responder.run(&mut ctl, &stats(0, 0)).await.unwrap());
        drop(ctl);
        assert!(peer.recv().await.is_err());
    }

    #[tokio::test]
    async fn announcement_uses_derived_timeout() {
        let (mut ctl, mut peer) = channels();
        let responder = Responder::new(config(), Arc::new(CurrentTest::default()));

        let tester = async move {
            let prepare = peer.recv().await.unwrap();
            assert_eq!(MessageType::TestPrepare, prepare.kind);
            let announcement = PeerAnnouncement::from_msg(&prepare).unwrap();
            assert_eq!(1, announcement.timeout_secs);
            // Break the exchange right after the announcement
            peer.send(MessageType::TestStart, b"").await.unwrap();
        };

        let link = stats(100, 200);
        let (result, _) = tokio::join!(responder.run(&mut ctl, &link), tester);
        assert!(matches!(
            result,
            Err(Error::UnexpectedMessage {
                expected: MessageType::TestMsg,
                received: MessageType::TestStart
            })
        ));
    }

    #[tokio::test]
    async fn missing_stats_are_fatal() {
        let (mut ctl, _peer) = channels();
        let mut stats = MockConnectionStats::new();
        stats
            .expect_rtt_stats()
            .returning(|| Err(sfw_sockets::Error::StatsUnsupported));
        let responder = Responder::new(config(), Arc::new(CurrentTest::default()));

        let err = responder.run(&mut ctl, &stats).await.unwrap_err();
        assert_eq!(-1, err.exit_code());
    }

    #[tokio::test]
    async fn bad_port_is_fatal() {
        let (mut ctl, mut peer) = channels();
        let responder = Responder::new(config(), Arc::new(CurrentTest::default()));

        let tester = async move {
            peer.recv().await.unwrap();
            peer.send(MessageType::TestMsg, b"port").await.unwrap();
        };
        let link = stats(0, 0);
        let (result, _) = tokio::join!(responder.run(&mut ctl, &link), tester);
        assert_eq!(4, result.unwrap_err().exit_code());
    }

    #[tokio::test]
    async fn unknown_peer_address_finalizes_then_fails() {
        let (a, b) = duplex(1024);
        let mut ctl = ControlChannel::new(a, None);
        let mut peer = ControlChannel::new(b, None);
        let responder = Responder::new(config(), Arc::new(CurrentTest::default()));

        let tester = async move {
            peer.recv().await.unwrap();
            peer.send(MessageType::TestMsg, b"4000").await.unwrap();
            peer.recv().await.unwrap()
        };
        let link = stats(0, 0);
        let (result, last) = tokio::join!(responder.run(&mut ctl, &link), tester);
        assert!(matches!(result, Err(Error::PeerAddress)));
        assert_eq!(Message::empty(MessageType::TestFinalize), last);
    }

    #[tokio::test]
    async fn finalize_waits_for_opposite_probe() {
        let (mut ctl, mut peer) = channels();
        let connector = Arc::new(SlowConnector {
            delay: Duration::from_millis(1500),
            finished_at: Mutex::new(None),
        });
        let tracker = Arc::new(CurrentTest::default());
        let responder = Responder::new(config(), tracker.clone())
            .with_connector(connector.clone());

        let tester = async move {
            let prepare = peer.recv().await.unwrap();
            let announcement = PeerAnnouncement::from_msg(&prepare).unwrap();
            peer.send(MessageType::TestMsg, b"1").await.unwrap();
            assert_eq!(MessageType::TestStart, peer.recv().await.unwrap().kind);

            let mut probe = TcpStream::connect(SocketAddr::new(LOOPBACK, announcement.port))
                .await
                .unwrap();
            write_msg(&mut probe, MessageType::TestMsg, b"Simple firewall test")
                .await
                .unwrap();

            let result = peer.recv().await.unwrap();
            assert_eq!(Message::new(MessageType::TestMsg, "1"), result);
            let finalize = peer.recv().await.unwrap();
            assert_eq!(MessageType::TestFinalize, finalize.kind);
            Instant::now()
        };

        let link = stats(0, 0);
        let (result, finalized_at) = tokio::join!(responder.run(&mut ctl, &link), tester);
        assert_eq!(Some(TestResult::NoFirewall), result.unwrap());

        let probe_done = (*connector.finished_at.lock()).expect("probe never finished");
        assert!(finalized_at >= probe_done);
        assert_eq!(ActiveTest::None, tracker.get());
    }

    #[tokio::test]
    async fn silent_tester_is_possible_firewall() {
        let (mut ctl, mut peer) = channels();
        let mut connector = crate::MockProbeConnector::new();
        connector
            .expect_probe()
            .times(1)
            .returning(|_, _| SendOutcome::Failed);
        let responder = Responder::new(config(), Arc::new(CurrentTest::default()))
            .with_connector(Arc::new(connector));

        let tester = async move {
            peer.recv().await.unwrap();
            peer.send(MessageType::TestMsg, b"1").await.unwrap();
            assert_eq!(MessageType::TestStart, peer.recv().await.unwrap().kind);
            let result = peer.recv().await.unwrap();
            let finalize = peer.recv().await.unwrap();
            (result, finalize)
        };

        let link = stats(0, 0);
        let start = Instant::now();
        let (result, (reported, finalize)) = tokio::join!(responder.run(&mut ctl, &link), tester);
        assert_eq!(Some(TestResult::Possible), result.unwrap());
        assert_eq!(
            TestResult::Possible,
            TestResult::from_msg(&reported).unwrap()
        );
        assert_eq!(MessageType::TestFinalize, finalize.kind);
        assert_elapsed!(start, Duration::from_secs(1), Duration::from_millis(500));
    }
}
