//! Tester (client) side of the simple firewall test.

use std::sync::Arc;

use sfw_proto::{ControlChannel, MessageType};
use sfw_sockets::resolve;
use sfw_utils::{sfw_log_debug, sfw_log_error, sfw_log_info};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    announce::{recv_expected, PeerAnnouncement},
    opposite::{ProbeConnector, TcpProbeConnector},
    timeout::deadline,
    Error, ProbeEndpoint, SfwConfig, SfwSession, TestResult,
};

/// Drives the tester's side of the message exchange
pub struct Tester {
    config: SfwConfig,
    connector: Arc<dyn ProbeConnector>,
}

impl Tester {
    pub fn new(config: SfwConfig) -> Self {
        let connector = Arc::new(TcpProbeConnector::new(config.tcp_params()));
        Self { config, connector }
    }

    /// Replaces the connector used for the outbound probe
    pub fn with_connector(mut self, connector: Arc<dyn ProbeConnector>) -> Self {
        self.connector = connector;
        self
    }

    /// Runs one test against the responder reachable as `host` over `ctl`.
    ///
    /// When disabled nothing is exchanged and both directions stay
    /// [TestResult::NotTested].
    pub async fn run<S>(&self, ctl: &mut ControlChannel<S>, host: &str) -> Result<SfwSession, Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut session = SfwSession::default();
        if !self.config.enabled {
            return Ok(session);
        }

        let prepare = recv_expected(ctl, MessageType::TestPrepare).await?;
        let announcement = PeerAnnouncement::from_msg(&prepare)?;
        sfw_log_debug!(
            "Responder probe port {}, waiting time {}",
            announcement.port,
            announcement.timeout_secs
        );

        let target = resolve(host, announcement.port, self.config.ip_stack)
            .await
            .map_err(|e| {
                sfw_log_error!("Unable to resolve server address: {}", e);
                Error::Resolve(e)
            })?;

        let endpoint = ProbeEndpoint::open(&self.config)?;
        ctl.send(MessageType::TestMsg, endpoint.port().to_string().as_bytes())
            .await?;

        recv_expected(ctl, MessageType::TestStart).await?;
        let send_within = deadline(announcement.timeout_secs, self.config.grace_secs);
        let outcome = self.connector.probe(target, send_within).await;
        sfw_log_debug!("Probe to {} finished: {:?}", target, outcome);

        let reported = recv_expected(ctl, MessageType::TestMsg).await?;
        session.c2s = TestResult::from_msg(&reported)?;
        sfw_log_info!("Responder reported {}", session.c2s);

        session.s2c = endpoint.wait(deadline(announcement.timeout_secs, 0)).await;

        recv_expected(ctl, MessageType::TestFinalize).await?;
        Ok(session)
    }
}
