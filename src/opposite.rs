//! Outbound half of the probe: connect to the peer's probe listener and
//! send the verification payload.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use sfw_proto::{write_msg, CodecError, MessageType};
use sfw_sockets::{connect, TcpParams};
use sfw_utils::{sfw_log_debug, sfw_log_info};
use tokio::{sync::oneshot, time::timeout};

use crate::VERIFICATION_PAYLOAD;

/// How an outbound probe attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Connected and wrote the payload
    Delivered,
    /// Connection or write failed
    Failed,
    /// Deadline passed before the attempt finished
    TimedOut,
}

/// Performs one outbound probe attempt
#[cfg_attr(any(test, feature = "mockall"), mockall::automock)]
#[async_trait]
pub trait ProbeConnector: Send + Sync {
    /// Connects to `target` and sends the verification payload, giving up
    /// once `deadline` has passed. Any socket opened is closed on return.
    async fn probe(&self, target: SocketAddr, deadline: Duration) -> SendOutcome;
}

/// [ProbeConnector] over real TCP sockets
pub struct TcpProbeConnector {
    params: TcpParams,
}

impl TcpProbeConnector {
    pub fn new(params: TcpParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl ProbeConnector for TcpProbeConnector {
    async fn probe(&self, target: SocketAddr, deadline: Duration) -> SendOutcome {
        let attempt = async {
            let mut stream = connect(target, &self.params).await?;
            write_msg(&mut stream, MessageType::TestMsg, VERIFICATION_PAYLOAD).await?;
            Ok::<_, CodecError>(())
        };

        match timeout(deadline, attempt).await {
            Ok(Ok(())) => SendOutcome::Delivered,
            Ok(Err(e)) => {
                sfw_log_info!("Probe to {} failed: {}", target, e);
                SendOutcome::Failed
            }
            Err(_) => {
                sfw_log_info!("Probe to {} abandoned after {:?}", target, deadline);
                SendOutcome::TimedOut
            }
        }
    }
}

/// Opposite-direction probe running as its own task.
///
/// The only thing shared with the spawner is the one-shot completion signal.
pub struct OppositeProbe {
    done: oneshot::Receiver<SendOutcome>,
}

impl OppositeProbe {
    /// Starts probing `target` in the background
    pub fn spawn(
        connector: Arc<dyn ProbeConnector>,
        target: SocketAddr,
        deadline: Duration,
    ) -> Self {
        let (tx, done) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = connector.probe(target, deadline).await;
            sfw_log_debug!("Opposite probe to {} finished: {:?}", target, outcome);
            let _ = tx.send(outcome);
        });
        Self { done }
    }

    /// Resolves once the background task is over, whatever its outcome.
    ///
    /// Returns `None` when the task ended without reporting (it panicked or
    /// the runtime is shutting down).
    pub async fn finished(self) -> Option<SendOutcome> {
        self.done.await.ok()
    }
}
