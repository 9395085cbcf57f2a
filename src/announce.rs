use std::fmt;

use sfw_proto::{ControlChannel, Message, MessageType};
use sfw_utils::sfw_log_error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::Error;

/// Probe port and deadline announced by the responder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAnnouncement {
    /// Port of the responder's probe listener
    pub port: u16,
    /// Deadline in whole seconds
    pub timeout_secs: u64,
}

impl fmt::Display for PeerAnnouncement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.port, self.timeout_secs)
    }
}

impl PeerAnnouncement {
    /// Parses `"<port> <timeoutSeconds>"`
    pub fn from_msg(msg: &Message) -> Result<Self, Error> {
        let text = non_empty_text(msg)?;
        let mut fields = text.split(' ').filter(|field| !field.is_empty());

        let port = fields.next().ok_or(Error::MissingField("port number"))?;
        let port = parse_number(port, "port number")?;
        let timeout_secs = fields.next().ok_or(Error::MissingField("waiting time"))?;
        let timeout_secs = parse_number(timeout_secs, "waiting time")?;

        Ok(Self { port, timeout_secs })
    }
}

/// Parses the probe port published by the tester
pub fn port_from_msg(msg: &Message) -> Result<u16, Error> {
    parse_number(non_empty_text(msg)?, "port number")
}

/// Receives one message and insists on its type
pub async fn recv_expected<S>(
    ctl: &mut ControlChannel<S>,
    expected: MessageType,
) -> Result<Message, Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let msg = ctl.recv().await.map_err(|e| {
        sfw_log_error!("Protocol error! {}", e);
        Error::Protocol(e)
    })?;
    if msg.kind != expected {
        sfw_log_error!(
            "Simple firewall test: received message type {} (expected {})",
            msg.kind,
            expected
        );
        return Err(Error::UnexpectedMessage {
            expected,
            received: msg.kind,
        });
    }
    Ok(msg)
}

fn non_empty_text(msg: &Message) -> Result<&str, Error> {
    if msg.payload.is_empty() {
        return Err(Error::EmptyMessage(msg.kind));
    }
    msg.text().ok_or_else(|| Error::InvalidNumber {
        field: "message",
        value: String::from_utf8_lossy(&msg.payload).into_owned(),
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, Error> {
    value.trim().parse().map_err(|_| Error::InvalidNumber {
        field,
        value: value.to_owned(),
    })
}
