use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use sfw_proto::{Message, MessageType};
use sfw_utils::sfw_log_warn;

use crate::Error;

/// Sole content of every probe connection
pub const VERIFICATION_PAYLOAD: &[u8; 20] = b"Simple firewall test";

/// Verdict for one direction of the probe.
///
/// Discriminants are the codes sent on the control channel.
#[repr(u8)]
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    strum::Display,
)]
pub enum TestResult {
    /// Direction was not probed
    #[default]
    NotTested = 0,
    /// Probe connection arrived intact
    NoFirewall = 1,
    /// No connection arrived in time, something is probably filtering
    Possible = 3,
    /// Probe failed in a way that says nothing about a firewall
    Unknown = 2,
}

impl TestResult {
    /// Decimal text sent to the peer
    pub fn code(self) -> String {
        u8::from(self).to_string()
    }

    /// Parses the decimal result code reported by the peer
    pub fn from_msg(msg: &Message) -> Result<Self, Error> {
        if msg.payload.is_empty() {
            return Err(Error::EmptyMessage(msg.kind));
        }
        let invalid = || Error::InvalidNumber {
            field: "test result",
            value: String::from_utf8_lossy(&msg.payload).into_owned(),
        };
        let code = msg
            .text()
            .and_then(|text| text.trim().parse::<u8>().ok())
            .ok_or_else(invalid)?;
        Self::try_from(code).map_err(|_| invalid())
    }
}

/// What a direct-connect probe observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Nothing connected before the deadline
    NoConnection,
    /// Waiting for a connection failed
    WaitFailed,
    /// Connection arrived but did not carry the verification payload
    Malformed,
    /// Connection arrived with the exact verification payload
    Verified,
}

impl From<ProbeOutcome> for TestResult {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::NoConnection => TestResult::Possible,
            ProbeOutcome::WaitFailed | ProbeOutcome::Malformed => TestResult::Unknown,
            ProbeOutcome::Verified => TestResult::NoFirewall,
        }
    }
}

/// Checks the single message read from a probe connection
pub fn check_payload(msg: &Message) -> ProbeOutcome {
    if msg.kind != MessageType::TestMsg {
        sfw_log_warn!(
            "Simple firewall test: received message type {} (expected {})",
            msg.kind,
            MessageType::TestMsg
        );
        return ProbeOutcome::Malformed;
    }
    if msg.payload.as_slice() != VERIFICATION_PAYLOAD {
        sfw_log_warn!(
            "Simple firewall test: Improper message ({} bytes)",
            msg.payload.len()
        );
        return ProbeOutcome::Malformed;
    }
    ProbeOutcome::Verified
}
