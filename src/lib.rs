#![cfg_attr(docsrs, feature(doc_cfg))]
//! Simple firewall test.
//!
//! Each peer opens a throwaway listener, publishes its port over an already
//! established control channel and waits for the other side to connect to
//! it directly. A connection that never arrives means something on the path
//! is dropping unsolicited inbound TCP.

pub mod announce;
pub mod config;
pub mod error;
pub mod opposite;
pub mod probe;
pub mod responder;
pub mod result;
pub mod session;
pub mod tester;
pub mod timeout;

pub use config::SfwConfig;
pub use error::Error;
pub use opposite::{OppositeProbe, ProbeConnector, SendOutcome, TcpProbeConnector};
pub use probe::ProbeEndpoint;
pub use responder::Responder;
pub use result::{ProbeOutcome, TestResult, VERIFICATION_PAYLOAD};
pub use session::{ActiveTest, CurrentTest, SfwSession, TestTracker};
pub use tester::Tester;

#[cfg(any(test, feature = "mockall"))]
pub use opposite::MockProbeConnector;
#[cfg(any(test, feature = "mockall"))]
pub use session::MockTestTracker;

pub use sfw_proto;
pub use sfw_sockets;
pub use sfw_utils;
