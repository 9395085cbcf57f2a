use sfw_proto::{CodecError, MessageType};

/// Failures that abort the whole diagnostic session.
///
/// Probe level problems never show up here, they are folded into a
/// [crate::TestResult] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Control channel could not carry a message
    #[error("Protocol error: {0}")]
    Protocol(#[from] CodecError),
    /// Peer sent a message out of order
    #[error("Simple firewall test: expected {expected} message, received {received}")]
    UnexpectedMessage {
        /// Type the state machine was waiting for
        expected: MessageType,
        /// Type that actually arrived
        received: MessageType,
    },
    /// Message that must carry data arrived empty
    #[error("Improper message: empty {0} payload")]
    EmptyMessage(MessageType),
    /// Numeric field could not be parsed
    #[error("Invalid {field}: {value:?}")]
    InvalidNumber {
        /// Name of the field
        field: &'static str,
        /// Raw text received
        value: String,
    },
    /// Announcement lacks one of its fields
    #[error("Simple firewall test: improper message, missing {0}")]
    MissingField(&'static str),
    /// Control channel does not know the address of its peer
    #[error("Unable to resolve peer address")]
    PeerAddress,
    /// Responder address could not be resolved
    #[error("Unable to resolve server address: {0}")]
    Resolve(#[source] sfw_sockets::Error),
    /// Round trip statistics of the control connection are unavailable
    #[error("Simple firewall test: cannot find connection: {0}")]
    ConnectionStats(#[source] sfw_sockets::Error),
    /// Probe listener could not be created
    #[error("Cannot create listening socket: {0}")]
    Listen(#[source] std::io::Error),
}

impl Error {
    /// Process exit status a command line driver should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Protocol(_) => 1,
            Error::UnexpectedMessage { .. } => 2,
            Error::EmptyMessage(_) => 3,
            Error::InvalidNumber { .. } => 4,
            Error::MissingField(_) | Error::PeerAddress => 5,
            Error::Listen(_) => 6,
            Error::Resolve(_) => -3,
            Error::ConnectionStats(_) => -1,
        }
    }
}
