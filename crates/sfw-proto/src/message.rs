use num_enum::{IntoPrimitive, TryFromPrimitive};

#[repr(u8)]
#[derive(
    Debug,
    Hash,
    PartialEq,
    Eq,
    Copy,
    Clone,
    strum::EnumIter,
    strum::Display,
    TryFromPrimitive,
    IntoPrimitive,
)]
/// Type of a control message, carried in the first byte of each frame
pub enum MessageType {
    /// Peer failed to communicate
    CommFailure = 0,
    /// Position in the server queue
    SrvQueue = 1,
    /// Session login
    Login = 2,
    /// Test specific parameters, sent before a test begins
    TestPrepare = 3,
    /// Peer may start the test
    TestStart = 4,
    /// Test specific data
    TestMsg = 5,
    /// Test is over
    TestFinalize = 6,
    /// Peer reported an error
    Error = 7,
    /// Results of the whole session
    Results = 8,
    /// Session logout
    Logout = 9,
    /// Peer is waiting in the queue
    Waiting = 10,
}

/// One framed control message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message type
    pub kind: MessageType,
    /// Raw payload, without the frame header
    pub payload: Vec<u8>,
}

impl Message {
    /// Creates a new message
    pub fn new(kind: MessageType, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Creates a message without payload
    pub fn empty(kind: MessageType) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Payload interpreted as text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
