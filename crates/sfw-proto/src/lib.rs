#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Control channel protocol crate.
//!
//! Defines the message types exchanged between the diagnostic peers and how
//! they are framed on a byte stream.

mod channel;
mod codec;
mod message;

pub use channel::ControlChannel;
pub use codec::{read_msg, write_msg, Error as CodecError, DEFAULT_MAX_MSG_LEN};
pub use message::{Message, MessageType};
