//! Utils.

#![deny(missing_docs)]
/// Logging macros
pub mod utils;

/// Address family preference for probe sockets
pub mod ip_stack;
pub use ip_stack::*;
