/// Socket layer errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Host name could not be resolved
    #[error("Unable to resolve {0}")]
    Resolve(String),
    /// Host resolved, but not to an address of the wanted family
    #[error(transparent)]
    NoAddress(#[from] sfw_utils::ip_stack::Error),
    /// Connection statistics are not available on this platform
    #[error("Connection statistics are not supported on this platform")]
    StatsUnsupported,
    /// IO Error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
