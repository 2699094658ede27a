/// Errors reported synchronously by viewer operations.
///
/// Missing data is not an error: the render driver turns it into the
/// undefined state and polls for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexViewError {
    /// A parameter was outside its allowed domain.
    InvalidArgument(String),
    /// An offset or nibble lay outside the data source.
    OutOfRange { offset: u64, len: u64 },
    /// A write was attempted on a source that does not accept edits.
    ReadOnly,
    /// The data source failed to serve a read or write.
    Source(String),
}

impl HexViewError {
    pub fn invalid(message: impl Into<String>) -> Self {
        HexViewError::InvalidArgument(message.into())
    }
}

impl std::fmt::Display for HexViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HexViewError::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
            HexViewError::OutOfRange { offset, len } => {
                write!(f, "Offset 0x{:X} is outside the data (length 0x{:X})", offset, len)
            }
            HexViewError::ReadOnly => write!(f, "Data source is not editable"),
            HexViewError::Source(e) => write!(f, "Data source error: {}", e),
        }
    }
}

impl std::error::Error for HexViewError {}

pub type Result<T> = std::result::Result<T, HexViewError>;
