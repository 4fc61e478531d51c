//! Custom error types for region extraction

use std::fmt;
use std::io;

/// Region extraction error types
#[derive(Debug)]
pub enum RegionError {
    /// I/O error
    IoError(io::Error),
    /// Source bytes are not a decodable image
    DecodeError(String),
    /// A crop could not be encoded
    EncodeError(String),
    /// A region is below the minimum croppable size
    RegionTooSmall { width: u32, height: u32 },
    /// A caller supplied an unusable parameter
    InvalidParameter(String),
    /// An external vision collaborator failed
    ProviderError(String),
    /// Configuration could not be read or parsed
    ConfigError(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::IoError(e) => write!(f, "I/O error: {}", e),
            RegionError::DecodeError(msg) => write!(f, "Failed to decode image: {}", msg),
            RegionError::EncodeError(msg) => write!(f, "Failed to encode image: {}", msg),
            RegionError::RegionTooSmall { width, height } =>
                write!(f, "Region too small: {}x{}", width, height),
            RegionError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            RegionError::ProviderError(msg) => write!(f, "Vision provider error: {}", msg),
            RegionError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            RegionError::GenericError(msg) => write!(f, "Region error: {}", msg),
        }
    }
}

impl std::error::Error for RegionError {}

impl From<io::Error> for RegionError {
    fn from(error: io::Error) -> Self {
        RegionError::IoError(error)
    }
}

impl From<image::ImageError> for RegionError {
    fn from(error: image::ImageError) -> Self {
        RegionError::DecodeError(error.to_string())
    }
}

impl From<serde_json::Error> for RegionError {
    fn from(error: serde_json::Error) -> Self {
        RegionError::GenericError(format!("JSON error: {}", error))
    }
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;

impl From<String> for RegionError {
    fn from(msg: String) -> Self {
        RegionError::GenericError(msg)
    }
}
