//! Error types for deck rendering and export

use thiserror::Error;

/// Result type alias for deck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering, snapshotting or packaging a deck
#[derive(Error, Debug)]
pub enum Error {
    /// A face element was not present on the surface at capture time
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The capture step itself failed
    #[error("Rasterization failed: {0}")]
    RasterizationFailure(String),

    /// The readiness marker never appeared
    #[error("Render marker '{marker}' did not appear within {timeout_ms}ms")]
    RenderTimeout { marker: String, timeout_ms: u64 },

    /// The automation download never landed (or never stopped growing)
    #[error("Download did not complete after {retries} polls of {interval_ms}ms")]
    DownloadTimeout { retries: u32, interval_ms: u64 },

    /// A clone is already attached to the surface's scratch slot
    #[error("Scratch slot is already occupied")]
    ScratchOccupied,

    /// Selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Archive assembly failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Card data could not be read
    #[error("Invalid deck data: {0}")]
    DeckData(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to load a document over HTTP
    #[error("Failed to load document: {0}")]
    Load(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error only affects a single face and the job may continue
    /// with the remaining ones.
    pub fn is_per_face(&self) -> bool {
        match self {
            Error::ElementNotFound(_) | Error::RasterizationFailure(_) => true,
            #[cfg(feature = "cdp")]
            Error::Cdp(_) => true,
            _ => false,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DeckData(err.to_string())
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Cdp(err.to_string())
    }
}
