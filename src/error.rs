//! Error handling for the Herpstat exporter.

/// A specialized `Result` type for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Failures while turning a `/RAWSTATUS` body into a [`Snapshot`](crate::device::Snapshot).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The body is not valid JSON
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The top level is valid JSON but not an object
    #[error("top level of payload is not an object")]
    NotAnObject,

    /// No `system` section in the payload
    #[error("payload has no \"system\" section")]
    MissingSystem,

    /// The `system` section does not match the expected shape
    #[error("unable to decode system section: {0}")]
    System(#[source] serde_json::Error),

    /// `numberofoutputs` is negative, fractional or absurdly large
    #[error("invalid output count {0}")]
    InvalidOutputCount(f64),

    /// A key other than `system` that isn't `output<N>`
    #[error("{0} doesn't look like 'output#' where # is a positive number")]
    InvalidOutputKey(String),

    /// `output<N>` with `N` above the declared output count
    #[error("output id {id} is > than # of available outputs ({count})")]
    OutputOutOfRange { id: usize, count: usize },

    /// An `output<N>` section does not match the expected shape
    #[error("unable to decode {key}: {source}")]
    Output {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The main error type for exporter operations.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request to the device failed (connect, timeout, body read)
    #[error("request to device failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The device answered with a non-success status
    #[error("device returned HTTP {0}")]
    Status(u16),

    /// The device answered but the body could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Every attempt of a poll failed
    #[error("unable to get data from device after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ExporterError>,
    },

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExporterError {
    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether another attempt within the same poll may succeed.
    ///
    /// The device is known to drop connections and emit garbled bodies under
    /// load, so transport and decode failures are both transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Status(_) | Self::Decode(_) | Self::Io(_)
        )
    }
}
