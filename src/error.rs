use thiserror::Error;

/// Failure to read one power-supply attribute.
///
/// Every variant is transient from the monitor's point of view: sysfs
/// nodes can vanish or return garbage for a moment around suspend/resume,
/// so the sampler skips the tick instead of exiting.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read attribute '{attribute}': {source}")]
    Io {
        attribute: String,
        #[source]
        source: std::io::Error,
    },

    #[error("attribute '{attribute}' has malformed value {value:?}")]
    Parse { attribute: String, value: String },

    #[error("attribute '{attribute}' is {value}, expected a positive reading")]
    NotPositive { attribute: String, value: f64 },
}

impl ReadError {
    pub fn is_missing(&self) -> bool {
        matches!(self, ReadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type ReadResult<T> = std::result::Result<T, ReadError>;
