// MIT License - Copyright (c) 2026 Peter Wright
// Driver errors

/// All errors that can occur in the ademco-serial library.
#[derive(Debug, thiserror::Error)]
pub enum AdemcoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial link disconnected")]
    Disconnected,

    #[error("Checksum mismatch on frame {frame:?}: expected {expected}, received {received}")]
    ChecksumMismatch {
        frame: String,
        expected: String,
        received: String,
    },

    #[error("Malformed frame: {details}")]
    MalformedFrame { details: String },

    #[error("Invalid partition status: {0:?}")]
    InvalidPartitionStatus(char),

    #[error("Invalid {kind} ID: {id} (valid range 1-{max})")]
    InvalidDeviceId { kind: &'static str, id: u32, max: u32 },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Driver has shut down")]
    ShutDown,
}

impl AdemcoError {
    /// Whether this error is a transport failure that a reconnect can recover from.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdemcoError::Io(_) | AdemcoError::Disconnected)
    }

    /// Whether this error concerns a single inbound frame and can be dropped.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            AdemcoError::ChecksumMismatch { .. }
                | AdemcoError::MalformedFrame { .. }
                | AdemcoError::InvalidPartitionStatus(_)
        )
    }

    pub(crate) fn malformed(details: impl Into<String>) -> Self {
        AdemcoError::MalformedFrame {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdemcoError>;
