use thiserror::Error;

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, CloakError>;

/// Every way a cloak session can end other than a clean stop
#[derive(Error, Debug)]
pub enum CloakError {
    /// The requested color is not in the profile table
    #[error("Unknown color profile: {name}")]
    UnknownProfile { name: String },

    /// A profile was built with an invalid set of ranges
    #[error("Invalid color profile {name}: {reason}")]
    InvalidProfile { name: String, reason: String },

    /// The camera could not be opened
    #[error("Camera unavailable")]
    CameraUnavailable {
        #[source]
        source: anyhow::Error,
    },

    /// A frame read failed while streaming
    #[error("Camera read failed at frame {frame}")]
    CameraReadFailure {
        frame: u64,
        #[source]
        source: anyhow::Error,
    },

    /// Every read in the background window failed
    #[error("No usable frame in background window of {attempts} reads")]
    NoUsableFrame { attempts: u32 },

    /// Background, frame or mask resolutions disagree
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The output sink rejected a composite
    #[error("Failed to deliver frame {frame}")]
    SinkFailure {
        frame: u64,
        #[source]
        source: anyhow::Error,
    },
}

impl CloakError {
    /// True when the camera was never touched
    pub fn is_rejected_before_capture(&self) -> bool {
        matches!(
            self,
            CloakError::UnknownProfile { .. } | CloakError::InvalidProfile { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CloakError::UnknownProfile {
            name: "Purple".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown color profile: Purple");
        assert!(err.is_rejected_before_capture());

        let err = CloakError::NoUsableFrame { attempts: 30 };
        assert!(err.to_string().contains("30 reads"));
        assert!(!err.is_rejected_before_capture());
    }

    #[test]
    fn test_source_chain() {
        let err = CloakError::CameraReadFailure {
            frame: 7,
            source: anyhow::anyhow!("device unplugged"),
        };
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("device unplugged"));
    }
}
