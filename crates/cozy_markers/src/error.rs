use cozy_icon::IconError;
use miette::Diagnostic;

#[derive(Diagnostic, Debug, thiserror::Error)]
#[diagnostic()]
pub enum MarkerError {
    /// a query named a marker that is not on the map
    #[error("{method} called with invalid markerId")]
    #[diagnostic(code(marker_error::invalid_marker_id))]
    InvalidMarkerId {
        method: &'static str,
        marker_id: String,
    },
    /// only produced by a strict registry
    #[error("{operation} called with unknown markerId {marker_id:?}")]
    #[diagnostic(code(marker_error::unknown_marker))]
    UnknownMarker {
        operation: &'static str,
        marker_id: String,
    },
    #[error("marker descriptor is missing {0:?}")]
    #[diagnostic(code(marker_error::missing_field))]
    MissingField(&'static str),
    #[error("malformed marker descriptor")]
    #[diagnostic(code(marker_error::malformed_descriptor))]
    MalformedDescriptor(#[from] serde_json::Error),
    #[error("failed to render marker icon")]
    #[diagnostic(code(marker_error::icon))]
    Icon(#[from] IconError),
}

impl MarkerError {
    /// The error code reported back over the host channel.
    pub fn channel_code(&self) -> &'static str {
        match self {
            MarkerError::InvalidMarkerId { .. } => "Invalid markerId",
            MarkerError::UnknownMarker { .. } => "Unknown markerId",
            MarkerError::MissingField(_) | MarkerError::MalformedDescriptor(_) => {
                "Invalid arguments"
            }
            MarkerError::Icon(_) => "Icon error",
        }
    }
}
