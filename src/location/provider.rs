//! The location provider seam.

use std::io;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::Fix;

/// Outcome of a foreground permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Why a provider could not produce a fix.
///
/// Cloneable so the flow can hold it in its `Unavailable` state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("no fix within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("malformed location report: {0}")]
    Malformed(String),
}

impl From<io::Error> for ProviderError {
    fn from(e: io::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Supplies permission status and device coordinates on request.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for permission to read the location while the app is in the foreground.
    async fn request_foreground_permission(&self) -> PermissionStatus;

    /// Read the current position. May wait for the hardware.
    async fn current_position(&self) -> Result<Fix, ProviderError>;
}
