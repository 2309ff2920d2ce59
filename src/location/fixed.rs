//! Fixed-position provider for machines without a receiver.

use async_trait::async_trait;

use crate::model::{Coordinate, Fix};

use super::{LocationProvider, PermissionStatus, ProviderError};

/// Reports the same configured coordinate on every request.
#[derive(Debug, Clone)]
pub struct FixedProvider {
    coordinate: Coordinate,
}

impl FixedProvider {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationProvider for FixedProvider {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&self) -> Result<Fix, ProviderError> {
        tracing::debug!(coordinate = %self.coordinate, "fixed provider fix");
        Ok(Fix::at(self.coordinate))
    }
}
