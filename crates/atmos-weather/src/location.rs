//! Device position lookup.
//!
//! The platform position provider is abstracted behind `PositionSource`.
//! `ConfiguredPosition` serves a fixed home location from configuration.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GeolocationError;
use crate::types::Coordinates;

/// Maximum time to wait for a position fix.
pub const DEFAULT_LOCATE_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// A position fixed at construction; `None` means the device has no fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredPosition {
    coords: Option<Coordinates>,
}

impl ConfiguredPosition {
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl PositionSource for ConfiguredPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        self.coords.ok_or(GeolocationError::Unavailable)
    }
}

/// Ask `source` for a fix, giving up after `timeout`.
pub async fn locate(
    source: &dyn PositionSource,
    timeout: Duration,
) -> Result<Coordinates, GeolocationError> {
    match tokio::time::timeout(timeout, source.current_position()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Position lookup timed out after {:?}", timeout);
            Err(GeolocationError::Timeout)
        }
    }
}
