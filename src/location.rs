//! Host location with bounded timeout and graceful fallback.
//!
//! The clock works anywhere: when no position is available within the
//! 12-second budget, or the host cannot provide one at all, it falls back
//! to a fixed default location (Mecca) and tells the user why.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::Coordinates;

/// Fallback location when no position can be obtained: Mecca.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates {
    lat: 21.4225,
    lon: 39.8262,
};

/// Label shown alongside the fallback location.
pub const DEFAULT_LOCATION_LABEL: &str = "Mecca (Default)";

/// How long to wait for the host position before giving up.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(12);

/// The distinguished ways obtaining a position can fail. Each maps to its
/// own user-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("Geolocation permission denied")]
    PermissionDenied,
    #[error("Geolocation position unavailable")]
    Unavailable,
    #[error("Geolocation timed out")]
    TimedOut,
    #[error("Geolocation not supported")]
    Unsupported,
}

/// Host-provided current position.
pub trait LocationSource: Send + Sync {
    fn current(&self) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// A position configured up front (or absent, when the host has no
/// location capability at all).
pub struct FixedLocation(pub Option<Coordinates>);

impl LocationSource for FixedLocation {
    async fn current(&self) -> Result<Coordinates, LocationError> {
        self.0.ok_or(LocationError::Unsupported)
    }
}

/// Outcome of location resolution. `notice` carries the user-facing
/// explanation when the default location had to be used.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coords: Coordinates,
    pub used_default: bool,
    pub notice: Option<String>,
}

/// Resolve the current position, degrading to [`DEFAULT_COORDINATES`] on
/// any failure, with the 12s bound applied here rather than trusted to the
/// source.
pub async fn resolve<L: LocationSource>(source: &L) -> ResolvedLocation {
    let result = match timeout(LOCATION_TIMEOUT, source.current()).await {
        Ok(inner) => inner,
        Err(_) => Err(LocationError::TimedOut),
    };

    match result {
        Ok(coords) => ResolvedLocation {
            coords,
            used_default: false,
            notice: None,
        },
        Err(e) => ResolvedLocation {
            coords: DEFAULT_COORDINATES,
            used_default: true,
            notice: Some(format!(
                "{e}. Using prayer times for {DEFAULT_LOCATION_LABEL}."
            )),
        },
    }
}
