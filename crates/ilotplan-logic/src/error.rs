//! Error and warning types.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Fatal errors. Anything else the engine runs into is either absorbed as
/// "infeasible here" or reported as an [`InputWarning`].
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Configuration rejected before placement started.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan or configuration JSON could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A layout could not be written out as JSON.
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("corridor width must be positive, got {0}")]
    NonPositiveCorridorWidth(f64),
    #[error("minimum ilot spacing must be positive, got {0}")]
    NonPositiveSpacing(f64),
    #[error("maximum ilot size must be positive, got {0}")]
    NonPositiveIlotSize(f64),
    #[error("maximum ilot size {max} is below the smallest tier ({smallest})")]
    IlotSizeBelowSmallestTier { max: f64, smallest: f64 },
    #[error("unsupported layout profile {0}% (expected 10, 25, 30 or 35)")]
    UnsupportedProfile(u8),
    #[error("grid resolution must be positive, got {0}")]
    NonPositiveResolution(f64),
    #[error("{name} must not be negative, got {value}")]
    NegativeClearance { name: &'static str, value: f64 },
    #[error("facing band [{min}, {max}] is empty or negative")]
    InvalidFacingBand { min: f64, max: f64 },
    #[error("{name} must be positive, got {value}")]
    NonPositiveStep { name: &'static str, value: f64 },
}

/// Non-fatal input problem. The engine carries on and reports these
/// alongside the layout.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum InputWarning {
    #[error("zone {index} has {points} boundary points (need at least 3)")]
    DegenerateZone { index: usize, points: usize },
    #[error("zone {index} area {area:.2} is below the {min:.2} threshold")]
    ZoneTooSmall { index: usize, area: f64, min: f64 },
    #[error("zone {index} centroid lies inside an entrance clearance")]
    ZoneInEntranceClearance { index: usize },
    #[error("no available zones to place ilots in")]
    NoAvailableZones,
    #[error("no ilots could be placed")]
    NoIlotsPlaced,
}
