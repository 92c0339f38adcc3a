//! Layout configuration and validation.
//!
//! Every section has sensible defaults and deserializes with
//! `#[serde(default)]`, so a JSON document only needs the fields it wants
//! to override. [`validate_config`] reports every problem at once;
//! [`LayoutConfig::validate`] stops at the first, which is what the engine
//! uses to fail fast before placement.

use serde::{Deserialize, Serialize};

use crate::catalogue::SMALLEST_TIER_AREA;
use crate::error::ConfigError;

/// Target share of available area covered by ilots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LayoutProfile {
    /// 10%
    Light,
    /// 25%
    #[default]
    Standard,
    /// 30%
    Dense,
    /// 35%
    Maximum,
}

impl LayoutProfile {
    pub fn all() -> &'static [LayoutProfile] {
        &[
            LayoutProfile::Light,
            LayoutProfile::Standard,
            LayoutProfile::Dense,
            LayoutProfile::Maximum,
        ]
    }

    pub fn percent(self) -> u8 {
        match self {
            LayoutProfile::Light => 10,
            LayoutProfile::Standard => 25,
            LayoutProfile::Dense => 30,
            LayoutProfile::Maximum => 35,
        }
    }

    pub fn fraction(self) -> f64 {
        self.percent() as f64 / 100.0
    }
}

impl TryFrom<u8> for LayoutProfile {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(LayoutProfile::Light),
            25 => Ok(LayoutProfile::Standard),
            30 => Ok(LayoutProfile::Dense),
            35 => Ok(LayoutProfile::Maximum),
            other => Err(ConfigError::UnsupportedProfile(other)),
        }
    }
}

impl From<LayoutProfile> for u8 {
    fn from(profile: LayoutProfile) -> u8 {
        profile.percent()
    }
}

/// Core placement parameters supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub layout_profile: LayoutProfile,
    pub corridor_width: f64,
    pub min_ilot_spacing: f64,
    pub max_ilot_size: f64,
    pub allow_wall_touching: bool,
    pub respect_entrance_clearance: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            layout_profile: LayoutProfile::Standard,
            corridor_width: 1.2,
            min_ilot_spacing: 1.0,
            max_ilot_size: 6.0,
            allow_wall_touching: false,
            respect_entrance_clearance: true,
        }
    }
}

/// Rasterization and clearance parameters for the occupancy grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell edge length in plan units.
    pub resolution: f64,
    /// Extra band beyond half the wall thickness.
    pub wall_buffer: f64,
    /// Radius kept clear around each entrance.
    pub entrance_clearance: f64,
    /// Ring kept clear around each restricted area.
    pub restricted_clearance: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: 0.2,
            wall_buffer: 0.3,
            entrance_clearance: 2.5,
            restricted_clearance: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSelectorConfig {
    pub min_zone_area: f64,
}

impl Default for ZoneSelectorConfig {
    fn default() -> Self {
        Self {
            min_zone_area: 10.0,
        }
    }
}

/// Hard iteration and sample budgets for the placement stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Gap-filling attempts per zone.
    pub gap_fill_attempts: usize,
    /// Opportunistic random samples per zone.
    pub random_samples: usize,
    /// Hill-climbing generations.
    pub generations: usize,
    /// Share of ilots perturbed per generation.
    pub mutation_rate: f64,
    /// Maximum perturbation offset per axis.
    pub mutation_step: f64,
    /// Scan step for densification.
    pub densify_step: f64,
    /// Local refinement passes over all ilots.
    pub refine_passes: usize,
    /// Compass offset length for local refinement.
    pub refine_step: f64,
    /// Sample points on each ilot-to-entrance sight line.
    pub accessibility_samples: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            gap_fill_attempts: 200,
            random_samples: 400,
            generations: 100,
            mutation_rate: 0.1,
            mutation_step: 0.5,
            densify_step: 1.0,
            refine_passes: 2,
            refine_step: 0.25,
            accessibility_samples: 10,
        }
    }
}

/// What to do about ilots the corridor network does not reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpurPolicy {
    /// Every ilot gets an access spur to the spine.
    Always,
    /// Only ilots not touching any corridor get a spur.
    #[default]
    WhenDisconnected,
    /// No spurs.
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    /// Max center offset across a row's axis for an ilot to join it.
    pub row_tolerance: f64,
    /// Row pairs closer than this are already adjacent.
    pub facing_min: f64,
    /// Row pairs farther than this are not bridged directly.
    pub facing_max: f64,
    pub min_spine_width: f64,
    /// Keep the spine band and every ilot's access lane free during
    /// placement, so the spine and its spurs never cut an ilot.
    pub reserve_spine: bool,
    /// Paths whose points all match within this distance are duplicates.
    pub duplicate_tolerance: f64,
    /// An ilot within this distance of a corridor counts as connected.
    pub connection_tolerance: f64,
    pub spur_policy: SpurPolicy,
    /// Insert a midpoint into row-pair paths (hook for obstacle avoidance).
    pub insert_midpoints: bool,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 2.0,
            facing_min: 3.0,
            facing_max: 8.0,
            min_spine_width: 2.0,
            reserve_spine: true,
            duplicate_tolerance: 0.5,
            connection_tolerance: 0.5,
            spur_policy: SpurPolicy::WhenDisconnected,
            insert_midpoints: false,
        }
    }
}

/// Full configuration for one layout run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub placement: PlacementConfig,
    pub grid: GridConfig,
    pub zones: ZoneSelectorConfig,
    pub optimizer: OptimizerConfig,
    pub corridors: CorridorConfig,
}

impl LayoutConfig {
    /// Config with the given profile and everything else at defaults.
    pub fn with_profile(profile: LayoutProfile) -> Self {
        let mut config = Self::default();
        config.placement.layout_profile = profile;
        config
    }

    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail on the first configuration problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match validate_config(self).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Validate a layout configuration, returning all errors found.
pub fn validate_config(config: &LayoutConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let p = &config.placement;

    if p.corridor_width <= 0.0 {
        errors.push(ConfigError::NonPositiveCorridorWidth(p.corridor_width));
    }
    if p.min_ilot_spacing <= 0.0 {
        errors.push(ConfigError::NonPositiveSpacing(p.min_ilot_spacing));
    }
    if p.max_ilot_size <= 0.0 {
        errors.push(ConfigError::NonPositiveIlotSize(p.max_ilot_size));
    } else if p.max_ilot_size < SMALLEST_TIER_AREA {
        errors.push(ConfigError::IlotSizeBelowSmallestTier {
            max: p.max_ilot_size,
            smallest: SMALLEST_TIER_AREA,
        });
    }

    let g = &config.grid;
    if g.resolution <= 0.0 {
        errors.push(ConfigError::NonPositiveResolution(g.resolution));
    }
    for (name, value) in [
        ("wall_buffer", g.wall_buffer),
        ("entrance_clearance", g.entrance_clearance),
        ("restricted_clearance", g.restricted_clearance),
        ("min_zone_area", config.zones.min_zone_area),
    ] {
        if value < 0.0 {
            errors.push(ConfigError::NegativeClearance { name, value });
        }
    }

    let o = &config.optimizer;
    for (name, value) in [
        ("densify_step", o.densify_step),
        ("refine_step", o.refine_step),
        ("mutation_step", o.mutation_step),
    ] {
        if value <= 0.0 {
            errors.push(ConfigError::NonPositiveStep { name, value });
        }
    }

    let c = &config.corridors;
    if c.facing_min < 0.0 || c.facing_max < c.facing_min {
        errors.push(ConfigError::InvalidFacingBand {
            min: c.facing_min,
            max: c.facing_max,
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&LayoutConfig::default()).is_empty());
    }

    #[test]
    fn test_profile_round_trip_through_u8() {
        for &p in LayoutProfile::all() {
            assert_eq!(LayoutProfile::try_from(p.percent()), Ok(p));
        }
        assert_eq!(
            LayoutProfile::try_from(20),
            Err(ConfigError::UnsupportedProfile(20))
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = LayoutConfig::default();
        config.placement.corridor_width = 0.0;
        config.placement.min_ilot_spacing = -1.0;
        config.placement.max_ilot_size = 0.5;
        let errs = validate_config(&config);
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0], ConfigError::NonPositiveCorridorWidth(0.0));
        assert!(matches!(
            errs[2],
            ConfigError::IlotSizeBelowSmallestTier { .. }
        ));
    }

    #[test]
    fn test_validate_stops_at_first() {
        let mut config = LayoutConfig::default();
        config.placement.min_ilot_spacing = 0.0;
        config.grid.resolution = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveSpacing(0.0)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LayoutConfig::from_json(
            r#"{"placement": {"layout_profile": 35, "min_ilot_spacing": 0.8}}"#,
        )
        .unwrap();
        assert_eq!(config.placement.layout_profile, LayoutProfile::Maximum);
        assert!((config.placement.min_ilot_spacing - 0.8).abs() < 1e-12);
        assert!((config.grid.resolution - 0.2).abs() < 1e-12);
        assert_eq!(config.corridors.spur_policy, SpurPolicy::WhenDisconnected);
    }

    #[test]
    fn test_json_rejects_unknown_profile() {
        assert!(LayoutConfig::from_json(r#"{"placement": {"layout_profile": 50}}"#).is_err());
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        let result = LayoutConfig::from_json(r#"{"placement": {"corridor_width": -2}}"#);
        assert!(matches!(
            result,
            Err(crate::LayoutError::Config(ConfigError::NonPositiveCorridorWidth(_)))
        ));
    }
}
