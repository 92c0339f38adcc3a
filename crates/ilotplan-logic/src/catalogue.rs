//! Ilot size catalogue: six tiers with density-dependent weights.
//!
//! A catalogue is built once per run from the layout profile and the
//! configured maximum ilot size. Denser profiles push weight towards the
//! larger tiers so fewer, bigger fixtures make up the target area.

use serde::{Deserialize, Serialize};

use crate::config::LayoutProfile;

/// Size tier of an ilot, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Large,
    Medium,
    Standard,
    Small,
    Compact,
    Micro,
}

impl SizeTier {
    pub fn all() -> &'static [SizeTier] {
        &[
            SizeTier::Large,
            SizeTier::Medium,
            SizeTier::Standard,
            SizeTier::Small,
            SizeTier::Compact,
            SizeTier::Micro,
        ]
    }

    /// Upright footprint (width, height).
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            SizeTier::Large => (3.0, 2.0),
            SizeTier::Medium => (2.5, 1.8),
            SizeTier::Standard => (2.0, 1.5),
            SizeTier::Small => (1.6, 1.25),
            SizeTier::Compact => (1.5, 1.0),
            SizeTier::Micro => (1.0, 1.0),
        }
    }

    pub fn area(self) -> f64 {
        let (w, h) = self.dimensions();
        w * h
    }

    /// Relative frequency before density skew.
    fn base_weight(self) -> f64 {
        match self {
            SizeTier::Large => 0.10,
            SizeTier::Medium => 0.15,
            SizeTier::Standard => 0.25,
            SizeTier::Small => 0.20,
            SizeTier::Compact => 0.15,
            SizeTier::Micro => 0.15,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SizeTier::Large => "large",
            SizeTier::Medium => "medium",
            SizeTier::Standard => "standard",
            SizeTier::Small => "small",
            SizeTier::Compact => "compact",
            SizeTier::Micro => "micro",
        }
    }
}

/// Area of the smallest tier; `max_ilot_size` below this cannot place anything.
pub const SMALLEST_TIER_AREA: f64 = 1.0;

/// One usable tier in a run's catalogue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierEntry {
    pub tier: SizeTier,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub weight: f64,
}

/// Tiers permitted for a run, ordered largest first, weights summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeCatalogue {
    entries: Vec<TierEntry>,
}

impl SizeCatalogue {
    /// Build the catalogue for a profile, dropping tiers above `max_ilot_size`.
    pub fn for_profile(profile: LayoutProfile, max_ilot_size: f64) -> Self {
        let density = profile.fraction();
        let usable: Vec<SizeTier> = SizeTier::all()
            .iter()
            .copied()
            .filter(|t| t.area() <= max_ilot_size + 1e-9)
            .collect();

        let max_area = usable.first().map(|t| t.area()).unwrap_or(0.0);
        let min_area = usable.last().map(|t| t.area()).unwrap_or(0.0);
        let span = (max_area - min_area).max(1e-9);

        // Skew: at 35% density the largest tier gets ~2.4x its base weight.
        let mut entries: Vec<TierEntry> = usable
            .iter()
            .map(|&tier| {
                let rank = (tier.area() - min_area) / span;
                let (width, height) = tier.dimensions();
                TierEntry {
                    tier,
                    width,
                    height,
                    area: tier.area(),
                    weight: tier.base_weight() * (1.0 + density * 4.0 * rank),
                }
            })
            .collect();

        let total: f64 = entries.iter().map(|e| e.weight).sum();
        if total > 0.0 {
            for e in &mut entries {
                e.weight /= total;
            }
        }
        Self { entries }
    }

    /// Largest first.
    pub fn entries(&self) -> &[TierEntry] {
        &self.entries
    }

    /// Smallest first, limited to `count` tiers.
    pub fn smallest(&self, count: usize) -> impl Iterator<Item = &TierEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn largest_dimension(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.width.max(e.height))
            .fold(0.0, f64::max)
    }

    /// Weighted mean tier area.
    pub fn mean_area(&self) -> f64 {
        self.entries.iter().map(|e| e.area * e.weight).sum()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.weight).collect()
    }
}
