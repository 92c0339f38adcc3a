//! Layout scoring used by the optimization and refinement stages.
//!
//! ```text
//! score = (100 − 2·|achieved% − target%|)
//!       + 0.3 · distribution     mean pairwise distance / plan diagonal
//!       + 0.2 · accessibility    % of ilots with a clear sight line to an entrance
//!       + 0.5 · constraint       100 − encroachment on restricted areas / entrances
//! ```
//! Every sub-score lives on a 0–100 scale.

use serde::Serialize;

use crate::geometry::clearance_to_polygon;
use crate::ilot::Ilot;
use crate::plan::{Entrance, FloorPlan};

const DISTRIBUTION_WEIGHT: f64 = 0.3;
const ACCESSIBILITY_WEIGHT: f64 = 0.2;
const CONSTRAINT_WEIGHT: f64 = 0.5;

/// Encroachment radius around restricted areas for the constraint term.
pub const RESTRICTED_PENALTY_RADIUS: f64 = 1.5;
/// Encroachment radius around entrances for the constraint term.
pub const ENTRANCE_PENALTY_RADIUS: f64 = 2.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub utilization: f64,
    pub distribution: f64,
    pub accessibility: f64,
    pub constraint: f64,
    pub total: f64,
}

pub struct LayoutScorer<'a> {
    plan: &'a FloorPlan,
    available_area: f64,
    target_pct: f64,
    diagonal: f64,
    samples: usize,
}

impl<'a> LayoutScorer<'a> {
    pub fn new(plan: &'a FloorPlan, available_area: f64, target_pct: f64, samples: usize) -> Self {
        Self {
            plan,
            available_area,
            target_pct,
            diagonal: plan.effective_bounds().diagonal(),
            samples,
        }
    }

    pub fn achieved_pct(&self, ilots: &[Ilot]) -> f64 {
        utilization_pct(ilots, self.available_area)
    }

    pub fn score(&self, ilots: &[Ilot]) -> ScoreBreakdown {
        let utilization = 100.0 - 2.0 * (self.achieved_pct(ilots) - self.target_pct).abs();
        let distribution = distribution_score(ilots, self.diagonal);
        let accessibility = accessibility_score(ilots, &self.plan.entrances, self.samples);
        let constraint = constraint_score(ilots, self.plan);
        ScoreBreakdown {
            utilization,
            distribution,
            accessibility,
            constraint,
            total: utilization
                + DISTRIBUTION_WEIGHT * distribution
                + ACCESSIBILITY_WEIGHT * accessibility
                + CONSTRAINT_WEIGHT * constraint,
        }
    }

    pub fn total(&self, ilots: &[Ilot]) -> f64 {
        self.score(ilots).total
    }
}

/// Σ ilot area / available area × 100; zero when nothing is available.
pub fn utilization_pct(ilots: &[Ilot], available_area: f64) -> f64 {
    if available_area <= 0.0 {
        return 0.0;
    }
    ilots.iter().map(|i| i.area).sum::<f64>() / available_area * 100.0
}

/// Mean pairwise center distance normalized by the plan diagonal.
pub fn distribution_score(ilots: &[Ilot], diagonal: f64) -> f64 {
    if ilots.len() < 2 || diagonal <= 0.0 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in ilots.iter().enumerate() {
        for b in &ilots[i + 1..] {
            total += a.center.distance(&b.center);
            pairs += 1;
        }
    }
    (total / pairs as f64 / diagonal * 100.0).clamp(0.0, 100.0)
}

/// Share of ilots with an unobstructed sampled straight path to at least
/// one entrance. A sample fails if it falls inside another ilot. With no
/// entrances every ilot counts as accessible.
pub fn accessibility_score(ilots: &[Ilot], entrances: &[Entrance], samples: usize) -> f64 {
    if ilots.is_empty() {
        return 0.0;
    }
    if entrances.is_empty() {
        return 100.0;
    }
    let samples = samples.max(1);
    let footprints: Vec<_> = ilots.iter().map(|i| i.footprint()).collect();
    let reachable = ilots
        .iter()
        .enumerate()
        .filter(|(idx, ilot)| {
            entrances.iter().any(|e| {
                (1..=samples).all(|k| {
                    let p = ilot.center.lerp(&e.position, k as f64 / samples as f64);
                    footprints
                        .iter()
                        .enumerate()
                        .all(|(j, f)| j == *idx || !f.contains(&p))
                })
            })
        })
        .count();
    reachable as f64 / ilots.len() as f64 * 100.0
}

/// 100 minus the mean per-ilot encroachment (capped at 1 per ilot) within
/// the penalty radii of restricted areas and entrances.
pub fn constraint_score(ilots: &[Ilot], plan: &FloorPlan) -> f64 {
    if ilots.is_empty() {
        return 100.0;
    }
    let total: f64 = ilots
        .iter()
        .map(|ilot| {
            let restricted: f64 = plan
                .restricted_areas
                .iter()
                .map(|a| {
                    let d = clearance_to_polygon(&ilot.center, &a.boundaries);
                    ((RESTRICTED_PENALTY_RADIUS - d) / RESTRICTED_PENALTY_RADIUS).max(0.0)
                })
                .sum();
            let entrances: f64 = plan
                .entrances
                .iter()
                .map(|e| {
                    let d = ilot.center.distance(&e.position);
                    ((ENTRANCE_PENALTY_RADIUS - d) / ENTRANCE_PENALTY_RADIUS).max(0.0)
                })
                .sum();
            (restricted + entrances).min(1.0)
        })
        .sum();
    100.0 - total / ilots.len() as f64 * 100.0
}
