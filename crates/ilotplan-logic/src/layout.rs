//! End-to-end layout generation: placement, then corridors, then stats.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::catalogue::SizeTier;
use crate::config::LayoutConfig;
use crate::corridors::{synthesize_corridors, Corridor, CorridorNetwork};
use crate::error::{InputWarning, LayoutError};
use crate::ilot::{IdSource, Ilot, PlacementStage, SequentialIds};
use crate::placement::scoring::ScoreBreakdown;
use crate::placement::{place_ilots, PlacementOutcome, StageReport};
use crate::plan::FloorPlan;
use crate::progress::{emit, NoProgress, ProgressSink, Stage};

/// Summary figures for a generated layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutStats {
    pub ilot_count: usize,
    pub total_ilot_area: f64,
    pub zone_count: usize,
    pub available_area: f64,
    pub utilization_pct: f64,
    pub target_pct: f64,
    pub score: ScoreBreakdown,
    pub tier_counts: BTreeMap<SizeTier, usize>,
    pub stage_counts: BTreeMap<PlacementStage, usize>,
    pub stages: StageReport,
    pub corridor_count: usize,
    pub total_corridor_length: f64,
    pub skipped_corridors: usize,
}

impl LayoutStats {
    fn collect(outcome: &PlacementOutcome, network: &CorridorNetwork, config: &LayoutConfig) -> Self {
        Self {
            ilot_count: outcome.ilots.len(),
            total_ilot_area: outcome.total_area(),
            zone_count: outcome.zones.len(),
            available_area: outcome.available_area,
            utilization_pct: outcome.utilization_pct(),
            target_pct: config.placement.layout_profile.percent() as f64,
            score: outcome.score,
            tier_counts: outcome.tier_counts(),
            stage_counts: outcome.stage_counts(),
            stages: outcome.report.clone(),
            corridor_count: network.corridors.len(),
            total_corridor_length: network.total_length(),
            skipped_corridors: network.skipped,
        }
    }
}

/// A finished layout.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub ilots: Vec<Ilot>,
    pub corridors: Vec<Corridor>,
    pub stats: LayoutStats,
    pub warnings: Vec<InputWarning>,
}

impl Layout {
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(LayoutError::Serialize)
    }
}

/// Generate a layout with a seeded [`StdRng`] and sequential ids.
pub fn generate_layout(plan: &FloorPlan, config: &LayoutConfig, seed: u64) -> crate::Result<Layout> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_layout_with(
        plan,
        config,
        &mut rng,
        &mut SequentialIds::new(),
        &mut NoProgress,
    )
}

/// Generate a layout with caller-supplied randomness, ids and progress sink.
///
/// Ilots and corridors draw from the same id source, so ids are unique
/// across both.
pub fn generate_layout_with(
    plan: &FloorPlan,
    config: &LayoutConfig,
    rng: &mut impl Rng,
    ids: &mut dyn IdSource,
    progress: &mut dyn ProgressSink,
) -> crate::Result<Layout> {
    let outcome = place_ilots(plan, config, rng, ids, progress)?;

    let network = synthesize_corridors(&outcome.ilots, plan, config, ids);
    emit(
        progress,
        Stage::Corridors,
        95,
        format!("{} corridors", network.corridors.len()),
    );

    let stats = LayoutStats::collect(&outcome, &network, config);
    emit(
        progress,
        Stage::Done,
        100,
        format!(
            "{} ilots, {:.1}% utilization",
            stats.ilot_count, stats.utilization_pct
        ),
    );

    Ok(Layout {
        ilots: outcome.ilots,
        corridors: network.corridors,
        stats,
        warnings: outcome.warnings,
    })
}
