//! Ilot placement engine.
//!
//! Pipeline, run once per layout:
//! 1. Rasterize the plan into an [`OccupancyGrid`], reserve the spine band
//!    and rank zones
//! 2. Stage 1: per zone, lattice seeding + gap filling + random sampling
//! 3. Stage 2: hill-climbing optimization of ilot centers
//! 4. Stage 3: densification with small "fill" ilots, then local refinement
//! 5. Finalize: mark ilots placed and re-occupy the grid
//!
//! Every zone carries an area budget of `zone_area × profile%`, so no stage
//! can push utilization past the target. With the spine reserved, every
//! stage also keeps each ilot's access lane to the band clear. All loops run on fixed budgets and
//! the best layout found is returned when they run out.

mod densify;
mod feasibility;
mod optimize;
pub mod scoring;
mod seeding;

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use crate::catalogue::{SizeCatalogue, SizeTier};
use crate::config::LayoutConfig;
use crate::error::InputWarning;
use crate::grid::{Cell, OccupancyGrid};
use crate::ilot::{IdSource, Ilot, PlacementStage};
use crate::plan::FloorPlan;
use crate::progress::{emit, ProgressSink, Stage};
use crate::zones::{select_zones, RankedZone};

use feasibility::Feasibility;
use scoring::{LayoutScorer, ScoreBreakdown};

/// Per-zone area budget plus the ilots placed so far.
#[derive(Debug, Clone, Default)]
pub(crate) struct LayoutState {
    pub ilots: Vec<Ilot>,
    limits: Vec<f64>,
    used: Vec<f64>,
}

impl LayoutState {
    pub fn new(rooms: usize) -> Self {
        Self {
            ilots: Vec::new(),
            limits: vec![0.0; rooms],
            used: vec![0.0; rooms],
        }
    }

    pub fn set_limit(&mut self, zone: usize, limit: f64) {
        if let Some(l) = self.limits.get_mut(zone) {
            *l = limit;
        }
    }

    pub fn limit(&self, zone: usize) -> f64 {
        self.limits.get(zone).copied().unwrap_or(0.0)
    }

    pub fn used(&self, zone: usize) -> f64 {
        self.used.get(zone).copied().unwrap_or(0.0)
    }

    pub fn remaining(&self, zone: usize) -> f64 {
        (self.limit(zone) - self.used(zone)).max(0.0)
    }

    pub fn has_room_for(&self, zone: usize, area: f64) -> bool {
        self.remaining(zone) + 1e-9 >= area
    }

    pub fn charge(&mut self, zone: usize, area: f64) {
        if let Some(u) = self.used.get_mut(zone) {
            *u += area;
        }
    }
}

/// Shared, read-only inputs for every stage.
pub(crate) struct PlacementContext<'a> {
    pub plan: &'a FloorPlan,
    pub config: &'a LayoutConfig,
    pub catalogue: SizeCatalogue,
    pub feasibility: Feasibility<'a>,
    pub smallest_area: f64,
}

impl<'a> PlacementContext<'a> {
    pub fn new(plan: &'a FloorPlan, config: &'a LayoutConfig) -> Self {
        let placement = &config.placement;
        let catalogue =
            SizeCatalogue::for_profile(placement.layout_profile, placement.max_ilot_size);
        let smallest_area = catalogue
            .smallest(1)
            .next()
            .map(|e| e.area)
            .unwrap_or(f64::INFINITY);
        Self {
            plan,
            config,
            catalogue,
            feasibility: Feasibility::new(plan, config),
            smallest_area,
        }
    }
}

/// How many ilots each stage contributed and what the optimizer did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageReport {
    pub lattice: usize,
    pub gap_fill: usize,
    pub sampled: usize,
    pub fill: usize,
    pub generations: usize,
    pub accepted_perturbations: usize,
    pub refinement_moves: usize,
    pub score_before_optimization: f64,
}

/// Result of a placement run.
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    pub ilots: Vec<Ilot>,
    /// Grid after finalization: restrictions plus every ilot occupied.
    pub grid: OccupancyGrid,
    pub zones: Vec<RankedZone>,
    pub available_area: f64,
    pub score: ScoreBreakdown,
    pub report: StageReport,
    pub warnings: Vec<InputWarning>,
}

impl PlacementOutcome {
    pub fn total_area(&self) -> f64 {
        self.ilots.iter().map(|i| i.area).sum()
    }

    pub fn utilization_pct(&self) -> f64 {
        scoring::utilization_pct(&self.ilots, self.available_area)
    }

    pub fn tier_counts(&self) -> BTreeMap<SizeTier, usize> {
        let mut counts = BTreeMap::new();
        for ilot in &self.ilots {
            *counts.entry(ilot.tier).or_insert(0) += 1;
        }
        counts
    }

    pub fn stage_counts(&self) -> BTreeMap<PlacementStage, usize> {
        let mut counts = BTreeMap::new();
        for ilot in &self.ilots {
            *counts.entry(ilot.stage).or_insert(0) += 1;
        }
        counts
    }
}

/// Place ilots over a floor plan.
///
/// Fails only on configuration errors. Input problems (no usable zones,
/// nothing placeable) come back as warnings with an empty ilot list.
pub fn place_ilots(
    plan: &FloorPlan,
    config: &LayoutConfig,
    rng: &mut impl Rng,
    ids: &mut dyn IdSource,
    progress: &mut dyn ProgressSink,
) -> crate::Result<PlacementOutcome> {
    config.validate()?;
    let placement = &config.placement;

    let mut grid = OccupancyGrid::from_plan(plan, &config.grid, placement);
    emit(
        progress,
        Stage::Grid,
        5,
        format!("{}x{} grid", grid.cols(), grid.rows()),
    );

    let entrance_clearance = placement
        .respect_entrance_clearance
        .then_some(config.grid.entrance_clearance);
    let selection = select_zones(plan, config.zones.min_zone_area, entrance_clearance);
    let available_area = selection.available_area();
    let mut warnings = selection.warnings.clone();
    let zones = selection.zones;
    emit(
        progress,
        Stage::Zones,
        10,
        format!("{} zones, {:.1} available area", zones.len(), available_area),
    );

    let target_pct = placement.layout_profile.percent() as f64;
    let scorer = LayoutScorer::new(
        plan,
        available_area,
        target_pct,
        config.optimizer.accessibility_samples,
    );

    let ctx = PlacementContext::new(plan, config);
    if let Some(band) = ctx.feasibility.spine() {
        grid.mark_rectangle(&band.bounds(), Cell::Restricted);
        log::debug!(
            "Reserved spine band at y = {:.2}, {:.2} wide",
            band.y,
            band.width
        );
    }

    let mut state = LayoutState::new(plan.rooms.len());
    for zone in &zones {
        state.set_limit(zone.index, zone.area * placement.layout_profile.fraction());
    }

    // ── Stage 1: primary placement ──
    let mut report = StageReport::default();
    for (n, zone) in zones.iter().enumerate() {
        let counts = seeding::seed_zone(&ctx, &mut grid, zone, &mut state, rng, ids);
        report.lattice += counts.lattice;
        report.gap_fill += counts.gap_fill;
        report.sampled += counts.sampled;
        let pct = 10 + (40 * (n + 1) / zones.len()) as u8;
        emit(
            progress,
            Stage::Seeding,
            pct,
            format!("zone {}: {} ilots", zone.index, counts.total()),
        );
    }
    log::info!(
        "Primary placement: {} ilots ({} lattice, {} gap, {} sampled) in {} zones",
        state.ilots.len(),
        report.lattice,
        report.gap_fill,
        report.sampled,
        zones.len()
    );

    // ── Stage 2: optimization ──
    grid.clear_occupancy();
    let climb = optimize::hill_climb(&ctx, &scorer, &grid, &mut state, rng);
    report.generations = climb.generations;
    report.accepted_perturbations = climb.accepted;
    report.score_before_optimization = climb.initial_score;
    emit(
        progress,
        Stage::Optimization,
        70,
        format!(
            "score {:.2} -> {:.2} ({} of {} generations accepted)",
            climb.initial_score, climb.final_score, climb.accepted, climb.generations
        ),
    );

    // ── Stage 3: densification ──
    report.fill = densify::densify(&ctx, &mut grid, &zones, &mut state, ids);
    grid.clear_occupancy();
    report.refinement_moves = densify::refine(&ctx, &scorer, &grid, &mut state);
    emit(
        progress,
        Stage::Densification,
        90,
        format!(
            "{} fill ilots, {} refinement moves",
            report.fill, report.refinement_moves
        ),
    );

    // ── Finalize ──
    for ilot in &mut state.ilots {
        ilot.placed = true;
        grid.occupy(ilot);
    }
    let score = scorer.score(&state.ilots);
    if state.ilots.is_empty() && !zones.is_empty() {
        log::warn!("{}", InputWarning::NoIlotsPlaced);
        warnings.push(InputWarning::NoIlotsPlaced);
    }
    log::info!(
        "Placed {} ilots, {:.1}% of {:.1} available (target {}%), score {:.2}",
        state.ilots.len(),
        scorer.achieved_pct(&state.ilots),
        available_area,
        placement.layout_profile.percent(),
        score.total
    );

    Ok(PlacementOutcome {
        ilots: state.ilots,
        grid,
        zones,
        available_area,
        score,
        report,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutProfile;
    use crate::corridors::SpineBand;
    use crate::geometry::{rectangle, Point};
    use crate::ilot::SequentialIds;
    use crate::plan::{Entrance, Zone, ZoneCategory};
    use crate::progress::{NoProgress, ProgressLog};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn office() -> FloorPlan {
        FloorPlan {
            rooms: vec![
                Zone::new(rectangle(0.0, 0.0, 20.0, 12.0), ZoneCategory::Available),
                Zone::new(rectangle(20.0, 0.0, 30.0, 12.0), ZoneCategory::Available),
            ],
            entrances: vec![Entrance::new(Point::new(10.0, 0.0), 1.5)],
            ..Default::default()
        }
    }

    fn run(plan: &FloorPlan, config: &LayoutConfig, seed: u64) -> PlacementOutcome {
        let mut rng = StdRng::seed_from_u64(seed);
        place_ilots(plan, config, &mut rng, &mut SequentialIds::new(), &mut NoProgress).unwrap()
    }

    #[test]
    fn test_layout_state_budget() {
        let mut s = LayoutState::new(2);
        s.set_limit(1, 5.0);
        s.charge(1, 3.0);
        assert!((s.remaining(1) - 2.0).abs() < 1e-12);
        assert!(s.has_room_for(1, 2.0));
        assert!(!s.has_room_for(1, 2.5));
        assert!(!s.has_room_for(0, 1.0));
        // Out-of-range zones are simply empty
        assert_eq!(s.limit(9), 0.0);
    }

    #[test]
    fn test_places_and_finalizes() {
        let out = run(&office(), &LayoutConfig::default(), 42);
        assert!(!out.ilots.is_empty());
        assert!(out.ilots.iter().all(|i| i.placed));
        assert!(out.utilization_pct() <= 25.0 + 1e-6);
        assert!(out.report.lattice > 0);
        assert!(out.grid.cell_counts().occupied > 0);
    }

    #[test]
    fn test_ids_unique() {
        let out = run(&office(), &LayoutConfig::default(), 3);
        let mut ids: Vec<u32> = out.ilots.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), out.ilots.len());
    }

    #[test]
    fn test_zone_budgets_hold_per_zone() {
        let config = LayoutConfig::with_profile(LayoutProfile::Maximum);
        let out = run(&office(), &config, 11);
        for zone in &out.zones {
            let used: f64 = out
                .ilots
                .iter()
                .filter(|i| i.zone == zone.index)
                .map(|i| i.area)
                .sum();
            assert!(used <= zone.area * 0.35 + 1e-6);
        }
    }

    #[test]
    fn test_progress_stages_in_order() {
        let mut log = ProgressLog::default();
        let mut rng = StdRng::seed_from_u64(1);
        place_ilots(
            &office(),
            &LayoutConfig::default(),
            &mut rng,
            &mut SequentialIds::new(),
            &mut log,
        )
        .unwrap();
        let stages: Vec<Stage> = log.events.iter().map(|e| e.stage).collect();
        assert_eq!(stages.first(), Some(&Stage::Grid));
        assert_eq!(stages.last(), Some(&Stage::Densification));
        let progress: Vec<u8> = log.events.iter().map(|e| e.progress).collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_spine_band_and_lanes_left_free() {
        let plan = office();
        let band = SpineBand::for_plan(&plan, &LayoutConfig::default()).unwrap();
        assert!((band.y - 6.0).abs() < 1e-12);
        for &profile in LayoutProfile::all() {
            let out = run(&plan, &LayoutConfig::with_profile(profile), 17);
            assert!(!out.ilots.is_empty());
            for ilot in &out.ilots {
                let fp = ilot.footprint();
                assert!(!fp.overlaps(&band.bounds()), "ilot {} on the band", ilot.id);
                if let Some(lane) = band.access_lane(&fp, 1.2) {
                    assert!(out
                        .ilots
                        .iter()
                        .all(|other| other.id == ilot.id || !lane.overlaps(&other.footprint())));
                }
            }
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = LayoutConfig::default();
        config.placement.max_ilot_size = 0.5;
        let mut rng = StdRng::seed_from_u64(1);
        let result = place_ilots(
            &office(),
            &config,
            &mut rng,
            &mut SequentialIds::new(),
            &mut NoProgress,
        );
        assert!(matches!(result, Err(crate::LayoutError::Config(_))));
    }

    #[test]
    fn test_zone_too_cramped_yields_nothing() {
        // Big enough to pass zone selection, too thin for the smallest tier
        let plan = FloorPlan {
            rooms: vec![Zone::new(rectangle(0.0, 0.0, 20.0, 0.5), ZoneCategory::Available)],
            ..Default::default()
        };
        let out = run(&plan, &LayoutConfig::default(), 5);
        assert!(out.ilots.is_empty());
        assert!(out.warnings.contains(&InputWarning::NoIlotsPlaced));
    }
}
