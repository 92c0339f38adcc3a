//! Stage 2: bounded perturb-and-accept hill climbing.
//!
//! Each generation nudges roughly `mutation_rate` of the ilots by a random
//! offset and keeps the candidate layout only if its score strictly
//! improves. The grid must hold restrictions only (no occupancy) while this
//! runs; ilot-to-ilot spacing is checked against the candidate list.

use rand::Rng;

use crate::geometry::Bounds;
use crate::grid::OccupancyGrid;

use super::scoring::LayoutScorer;
use super::{LayoutState, PlacementContext};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ClimbSummary {
    pub generations: usize,
    pub accepted: usize,
    pub initial_score: f64,
    pub final_score: f64,
}

pub(crate) fn hill_climb(
    ctx: &PlacementContext,
    scorer: &LayoutScorer,
    grid: &OccupancyGrid,
    state: &mut LayoutState,
    rng: &mut impl Rng,
) -> ClimbSummary {
    let n = state.ilots.len();
    let mut current = scorer.total(&state.ilots);
    let mut summary = ClimbSummary {
        initial_score: current,
        final_score: current,
        ..Default::default()
    };
    let opts = &ctx.config.optimizer;
    if n == 0 || opts.generations == 0 {
        return summary;
    }

    let per_generation = ((n as f64 * opts.mutation_rate).round() as usize).clamp(1, n);
    let step = opts.mutation_step;

    for _ in 0..opts.generations {
        summary.generations += 1;
        let mut candidate = state.ilots.clone();
        let mut moved = false;
        for _ in 0..per_generation {
            let i = rng.gen_range(0..n);
            let dx = rng.gen_range(-step..=step);
            let dy = rng.gen_range(-step..=step);
            let ilot = &candidate[i];
            let center = ilot.center.offset(dx, dy);
            let rect = Bounds::from_center(center, ilot.width, ilot.height);
            if ctx
                .feasibility
                .can_place(grid, ilot.zone, &rect, &candidate, Some(i))
            {
                candidate[i].center = center;
                moved = true;
            }
        }
        if !moved {
            continue;
        }
        let score = scorer.total(&candidate);
        if score > current {
            current = score;
            state.ilots = candidate;
            summary.accepted += 1;
        }
    }
    summary.final_score = current;
    summary
}
