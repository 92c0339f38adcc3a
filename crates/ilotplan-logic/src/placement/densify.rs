//! Stage 3: densification and local refinement.

use crate::geometry::{point_in_polygon, Bounds};
use crate::grid::OccupancyGrid;
use crate::ilot::{IdSource, PlacementStage};
use crate::zones::RankedZone;

use super::feasibility::try_place;
use super::scoring::LayoutScorer;
use super::{LayoutState, PlacementContext};

/// Fill uses only the two smallest tiers.
const FILL_TIERS: usize = 2;

const DIAG: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// N, NE, E, SE, S, SW, W, NW.
const COMPASS: [(f64, f64); 8] = [
    (0.0, 1.0),
    (DIAG, DIAG),
    (1.0, 0.0),
    (DIAG, -DIAG),
    (0.0, -1.0),
    (-DIAG, -DIAG),
    (-1.0, 0.0),
    (-DIAG, DIAG),
];

/// Re-mark current ilots on a grid cleared of occupancy, then drop small
/// "fill" ilots on remaining free cells, scanned at a coarse step.
pub(crate) fn densify(
    ctx: &PlacementContext,
    grid: &mut OccupancyGrid,
    zones: &[RankedZone],
    state: &mut LayoutState,
    ids: &mut dyn IdSource,
) -> usize {
    grid.clear_occupancy();
    for ilot in &state.ilots {
        grid.occupy(ilot);
    }

    let step = ctx.config.optimizer.densify_step;
    let mut placed = 0;
    for zone in zones {
        if !state.has_room_for(zone.index, ctx.smallest_area) {
            continue;
        }
        let boundary = &ctx.plan.rooms[zone.index].boundaries;
        for p in grid.free_points_in(&zone.bounds, step) {
            if !state.has_room_for(zone.index, ctx.smallest_area) {
                break;
            }
            // Earlier fills in this scan may have taken the cell
            if !grid.is_available(&p) || !point_in_polygon(&p, boundary) {
                continue;
            }
            let hit = ctx.catalogue.smallest(FILL_TIERS).any(|entry| {
                try_place(
                    &ctx.feasibility,
                    grid,
                    state,
                    zone.index,
                    p,
                    entry,
                    PlacementStage::Fill,
                    ids,
                )
            });
            if hit {
                placed += 1;
            }
        }
    }
    placed
}

/// Try the eight compass offsets for each ilot and keep the first move that
/// strictly improves the score. Bounded by `refine_passes`; stops early when
/// a pass moves nothing. Returns the number of moves made.
pub(crate) fn refine(
    ctx: &PlacementContext,
    scorer: &LayoutScorer,
    grid: &OccupancyGrid,
    state: &mut LayoutState,
) -> usize {
    let step = ctx.config.optimizer.refine_step;
    let mut current = scorer.total(&state.ilots);
    let mut moves = 0;

    for _ in 0..ctx.config.optimizer.refine_passes {
        let mut moved_any = false;
        for i in 0..state.ilots.len() {
            let original = state.ilots[i].center;
            for (dx, dy) in COMPASS {
                let ilot = &state.ilots[i];
                let center = original.offset(dx * step, dy * step);
                let rect = Bounds::from_center(center, ilot.width, ilot.height);
                if !ctx
                    .feasibility
                    .can_place(grid, ilot.zone, &rect, &state.ilots, Some(i))
                {
                    continue;
                }
                state.ilots[i].center = center;
                let score = scorer.total(&state.ilots);
                if score > current {
                    current = score;
                    moves += 1;
                    moved_any = true;
                    break;
                }
                state.ilots[i].center = original;
            }
        }
        if !moved_any {
            break;
        }
    }
    moves
}
