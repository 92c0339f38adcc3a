//! Candidate acceptance rules shared by every placement stage.

use crate::catalogue::TierEntry;
use crate::config::LayoutConfig;
use crate::corridors::SpineBand;
use crate::geometry::{clearance_to_polygon, point_in_polygon, Bounds, Point};
use crate::grid::OccupancyGrid;
use crate::ilot::{IdSource, Ilot, PlacementStage};
use crate::plan::FloorPlan;

use super::LayoutState;

/// Inset applied before corner tests so flush edges are not ambiguous.
const CORNER_INSET: f64 = 1e-6;

pub(crate) struct Feasibility<'a> {
    plan: &'a FloorPlan,
    min_spacing: f64,
    restricted_clearance: f64,
    entrance_clearance: Option<f64>,
    spine: Option<SpineBand>,
    lane_width: f64,
}

impl<'a> Feasibility<'a> {
    pub fn new(plan: &'a FloorPlan, config: &LayoutConfig) -> Self {
        let spine = if config.corridors.reserve_spine {
            SpineBand::for_plan(plan, config)
        } else {
            None
        };
        Self {
            plan,
            spine,
            lane_width: config.placement.corridor_width,
            min_spacing: config.placement.min_ilot_spacing,
            restricted_clearance: config.grid.restricted_clearance,
            entrance_clearance: config
                .placement
                .respect_entrance_clearance
                .then_some(config.grid.entrance_clearance),
        }
    }

    /// Exact clearance test for an ilot center, independent of grid
    /// resolution.
    pub fn center_clear(&self, p: &Point) -> bool {
        let restricted_ok = self
            .plan
            .restricted_areas
            .iter()
            .all(|a| clearance_to_polygon(p, &a.boundaries) >= self.restricted_clearance.max(1e-9));
        let entrances_ok = match self.entrance_clearance {
            Some(r) => self.plan.entrances.iter().all(|e| e.position.distance(p) >= r),
            None => true,
        };
        restricted_ok && entrances_ok
    }

    /// Grid, zone polygon and clearance checks for a footprint.
    pub fn site_ok(&self, grid: &OccupancyGrid, zone: usize, rect: &Bounds) -> bool {
        let Some(room) = self.plan.rooms.get(zone) else {
            return false;
        };
        let inner = rect.expand(-CORNER_INSET);
        let center = rect.center();
        grid.is_rect_available(&inner)
            && point_in_polygon(&center, &room.boundaries)
            && inner
                .corners()
                .iter()
                .all(|c| point_in_polygon(c, &room.boundaries))
            && self.center_clear(&center)
    }

    /// Rectangle gap to every other ilot is at least the minimum spacing.
    pub fn spacing_ok(&self, rect: &Bounds, ilots: &[Ilot], skip: Option<usize>) -> bool {
        ilots
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .all(|(_, other)| rect.gap(&other.footprint()) >= self.min_spacing - 1e-9)
    }

    pub fn spine(&self) -> Option<&SpineBand> {
        self.spine.as_ref()
    }

    /// The footprint stays off the spine band, its own access lane is clear
    /// of other ilots and it blocks no other ilot's lane.
    pub fn lanes_ok(&self, rect: &Bounds, ilots: &[Ilot], skip: Option<usize>) -> bool {
        let Some(band) = &self.spine else {
            return true;
        };
        if rect.overlaps(&band.bounds()) {
            return false;
        }
        let own = band.access_lane(rect, self.lane_width);
        ilots
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .all(|(_, other)| {
                let fp = other.footprint();
                own.map_or(true, |lane| !lane.overlaps(&fp))
                    && band
                        .access_lane(&fp, self.lane_width)
                        .map_or(true, |lane| !lane.overlaps(rect))
            })
    }

    pub fn can_place(
        &self,
        grid: &OccupancyGrid,
        zone: usize,
        rect: &Bounds,
        ilots: &[Ilot],
        skip: Option<usize>,
    ) -> bool {
        self.spacing_ok(rect, ilots, skip)
            && self.lanes_ok(rect, ilots, skip)
            && self.site_ok(grid, zone, rect)
    }
}

/// Try to place one tier at `center`, upright first and then rotated.
///
/// On success the ilot is appended, its cells occupied and the zone budget
/// charged.
#[allow(clippy::too_many_arguments)]
pub(crate) fn try_place(
    feasibility: &Feasibility,
    grid: &mut OccupancyGrid,
    state: &mut LayoutState,
    zone: usize,
    center: Point,
    entry: &TierEntry,
    stage: PlacementStage,
    ids: &mut dyn IdSource,
) -> bool {
    if state.remaining(zone) + 1e-9 < entry.area {
        return false;
    }
    let orientations: &[bool] = if (entry.width - entry.height).abs() < 1e-9 {
        &[false]
    } else {
        &[false, true]
    };
    for &rotated in orientations {
        let (w, h) = if rotated {
            (entry.height, entry.width)
        } else {
            (entry.width, entry.height)
        };
        let rect = Bounds::from_center(center, w, h);
        if feasibility.can_place(grid, zone, &rect, &state.ilots, None) {
            let ilot = Ilot::new(ids.next_id(), center, entry.tier, rotated, zone).with_stage(stage);
            grid.occupy(&ilot);
            state.charge(zone, ilot.area);
            state.ilots.push(ilot);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::SizeTier;
    use crate::geometry::{circle_polygon, rectangle};
    use crate::plan::{RestrictedArea, RestrictedCategory, Zone, ZoneCategory};

    fn plan() -> FloorPlan {
        FloorPlan {
            rooms: vec![Zone::new(rectangle(0.0, 0.0, 10.0, 10.0), ZoneCategory::Available)],
            restricted_areas: vec![RestrictedArea::new(
                circle_polygon(Point::new(8.0, 8.0), 0.5, 16),
                RestrictedCategory::Utility,
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_spacing_rule() {
        let plan = plan();
        let config = LayoutConfig::default();
        let f = Feasibility::new(&plan, &config);
        let placed = vec![Ilot::new(1, Point::new(2.0, 2.0), SizeTier::Micro, false, 0)];
        // 1x1 ilots: gap = 2.0 - 1.0 = 1.0 == min spacing
        let ok = Bounds::from_center(Point::new(4.0, 2.0), 1.0, 1.0);
        let close = Bounds::from_center(Point::new(3.9, 2.0), 1.0, 1.0);
        assert!(f.spacing_ok(&ok, &placed, None));
        assert!(!f.spacing_ok(&close, &placed, None));
        assert!(f.spacing_ok(&close, &placed, Some(0)));
    }

    #[test]
    fn test_site_rejects_outside_zone_and_near_restricted() {
        let plan = plan();
        let config = LayoutConfig::default();
        let f = Feasibility::new(&plan, &config);
        let grid = OccupancyGrid::from_plan(&plan, &config.grid, &config.placement);
        assert!(f.site_ok(&grid, 0, &Bounds::from_center(Point::new(3.0, 3.0), 2.0, 1.5)));
        assert!(!f.site_ok(&grid, 0, &Bounds::from_center(Point::new(9.5, 3.0), 2.0, 1.5)));
        assert!(!f.center_clear(&Point::new(8.0, 6.8)));
        assert!(f.center_clear(&Point::new(8.0, 6.4)));
        assert!(!f.site_ok(&grid, 1, &Bounds::from_center(Point::new(3.0, 3.0), 1.0, 1.0)));
    }

    #[test]
    fn test_try_place_rotates_when_needed() {
        let plan = FloorPlan {
            rooms: vec![Zone::new(rectangle(0.0, 0.0, 2.2, 10.0), ZoneCategory::Available)],
            ..Default::default()
        };
        let config = LayoutConfig::default();
        let f = Feasibility::new(&plan, &config);
        let mut grid = OccupancyGrid::from_plan(&plan, &config.grid, &config.placement);
        let mut state = LayoutState::new(1);
        state.set_limit(0, 100.0);
        let entry = TierEntry {
            tier: SizeTier::Large,
            width: 3.0,
            height: 2.0,
            area: 6.0,
            weight: 1.0,
        };
        let mut ids = crate::ilot::SequentialIds::new();
        assert!(try_place(
            &f,
            &mut grid,
            &mut state,
            0,
            Point::new(1.1, 2.0),
            &entry,
            PlacementStage::Lattice,
            &mut ids
        ));
        assert_eq!(state.ilots[0].rotation, 90.0);
        assert_eq!(state.ilots[0].width, 2.0);
        assert!((state.used(0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_lanes_keep_spine_reachable() {
        let plan = FloorPlan {
            rooms: vec![Zone::new(rectangle(0.0, 0.0, 20.0, 20.0), ZoneCategory::Available)],
            ..Default::default()
        };
        let config = LayoutConfig::default();
        let f = Feasibility::new(&plan, &config);
        let band = f.spine().unwrap();
        assert!((band.y - 10.0).abs() < 1e-12);

        // On the band
        assert!(!f.lanes_ok(&Bounds::from_center(Point::new(5.0, 10.0), 2.0, 1.0), &[], None));
        // Touching it from below is fine
        assert!(f.lanes_ok(&Bounds::from_center(Point::new(5.0, 8.5), 2.0, 1.0), &[], None));

        let placed = vec![Ilot::new(1, Point::new(5.0, 5.0), SizeTier::Standard, false, 0)];
        // Between the placed ilot and the band, right across its lane
        let blocking = Bounds::from_center(Point::new(5.0, 7.8), 2.0, 1.0);
        assert!(!f.lanes_ok(&blocking, &placed, None));
        assert!(f.lanes_ok(&blocking, &placed, Some(0)));
        // Behind the placed ilot: its own lane would run into it
        let behind = Bounds::from_center(Point::new(5.0, 2.0), 2.0, 1.0);
        assert!(!f.lanes_ok(&behind, &placed, None));
        // Off to the side both lanes are clear
        let beside = Bounds::from_center(Point::new(9.0, 2.0), 2.0, 1.0);
        assert!(f.lanes_ok(&beside, &placed, None));
    }

    #[test]
    fn test_no_lanes_without_reservation() {
        let plan = plan();
        let mut config = LayoutConfig::default();
        config.corridors.reserve_spine = false;
        let f = Feasibility::new(&plan, &config);
        assert!(f.spine().is_none());
        assert!(f.lanes_ok(&Bounds::from_center(Point::new(5.0, 5.0), 2.0, 1.0), &[], None));
    }

    #[test]
    fn test_try_place_respects_budget() {
        let plan = plan();
        let config = LayoutConfig::default();
        let f = Feasibility::new(&plan, &config);
        let mut grid = OccupancyGrid::from_plan(&plan, &config.grid, &config.placement);
        let mut state = LayoutState::new(1);
        state.set_limit(0, 2.0);
        let entry = TierEntry {
            tier: SizeTier::Standard,
            width: 2.0,
            height: 1.5,
            area: 3.0,
            weight: 1.0,
        };
        let mut ids = crate::ilot::SequentialIds::new();
        assert!(!try_place(
            &f,
            &mut grid,
            &mut state,
            0,
            Point::new(3.0, 3.0),
            &entry,
            PlacementStage::Lattice,
            &mut ids
        ));
        assert!(state.ilots.is_empty());
    }
}
