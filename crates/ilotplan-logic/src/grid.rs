//! Occupancy grid: rasterized feasibility map over the floor plan.
//!
//! Cells are free, restricted or occupied. Restricted is sticky: once a cell
//! is restricted no later write turns it back into free or occupied, so
//! clearing occupancy can never reopen a stairwell or an entrance clearance.
//! Anything outside the grid reads as restricted.
//!
//! A grid never holds more than [`MAX_CELLS`] cells: plans too large for the
//! configured resolution are rasterized at a coarser one.

use serde::{Deserialize, Serialize};

use crate::config::{GridConfig, PlacementConfig};
use crate::geometry::{bounds_of, distance_to_polygon, distance_to_segment, point_in_polygon};
use crate::geometry::{Bounds, Point};
use crate::ilot::Ilot;
use crate::plan::FloorPlan;

/// Upper bound on the number of cells in one grid.
pub const MAX_CELLS: usize = 4_000_000;

/// State of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Cell {
    Restricted = -1,
    Free = 0,
    Occupied = 1,
}

/// Number of cells in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CellCounts {
    pub free: usize,
    pub restricted: usize,
    pub occupied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyGrid {
    origin: Point,
    resolution: f64,
    cols: usize,
    rows: usize,
    /// Row-major, `rows * cols`.
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    /// Empty (all free) grid covering `bounds`. The resolution is coarsened
    /// when `bounds` would need more than [`MAX_CELLS`] cells.
    pub fn new(bounds: Bounds, resolution: f64) -> Self {
        let requested = if resolution > 0.0 { resolution } else { 0.2 };
        let (resolution, cols, rows) = fit_resolution(&bounds, requested);
        if resolution > requested {
            log::warn!(
                "Plan bounds {:.1} x {:.1} too large for resolution {:.3}; using {:.3}",
                bounds.width(),
                bounds.height(),
                requested,
                resolution
            );
        }
        Self {
            origin: Point::new(bounds.min_x, bounds.min_y),
            resolution,
            cols,
            rows,
            cells: vec![Cell::Free; cols * rows],
        }
    }

    /// Rasterize a plan: restricted areas (with their clearance ring), wall
    /// bands and entrance clearances are marked restricted.
    pub fn from_plan(plan: &FloorPlan, grid: &GridConfig, placement: &PlacementConfig) -> Self {
        let mut out = Self::new(plan.effective_bounds(), grid.resolution);

        for area in &plan.restricted_areas {
            out.mark_polygon(&area.boundaries, Cell::Restricted);
            if grid.restricted_clearance > 0.0 {
                out.mark_polygon_ring(&area.boundaries, grid.restricted_clearance, Cell::Restricted);
            }
        }

        let buffer = if placement.allow_wall_touching {
            0.0
        } else {
            grid.wall_buffer
        };
        for wall in &plan.walls {
            let half = wall.thickness.max(0.0) / 2.0 + buffer;
            out.mark_segment_band(&wall.start, &wall.end, half, Cell::Restricted);
        }

        if placement.respect_entrance_clearance {
            for entrance in &plan.entrances {
                out.mark_circle(&entrance.position, grid.entrance_clearance, Cell::Restricted);
            }
        }

        let counts = out.cell_counts();
        log::debug!(
            "Grid {}x{} @ {:.2}: {} free, {} restricted",
            out.cols,
            out.rows,
            out.resolution,
            counts.free,
            counts.restricted
        );
        out
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.origin.x,
            self.origin.x + self.cols as f64 * self.resolution,
            self.origin.y,
            self.origin.y + self.rows as f64 * self.resolution,
        )
    }

    // ── Coordinate mapping ──────────────────────────────────────────────

    /// Cell containing `p`, or `None` outside the grid.
    pub fn world_to_cell(&self, p: &Point) -> Option<(usize, usize)> {
        let fx = (p.x - self.origin.x) / self.resolution;
        let fy = (p.y - self.origin.y) / self.resolution;
        if !fx.is_finite() || !fy.is_finite() || fx < 0.0 || fy < 0.0 {
            return None;
        }
        let (col, row) = (fx.floor() as usize, fy.floor() as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    /// World position of a cell's center.
    pub fn cell_center(&self, col: usize, row: usize) -> Point {
        Point::new(
            self.origin.x + (col as f64 + 0.5) * self.resolution,
            self.origin.y + (row as f64 + 0.5) * self.resolution,
        )
    }

    /// Inclusive cell range covering a world box, clipped to the grid.
    fn cell_range(&self, b: &Bounds) -> Option<(usize, usize, usize, usize)> {
        let to_col = |x: f64| ((x - self.origin.x) / self.resolution).floor();
        let to_row = |y: f64| ((y - self.origin.y) / self.resolution).floor();
        let c0 = to_col(b.min_x).max(0.0);
        let c1 = to_col(b.max_x).min(self.cols as f64 - 1.0);
        let r0 = to_row(b.min_y).max(0.0);
        let r1 = to_row(b.max_y).min(self.rows as f64 - 1.0);
        if !(c0.is_finite() && c1.is_finite() && r0.is_finite() && r1.is_finite())
            || c1 < c0
            || r1 < r0
        {
            return None;
        }
        Some((c0 as usize, c1 as usize, r0 as usize, r1 as usize))
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get(&self, col: usize, row: usize) -> Cell {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col]
        } else {
            Cell::Restricted
        }
    }

    /// State under a world point; outside the grid is restricted.
    pub fn cell_at(&self, p: &Point) -> Cell {
        match self.world_to_cell(p) {
            Some((c, r)) => self.get(c, r),
            None => Cell::Restricted,
        }
    }

    pub fn is_available(&self, p: &Point) -> bool {
        self.cell_at(p) == Cell::Free
    }

    /// True when the four corners and the center of `rect` are free.
    pub fn is_rect_available(&self, rect: &Bounds) -> bool {
        rect.corners().iter().all(|c| self.is_available(c)) && self.is_available(&rect.center())
    }

    pub fn cell_counts(&self) -> CellCounts {
        let mut counts = CellCounts::default();
        for cell in &self.cells {
            match cell {
                Cell::Free => counts.free += 1,
                Cell::Restricted => counts.restricted += 1,
                Cell::Occupied => counts.occupied += 1,
            }
        }
        counts
    }

    /// Free cell centers inside `region`, sampled every `step` units.
    pub fn free_points_in(&self, region: &Bounds, step: f64) -> Vec<Point> {
        let step = step.max(self.resolution);
        let mut points = Vec::new();
        let mut y = region.min_y + step / 2.0;
        while y < region.max_y {
            let mut x = region.min_x + step / 2.0;
            while x < region.max_x {
                let p = Point::new(x, y);
                if self.is_available(&p) {
                    points.push(p);
                }
                x += step;
            }
            y += step;
        }
        points
    }

    // ── Marking ─────────────────────────────────────────────────────────

    fn set(&mut self, col: usize, row: usize, value: Cell) {
        let idx = row * self.cols + col;
        if self.cells[idx] == Cell::Restricted && value != Cell::Restricted {
            return;
        }
        self.cells[idx] = value;
    }

    /// Set every cell whose center satisfies `pred` within `region`.
    fn mark_where(&mut self, region: &Bounds, value: Cell, pred: impl Fn(&Point) -> bool) {
        let Some((c0, c1, r0, r1)) = self.cell_range(region) else {
            return;
        };
        for row in r0..=r1 {
            for col in c0..=c1 {
                if pred(&self.cell_center(col, row)) {
                    self.set(col, row, value);
                }
            }
        }
    }

    /// Cells whose centers lie inside the polygon.
    pub fn mark_polygon(&mut self, poly: &[Point], value: Cell) {
        if poly.len() < 3 {
            return;
        }
        self.mark_where(&bounds_of(poly), value, |p| point_in_polygon(p, poly));
    }

    /// Cells within `margin` of the polygon's boundary.
    pub fn mark_polygon_ring(&mut self, poly: &[Point], margin: f64, value: Cell) {
        if poly.len() < 3 {
            return;
        }
        self.mark_where(&bounds_of(poly).expand(margin), value, |p| {
            distance_to_polygon(p, poly) <= margin
        });
    }

    /// Cells whose centers lie inside the box.
    pub fn mark_rectangle(&mut self, rect: &Bounds, value: Cell) {
        self.mark_where(rect, value, |p| rect.contains(p));
    }

    /// Cells whose centers lie within `radius` of `center`.
    pub fn mark_circle(&mut self, center: &Point, radius: f64, value: Cell) {
        if radius <= 0.0 {
            return;
        }
        let region = Bounds::from_center(*center, radius * 2.0, radius * 2.0);
        self.mark_where(&region, value, |p| p.distance(center) <= radius);
    }

    /// Cells within `half_width` of the segment (a wall band).
    pub fn mark_segment_band(&mut self, a: &Point, b: &Point, half_width: f64, value: Cell) {
        let region = bounds_of(&[*a, *b]).expand(half_width);
        self.mark_where(&region, value, |p| distance_to_segment(p, a, b) <= half_width);
    }

    /// Mark an ilot's footprint occupied.
    pub fn occupy(&mut self, ilot: &Ilot) {
        self.mark_rectangle(&ilot.footprint(), Cell::Occupied);
    }

    /// Turn every occupied cell back to free. Restricted cells are untouched.
    pub fn clear_occupancy(&mut self) {
        for cell in &mut self.cells {
            if *cell == Cell::Occupied {
                *cell = Cell::Free;
            }
        }
    }
}

/// Smallest resolution, no finer than `requested`, at which `bounds` fits in
/// [`MAX_CELLS`]. Non-finite bounds collapse to a single cell.
fn fit_resolution(bounds: &Bounds, requested: f64) -> (f64, usize, usize) {
    let width = bounds.max_x - bounds.min_x;
    let height = bounds.max_y - bounds.min_y;
    if !(width.is_finite() && height.is_finite()) {
        return (requested, 1, 1);
    }
    let (width, height) = (width.max(0.0), height.max(0.0));
    let max = MAX_CELLS as f64;
    let mut resolution = requested
        .max((width * height / max).sqrt())
        .max(width.max(height) / max);
    loop {
        let cols = (width / resolution).ceil().max(1.0);
        let rows = (height / resolution).ceil().max(1.0);
        if cols * rows <= max {
            return (resolution, cols as usize, rows as usize);
        }
        resolution *= 1.25;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::SizeTier;
    use crate::geometry::rectangle;
    use crate::plan::{Entrance, RestrictedArea, RestrictedCategory, Wall};

    fn grid_10() -> OccupancyGrid {
        OccupancyGrid::new(Bounds::new(0.0, 10.0, 0.0, 10.0), 0.2)
    }

    #[test]
    fn test_dimensions_and_mapping() {
        let g = grid_10();
        assert_eq!((g.cols(), g.rows()), (50, 50));
        assert_eq!(g.world_to_cell(&Point::new(0.1, 0.1)), Some((0, 0)));
        assert_eq!(g.world_to_cell(&Point::new(9.99, 5.0)), Some((49, 25)));
        assert_eq!(g.world_to_cell(&Point::new(10.0, 5.0)), None);
        assert_eq!(g.world_to_cell(&Point::new(-0.01, 5.0)), None);
        let c = g.cell_center(0, 0);
        assert!((c.x - 0.1).abs() < 1e-12 && (c.y - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_huge_bounds_are_coarsened() {
        let g = OccupancyGrid::new(Bounds::new(0.0, 1e10, 0.0, 1e10), 0.2);
        assert!(g.cols() * g.rows() <= MAX_CELLS);
        assert!(g.resolution() > 0.2);
        assert!(g.bounds().max_x >= 1e10 && g.bounds().max_y >= 1e10);
        assert!(g.is_available(&Point::new(5e9, 5e9)));

        // Millimetre plan: 40 m x 24 m
        let mm = OccupancyGrid::new(Bounds::new(0.0, 40_000.0, 0.0, 24_000.0), 0.2);
        assert!(mm.cols() * mm.rows() <= MAX_CELLS);

        // Long thin strip
        let strip = OccupancyGrid::new(Bounds::new(0.0, 1e12, 0.0, 0.5), 0.2);
        assert!(strip.cols() * strip.rows() <= MAX_CELLS);
    }

    #[test]
    fn test_non_finite_bounds_single_cell() {
        let g = OccupancyGrid::new(Bounds::new(0.0, f64::INFINITY, 0.0, 10.0), 0.2);
        assert_eq!((g.cols(), g.rows()), (1, 1));
        let nan = OccupancyGrid::new(Bounds::new(f64::NAN, 1.0, 0.0, 1.0), 0.2);
        assert_eq!((nan.cols(), nan.rows()), (1, 1));
    }

    #[test]
    fn test_small_plans_keep_resolution() {
        let g = grid_10();
        assert_eq!(g.resolution(), 0.2);
    }

    #[test]
    fn test_outside_is_restricted() {
        let g = grid_10();
        assert_eq!(g.cell_at(&Point::new(20.0, 5.0)), Cell::Restricted);
        assert!(!g.is_available(&Point::new(5.0, -1.0)));
        assert!(g.is_available(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_mark_circle() {
        let mut g = grid_10();
        g.mark_circle(&Point::new(5.0, 5.0), 1.0, Cell::Restricted);
        assert!(!g.is_available(&Point::new(5.0, 5.0)));
        assert!(!g.is_available(&Point::new(5.6, 5.6)));
        assert!(g.is_available(&Point::new(6.5, 5.0)));
    }

    #[test]
    fn test_restricted_cells_are_sticky() {
        let mut g = grid_10();
        let rect = Bounds::new(2.0, 4.0, 2.0, 4.0);
        g.mark_rectangle(&rect, Cell::Restricted);
        g.mark_rectangle(&rect, Cell::Occupied);
        assert_eq!(g.cell_at(&Point::new(3.0, 3.0)), Cell::Restricted);
        g.mark_rectangle(&rect, Cell::Free);
        assert_eq!(g.cell_at(&Point::new(3.0, 3.0)), Cell::Restricted);
    }

    #[test]
    fn test_clear_occupancy_keeps_restrictions() {
        let mut g = grid_10();
        g.mark_rectangle(&Bounds::new(0.0, 2.0, 0.0, 2.0), Cell::Restricted);
        let ilot = Ilot::new(1, Point::new(6.0, 6.0), SizeTier::Standard, false, 0);
        g.occupy(&ilot);
        assert_eq!(g.cell_at(&Point::new(6.0, 6.0)), Cell::Occupied);
        let before = g.cell_counts();
        assert!(before.occupied > 0);
        g.clear_occupancy();
        let after = g.cell_counts();
        assert_eq!(after.occupied, 0);
        assert_eq!(after.restricted, before.restricted);
        assert!(g.is_available(&Point::new(6.0, 6.0)));
    }

    #[test]
    fn test_rect_availability_checks_corners_and_center() {
        let mut g = grid_10();
        g.mark_circle(&Point::new(5.0, 5.0), 0.3, Cell::Restricted);
        // Corners clear but the center sits on the column
        assert!(!g.is_rect_available(&Bounds::from_center(Point::new(5.0, 5.0), 2.0, 2.0)));
        assert!(g.is_rect_available(&Bounds::from_center(Point::new(2.0, 2.0), 2.0, 2.0)));
        // Hanging off the edge of the grid
        assert!(!g.is_rect_available(&Bounds::from_center(Point::new(0.5, 5.0), 2.0, 2.0)));
    }

    #[test]
    fn test_from_plan_marks_features() {
        let plan = FloorPlan {
            bounds: Bounds::new(0.0, 20.0, 0.0, 10.0),
            walls: vec![Wall::new(Point::new(10.0, 0.0), Point::new(10.0, 10.0), 0.2)],
            restricted_areas: vec![RestrictedArea::new(
                rectangle(2.0, 2.0, 4.0, 4.0),
                RestrictedCategory::Stairs,
            )],
            entrances: vec![Entrance::new(Point::new(18.0, 0.0), 1.0)],
            ..Default::default()
        };
        let g = OccupancyGrid::from_plan(&plan, &GridConfig::default(), &PlacementConfig::default());
        // Inside the stairs and inside its 1.0 clearance ring
        assert!(!g.is_available(&Point::new(3.0, 3.0)));
        assert!(!g.is_available(&Point::new(4.7, 3.0)));
        assert!(g.is_available(&Point::new(5.5, 3.0)));
        // Wall band: 0.1 half thickness + 0.3 buffer
        assert!(!g.is_available(&Point::new(10.3, 5.0)));
        assert!(g.is_available(&Point::new(10.7, 5.0)));
        // Entrance clearance 2.5
        assert!(!g.is_available(&Point::new(18.0, 2.0)));
        assert!(g.is_available(&Point::new(18.0, 3.0)));
    }

    #[test]
    fn test_wall_touching_and_entrance_flags() {
        let plan = FloorPlan {
            bounds: Bounds::new(0.0, 10.0, 0.0, 10.0),
            walls: vec![Wall::new(Point::new(5.0, 0.0), Point::new(5.0, 10.0), 0.2)],
            entrances: vec![Entrance::new(Point::new(1.0, 1.0), 1.0)],
            ..Default::default()
        };
        let placement = PlacementConfig {
            allow_wall_touching: true,
            respect_entrance_clearance: false,
            ..Default::default()
        };
        let g = OccupancyGrid::from_plan(&plan, &GridConfig::default(), &placement);
        assert!(g.is_available(&Point::new(5.3, 5.0)));
        assert!(g.is_available(&Point::new(1.5, 1.5)));
    }

    #[test]
    fn test_free_points_skip_restricted() {
        let mut g = grid_10();
        g.mark_rectangle(&Bounds::new(0.0, 5.0, 0.0, 10.0), Cell::Restricted);
        let pts = g.free_points_in(&Bounds::new(0.0, 10.0, 0.0, 10.0), 1.0);
        assert_eq!(pts.len(), 50);
        assert!(pts.iter().all(|p| p.x > 5.0));
    }
}
