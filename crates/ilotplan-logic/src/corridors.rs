//! Corridor synthesis over a finished ilot layout.
//!
//! 1. Group ilots into rows
//! 2. Bridge facing row pairs with straight corridors
//! 3. Lay one horizontal main spine through the layout, on the reserved
//!    [`SpineBand`] when placement kept it free
//! 4. Add access spurs from ilots to the spine (per [`SpurPolicy`])
//! 5. Drop near-duplicates, degenerate corridors and anything the spine
//!    cannot reach, then assign ids
//!
//! Candidates that would cut through an ilot are skipped, never repaired.
//! Ilots are read-only here.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::{LayoutConfig, SpurPolicy};
use crate::geometry::{bounds_of, polyline_length, Bounds, Point, EPSILON};
use crate::ilot::{IdSource, Ilot};
use crate::plan::{FloorPlan, ZoneCategory};

/// Cap on candidate center lines scanned when siting the spine band.
const MAX_BAND_CANDIDATES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorKind {
    /// Between two facing rows of ilots.
    RowPair,
    /// The horizontal circulation spine.
    MainSpine,
    /// From a single ilot to the spine.
    AccessSpur,
}

/// A walkable polyline with a uniform width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub id: u32,
    pub kind: CorridorKind,
    pub path: Vec<Point>,
    pub width: f64,
    pub connected_ilots: BTreeSet<u32>,
    pub length: f64,
}

impl Corridor {
    pub fn new(
        id: u32,
        kind: CorridorKind,
        path: Vec<Point>,
        width: f64,
        connected_ilots: BTreeSet<u32>,
    ) -> Self {
        let length = polyline_length(&path);
        Self {
            id,
            kind,
            path,
            width,
            connected_ilots,
            length,
        }
    }

    /// One rectangle per path segment, buffered by half the width.
    pub fn footprint(&self) -> Vec<Bounds> {
        self.path
            .windows(2)
            .map(|s| segment_footprint(&s[0], &s[1], self.width))
            .collect()
    }

    /// At least two points, positive width and positive length.
    pub fn is_valid(&self) -> bool {
        self.path.len() >= 2 && self.width > 0.0 && self.length > EPSILON
    }

    /// True if `rect` grown by `tolerance` overlaps any segment rectangle.
    pub fn touches(&self, rect: &Bounds, tolerance: f64) -> bool {
        let grown = rect.expand(tolerance);
        self.footprint().iter().any(|f| f.overlaps(&grown))
    }

    /// True if any part of the corridor cuts into an ilot.
    pub fn overlaps_ilot(&self, ilot: &Ilot) -> bool {
        let fp = ilot.footprint();
        self.footprint().iter().any(|f| f.overlaps(&fp))
    }

    /// Same points within `tolerance`, in either direction.
    pub fn is_duplicate_of(&self, other: &Corridor, tolerance: f64) -> bool {
        paths_match(&self.path, &other.path, tolerance)
    }
}

/// Rectangle covered by a segment of the given width. Axis-aligned segments
/// are buffered perpendicular to their direction only; anything else is
/// buffered on both axes.
pub fn segment_footprint(a: &Point, b: &Point, width: f64) -> Bounds {
    let half = width / 2.0;
    let base = Bounds::new(a.x.min(b.x), a.x.max(b.x), a.y.min(b.y), a.y.max(b.y));
    if (a.y - b.y).abs() < EPSILON {
        base.expand_xy(0.0, half)
    } else if (a.x - b.x).abs() < EPSILON {
        base.expand_xy(half, 0.0)
    } else {
        base.expand(half)
    }
}

fn paths_match(a: &[Point], b: &[Point], tolerance: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let close = |p: &Point, q: &Point| p.distance(q) <= tolerance;
    a.iter().zip(b).all(|(p, q)| close(p, q)) || a.iter().zip(b.iter().rev()).all(|(p, q)| close(p, q))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAxis {
    Horizontal,
    Vertical,
}

/// Ilots grouped by proximity of their centers.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Indices into the ilot slice, in input order.
    pub members: Vec<usize>,
    /// Mean member center.
    pub center: Point,
    pub axis: RowAxis,
}

/// Greedy grouping. Each row is seeded by the first ungrouped ilot and runs
/// towards the seed's nearest ungrouped neighbour: vertical when that
/// neighbour is offset more in y than in x, horizontal otherwise (and for a
/// lone seed). The row collects every ungrouped ilot whose center lies
/// within `tolerance` of the seed's across the row axis.
pub fn group_into_rows(ilots: &[Ilot], tolerance: f64) -> Vec<Row> {
    let mut grouped = vec![false; ilots.len()];
    let mut rows = Vec::new();

    for seed in 0..ilots.len() {
        if grouped[seed] {
            continue;
        }
        let origin = ilots[seed].center;
        let axis = match nearest_ungrouped(ilots, &grouped, seed) {
            Some(n) if (ilots[n].center.x - origin.x).abs() < (ilots[n].center.y - origin.y).abs() => {
                RowAxis::Vertical
            }
            _ => RowAxis::Horizontal,
        };
        let mut members = Vec::new();
        for (i, ilot) in ilots.iter().enumerate().skip(seed) {
            if grouped[i] {
                continue;
            }
            let offset = match axis {
                RowAxis::Horizontal => (ilot.center.y - origin.y).abs(),
                RowAxis::Vertical => (ilot.center.x - origin.x).abs(),
            };
            if i == seed || offset < tolerance {
                grouped[i] = true;
                members.push(i);
            }
        }
        let n = members.len() as f64;
        let (sx, sy) = members.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            (sx + ilots[i].center.x, sy + ilots[i].center.y)
        });
        rows.push(Row {
            members,
            center: Point::new(sx / n, sy / n),
            axis,
        });
    }
    rows
}

fn nearest_ungrouped(ilots: &[Ilot], grouped: &[bool], seed: usize) -> Option<usize> {
    let origin = ilots[seed].center;
    let mut best: Option<(usize, f64)> = None;
    for (i, ilot) in ilots.iter().enumerate() {
        if i == seed || grouped[i] {
            continue;
        }
        let d = ilot.center.distance(&origin);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Horizontal band kept for the main spine, spanning the plan's width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpineBand {
    /// Center line.
    pub y: f64,
    pub width: f64,
    pub min_x: f64,
    pub max_x: f64,
}

impl SpineBand {
    /// Band of width `max(corridor_width, min_spine_width)` through the
    /// available rooms, on the unobstructed center line closest to their
    /// vertical middle (lower line on ties). Restricted areas grown by their
    /// clearance and restricted rooms obstruct; if every line is obstructed
    /// the middle is used anyway. `None` without available rooms.
    pub fn for_plan(plan: &FloorPlan, config: &LayoutConfig) -> Option<Self> {
        let width = config
            .placement
            .corridor_width
            .max(config.corridors.min_spine_width);
        let corners: Vec<Point> = plan
            .rooms
            .iter()
            .filter(|r| r.category == ZoneCategory::Available && r.boundaries.len() >= 3)
            .flat_map(|r| r.boundaries.iter().copied())
            .collect();
        if corners.is_empty() {
            return None;
        }
        let extent = bounds_of(&corners);
        let span = plan.effective_bounds().union(&extent);
        let band_at = |y: f64| Self {
            y,
            width,
            min_x: span.min_x,
            max_x: span.max_x,
        };

        let clearance = config.grid.restricted_clearance;
        let obstacles: Vec<Bounds> = plan
            .restricted_areas
            .iter()
            .filter(|a| a.boundaries.len() >= 3)
            .map(|a| bounds_of(&a.boundaries).expand(clearance))
            .chain(
                plan.rooms
                    .iter()
                    .filter(|r| r.category == ZoneCategory::Restricted && r.boundaries.len() >= 3)
                    .map(|r| bounds_of(&r.boundaries)),
            )
            .collect();
        let clear = |y: f64| {
            let band = band_at(y).bounds();
            !obstacles.iter().any(|o| o.overlaps(&band))
        };

        let middle = extent.center().y;
        if clear(middle) {
            return Some(band_at(middle));
        }
        let half = width / 2.0;
        let (lo, hi) = (extent.min_y + half, extent.max_y - half);
        if hi <= lo || !(hi - lo).is_finite() {
            return Some(band_at(middle));
        }
        let step = config
            .grid
            .resolution
            .max((hi - lo) / MAX_BAND_CANDIDATES as f64);
        let steps = ((hi - lo) / step).floor() as usize;

        let mut best: Option<f64> = None;
        for k in 0..=steps {
            let y = lo + k as f64 * step;
            if clear(y) && best.map_or(true, |b| (y - middle).abs() < (b - middle).abs()) {
                best = Some(y);
            }
        }
        Some(band_at(best.unwrap_or(middle)))
    }

    pub fn bounds(&self) -> Bounds {
        let half = self.width / 2.0;
        Bounds::new(self.min_x, self.max_x, self.y - half, self.y + half)
    }

    /// Strip of `width` from a footprint's edge facing the band to the
    /// band's near edge, centered on the footprint. `None` when the
    /// footprint touches or crosses the band.
    pub fn access_lane(&self, footprint: &Bounds, width: f64) -> Option<Bounds> {
        let band = self.bounds();
        let x = footprint.center().x;
        let half = width / 2.0;
        if band.min_y - footprint.max_y > EPSILON {
            Some(Bounds::new(x - half, x + half, footprint.max_y, band.min_y))
        } else if footprint.min_y - band.max_y > EPSILON {
            Some(Bounds::new(x - half, x + half, band.max_y, footprint.min_y))
        } else {
            None
        }
    }
}

/// Output of corridor synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorridorNetwork {
    pub corridors: Vec<Corridor>,
    /// Candidates dropped because they cut through an ilot or had no room.
    pub skipped: usize,
}

impl CorridorNetwork {
    pub fn total_length(&self) -> f64 {
        self.corridors.iter().map(|c| c.length).sum()
    }

    pub fn count(&self, kind: CorridorKind) -> usize {
        self.corridors.iter().filter(|c| c.kind == kind).count()
    }

    pub fn spine(&self) -> Option<&Corridor> {
        self.corridors.iter().find(|c| c.kind == CorridorKind::MainSpine)
    }

    /// Every ilot id referenced by some corridor.
    pub fn connected_ilots(&self) -> BTreeSet<u32> {
        self.corridors
            .iter()
            .flat_map(|c| c.connected_ilots.iter().copied())
            .collect()
    }
}

/// Corridors reachable from `start` through overlapping (or touching within
/// `tolerance`) footprints. Returns one flag per corridor.
pub fn reachable_from(corridors: &[Corridor], start: usize, tolerance: f64) -> Vec<bool> {
    let mut seen = vec![false; corridors.len()];
    if start >= corridors.len() {
        return seen;
    }
    let footprints: Vec<Vec<Bounds>> = corridors.iter().map(|c| c.footprint()).collect();
    let mut queue = VecDeque::new();
    seen[start] = true;
    queue.push_back(start);
    while let Some(current) = queue.pop_front() {
        for next in 0..corridors.len() {
            if seen[next] {
                continue;
            }
            let linked = footprints[current].iter().any(|a| {
                let a = a.expand(tolerance);
                footprints[next].iter().any(|b| a.overlaps(b))
            });
            if linked {
                seen[next] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Build the corridor network for a set of placed ilots.
pub fn synthesize_corridors(
    ilots: &[Ilot],
    plan: &FloorPlan,
    config: &LayoutConfig,
    ids: &mut dyn IdSource,
) -> CorridorNetwork {
    let cfg = &config.corridors;
    let width = config.placement.corridor_width;
    let mut candidates: Vec<Corridor> = Vec::new();
    let mut skipped = 0;

    if ilots.is_empty() {
        return CorridorNetwork::default();
    }

    // ── Row pairs ──
    let rows = group_into_rows(ilots, cfg.row_tolerance);
    for (i, a) in rows.iter().enumerate() {
        for b in &rows[i + 1..] {
            let d = a.center.distance(&b.center);
            if d < cfg.facing_min || d > cfg.facing_max {
                continue;
            }
            match row_pair_corridor(ilots, a, b, width, cfg.insert_midpoints) {
                Some(c) if !cuts_any_ilot(&c, ilots) => candidates.push(c),
                Some(c) => {
                    log::debug!(
                        "Skipping row-pair corridor {:?}: crosses an ilot",
                        c.connected_ilots
                    );
                    skipped += 1;
                }
                None => {
                    log::debug!("Skipping row pair at {:.2}: closest ilots touch", d);
                    skipped += 1;
                }
            }
        }
    }

    // ── Main spine ──
    let spine_width = width.max(cfg.min_spine_width);
    let band = if cfg.reserve_spine {
        SpineBand::for_plan(plan, config).filter(|b| {
            let area = b.bounds();
            !ilots.iter().any(|i| i.footprint().overlaps(&area))
        })
    } else {
        None
    };
    let spine = main_spine(ilots, plan, spine_width, band.as_ref());
    match &spine {
        Some(s) => candidates.push(s.clone()),
        None => {
            log::debug!("No free band for a {:.2} wide spine", spine_width);
            skipped += 1;
        }
    }

    // ── Access spurs ──
    if let Some(spine) = &spine {
        let connected = connected_to_spine(ilots, &candidates, cfg.connection_tolerance);
        for (i, ilot) in ilots.iter().enumerate() {
            let wants_spur = match cfg.spur_policy {
                SpurPolicy::Never => false,
                SpurPolicy::Always => !spine.touches(&ilot.footprint(), cfg.connection_tolerance),
                SpurPolicy::WhenDisconnected => !connected[i],
            };
            if !wants_spur {
                continue;
            }
            match access_spur(ilot, spine, width) {
                Some(c) if !cuts_any_ilot(&c, ilots) => candidates.push(c),
                _ => {
                    log::debug!("Skipping access spur for ilot {}", ilot.id);
                    skipped += 1;
                }
            }
        }
    }

    // ── Cleanup ──
    let mut corridors: Vec<Corridor> = Vec::new();
    for c in candidates {
        if !c.is_valid() {
            log::debug!("Dropping degenerate {:?} corridor", c.kind);
            skipped += 1;
            continue;
        }
        if let Some(kept) = corridors
            .iter_mut()
            .find(|k| k.is_duplicate_of(&c, cfg.duplicate_tolerance))
        {
            kept.connected_ilots.extend(c.connected_ilots);
            continue;
        }
        corridors.push(c);
    }
    if let Some(s) = corridors.iter().position(|c| c.kind == CorridorKind::MainSpine) {
        let reach = reachable_from(&corridors, s, 0.0);
        let before = corridors.len();
        corridors = corridors
            .into_iter()
            .zip(reach)
            .filter_map(|(c, r)| r.then_some(c))
            .collect();
        if corridors.len() < before {
            log::debug!(
                "Dropping {} corridors the spine cannot reach",
                before - corridors.len()
            );
            skipped += before - corridors.len();
        }
    }
    for c in &mut corridors {
        c.id = ids.next_id();
    }

    let network = CorridorNetwork { corridors, skipped };
    log::info!(
        "Corridors: {} row-pair, {} spine, {} spur, {:.1} total length ({} skipped)",
        network.count(CorridorKind::RowPair),
        network.count(CorridorKind::MainSpine),
        network.count(CorridorKind::AccessSpur),
        network.total_length(),
        network.skipped
    );
    network
}

fn cuts_any_ilot(corridor: &Corridor, ilots: &[Ilot]) -> bool {
    ilots.iter().any(|i| corridor.overlaps_ilot(i))
}

/// Straight corridor between the closest ilot pair of two rows.
fn row_pair_corridor(
    ilots: &[Ilot],
    a: &Row,
    b: &Row,
    width: f64,
    insert_midpoint: bool,
) -> Option<Corridor> {
    let mut best: Option<(usize, usize, f64)> = None;
    for &i in &a.members {
        for &j in &b.members {
            let d = ilots[i].center.distance(&ilots[j].center);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((i, j, d));
            }
        }
    }
    let (i, j, _) = best?;
    let (start, end) = nearest_edge_points(&ilots[i].footprint(), &ilots[j].footprint())?;
    let mut path = vec![start, end];
    if insert_midpoint {
        path.insert(1, start.lerp(&end, 0.5));
    }
    let connected = [ilots[i].id, ilots[j].id].into_iter().collect();
    Some(Corridor::new(0, CorridorKind::RowPair, path, width, connected))
}

/// Facing edge points of two boxes. When their projections overlap on an
/// axis the segment is orthogonal, through the middle of the overlap.
/// `None` if the boxes touch or overlap.
fn nearest_edge_points(a: &Bounds, b: &Bounds) -> Option<(Point, Point)> {
    let overlap_x = (a.min_x.max(b.min_x), a.max_x.min(b.max_x));
    let overlap_y = (a.min_y.max(b.min_y), a.max_y.min(b.max_y));

    let (start, end) = if overlap_x.1 - overlap_x.0 > EPSILON {
        let x = (overlap_x.0 + overlap_x.1) / 2.0;
        if a.max_y <= b.min_y {
            (Point::new(x, a.max_y), Point::new(x, b.min_y))
        } else {
            (Point::new(x, a.min_y), Point::new(x, b.max_y))
        }
    } else if overlap_y.1 - overlap_y.0 > EPSILON {
        let y = (overlap_y.0 + overlap_y.1) / 2.0;
        if a.max_x <= b.min_x {
            (Point::new(a.max_x, y), Point::new(b.min_x, y))
        } else {
            (Point::new(a.min_x, y), Point::new(b.max_x, y))
        }
    } else {
        (a.clamp(&b.center()), b.clamp(&a.center()))
    };

    (start.distance(&end) > EPSILON).then_some((start, end))
}

/// Horizontal spine across the ilots' bounding box. Runs along the reserved
/// band when there is one, otherwise on the free band of height `width`
/// closest to the box center.
fn main_spine(
    ilots: &[Ilot],
    plan: &FloorPlan,
    width: f64,
    band: Option<&SpineBand>,
) -> Option<Corridor> {
    let footprints: Vec<Bounds> = ilots.iter().map(|i| i.footprint()).collect();
    let corners: Vec<Point> = footprints
        .iter()
        .flat_map(|f| [Point::new(f.min_x, f.min_y), Point::new(f.max_x, f.max_y)])
        .collect();
    let bbox = bounds_of(&corners);
    let y = match band {
        Some(b) => b.y,
        None => {
            let domain = plan.effective_bounds().union(&bbox);
            free_band(&footprints, domain.min_y, domain.max_y, width, bbox.center().y)?
        }
    };

    let path = vec![Point::new(bbox.min_x, y), Point::new(bbox.max_x, y)];
    let connected = ilots.iter().map(|i| i.id).collect();
    Some(Corridor::new(0, CorridorKind::MainSpine, path, width, connected))
}

/// Center line of the free horizontal band of height `width` in
/// `[lo, hi]` nearest `target`. Ties go to the lower band.
fn free_band(footprints: &[Bounds], lo: f64, hi: f64, width: f64, target: f64) -> Option<f64> {
    let mut spans: Vec<(f64, f64)> = footprints.iter().map(|f| (f.min_y, f.max_y)).collect();
    spans.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut gaps = Vec::new();
    let mut cursor = lo;
    for (start, end) in spans {
        if start > cursor {
            gaps.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if hi > cursor {
        gaps.push((cursor, hi));
    }

    let half = width / 2.0;
    let mut best: Option<f64> = None;
    for (g0, g1) in gaps {
        if g1 - g0 < width - EPSILON {
            continue;
        }
        let y = target.clamp(g0 + half, (g1 - half).max(g0 + half));
        if best.map_or(true, |b| (y - target).abs() < (b - target).abs()) {
            best = Some(y);
        }
    }
    best
}

/// For each ilot, whether it touches a corridor that reaches the spine.
fn connected_to_spine(ilots: &[Ilot], corridors: &[Corridor], tolerance: f64) -> Vec<bool> {
    let reach = corridors
        .iter()
        .position(|c| c.kind == CorridorKind::MainSpine)
        .map(|s| reachable_from(corridors, s, 0.0))
        .unwrap_or_else(|| vec![true; corridors.len()]);
    ilots
        .iter()
        .map(|ilot| {
            let fp = ilot.footprint();
            corridors
                .iter()
                .zip(&reach)
                .any(|(c, &r)| r && c.touches(&fp, tolerance))
        })
        .collect()
}

/// Vertical segment from the ilot's edge facing the spine to the spine's
/// center line, so the two footprints overlap.
fn access_spur(ilot: &Ilot, spine: &Corridor, width: f64) -> Option<Corridor> {
    let (first, last) = (spine.path.first()?, spine.path.last()?);
    let spine_y = first.y;
    let x = ilot.center.x.clamp(first.x.min(last.x), first.x.max(last.x));
    let fp = ilot.footprint();

    let (start, end) = if ilot.center.y < spine_y {
        (Point::new(x, fp.max_y), Point::new(x, spine_y))
    } else {
        (Point::new(x, fp.min_y), Point::new(x, spine_y))
    };
    if (end.y - start.y).abs() <= EPSILON {
        return None;
    }
    let connected = std::iter::once(ilot.id).collect();
    Some(Corridor::new(
        0,
        CorridorKind::AccessSpur,
        vec![start, end],
        width,
        connected,
    ))
}
