//! Zone selection: which rooms receive ilots, and in what order.
//!
//! Rooms are filtered to usable, available polygons and ranked by packing
//! efficiency: large, square, fully-used rooms first.

use serde::Serialize;

use crate::error::InputWarning;
use crate::geometry::{bounds_of, polygon_centroid, Bounds, Point};
use crate::plan::{Entrance, FloorPlan, ZoneCategory};

/// A room that passed selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedZone {
    /// Index into `FloorPlan::rooms`.
    pub index: usize,
    pub area: f64,
    pub bounds: Bounds,
    pub efficiency: f64,
}

/// Outcome of zone selection.
#[derive(Debug, Clone, Default)]
pub struct ZoneSelection {
    pub zones: Vec<RankedZone>,
    pub warnings: Vec<InputWarning>,
}

impl ZoneSelection {
    /// Sum of selected zone areas.
    pub fn available_area(&self) -> f64 {
        self.zones.iter().map(|z| z.area).sum()
    }
}

/// `compactness / max(1, aspect − 1)` over the room's bounding box.
pub fn zone_efficiency(area: f64, bounds: &Bounds) -> f64 {
    let (w, h) = (bounds.width(), bounds.height());
    let short = w.min(h);
    if short <= 0.0 {
        return 0.0;
    }
    let compactness = area / bounds.area();
    let aspect = w.max(h) / short;
    compactness / (aspect - 1.0).max(1.0)
}

/// Filter and rank the plan's rooms.
///
/// `entrance_clearance` is `None` when entrance clearance is not respected.
pub fn select_zones(
    plan: &FloorPlan,
    min_zone_area: f64,
    entrance_clearance: Option<f64>,
) -> ZoneSelection {
    let mut selection = ZoneSelection::default();

    for (index, zone) in plan.rooms.iter().enumerate() {
        if zone.category != ZoneCategory::Available {
            continue;
        }
        if !zone.is_valid_polygon() {
            selection.warnings.push(InputWarning::DegenerateZone {
                index,
                points: zone.boundaries.len(),
            });
            continue;
        }
        let area = zone.effective_area();
        if area < min_zone_area || area <= 0.0 {
            selection.warnings.push(InputWarning::ZoneTooSmall {
                index,
                area,
                min: min_zone_area,
            });
            continue;
        }
        if let Some(radius) = entrance_clearance {
            let centroid = polygon_centroid(&zone.boundaries);
            if in_entrance_clearance(&centroid, &plan.entrances, radius) {
                selection
                    .warnings
                    .push(InputWarning::ZoneInEntranceClearance { index });
                continue;
            }
        }
        let bounds = bounds_of(&zone.boundaries);
        selection.zones.push(RankedZone {
            index,
            area,
            bounds,
            efficiency: zone_efficiency(area, &bounds),
        });
    }

    // Stable: equal efficiencies keep input order
    selection.zones.sort_by(|a, b| {
        b.efficiency
            .partial_cmp(&a.efficiency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if selection.zones.is_empty() {
        selection.warnings.push(InputWarning::NoAvailableZones);
    }
    for w in &selection.warnings {
        log::warn!("Zone selection: {}", w);
    }
    selection
}

fn in_entrance_clearance(p: &Point, entrances: &[Entrance], radius: f64) -> bool {
    entrances.iter().any(|e| e.position.distance(p) < radius)
}
