//! Layout validation.
//!
//! Pure functions over ilots, corridors and the plan that return validation
//! errors. The engine does not call these itself; they back the tests and
//! the headless harness.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::corridors::{reachable_from, Corridor};
use crate::geometry::{clearance_to_polygon, point_in_polygon};
use crate::ilot::Ilot;
use crate::layout::Layout;
use crate::plan::{FloorPlan, ZoneCategory};

/// Allowed drift of achieved utilization from the profile target before a
/// warning is raised.
pub const UTILIZATION_TOLERANCE: f64 = 15.0;

/// A layout validation error.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Ilots ────────────────────────────────────────────────────────────

/// Check that every ilot has positive dimensions and a consistent area.
pub fn check_ilot_dimensions(ilots: &[Ilot]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in ilots {
        if i.width <= 0.0 || i.height <= 0.0 {
            errors.push(ValidationError {
                category: "ilot_geometry",
                severity: Severity::Error,
                message: format!(
                    "Ilot #{} has non-positive dimensions: {}×{}",
                    i.id, i.width, i.height
                ),
            });
        } else if (i.width * i.height - i.area).abs() > 1e-6 {
            errors.push(ValidationError {
                category: "ilot_geometry",
                severity: Severity::Error,
                message: format!(
                    "Ilot #{} area {:.3} does not match {}×{}",
                    i.id, i.area, i.width, i.height
                ),
            });
        }
    }
    errors
}

/// Check that every pair of ilots is at least `min_spacing` apart.
pub fn check_ilot_spacing(ilots: &[Ilot], min_spacing: f64) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (i, a) in ilots.iter().enumerate() {
        let fa = a.footprint();
        for b in &ilots[i + 1..] {
            let gap = fa.gap(&b.footprint());
            if gap < min_spacing - 1e-6 {
                errors.push(ValidationError {
                    category: "spacing",
                    severity: Severity::Error,
                    message: format!(
                        "Ilots #{} and #{} are {:.3} apart (minimum {})",
                        a.id, b.id, gap, min_spacing
                    ),
                });
            }
        }
    }
    errors
}

/// Check that each ilot center lies inside its available zone.
pub fn check_ilots_in_zones(ilots: &[Ilot], plan: &FloorPlan) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in ilots {
        let inside = plan.rooms.get(i.zone).is_some_and(|z| {
            z.category == ZoneCategory::Available && point_in_polygon(&i.center, &z.boundaries)
        });
        if !inside {
            errors.push(ValidationError {
                category: "containment",
                severity: Severity::Error,
                message: format!(
                    "Ilot #{} at ({:.2}, {:.2}) is outside available zone {}",
                    i.id, i.center.x, i.center.y, i.zone
                ),
            });
        }
    }
    errors
}

/// Check ilot centers against restricted-area and entrance clearances.
pub fn check_ilot_clearances(
    ilots: &[Ilot],
    plan: &FloorPlan,
    config: &LayoutConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let restricted = config.grid.restricted_clearance;
    let entrance = config
        .placement
        .respect_entrance_clearance
        .then_some(config.grid.entrance_clearance);

    for i in ilots {
        for (n, area) in plan.restricted_areas.iter().enumerate() {
            let d = clearance_to_polygon(&i.center, &area.boundaries);
            if d < restricted - 1e-6 {
                errors.push(ValidationError {
                    category: "clearance",
                    severity: Severity::Error,
                    message: format!(
                        "Ilot #{} is {:.2} from restricted area {} (clearance {})",
                        i.id, d, n, restricted
                    ),
                });
            }
        }
        if let Some(radius) = entrance {
            for (n, e) in plan.entrances.iter().enumerate() {
                let d = i.center.distance(&e.position);
                if d < radius - 1e-6 {
                    errors.push(ValidationError {
                        category: "clearance",
                        severity: Severity::Error,
                        message: format!(
                            "Ilot #{} is {:.2} from entrance {} (clearance {})",
                            i.id, d, n, radius
                        ),
                    });
                }
            }
        }
    }
    errors
}

// ── B. Corridors ────────────────────────────────────────────────────────

/// Check that corridors have at least two points, positive width and length.
pub fn check_corridor_geometry(corridors: &[Corridor]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for c in corridors {
        if !c.is_valid() {
            errors.push(ValidationError {
                category: "corridor_geometry",
                severity: Severity::Error,
                message: format!(
                    "Corridor #{} is degenerate: {} points, width {}, length {:.3}",
                    c.id,
                    c.path.len(),
                    c.width,
                    c.length
                ),
            });
        }
    }
    errors
}

/// Check that no corridor cuts through an ilot.
pub fn check_corridor_ilot_overlap(corridors: &[Corridor], ilots: &[Ilot]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for c in corridors {
        for i in ilots {
            if c.overlaps_ilot(i) {
                errors.push(ValidationError {
                    category: "corridor_overlap",
                    severity: Severity::Error,
                    message: format!("Corridor #{} ({:?}) overlaps ilot #{}", c.id, c.kind, i.id),
                });
            }
        }
    }
    errors
}

/// Check corridor ids are unique and referenced ilots exist.
pub fn check_corridor_references(corridors: &[Corridor], ilots: &[Ilot]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let ilot_ids: BTreeSet<u32> = ilots.iter().map(|i| i.id).collect();
    let mut seen = BTreeSet::new();

    for c in corridors {
        if !seen.insert(c.id) {
            errors.push(ValidationError {
                category: "references",
                severity: Severity::Error,
                message: format!("Duplicate corridor id #{}", c.id),
            });
        }
        for id in &c.connected_ilots {
            if !ilot_ids.contains(id) {
                errors.push(ValidationError {
                    category: "references",
                    severity: Severity::Error,
                    message: format!("Corridor #{} references missing ilot #{}", c.id, id),
                });
            }
        }
    }
    errors
}

// ── C. Connectivity ─────────────────────────────────────────────────────

/// Check that every ilot touches at least one corridor.
pub fn check_ilot_connectivity(
    ilots: &[Ilot],
    corridors: &[Corridor],
    tolerance: f64,
) -> Vec<ValidationError> {
    if corridors.is_empty() {
        return Vec::new();
    }
    let isolated: Vec<u32> = ilots
        .iter()
        .filter(|i| {
            let fp = i.footprint();
            !corridors.iter().any(|c| c.touches(&fp, tolerance))
        })
        .map(|i| i.id)
        .collect();

    if isolated.is_empty() {
        return Vec::new();
    }
    vec![ValidationError {
        category: "connectivity",
        severity: Severity::Warning,
        message: format!(
            "{} of {} ilots touch no corridor (e.g. ilot #{})",
            isolated.len(),
            ilots.len(),
            isolated[0]
        ),
    }]
}

/// Check that all corridors form one network (BFS over touching footprints).
pub fn check_network_connectivity(corridors: &[Corridor], tolerance: f64) -> Vec<ValidationError> {
    if corridors.len() <= 1 {
        return Vec::new();
    }
    let reached = reachable_from(corridors, 0, tolerance);
    let unreached: Vec<u32> = corridors
        .iter()
        .zip(&reached)
        .filter(|(_, r)| !**r)
        .map(|(c, _)| c.id)
        .collect();

    if unreached.is_empty() {
        return Vec::new();
    }
    vec![ValidationError {
        category: "connectivity",
        severity: Severity::Warning,
        message: format!(
            "{} of {} corridors are disconnected from corridor #{} (e.g. #{})",
            unreached.len(),
            corridors.len(),
            corridors[0].id,
            unreached[0]
        ),
    }]
}

// ── D. Utilization ──────────────────────────────────────────────────────

/// Check achieved utilization: above 100% is an error, far from target a warning.
pub fn check_utilization(
    ilots: &[Ilot],
    available_area: f64,
    target_pct: f64,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if available_area <= 0.0 {
        return errors;
    }
    let pct = ilots.iter().map(|i| i.area).sum::<f64>() / available_area * 100.0;
    if pct > 100.0 + 1e-9 {
        errors.push(ValidationError {
            category: "utilization",
            severity: Severity::Error,
            message: format!("Utilization {:.1}% exceeds 100%", pct),
        });
    } else if (pct - target_pct).abs() > UTILIZATION_TOLERANCE {
        errors.push(ValidationError {
            category: "utilization",
            severity: Severity::Warning,
            message: format!(
                "Utilization {:.1}% is more than {} points from target {}%",
                pct, UTILIZATION_TOLERANCE, target_pct
            ),
        });
    }
    errors
}

// ── Master validation ───────────────────────────────────────────────────

/// Run all layout validations and return combined results.
pub fn validate_layout(
    layout: &Layout,
    plan: &FloorPlan,
    config: &LayoutConfig,
) -> Vec<ValidationError> {
    let tolerance = config.corridors.connection_tolerance;
    let mut all = Vec::new();
    all.extend(check_ilot_dimensions(&layout.ilots));
    all.extend(check_ilot_spacing(
        &layout.ilots,
        config.placement.min_ilot_spacing,
    ));
    all.extend(check_ilots_in_zones(&layout.ilots, plan));
    all.extend(check_ilot_clearances(&layout.ilots, plan, config));
    all.extend(check_corridor_geometry(&layout.corridors));
    all.extend(check_corridor_ilot_overlap(&layout.corridors, &layout.ilots));
    all.extend(check_corridor_references(&layout.corridors, &layout.ilots));
    all.extend(check_ilot_connectivity(
        &layout.ilots,
        &layout.corridors,
        tolerance,
    ));
    all.extend(check_network_connectivity(&layout.corridors, 0.0));
    all.extend(check_utilization(
        &layout.ilots,
        layout.stats.available_area,
        layout.stats.target_pct,
    ));
    all
}

/// True if none of the results is an error.
pub fn is_clean(results: &[ValidationError]) -> bool {
    results.iter().all(|e| e.severity != Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::SizeTier;
    use crate::corridors::CorridorKind;
    use crate::geometry::{rectangle, Point};
    use crate::plan::{Entrance, RestrictedArea, RestrictedCategory, Zone};

    fn make_ilot(id: u32, x: f64, y: f64) -> Ilot {
        Ilot::new(id, Point::new(x, y), SizeTier::Micro, false, 0)
    }

    fn make_corridor(id: u32, a: (f64, f64), b: (f64, f64), ilots: &[u32]) -> Corridor {
        Corridor::new(
            id,
            CorridorKind::RowPair,
            vec![Point::new(a.0, a.1), Point::new(b.0, b.1)],
            1.0,
            ilots.iter().copied().collect(),
        )
    }

    fn make_plan() -> FloorPlan {
        FloorPlan {
            rooms: vec![Zone::new(
                rectangle(0.0, 0.0, 10.0, 10.0),
                ZoneCategory::Available,
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_ilots_no_errors() {
        let ilots = vec![make_ilot(1, 2.0, 2.0), make_ilot(2, 5.0, 2.0)];
        assert!(check_ilot_dimensions(&ilots).is_empty());
        assert!(check_ilot_spacing(&ilots, 1.0).is_empty());
        assert!(check_ilots_in_zones(&ilots, &make_plan()).is_empty());
    }

    #[test]
    fn test_area_mismatch() {
        let mut ilot = make_ilot(1, 2.0, 2.0);
        ilot.area = 3.0;
        let errs = check_ilot_dimensions(&[ilot]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("does not match"));
    }

    #[test]
    fn test_spacing_violation() {
        // 1×1 ilots, centers 1.5 apart: 0.5 gap
        let ilots = vec![make_ilot(1, 2.0, 2.0), make_ilot(2, 3.5, 2.0)];
        let errs = check_ilot_spacing(&ilots, 1.0);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].category, "spacing");
    }

    #[test]
    fn test_ilot_outside_zone() {
        let errs = check_ilots_in_zones(&[make_ilot(1, 12.0, 2.0)], &make_plan());
        assert_eq!(errs.len(), 1);
        // Unknown zone index
        let mut ilot = make_ilot(2, 2.0, 2.0);
        ilot.zone = 4;
        assert_eq!(check_ilots_in_zones(&[ilot], &make_plan()).len(), 1);
    }

    #[test]
    fn test_clearances() {
        let mut plan = make_plan();
        plan.restricted_areas.push(RestrictedArea::new(
            rectangle(4.0, 4.0, 6.0, 6.0),
            RestrictedCategory::Elevator,
        ));
        plan.entrances.push(Entrance::new(Point::new(0.0, 0.0), 1.0));
        let config = LayoutConfig::default();
        let ilots = vec![make_ilot(1, 6.5, 5.0), make_ilot(2, 1.0, 1.0), make_ilot(3, 8.5, 8.5)];
        let errs = check_ilot_clearances(&ilots, &plan, &config);
        assert_eq!(errs.len(), 2);
        assert!(errs[0].message.contains("restricted area 0"));
        assert!(errs[1].message.contains("entrance 0"));

        let mut relaxed = config.clone();
        relaxed.placement.respect_entrance_clearance = false;
        assert_eq!(check_ilot_clearances(&ilots, &plan, &relaxed).len(), 1);
    }

    #[test]
    fn test_degenerate_corridor() {
        let c = make_corridor(1, (1.0, 1.0), (1.0, 1.0), &[]);
        assert_eq!(check_corridor_geometry(&[c]).len(), 1);
    }

    #[test]
    fn test_corridor_through_ilot() {
        let ilots = vec![make_ilot(1, 5.0, 5.0)];
        let c = make_corridor(1, (0.0, 5.0), (10.0, 5.0), &[]);
        let errs = check_corridor_ilot_overlap(&[c], &ilots);
        assert_eq!(errs.len(), 1);
        // Running along an edge is fine
        let edge = make_corridor(2, (0.0, 6.0), (10.0, 6.0), &[]);
        assert!(check_corridor_ilot_overlap(&[edge], &ilots).is_empty());
    }

    #[test]
    fn test_missing_and_duplicate_references() {
        let ilots = vec![make_ilot(1, 2.0, 2.0)];
        let corridors = vec![
            make_corridor(1, (0.0, 0.0), (5.0, 0.0), &[1, 9]),
            make_corridor(1, (0.0, 5.0), (5.0, 5.0), &[]),
        ];
        let errs = check_corridor_references(&corridors, &ilots);
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn test_isolated_ilot_is_warning() {
        let ilots = vec![make_ilot(1, 2.0, 1.0), make_ilot(2, 8.0, 8.0)];
        let corridors = vec![make_corridor(1, (0.0, 2.0), (5.0, 2.0), &[1])];
        let errs = check_ilot_connectivity(&ilots, &corridors, 0.5);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].severity, Severity::Warning);
        assert!(errs[0].message.contains("#2"));
    }

    #[test]
    fn test_network_connectivity() {
        let joined = vec![
            make_corridor(1, (0.0, 0.0), (5.0, 0.0), &[]),
            make_corridor(2, (5.0, -2.0), (5.0, 4.0), &[]),
        ];
        assert!(check_network_connectivity(&joined, 0.0).is_empty());

        let split = vec![
            make_corridor(1, (0.0, 0.0), (5.0, 0.0), &[]),
            make_corridor(2, (0.0, 9.0), (5.0, 9.0), &[]),
        ];
        let errs = check_network_connectivity(&split, 0.0);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("#2"));
    }

    #[test]
    fn test_utilization_bounds() {
        let ilots: Vec<Ilot> = (0..5).map(|n| make_ilot(n, n as f64 * 2.0, 0.0)).collect();
        // 5 m² of 20: 25%
        assert!(check_utilization(&ilots, 20.0, 25.0).is_empty());
        let far = check_utilization(&ilots, 20.0, 45.0);
        assert_eq!(far[0].severity, Severity::Warning);
        let over = check_utilization(&ilots, 4.0, 25.0);
        assert_eq!(over[0].severity, Severity::Error);
        assert!(!is_clean(&over));
    }
}
