//! Floor plan input types.
//!
//! These come from the CAD-parsing collaborator and are read-only for the
//! whole run. All coordinates share one linear unit and a common origin.

use serde::{Deserialize, Serialize};

use crate::geometry::{bounds_of, polygon_area, Bounds, Point};

/// Usage category of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneCategory {
    #[default]
    Available,
    Restricted,
    Entrance,
}

/// A room polygon. Only `Available` rooms receive ilots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub boundaries: Vec<Point>,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub category: ZoneCategory,
}

impl Zone {
    /// Build a zone and compute its area from the boundary.
    pub fn new(boundaries: Vec<Point>, category: ZoneCategory) -> Self {
        let area = polygon_area(&boundaries);
        Self {
            boundaries,
            area,
            category,
        }
    }

    /// The declared area, or the polygon area when none was supplied.
    pub fn effective_area(&self) -> f64 {
        if self.area > 0.0 {
            self.area
        } else {
            polygon_area(&self.boundaries)
        }
    }

    pub fn is_valid_polygon(&self) -> bool {
        self.boundaries.len() >= 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictedCategory {
    Stairs,
    Elevator,
    Utility,
    Mechanical,
}

/// A no-placement region (stairwell, lift shaft, plant room...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictedArea {
    pub boundaries: Vec<Point>,
    pub category: RestrictedCategory,
    #[serde(default)]
    pub area: f64,
}

impl RestrictedArea {
    pub fn new(boundaries: Vec<Point>, category: RestrictedCategory) -> Self {
        let area = polygon_area(&boundaries);
        Self {
            boundaries,
            category,
            area,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallCategory {
    Exterior,
    #[default]
    Interior,
    Partition,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub start: Point,
    pub end: Point,
    #[serde(default = "default_wall_thickness")]
    pub thickness: f64,
    #[serde(default)]
    pub category: WallCategory,
}

fn default_wall_thickness() -> f64 {
    0.2
}

impl Wall {
    pub fn new(start: Point, end: Point, thickness: f64) -> Self {
        Self {
            start,
            end,
            thickness,
            category: WallCategory::Interior,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntranceCategory {
    #[default]
    Main,
    Secondary,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entrance {
    pub position: Point,
    #[serde(default = "default_entrance_width")]
    pub width: f64,
    #[serde(default)]
    pub category: EntranceCategory,
}

fn default_entrance_width() -> f64 {
    1.0
}

impl Entrance {
    pub fn new(position: Point, width: f64) -> Self {
        Self {
            position,
            width,
            category: EntranceCategory::Main,
        }
    }
}

/// Parsed floor plan handed to the layout engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    #[serde(default)]
    pub bounds: Bounds,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub rooms: Vec<Zone>,
    #[serde(default)]
    pub restricted_areas: Vec<RestrictedArea>,
    #[serde(default)]
    pub entrances: Vec<Entrance>,
}

impl FloorPlan {
    /// Parse a plan from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Declared bounds, or the extent of all geometry when the declared box
    /// is empty.
    pub fn effective_bounds(&self) -> Bounds {
        if self.bounds.area() > 0.0 {
            return self.bounds;
        }
        let mut points: Vec<Point> = Vec::new();
        for room in &self.rooms {
            points.extend_from_slice(&room.boundaries);
        }
        for area in &self.restricted_areas {
            points.extend_from_slice(&area.boundaries);
        }
        for wall in &self.walls {
            points.push(wall.start);
            points.push(wall.end);
        }
        for e in &self.entrances {
            points.push(e.position);
        }
        bounds_of(&points)
    }

    pub fn available_rooms(&self) -> impl Iterator<Item = (usize, &Zone)> {
        self.rooms
            .iter()
            .enumerate()
            .filter(|(_, z)| z.category == ZoneCategory::Available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rectangle;

    #[test]
    fn test_zone_area_computed() {
        let zone = Zone::new(rectangle(0.0, 0.0, 4.0, 5.0), ZoneCategory::Available);
        assert!((zone.area - 20.0).abs() < 1e-12);
        assert!(zone.is_valid_polygon());
    }

    #[test]
    fn test_effective_bounds_from_geometry() {
        let plan = FloorPlan {
            rooms: vec![Zone::new(
                rectangle(1.0, 2.0, 11.0, 7.0),
                ZoneCategory::Available,
            )],
            entrances: vec![Entrance::new(Point::new(0.0, 4.0), 1.0)],
            ..Default::default()
        };
        assert_eq!(plan.effective_bounds(), Bounds::new(0.0, 11.0, 2.0, 7.0));
    }

    #[test]
    fn test_plan_from_json_with_defaults() {
        let json = r#"{
            "rooms": [
                {"boundaries": [{"x":0,"y":0},{"x":5,"y":0},{"x":5,"y":4},{"x":0,"y":4}]}
            ],
            "walls": [{"start":{"x":0,"y":0},"end":{"x":5,"y":0}}],
            "entrances": [{"position":{"x":2.5,"y":0}}]
        }"#;
        let plan = FloorPlan::from_json(json).unwrap();
        assert_eq!(plan.rooms[0].category, ZoneCategory::Available);
        assert!((plan.rooms[0].effective_area() - 20.0).abs() < 1e-12);
        assert!((plan.walls[0].thickness - 0.2).abs() < 1e-12);
        assert_eq!(plan.entrances[0].category, EntranceCategory::Main);
    }

    #[test]
    fn test_plan_from_bad_json_is_parse_error() {
        assert!(matches!(
            FloorPlan::from_json("{ not json"),
            Err(crate::LayoutError::Parse(_))
        ));
    }
}
