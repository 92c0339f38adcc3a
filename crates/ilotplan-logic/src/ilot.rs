//! Ilots (placed rectangular fixtures) and id generation.

use serde::{Deserialize, Serialize};

use crate::catalogue::SizeTier;
use crate::geometry::{Bounds, Point};

/// Which placement stage produced an ilot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStage {
    Lattice,
    GapFill,
    Sampled,
    Fill,
}

/// A placed fixture.
///
/// `width` and `height` are the axis-aligned footprint after rotation, so
/// a 90° ilot has its tier dimensions swapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ilot {
    pub id: u32,
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub tier: SizeTier,
    /// Degrees, 0 or 90.
    pub rotation: f64,
    /// Set once the layout is finalized.
    pub placed: bool,
    /// Index of the containing room in `FloorPlan::rooms`.
    pub zone: usize,
    pub stage: PlacementStage,
}

impl Ilot {
    pub fn new(id: u32, center: Point, tier: SizeTier, rotated: bool, zone: usize) -> Self {
        let (w, h) = tier.dimensions();
        let (width, height) = if rotated { (h, w) } else { (w, h) };
        Self {
            id,
            center,
            width,
            height,
            area: tier.area(),
            tier,
            rotation: if rotated { 90.0 } else { 0.0 },
            placed: false,
            zone,
            stage: PlacementStage::Lattice,
        }
    }

    pub fn with_stage(mut self, stage: PlacementStage) -> Self {
        self.stage = stage;
        self
    }

    /// Axis-aligned bounding rectangle.
    pub fn footprint(&self) -> Bounds {
        Bounds::from_center(self.center, self.width, self.height)
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }
}

/// Source of unique ids for ilots and corridors.
pub trait IdSource {
    fn next_id(&mut self) -> u32;
}

/// Monotonic counter.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u32,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}
