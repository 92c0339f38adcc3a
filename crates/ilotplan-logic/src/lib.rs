//! Pure layout logic for ilotplan.
//!
//! Places rectangular fixtures ("ilots") inside the available zones of a
//! floor plan at a target density, then lays corridors between them.
//! Functions take plain data and return results: no file or network I/O,
//! no global state, and all randomness comes through an explicit seeded
//! RNG, so a given plan, config and seed always produce the same layout.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalogue`] | Six ilot size tiers and density-dependent tier weights |
//! | [`config`] | Layout profiles and tunables, with validation |
//! | [`corridors`] | Row grouping, row-pair corridors, main spine, access spurs |
//! | [`error`] | Fatal errors and non-fatal input warnings |
//! | [`geometry`] | Points, boxes, polygons, distances |
//! | [`grid`] | Rasterized free / restricted / occupied map of the plan |
//! | [`ilot`] | Placed fixtures and id sources |
//! | [`layout`] | End-to-end generation and layout statistics |
//! | [`placement`] | Seeding, hill climbing, densification, scoring |
//! | [`plan`] | Floor plan input model (rooms, walls, restricted areas, entrances) |
//! | [`progress`] | Advisory progress events |
//! | [`validation`] | Layout checks (spacing, clearances, corridors, connectivity) |
//! | [`zones`] | Zone filtering and ranking |
//!
//! # Example
//!
//! ```
//! use ilotplan_logic::{generate_layout, FloorPlan, LayoutConfig};
//! use ilotplan_logic::geometry::rectangle;
//! use ilotplan_logic::plan::{Zone, ZoneCategory};
//!
//! let plan = FloorPlan {
//!     rooms: vec![Zone::new(rectangle(0.0, 0.0, 10.0, 10.0), ZoneCategory::Available)],
//!     ..Default::default()
//! };
//! let layout = generate_layout(&plan, &LayoutConfig::default(), 42).unwrap();
//! assert!(layout.stats.utilization_pct <= 100.0);
//! ```

pub mod catalogue;
pub mod config;
pub mod corridors;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod ilot;
pub mod layout;
pub mod placement;
pub mod plan;
pub mod progress;
pub mod validation;
pub mod zones;

pub use config::{LayoutConfig, LayoutProfile};
pub use error::{ConfigError, InputWarning, LayoutError, Result};
pub use ilot::{IdSource, Ilot, SequentialIds};
pub use layout::{generate_layout, generate_layout_with, Layout, LayoutStats};
pub use plan::FloorPlan;
pub use progress::{ProgressEvent, ProgressSink};
