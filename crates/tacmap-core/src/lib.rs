//! **tacmap-core** — foundational types for the *tacmap* crates.
//!
//! This crate provides the geometry primitives ([`Point`], [`GridPoint`],
//! [`Rect`]) and the base terrain grid ([`TerrainGrid`]) that the influence
//! map and pathfinding layers are built on.

pub mod geom;
pub mod grid;

pub use geom::{GridPoint, Point, Rect, RectIter};
pub use grid::TerrainGrid;
