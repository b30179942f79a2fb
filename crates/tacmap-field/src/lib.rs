//! **tacmap-field** — influence map with weighted A* pathfinding.
//!
//! Built for real-time strategy AI where many agents, every simulation
//! tick, evaluate spatial danger fields and plan paths that bias away from
//! dangerous regions:
//!
//! - build or reset an [`InfluenceMap`] from the current
//!   [`TerrainGrid`](tacmap_core::TerrainGrid),
//! - stamp threat discs and auras ([`InfluenceMap::add_influence`],
//!   [`InfluenceMap::add_influence_hollow`]),
//! - query retreat positions ([`InfluenceMap::find_closest_safe_spot`]),
//! - pathfind with a full reconstruction ([`InfluenceMap::pathfind_path`])
//!   or the compact per-tick flavor ([`InfluenceMap::pathfind_direction`]).

mod astar;
mod influence;

pub use astar::PathDirection;
pub use influence::{Decay, InfluenceMap};
