//! Weighted A* over the influence field.
//!
//! The search is tuned for being issued hundreds of times per tick by many
//! agents: it records predecessors on *first discovery* and never relaxes
//! them, trading strict cost-optimality for fewer queue operations. With the
//! consistent octile heuristic the first-reached route is near-optimal on
//! uniform terrain, and the elongation on stamped fields is exactly the
//! "route around danger" behavior callers want. Switching to best-cost A*
//! changes observable detour lengths and must be re-baselined.

use std::collections::BinaryHeap;

use tacmap_core::Point;

use crate::InfluenceMap;

/// A short-horizon pathfinding result for hot-loop callers that replan
/// every tick: the total step count plus the fifth waypoint along the path
/// (the first waypoint for paths shorter than five steps). Aiming at the
/// fifth step instead of the immediate neighbor smooths micro-jitter.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathDirection {
    pub path_len: usize,
    pub next_point: Point,
}

const SQRT_2: f32 = std::f32::consts::SQRT_2;

/// Sentinel predecessor index marking an undiscovered cell.
const UNDISCOVERED: usize = usize::MAX;

/// Predecessor record, written once when a cell is first discovered.
#[derive(Copy, Clone)]
struct Crumb {
    prev: usize,
    steps: u32,
}

/// Open-set entry ordered by `f` for use in `BinaryHeap`.
///
/// `f` is always finite (walls never enter the open set), so the total
/// order from `total_cmp` agrees with the usual float comparison.
#[derive(Copy, Clone)]
struct NodeRef {
    idx: usize,
    g: f32,
    f: f32,
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}

impl Eq for NodeRef {}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest f first.
        other.f.total_cmp(&self.f)
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Neighbor offsets in fixed expansion order.
const DIRS: [(i32, i32); 8] = [
    (-1, -1), // SW
    (0, -1),  // S
    (1, -1),  // SE
    (-1, 0),  // W
    (1, 0),   // E
    (-1, 1),  // NW
    (0, 1),   // N
    (1, 1),   // NE
];

impl InfluenceMap {
    /// Find a path and return its step count plus a short-horizon waypoint.
    ///
    /// Returns `None` when the goal cell is a wall or unreachable. When
    /// `start` and `goal` fall in the same cell the result is a no-op move:
    /// zero steps toward the own cell center.
    ///
    /// `large` applies the wide-unit admissibility rule: cardinal steps
    /// through one-cell-wide gaps are rejected.
    pub fn pathfind_direction(&self, start: Point, goal: Point, large: bool) -> Option<PathDirection> {
        let start_idx = self.point_to_index(start);
        let goal_idx = self.point_to_index(goal);
        if self.field[goal_idx] == f32::INFINITY {
            return None;
        }
        if start_idx == goal_idx {
            return Some(PathDirection {
                path_len: 0,
                next_point: self.cell_center(goal_idx),
            });
        }
        let crumbs = self.run_pathfind(start_idx, goal_idx, large)?;

        // Walk backward from the goal keeping a 5-slot ring of visited
        // cells. The oldest surviving entry is the fifth step from the
        // start; short walks fall back to the first step.
        let mut ring = [goal_idx; 5];
        let mut walked = 0usize;
        let mut cur = goal_idx;
        while cur != start_idx {
            ring[walked % 5] = cur;
            walked += 1;
            cur = crumbs[cur].prev;
        }
        let next = if walked >= 5 {
            ring[walked % 5]
        } else {
            ring[walked - 1]
        };
        Some(PathDirection {
            path_len: crumbs[goal_idx].steps as usize,
            next_point: self.cell_center(next),
        })
    }

    /// Find a path and return the cell centers of every step, from the
    /// start cell's successor through the goal cell.
    ///
    /// Returns `None` when the goal cell is a wall or unreachable, and an
    /// empty path when `start` and `goal` fall in the same cell.
    pub fn pathfind_path(&self, start: Point, goal: Point, large: bool) -> Option<Vec<Point>> {
        let start_idx = self.point_to_index(start);
        let goal_idx = self.point_to_index(goal);
        if self.field[goal_idx] == f32::INFINITY {
            return None;
        }
        if start_idx == goal_idx {
            return Some(Vec::new());
        }
        let crumbs = self.run_pathfind(start_idx, goal_idx, large)?;

        let mut path = vec![Point::ZERO; crumbs[goal_idx].steps as usize];
        let mut cur = goal_idx;
        for slot in path.iter_mut().rev() {
            *slot = self.cell_center(cur);
            cur = crumbs[cur].prev;
        }
        Some(path)
    }

    /// Whether `(x, y)` is a passable cell.
    #[inline]
    fn walkable(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.field[(y * self.width + x) as usize] != f32::INFINITY
    }

    /// The shared search core. Returns the predecessor table once the goal
    /// has been dequeued, or `None` when the open set runs dry first.
    fn run_pathfind(&self, start_idx: usize, goal_idx: usize, large: bool) -> Option<Vec<Crumb>> {
        let mut crumbs = vec![
            Crumb {
                prev: UNDISCOVERED,
                steps: 0,
            };
            self.field.len()
        ];
        let goal_center = self.cell_center(goal_idx);

        let mut open: BinaryHeap<NodeRef> = BinaryHeap::new();
        open.push(NodeRef {
            idx: start_idx,
            g: 0.0,
            f: self.cell_center(start_idx).octile_distance(goal_center),
        });

        while let Some(current) = open.pop() {
            let ci = current.idx;
            if ci == goal_idx {
                return Some(crumbs);
            }

            let cx = ci as i32 % self.width;
            let cy = ci as i32 / self.width;
            let steps = if ci == start_idx { 0 } else { crumbs[ci].steps };

            for &(dx, dy) in &DIRS {
                let nx = cx + dx;
                let ny = cy + dy;
                if !self.walkable(nx, ny) {
                    continue;
                }
                if dx != 0 && dy != 0 {
                    // No corner cutting: both flanking cardinals must be
                    // passable.
                    if !self.walkable(cx + dx, cy) || !self.walkable(cx, cy + dy) {
                        continue;
                    }
                } else if large {
                    // A wide unit cannot slip through a one-cell gap: a
                    // cardinal step needs at least one open flanking
                    // diagonal on the same axis.
                    let blocked = if dx == 0 {
                        !self.walkable(cx - 1, ny) && !self.walkable(cx + 1, ny)
                    } else {
                        !self.walkable(nx, cy - 1) && !self.walkable(nx, cy + 1)
                    };
                    if blocked {
                        continue;
                    }
                }

                let ni = (ny * self.width + nx) as usize;
                // First-reached: the start is never re-entered and a
                // discovered cell keeps its first predecessor.
                if ni == start_idx || crumbs[ni].prev != UNDISCOVERED {
                    continue;
                }

                let move_cost = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
                let g = current.g + move_cost * self.field[ni];
                let h = self.cell_center(ni).octile_distance(goal_center);
                crumbs[ni] = Crumb {
                    prev: ci,
                    steps: steps + 1,
                };
                open.push(NodeRef { idx: ni, g, f: g + h });
            }
        }
        None
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn path_direction_round_trip() {
        let dir = PathDirection {
            path_len: 9,
            next_point: Point::new(5.5, 5.5),
        };
        let json = serde_json::to_string(&dir).unwrap();
        let back: PathDirection = serde_json::from_str(&json).unwrap();
        assert_eq!(dir, back);
    }
}
