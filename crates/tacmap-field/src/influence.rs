//! The influence field: a per-cell scalar map mixing terrain passability
//! with dynamic influence sources stamped each simulation tick.

use tacmap_core::{GridPoint, Point, Rect, TerrainGrid};

/// Radial falloff applied by an influence stamp.
///
/// A closed set of curves; new falloffs are added as variants.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decay {
    /// Uniform amount everywhere inside the disc.
    #[default]
    None,
    /// Linear interpolation from the full amount at the center down to the
    /// given amount at the rim.
    Linear(f32),
}

/// A per-cell `f32` field over a terrain grid.
///
/// Cells built from impassable terrain hold `f32::INFINITY` and stay walls
/// for the lifetime of the map: stamps never turn a wall passable, and a
/// rebuild ([`InfluenceMap::reset`]) is the only way to change passability.
/// Every passable cell holds at least `1.0` at all times.
///
/// The map is synchronous and single-threaded. It may be read-shared across
/// concurrent searches as long as no stamp or reset runs meanwhile; that
/// discipline is the caller's to enforce.
#[derive(Clone, Debug)]
pub struct InfluenceMap {
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) field: Vec<f32>,
}

impl InfluenceMap {
    /// Build a map from a terrain grid: `0` becomes a wall (`∞`), any
    /// positive value becomes `1.0`.
    pub fn from_grid(base: &TerrainGrid) -> Self {
        let field = base
            .values()
            .iter()
            .map(|&v| if v > 0 { 1.0 } else { f32::INFINITY })
            .collect();
        Self {
            width: base.width(),
            height: base.height(),
            field,
        }
    }

    /// Re-initialize in place from a grid of identical dimensions.
    pub fn reset(&mut self, base: &TerrainGrid) {
        assert!(
            base.width() == self.width && base.height() == self.height,
            "reset requires identical dimensions ({}x{} vs {}x{})",
            base.width(),
            base.height(),
            self.width,
            self.height,
        );
        for (cell, &v) in self.field.iter_mut().zip(base.values()) {
            *cell = if v > 0 { 1.0 } else { f32::INFINITY };
        }
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Field value of cell `c`.
    #[inline]
    pub fn get(&self, c: GridPoint) -> f32 {
        assert!(self.contains(c), "cell {c} outside map");
        self.field[(c.y * self.width + c.x) as usize]
    }

    /// Field value of the cell containing `p`.
    #[inline]
    pub fn value_at(&self, p: Point) -> f32 {
        self.field[self.point_to_index(p)]
    }

    /// Whether cell `c` is impassable.
    #[inline]
    pub fn is_wall(&self, c: GridPoint) -> bool {
        self.get(c) == f32::INFINITY
    }

    #[inline]
    pub(crate) fn contains(&self, c: GridPoint) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height
    }

    /// Linear index of the cell containing `p` (floored).
    #[inline]
    pub fn point_to_index(&self, p: Point) -> usize {
        let c = p.to_grid();
        assert!(self.contains(c), "point {p} outside {}x{} map", self.width, self.height);
        (c.y * self.width + c.x) as usize
    }

    /// Center of the cell at linear index `i`.
    #[inline]
    pub(crate) fn cell_center(&self, i: usize) -> Point {
        GridPoint::new(i as i32 % self.width, i as i32 / self.width).center()
    }

    /// The grid-clipped bounding box of a disc, or `None` when the disc
    /// misses the grid entirely.
    fn clip_box(&self, center: Point, radius: f32) -> Option<Rect> {
        let x0 = (center.x - radius).max(0.0) as i32;
        let y0 = (center.y - radius).max(0.0) as i32;
        let x1 = ((center.x + radius) as i32).min(self.width - 1);
        let y1 = ((center.y + radius) as i32).min(self.height - 1);
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1, y1))
    }

    /// Stamp a filled disc of influence.
    ///
    /// Every cell whose *center* lies strictly within `radius` of `center`
    /// receives `amount` (shaped by `decay`), then is clamped to `≥ 1.0`.
    /// The strict rim test keeps the discrete stamp size stable under FP
    /// jitter. Wall cells flow through the arithmetic unchanged
    /// (`∞ ± finite = ∞`).
    pub fn add_influence(&mut self, center: Point, radius: f32, amount: f32, decay: Decay) {
        let Some(bounds) = self.clip_box(center, radius) else {
            return;
        };
        let r2 = radius * radius;
        for cell in bounds.iter() {
            let d2 = cell.center().distance_squared_to(center);
            if d2 >= r2 {
                continue;
            }
            let add = match decay {
                Decay::None => amount,
                Decay::Linear(end) => {
                    let t = d2.sqrt() / radius;
                    (1.0 - t) * amount + t * end
                }
            };
            let i = (cell.y * self.width + cell.x) as usize;
            self.field[i] = (self.field[i] + add).max(1.0);
        }
    }

    /// Stamp an annulus: a full disc of `amount`, then a flat inner disc of
    /// `-amount` out to `hollow_radius`.
    ///
    /// Cells strictly inside `hollow_radius` receive zero net contribution
    /// (before the `≥ 1.0` clamp); with `hollow_radius == radius` the stamp
    /// is the identity.
    pub fn add_influence_hollow(
        &mut self,
        center: Point,
        radius: f32,
        hollow_radius: f32,
        amount: f32,
        decay: Decay,
    ) {
        self.add_influence(center, radius, amount, decay);
        self.add_influence(center, hollow_radius, -amount, Decay::None);
    }

    /// The center of the lowest-influence cell strictly within `radius` of
    /// `pos`, or `None` when no passable cell qualifies.
    ///
    /// The scan runs x-outer/y-inner over the clipped bounding box, and a
    /// candidate displaces the incumbent only when its value is `≤` *and*
    /// its squared distance to `pos` is strictly `<`. Equal candidates
    /// therefore never displace each other and the scan order picks the
    /// winner deterministically. Callers may observe (and rely on) the
    /// asymmetry: a farther cell never wins on value alone.
    pub fn find_closest_safe_spot(&self, pos: Point, radius: f32) -> Option<Point> {
        let bounds = self.clip_box(pos, radius)?;
        let r2 = radius * radius;
        let mut best: Option<(f32, f32, Point)> = None;
        for cell in bounds.iter() {
            let value = self.field[(cell.y * self.width + cell.x) as usize];
            if value == f32::INFINITY {
                continue;
            }
            let center = cell.center();
            let d2 = center.distance_squared_to(pos);
            if d2 >= r2 {
                continue;
            }
            match best {
                Some((best_value, best_d2, _)) if !(value <= best_value && d2 < best_d2) => {}
                _ => best = Some((value, d2, center)),
            }
        }
        best.map(|(_, _, center)| center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn open_map(w: i32, h: i32) -> InfluenceMap {
        InfluenceMap::from_grid(&TerrainGrid::new(w, h, 1))
    }

    /// The 10×10 fixture shared with the search tests: an L-shaped wall and
    /// a threat disc at (7, 3).
    fn threat_map() -> InfluenceMap {
        let mut base = TerrainGrid::new(10, 10, 1);
        base.set_values(&[11, 21, 31, 41, 51, 61, 71, 12, 13, 14, 15], 0);
        let mut map = InfluenceMap::from_grid(&base);
        map.add_influence(Point::new(7.0, 3.0), 4.0, 10.0, Decay::None);
        map
    }

    #[test]
    fn from_grid_marks_walls_infinite() {
        let mut base = TerrainGrid::new(4, 4, 1);
        base.set(GridPoint::new(2, 1), 0);
        let map = InfluenceMap::from_grid(&base);
        assert!(map.is_wall(GridPoint::new(2, 1)));
        assert_eq!(map.get(GridPoint::new(0, 0)), 1.0);
        assert_eq!(map.value_at(Point::new(3.9, 3.9)), 1.0);
    }

    #[test]
    fn from_grid_honors_positive_weights_as_passable() {
        let mut base = TerrainGrid::new(3, 3, 1);
        base.set(GridPoint::new(1, 1), 200);
        let map = InfluenceMap::from_grid(&base);
        assert_eq!(map.get(GridPoint::new(1, 1)), 1.0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let base = TerrainGrid::new(5, 5, 1);
        let mut map = InfluenceMap::from_grid(&base);
        map.add_influence(Point::new(2.5, 2.5), 2.0, 10.0, Decay::None);
        assert!(map.get(GridPoint::new(2, 2)) > 1.0);
        map.reset(&base);
        assert!(map.field.iter().all(|&v| v == 1.0));
    }

    #[test]
    #[should_panic]
    fn reset_rejects_mismatched_dimensions() {
        let mut map = open_map(5, 5);
        map.reset(&TerrainGrid::new(5, 6, 1));
    }

    #[test]
    fn flat_stamp_adds_inside_disc_only() {
        let mut map = open_map(6, 6);
        map.add_influence(Point::new(0.5, 0.5), 2.0, 10.0, Decay::None);
        assert_eq!(map.get(GridPoint::new(0, 0)), 11.0);
        assert_eq!(map.get(GridPoint::new(1, 0)), 11.0);
        // (2, 0) has its center exactly on the rim: dist == radius, and the
        // test is strict.
        assert_eq!(map.get(GridPoint::new(2, 0)), 1.0);
        assert_eq!(map.get(GridPoint::new(3, 3)), 1.0);
    }

    #[test]
    fn linear_decay_interpolates_to_rim() {
        let mut map = open_map(9, 9);
        map.add_influence(Point::new(4.5, 4.5), 4.0, 10.0, Decay::Linear(2.0));
        // Center cell: full amount.
        assert!((map.get(GridPoint::new(4, 4)) - 11.0).abs() < EPS);
        // Two cells out: halfway between 10 and 2 is 6.
        assert!((map.get(GridPoint::new(6, 4)) - 7.0).abs() < EPS);
    }

    #[test]
    fn negative_amount_clamps_to_one() {
        let mut map = open_map(5, 5);
        map.add_influence(Point::new(2.5, 2.5), 3.0, -5.0, Decay::None);
        for &v in &map.field {
            assert!(v >= 1.0);
        }
    }

    #[test]
    fn walls_survive_any_stamp() {
        let mut base = TerrainGrid::new(6, 6, 1);
        base.set(GridPoint::new(3, 3), 0);
        let mut map = InfluenceMap::from_grid(&base);
        map.add_influence(Point::new(3.5, 3.5), 3.0, 10.0, Decay::None);
        map.add_influence(Point::new(3.5, 3.5), 3.0, -10.0, Decay::Linear(0.0));
        map.add_influence_hollow(Point::new(3.5, 3.5), 4.0, 1.0, 7.0, Decay::None);
        assert!(map.is_wall(GridPoint::new(3, 3)));
        // Neighbors were stamped and stayed >= 1.
        assert!(map.get(GridPoint::new(2, 3)) >= 1.0);
    }

    #[test]
    fn stamp_clipped_at_grid_edge() {
        let mut map = open_map(4, 4);
        // Disc centered off-grid still writes the overlapping corner.
        map.add_influence(Point::new(-1.0, -1.0), 3.0, 5.0, Decay::None);
        assert!(map.get(GridPoint::new(0, 0)) > 1.0);
        // Disc entirely off-grid is a no-op.
        map.add_influence(Point::new(-10.0, -10.0), 2.0, 5.0, Decay::None);
        assert_eq!(map.get(GridPoint::new(3, 3)), 1.0);
    }

    #[test]
    fn hollow_stamp_leaves_interior_flat() {
        let mut map = open_map(11, 11);
        map.add_influence_hollow(Point::new(5.5, 5.5), 4.0, 2.0, 6.0, Decay::None);
        // Inside the hollow: +6 then -6, back to base.
        assert_eq!(map.get(GridPoint::new(5, 5)), 1.0);
        // In the ring: only the outer pass applies.
        assert_eq!(map.get(GridPoint::new(8, 5)), 7.0);
        // Outside: untouched.
        assert_eq!(map.get(GridPoint::new(0, 0)), 1.0);
    }

    #[test]
    fn hollow_with_equal_radii_is_identity() {
        let mut map = open_map(8, 8);
        map.add_influence(Point::new(4.0, 4.0), 2.0, 3.0, Decay::None);
        let before = map.field.clone();
        map.add_influence_hollow(Point::new(4.0, 4.0), 3.0, 3.0, 5.0, Decay::None);
        for (a, b) in map.field.iter().zip(&before) {
            assert!((a - b).abs() < EPS);
        }
    }

    #[test]
    fn safe_spot_avoids_threat() {
        let map = threat_map();
        let spot = map.find_closest_safe_spot(Point::new(7.0, 3.0), 6.0);
        assert_eq!(spot, Some(Point::new(3.5, 0.5)));
    }

    #[test]
    fn safe_spot_skips_walls() {
        let mut base = TerrainGrid::new(3, 3, 1);
        base.set(GridPoint::new(0, 0), 0);
        let map = InfluenceMap::from_grid(&base);
        // Radius reaches only the wall cell.
        assert_eq!(map.find_closest_safe_spot(Point::new(0.5, 0.5), 0.4), None);
        // A larger radius finds a passable neighbor.
        assert!(map.find_closest_safe_spot(Point::new(0.5, 0.5), 2.0).is_some());
    }

    #[test]
    fn safe_spot_none_off_grid() {
        let map = open_map(4, 4);
        assert_eq!(map.find_closest_safe_spot(Point::new(-9.0, -9.0), 2.0), None);
    }

    #[test]
    fn safe_spot_keeps_closer_incumbent_over_lower_value() {
        // Every cell near the query is stamped; a lower-value cell exists
        // farther out, but the strict update rule requires the candidate to
        // win on distance too, so the close stamped cell stays.
        let mut map = open_map(10, 10);
        map.add_influence(Point::new(1.0, 1.0), 3.0, 5.0, Decay::None);
        let spot = map.find_closest_safe_spot(Point::new(1.0, 1.0), 4.0);
        assert_eq!(spot, Some(Point::new(0.5, 0.5)));
    }

    #[test]
    fn safe_spot_ties_resolved_by_scan_order() {
        // (0,0), (0,1) and (1,1) are all equidistant from the query with
        // equal value; the first scanned wins and is never displaced.
        let map = open_map(4, 4);
        let spot = map.find_closest_safe_spot(Point::new(1.0, 1.0), 2.0);
        assert_eq!(spot, Some(Point::new(0.5, 0.5)));
    }
}
