//! A tiny skirmish scene: random wall strips, a few threat stamps, one
//! support ring, and a unit pathing from the south-west corner to the
//! north-east corner. Renders the field as ASCII.

use rand::Rng;

use tacmap_core::{GridPoint, Point, TerrainGrid};
use tacmap_field::{Decay, InfluenceMap};

const WIDTH: i32 = 32;
const HEIGHT: i32 = 24;

const START: Point = Point::new(0.5, 0.5);
const GOAL: Point = Point::new(30.5, 22.5);

fn main() {
    let mut rng = rand::rng();

    // Regenerate until the random walls leave a route open.
    let (map, path) = loop {
        let base = generate_terrain(&mut rng);
        let mut map = InfluenceMap::from_grid(&base);
        stamp_threats(&mut map, &mut rng);
        if let Some(path) = map.pathfind_path(START, GOAL, false) {
            break (map, path);
        }
    };

    render(&map, &path);

    if let Some(dir) = map.pathfind_direction(START, GOAL, false) {
        println!(
            "path: {} steps, heading for {} first",
            dir.path_len, dir.next_point
        );
    }
    match map.find_closest_safe_spot(START, 12.0) {
        Some(spot) => println!("nearest safe spot within 12.0: {spot}"),
        None => println!("no safe spot within 12.0"),
    }
}

/// Open terrain with a handful of random vertical and horizontal wall
/// strips.
fn generate_terrain(rng: &mut impl Rng) -> TerrainGrid {
    let mut base = TerrainGrid::new(WIDTH, HEIGHT, 1);
    for _ in 0..6 {
        let vertical = rng.random_range(0..2) == 0;
        let len = rng.random_range(4..10);
        let x = rng.random_range(1..WIDTH - 1);
        let y = rng.random_range(1..HEIGHT - 1);
        for i in 0..len {
            let c = if vertical {
                GridPoint::new(x, y + i)
            } else {
                GridPoint::new(x + i, y)
            };
            if c.x < WIDTH - 1 && c.y < HEIGHT - 1 {
                base.set(c, 0);
            }
        }
    }
    // Keep the corners open for the unit and its goal.
    base.set(START.to_grid(), 1);
    base.set(GOAL.to_grid(), 1);
    base
}

/// A few enemy threat discs plus one hollow support ring.
fn stamp_threats(map: &mut InfluenceMap, rng: &mut impl Rng) {
    for _ in 0..3 {
        let center = Point::new(
            rng.random_range(4.0..WIDTH as f32 - 4.0),
            rng.random_range(4.0..HEIGHT as f32 - 4.0),
        );
        let radius = rng.random_range(3.0..6.0);
        map.add_influence(center, radius, 12.0, Decay::Linear(2.0));
    }
    map.add_influence_hollow(Point::new(16.0, 12.0), 7.0, 4.0, 5.0, Decay::None);
}

/// Print the field top row first: walls `#`, hot cells `+`, path `*`.
fn render(map: &InfluenceMap, path: &[Point]) {
    let on_path = |c: GridPoint| path.iter().any(|p| p.to_grid() == c);
    for y in (0..HEIGHT).rev() {
        let mut line = String::with_capacity(WIDTH as usize);
        for x in 0..WIDTH {
            let c = GridPoint::new(x, y);
            let glyph = if c == START.to_grid() {
                'S'
            } else if c == GOAL.to_grid() {
                'G'
            } else if map.is_wall(c) {
                '#'
            } else if on_path(c) {
                '*'
            } else if map.get(c) > 4.0 {
                '+'
            } else {
                '.'
            };
            line.push(glyph);
        }
        println!("{line}");
    }
}
