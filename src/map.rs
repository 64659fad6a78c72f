// Occupancy map: one cell per board coordinate, rebuilt every turn
//
// Cells carry what occupies them (nothing, food or a snake segment) and a
// scratch score that the route engine accumulates while analysing the turn.

use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::{Index, IndexMut};

use crate::board::Snake;
use crate::config::TargetsConfig;
use crate::types::Coord;

/// A snake body part, identified by its owner's index on the board and its
/// position in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub snake: usize,
    pub index: usize,
    pub is_head: bool,
    pub is_tail: bool,
    /// Turns until the cell is free again; the tail vacates soonest
    pub vacates_in: usize,
}

/// What a cell holds, and thereby what a route may aim for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Empty { decoy: bool },
    Food,
    Snake(Segment),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub target: Target,
    score: i32,
}

impl Cell {
    fn new(target: Target) -> Self {
        Cell { target, score: 0 }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn bump(&mut self, delta: i32) {
        self.score += delta;
    }

    pub fn segment(&self) -> Option<&Segment> {
        match &self.target {
            Target::Snake(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn is_food(&self) -> bool {
        self.target == Target::Food
    }

    pub fn is_decoy(&self) -> bool {
        self.target == Target::Empty { decoy: true }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::new(Target::Empty { decoy: false })
    }
}

/// Dense `width * height` grid of cells, indexed by coordinate.
#[derive(Debug, Clone)]
pub struct OccupancyMap {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    decoys: Vec<Coord>,
}

impl OccupancyMap {
    /// Builds the map for one turn.
    ///
    /// Food is placed first, snakes override it. Afterwards up to
    /// `targets.decoy_count` empty cells of the central decoy band are drawn
    /// with `rng` and flagged as decoys.
    ///
    /// All coordinates must lie on the board, and `width * height` must be a
    /// sensible cell count; `Board::new` checks both.
    pub fn build<R: Rng + ?Sized>(
        width: i32,
        height: i32,
        food: &[Coord],
        snakes: &[Snake],
        targets: &TargetsConfig,
        rng: &mut R,
    ) -> Self {
        let mut map = OccupancyMap {
            width,
            height,
            cells: vec![Cell::default(); (width * height) as usize],
            decoys: Vec::new(),
        };

        for &p in food {
            map[p] = Cell::new(Target::Food);
        }

        for (i, snake) in snakes.iter().enumerate() {
            let len = snake.body.len();
            // Tail first, so stacked segments keep the earliest (longest lived) part
            for (index, &p) in snake.body.iter().enumerate().rev() {
                let stacked_tail = matches!(
                    map[p].target,
                    Target::Snake(s) if s.snake == i && s.is_tail
                );
                map[p] = Cell::new(Target::Snake(Segment {
                    snake: i,
                    index,
                    is_head: index == 0,
                    is_tail: index == len - 1 || stacked_tail,
                    vacates_in: len - index,
                }));
            }
        }

        let mut band = map.decoy_band(targets.decoy_scope_percent);
        band.shuffle(rng);
        band.truncate(targets.decoy_count);
        for &p in &band {
            map[p].target = Target::Empty { decoy: true };
        }
        map.decoys = band;
        map
    }

    /// Empty cells whose relative position on both axes lies within the
    /// centred `scope_percent` share of the board.
    fn decoy_band(&self, scope_percent: u8) -> Vec<Coord> {
        let min_percent = (100.0 - scope_percent as f64) / 2.0;
        let max_percent = 100.0 - min_percent;
        let in_band = |v: i32, size: i32| {
            let percent = v as f64 / size as f64 * 100.0;
            percent >= min_percent && percent <= max_percent
        };

        let mut band = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                let p = Coord::new(x, y);
                if in_band(x, self.width)
                    && in_band(y, self.height)
                    && self[p].target == (Target::Empty { decoy: false })
                {
                    band.push(p);
                }
            }
        }
        band
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, p: Coord) -> bool {
        0 <= p.x && p.x < self.width && 0 <= p.y && p.y < self.height
    }

    /// Row-major position of `p`, if it lies on the board
    pub fn index_of(&self, p: Coord) -> Option<usize> {
        if self.contains(p) {
            Some((p.y * self.width + p.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, p: Coord) -> Option<&Cell> {
        self.index_of(p).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, p: Coord) -> Option<&mut Cell> {
        self.index_of(p).map(move |i| &mut self.cells[i])
    }

    /// Decoy targets in selection order
    pub fn decoys(&self) -> &[Coord] {
        &self.decoys
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Cell)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Coord::new(i as i32 % width, i as i32 / width), cell))
    }
}

impl Index<Coord> for OccupancyMap {
    type Output = Cell;

    fn index(&self, p: Coord) -> &Self::Output {
        assert!(self.contains(p), "{} is outside the board", p);
        &self.cells[(p.y * self.width + p.x) as usize]
    }
}

impl IndexMut<Coord> for OccupancyMap {
    fn index_mut(&mut self, p: Coord) -> &mut Self::Output {
        assert!(self.contains(p), "{} is outside the board", p);
        &mut self.cells[(p.y * self.width + p.x) as usize]
    }
}
