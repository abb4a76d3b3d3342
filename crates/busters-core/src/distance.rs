//! Shortest-path distance oracles over a static layout.

use crate::model::direction::Direction;
use crate::model::layout::Layout;
use crate::model::position::Position;
use std::collections::VecDeque;

/// Distance reported for unreachable or off-layout pairs.
pub const UNREACHABLE: u32 = 100_000;

pub trait DistanceOracle {
    fn distance(&self, a: Position, b: Position) -> u32;
}

/// Plain Manhattan metric, ignoring walls.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManhattanDistance;

impl DistanceOracle for ManhattanDistance {
    fn distance(&self, a: Position, b: Position) -> u32 {
        a.manhattan(b)
    }
}

/// All-pairs maze distances, computed once per layout by breadth-first search.
#[derive(Debug, Clone)]
pub struct Distancer {
    width: usize,
    height: usize,
    /// Cell index -> dense index into `table`, `None` for walls.
    dense: Vec<Option<usize>>,
    open: usize,
    table: Vec<u32>,
}

impl Distancer {
    pub fn new(layout: &Layout) -> Self {
        let width = layout.width();
        let height = layout.height();
        let mut dense = vec![None; width * height];
        let cells = layout.legal_positions();
        for (dense_index, pos) in cells.iter().enumerate() {
            if let Some(cell) = layout.index_of(*pos) {
                dense[cell] = Some(dense_index);
            }
        }

        let open = cells.len();
        let mut table = vec![UNREACHABLE; open * open];
        let mut queue = VecDeque::new();

        for (source_index, source) in cells.iter().enumerate() {
            let row = &mut table[source_index * open..(source_index + 1) * open];
            row[source_index] = 0;
            queue.clear();
            queue.push_back(*source);

            while let Some(current) = queue.pop_front() {
                let Some(current_index) = lookup(&dense, layout, current) else {
                    continue;
                };
                let next_distance = row[current_index] + 1;
                for direction in Direction::CARDINAL {
                    let neighbour = current.step(direction);
                    let Some(neighbour_index) = lookup(&dense, layout, neighbour) else {
                        continue;
                    };
                    if row[neighbour_index] == UNREACHABLE {
                        row[neighbour_index] = next_distance;
                        queue.push_back(neighbour);
                    }
                }
            }
        }

        Self {
            width,
            height,
            dense,
            open,
            table,
        }
    }

    fn dense_index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.dense[y * self.width + x]
    }
}

fn lookup(dense: &[Option<usize>], layout: &Layout, pos: Position) -> Option<usize> {
    layout.index_of(pos).and_then(|cell| dense[cell])
}

impl DistanceOracle for Distancer {
    fn distance(&self, a: Position, b: Position) -> u32 {
        match (self.dense_index(a), self.dense_index(b)) {
            (Some(from), Some(to)) => self.table[from * self.open + to],
            _ => UNREACHABLE,
        }
    }
}
