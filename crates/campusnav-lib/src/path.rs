//! A* search over the working cost grid.
//!
//! The search is 8-connected and pure CPU-bound: it owns its open and
//! closed sets, touches only the per-request [`CostGrid`], and never
//! mutates shared state, so any number of searches can run concurrently
//! against one loaded grid.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::cost::CostGrid;

/// Grid cell identified by `(row, col)`.
pub type Cell = (usize, usize);

/// Neighbour offsets: orthogonal first, then diagonals.
const DIRECTIONS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Straight-line distance between two cells.
#[must_use]
pub fn euclidean_distance(a: Cell, b: Cell) -> f64 {
    let dr = a.0 as f64 - b.0 as f64;
    let dc = a.1 as f64 - b.1 as f64;
    (dr * dr + dc * dc).sqrt()
}

/// Find the cheapest path from `start` to `goal` over the cost grid.
///
/// Returns the ordered cell sequence from start to goal inclusive, or an
/// empty vector when either endpoint is impassable in the working grid or
/// the open set empties without reaching the goal. "No path" is a valid
/// result, never an error.
#[must_use]
pub fn find_path(cost: &CostGrid, start: Cell, goal: Cell) -> Vec<Cell> {
    if cost.is_obstacle(start.0, start.1) || cost.is_obstacle(goal.0, goal.1) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let mut g_score: HashMap<Cell, f64> = HashMap::new();
    let mut parents: HashMap<Cell, Option<Cell>> = HashMap::new();
    let mut queue = BinaryHeap::new();
    let mut sequence = 0_u64;

    g_score.insert(start, 0.0);
    parents.insert(start, None);
    queue.push(QueueEntry::new(
        start,
        0.0,
        euclidean_distance(start, goal),
        sequence,
    ));

    while let Some(entry) = queue.pop() {
        let current_score = match g_score.get(&entry.cell) {
            Some(score) if *score < entry.cost.0 => continue,
            Some(score) => *score,
            None => continue,
        };

        if entry.cell == goal {
            return reconstruct_path(&parents, start, goal);
        }

        for (dr, dc) in DIRECTIONS {
            let (r, c) = (entry.cell.0 as i64 + dr, entry.cell.1 as i64 + dc);
            if r < 0 || c < 0 || r as usize >= cost.rows() || c as usize >= cost.cols() {
                continue;
            }
            let next = (r as usize, c as usize);
            if cost.is_obstacle(next.0, next.1) {
                continue;
            }

            let edge = euclidean_distance(entry.cell, next) * cost.multiplier(next.0, next.1);
            let tentative_g = current_score + edge;
            if tentative_g < *g_score.get(&next).unwrap_or(&f64::INFINITY) {
                g_score.insert(next, tentative_g);
                parents.insert(next, Some(entry.cell));
                sequence += 1;
                queue.push(QueueEntry::new(
                    next,
                    tentative_g,
                    euclidean_distance(next, goal),
                    sequence,
                ));
            }
        }
    }

    Vec::new()
}

fn reconstruct_path(parents: &HashMap<Cell, Option<Cell>>, start: Cell, goal: Cell) -> Vec<Cell> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(cell) = current {
        path.push(cell);
        if cell == start {
            break;
        }
        current = parents.get(&cell).copied().flatten();
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    cell: Cell,
    cost: FloatOrd,
    estimate: FloatOrd,
    sequence: u64,
}

impl QueueEntry {
    fn new(cell: Cell, cost: f64, heuristic: f64, sequence: u64) -> Self {
        Self {
            cell,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
            sequence,
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by f-score.
        // Equal scores fall back to insertion order for determinism.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
