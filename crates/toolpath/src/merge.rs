//! Stroke merging
//!
//! Joins strokes whose endpoints lie within a tolerance into longer
//! continuous strokes, so the tool is not lifted between pieces of what is
//! visually one line.
//!
//! Every stroke endpoint is a node of an undirected compatibility graph with
//! an edge between endpoints of *different* strokes closer than the
//! tolerance. Chains are grown iteratively from seeds in input order, with an
//! explicit consumed marker per stroke, so long chains never recurse.

use std::collections::VecDeque;

use glam::DVec2;
use tracing::{debug, trace};

use crate::constants::POINT_EPSILON;
use crate::error::Result;
use crate::grid::SpatialGrid;
use crate::types::Stroke;

/// Joins strokes with endpoints within `tolerance` of each other
#[derive(Debug, Clone, Copy)]
pub struct StrokeMerger {
    tolerance: f64,
}

/// Node index of a stroke's first point
fn start_node(stroke: usize) -> usize {
    stroke * 2
}

/// Node index of a stroke's last point
fn end_node(stroke: usize) -> usize {
    stroke * 2 + 1
}

fn is_start(node: usize) -> bool {
    node % 2 == 0
}

impl StrokeMerger {
    /// Create a merger. `tolerance` 0 disables merging; negative values fail.
    pub fn new(tolerance: f64) -> Result<Self> {
        brushpath_config::non_negative("merge_tolerance", tolerance)?;
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Merge connected strokes. Input strokes are not modified.
    ///
    /// Output order follows the seed stroke of each chain. With tolerance 0,
    /// or fewer than two strokes, the output equals the input.
    pub fn merge(&self, strokes: &[Stroke]) -> Vec<Stroke> {
        if self.tolerance <= 0.0 || strokes.len() < 2 {
            return strokes.to_vec();
        }

        let adjacency = self.build_adjacency(strokes);
        let mut consumed = vec![false; strokes.len()];
        let mut merged = Vec::with_capacity(strokes.len());

        for seed in 0..strokes.len() {
            if consumed[seed] {
                continue;
            }
            consumed[seed] = true;

            if strokes[seed].is_empty() {
                merged.push(strokes[seed].clone());
                continue;
            }

            let mut chain: VecDeque<DVec2> = strokes[seed].points.iter().copied().collect();
            let mut tail = end_node(seed);
            let mut head = start_node(seed);
            let mut joined = 0usize;

            // Grow the end of the chain
            while let Some(node) = first_free(&adjacency[tail], &consumed) {
                let other = node / 2;
                consumed[other] = true;
                joined += 1;
                let points = &strokes[other].points;
                if is_start(node) {
                    join_back(&mut chain, points.iter().copied());
                    tail = end_node(other);
                } else {
                    join_back(&mut chain, points.iter().rev().copied());
                    tail = start_node(other);
                }
                trace!("merge: stroke {} appended to chain seeded by {}", other, seed);
            }

            // Grow the start of the chain
            while let Some(node) = first_free(&adjacency[head], &consumed) {
                let other = node / 2;
                consumed[other] = true;
                joined += 1;
                let points = &strokes[other].points;
                if is_start(node) {
                    join_front(&mut chain, points.iter().copied());
                    head = end_node(other);
                } else {
                    join_front(&mut chain, points.iter().rev().copied());
                    head = start_node(other);
                }
                trace!("merge: stroke {} prepended to chain seeded by {}", other, seed);
            }

            if let (Some(first), Some(last)) = (chain.front(), chain.back()) {
                let gap = first.distance(*last);
                if chain.len() > 2 && gap > POINT_EPSILON && gap <= self.tolerance {
                    debug!(
                        "merge: chain seeded by {} left open, ends {:.3} apart",
                        seed, gap
                    );
                }
            }

            if joined > 0 {
                trace!("merge: chain seeded by {} joined {} strokes", seed, joined);
            }
            merged.push(Stroke::new(chain.into()));
        }

        debug!(
            "merge: {} strokes -> {} strokes (tolerance {:.3})",
            strokes.len(),
            merged.len(),
            self.tolerance
        );
        merged
    }

    /// Neighbour endpoints of every endpoint node, sorted by node index
    fn build_adjacency(&self, strokes: &[Stroke]) -> Vec<Vec<usize>> {
        let mut grid = SpatialGrid::new(self.tolerance);
        let mut positions = vec![None; strokes.len() * 2];

        for (index, stroke) in strokes.iter().enumerate() {
            if let (Some(first), Some(last)) = (stroke.first(), stroke.last()) {
                positions[start_node(index)] = Some(first);
                positions[end_node(index)] = Some(last);
                grid.insert_point(first, start_node(index));
                grid.insert_point(last, end_node(index));
            }
        }

        positions
            .iter()
            .enumerate()
            .map(|(node, position)| {
                let Some(position) = *position else {
                    return Vec::new();
                };
                let mut neighbours: Vec<usize> = grid
                    .query_square(position, self.tolerance)
                    .into_iter()
                    .filter(|&other| other / 2 != node / 2)
                    .filter(|&other| {
                        positions[other]
                            .is_some_and(|p| p.distance(position) <= self.tolerance)
                    })
                    .collect();
                neighbours.sort_unstable();
                neighbours.dedup();
                neighbours
            })
            .collect()
    }
}

/// First neighbour whose stroke has not been used yet
fn first_free(neighbours: &[usize], consumed: &[bool]) -> Option<usize> {
    neighbours.iter().copied().find(|&node| !consumed[node / 2])
}

/// Append points, dropping the first one if it repeats the chain's end
fn join_back(chain: &mut VecDeque<DVec2>, points: impl Iterator<Item = DVec2>) {
    for point in points {
        if chain
            .back()
            .is_some_and(|last| last.distance(point) <= POINT_EPSILON)
        {
            continue;
        }
        chain.push_back(point);
    }
}

/// Prepend points in iteration order (the first point ends up adjacent to
/// the chain), dropping points that repeat the chain's start
fn join_front(chain: &mut VecDeque<DVec2>, points: impl Iterator<Item = DVec2>) {
    for point in points {
        if chain
            .front()
            .is_some_and(|first| first.distance(point) <= POINT_EPSILON)
        {
            continue;
        }
        chain.push_front(point);
    }
}
