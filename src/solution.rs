//! Solution representation and output for the tour heuristic.
//!
//! A solution is a closed tour (first vertex repeated at the end) together
//! with its total weight, recomputed from the edge list of the instance.

use crate::error::{TspError, TspResult};
use crate::instance::{Edge, GraphInstance, VertexId, Weight};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A constructed tour and its weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Closed tour: the first vertex is repeated as the last entry
    pub tour: Vec<VertexId>,
    /// Sum of edge weights over consecutive tour pairs
    pub weight: Weight,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of insertion steps performed after seeding
    pub iterations: usize,
}

impl Solution {
    /// Create a solution from a closed tour, resolving its weight on `instance`
    pub fn from_tour(instance: &GraphInstance, tour: Vec<VertexId>, algorithm: &str) -> TspResult<Self> {
        let weight = edges_weight(&tour_edges(instance, &tour)?)?;

        Ok(Solution {
            tour,
            weight,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: 0,
        })
    }

    /// Check that the tour starts and ends at the same vertex
    pub fn is_closed(&self) -> bool {
        self.tour.len() >= 2 && self.tour.first() == self.tour.last()
    }

    /// Check that every vertex of `instance` is visited exactly once
    pub fn is_complete(&self, instance: &GraphInstance) -> bool {
        let open = self.open_sequence();
        let unique: HashSet<VertexId> = open.iter().copied().collect();
        let vertices: HashSet<VertexId> = instance.vertices().into_iter().collect();

        self.is_closed() && unique.len() == open.len() && unique == vertices
    }

    /// Tour without its closing vertex
    pub fn open_sequence(&self) -> &[VertexId] {
        match self.tour.split_last() {
            Some((_, open)) => open,
            None => &[],
        }
    }

    /// Render the result file: weight on the first line, the open tour
    /// comma-separated on the second.
    pub fn render(&self) -> String {
        let sequence: Vec<String> = self.open_sequence().iter().map(|v| v.to_string()).collect();
        format!("{}\n{}\n", self.weight, sequence.join(","))
    }

    /// Write the rendered result to `path`
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> TspResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render()).map_err(|e| TspError::io(path, e))
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Weight: {}", self.weight)?;
        writeln!(f, "  Insertions: {}", self.iterations)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

/// Resolve each consecutive pair of `sequence` to its edge on `instance`
pub fn tour_edges(instance: &GraphInstance, sequence: &[VertexId]) -> TspResult<Vec<Edge>> {
    sequence
        .windows(2)
        .map(|pair| instance.find_edge(pair[0], pair[1]))
        .collect()
}

/// Total weight of an edge sequence
pub fn edges_weight(edges: &[Edge]) -> TspResult<Weight> {
    edges.iter().try_fold(0 as Weight, |total, edge| {
        total
            .checked_add(edge.weight)
            .ok_or_else(|| TspError::WeightOverflow("summing tour edges".to_string()))
    })
}
