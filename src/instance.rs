//! Module for parsing and representing weighted graph instances.
//!
//! An instance is a plain edge list read from a text file, one edge per line
//! written as `first second weight`. Vertices are never declared on their own:
//! the vertex set is whatever appears as an endpoint of some edge. Edges are
//! undirected, so a lookup for `(a, b)` also matches an edge stored as `(b, a)`.

use crate::error::{TspError, TspResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Vertex identifier as written in the input file
pub type VertexId = i64;

/// Edge weight
pub type Weight = i64;

/// An undirected weighted edge, stored in the direction it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub first: VertexId,
    pub second: VertexId,
    pub weight: Weight,
}

impl Edge {
    pub fn new(first: VertexId, second: VertexId, weight: Weight) -> Self {
        Edge { first, second, weight }
    }

    /// The same edge with its endpoints swapped
    pub fn reversed(&self) -> Self {
        Edge::new(self.second, self.first, self.weight)
    }

    /// Check if this edge has `vertex` as one of its endpoints
    pub fn is_incident(&self, vertex: VertexId) -> bool {
        self.first == vertex || self.second == vertex
    }

    /// Orient this edge as `(a, b)` if it joins those two vertices.
    ///
    /// The stored direction is tried first, then the swapped one.
    pub fn oriented(&self, a: VertexId, b: VertexId) -> Option<Self> {
        if self.first == a && self.second == b {
            Some(*self)
        } else if self.second == a && self.first == b {
            Some(self.reversed())
        } else {
            None
        }
    }

    /// Parse one `first second weight` line
    fn parse(line: &str) -> Result<Self, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(format!("expected 3 fields, found {}", parts.len()));
        }

        let mut values = [0i64; 3];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| format!("invalid integer '{}'", part))?;
        }

        Ok(Edge::new(values[0], values[1], values[2]))
    }
}

/// A problem instance: the full edge list of one weighted graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInstance {
    /// Name of the instance (file stem when read from disk)
    pub name: String,
    /// Edges in input order. Order matters: every tie is broken by it.
    pub edges: Vec<Edge>,
}

impl GraphInstance {
    pub fn new(name: impl Into<String>, edges: Vec<Edge>) -> Self {
        GraphInstance { name: name.into(), edges }
    }

    /// Parse an instance from an edge-list file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TspResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TspError::io(path, e))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::parse(name, &text)
    }

    /// Parse an instance from edge-list text
    pub fn parse(name: impl Into<String>, text: &str) -> TspResult<Self> {
        let mut edges = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if let Some(edge) = Self::parse_line(index + 1, line)? {
                edges.push(edge);
            }
        }

        let instance = GraphInstance::new(name, edges);
        instance.warn_on_irregularities();
        Ok(instance)
    }

    fn parse_line(line_no: usize, line: &str) -> TspResult<Option<Edge>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        Edge::parse(trimmed)
            .map(Some)
            .map_err(|reason| TspError::MalformedInput {
                line: line_no,
                content: line.to_string(),
                reason,
            })
    }

    fn warn_on_irregularities(&self) {
        if let Some(edge) = self.edges.iter().find(|e| e.weight < 0) {
            warn!(
                "{}: negative weight {} on edge {}-{}",
                self.name, edge.weight, edge.first, edge.second
            );
        }
        let duplicates = self.duplicate_pairs();
        if !duplicates.is_empty() {
            warn!(
                "{}: {} duplicate vertex pairs, the first listed edge wins",
                self.name,
                duplicates.len()
            );
        }
        if !self.is_complete() {
            warn!(
                "{}: graph is not complete, tour construction may fail",
                self.name
            );
        }
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct vertices
    pub fn num_vertices(&self) -> usize {
        self.vertices().len()
    }

    /// All distinct vertices, in the order they first appear in the edge list
    pub fn vertices(&self) -> Vec<VertexId> {
        let mut seen = HashSet::new();
        let mut vertices = Vec::new();

        for edge in &self.edges {
            for vertex in [edge.first, edge.second] {
                if seen.insert(vertex) {
                    vertices.push(vertex);
                }
            }
        }

        vertices
    }

    /// All distinct vertices in ascending order
    pub fn sorted_vertices(&self) -> Vec<VertexId> {
        let mut vertices = self.vertices();
        vertices.sort_unstable();
        vertices
    }

    /// Find the edge joining `a` and `b`, oriented as `(a, b)`.
    ///
    /// Scans the edge list and returns the first edge over the unordered pair.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> TspResult<Edge> {
        self.edges
            .iter()
            .find_map(|edge| edge.oriented(a, b))
            .ok_or(TspError::IncompleteGraph { first: a, second: b })
    }

    /// Endpoint across the lightest edge incident to `vertex`.
    ///
    /// Ties keep the earliest edge in the list.
    pub fn nearest_vertex(&self, vertex: VertexId) -> TspResult<VertexId> {
        let mut nearest: Option<&Edge> = None;

        for edge in self.edges.iter().filter(|e| e.is_incident(vertex)) {
            match nearest {
                Some(best) if edge.weight >= best.weight => {}
                _ => nearest = Some(edge),
            }
        }

        let edge = nearest.ok_or(TspError::IsolatedVertex(vertex))?;
        if edge.first == vertex {
            Ok(edge.second)
        } else {
            Ok(edge.first)
        }
    }

    /// Unordered vertex pairs listed by more than one edge
    pub fn duplicate_pairs(&self) -> Vec<(VertexId, VertexId)> {
        let mut counts: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for edge in &self.edges {
            let key = (edge.first.min(edge.second), edge.first.max(edge.second));
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut duplicates: Vec<_> = counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(pair, _)| pair)
            .collect();
        duplicates.sort_unstable();
        duplicates
    }

    /// Check that every pair of distinct vertices is joined by an edge
    pub fn is_complete(&self) -> bool {
        self.missing_pairs() == 0
    }

    /// Number of distinct vertex pairs with no edge between them
    pub fn missing_pairs(&self) -> usize {
        let pairs: HashSet<(VertexId, VertexId)> = self
            .edges
            .iter()
            .filter(|e| e.first != e.second)
            .map(|e| (e.first.min(e.second), e.first.max(e.second)))
            .collect();

        let n = self.num_vertices();
        n * n.saturating_sub(1) / 2 - pairs.len()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let weights: Vec<Weight> = self.edges.iter().map(|e| e.weight).collect();
        let avg_weight = if weights.is_empty() {
            0.0
        } else {
            weights.iter().map(|&w| w as f64).sum::<f64>() / weights.len() as f64
        };

        InstanceStatistics {
            name: self.name.clone(),
            num_vertices: self.num_vertices(),
            num_edges: self.num_edges(),
            complete: self.is_complete(),
            missing_pairs: self.missing_pairs(),
            duplicate_pairs: self.duplicate_pairs().len(),
            min_weight: weights.iter().copied().min(),
            max_weight: weights.iter().copied().max(),
            avg_weight,
        }
    }
}

/// Hash index over an edge list that answers lookups like the linear scan.
///
/// Built once per run. For each unordered pair only the first listed edge is
/// kept, so duplicate pairs resolve to the same edge `find_edge` would return.
#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    weights: HashMap<(VertexId, VertexId), Weight>,
}

impl EdgeIndex {
    pub fn build(instance: &GraphInstance) -> Self {
        let mut weights = HashMap::with_capacity(instance.edges.len() * 2);
        for edge in &instance.edges {
            weights.entry((edge.first, edge.second)).or_insert(edge.weight);
            weights.entry((edge.second, edge.first)).or_insert(edge.weight);
        }
        EdgeIndex { weights }
    }

    /// Find the edge joining `a` and `b`, oriented as `(a, b)`
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> TspResult<Edge> {
        self.weights
            .get(&(a, b))
            .map(|&weight| Edge::new(a, b, weight))
            .ok_or(TspError::IncompleteGraph { first: a, second: b })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Statistics about a graph instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_vertices: usize,
    pub num_edges: usize,
    pub complete: bool,
    pub missing_pairs: usize,
    pub duplicate_pairs: usize,
    pub min_weight: Option<Weight>,
    pub max_weight: Option<Weight>,
    pub avg_weight: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Vertices: {}", self.num_vertices)?;
        writeln!(f, "  Edges: {}", self.num_edges)?;
        writeln!(f, "  Complete: {} ({} missing pairs)", self.complete, self.missing_pairs)?;
        writeln!(f, "  Duplicate pairs: {}", self.duplicate_pairs)?;
        match (self.min_weight, self.max_weight) {
            (Some(min), Some(max)) => writeln!(f, "  Weight range: {}..={}", min, max)?,
            _ => writeln!(f, "  Weight range: -")?,
        }
        writeln!(f, "  Avg weight: {:.2}", self.avg_weight)
    }
}
