//! Nearest insertion of an arbitrary city.
//!
//! The tour is seeded as `[v0, nearest(v0), v0]` where `v0` is the smallest
//! vertex id. The remaining vertices are then taken in ascending id order and
//! each one is spliced in between the adjacent pair whose replacement costs
//! the least:
//!
//! ```text
//! cost(i) = w(tour[i], v) + w(v, tour[i + 1]) - w(tour[i], tour[i + 1])
//! ```
//!
//! Ties go to the earliest position. Every step is deterministic for a fixed
//! edge-list order.

use crate::error::{TspError, TspResult};
use crate::instance::{EdgeIndex, GraphInstance, VertexId, Weight};
use crate::solution::Solution;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &GraphInstance) -> TspResult<Solution>;
    fn name(&self) -> &str;
}

/// How edge weights are looked up during construction
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum EdgeLookup {
    /// Linear scan of the edge list on every query
    #[default]
    Scan,
    /// Hash index built once per run. Same answers as `Scan`.
    Indexed,
}

/// Edge weight source used by the insertion step
#[derive(Debug)]
pub enum EdgeWeights<'a> {
    Scan(&'a GraphInstance),
    Indexed(EdgeIndex),
}

impl<'a> EdgeWeights<'a> {
    pub fn new(instance: &'a GraphInstance, lookup: EdgeLookup) -> Self {
        match lookup {
            EdgeLookup::Scan => EdgeWeights::Scan(instance),
            EdgeLookup::Indexed => EdgeWeights::Indexed(EdgeIndex::build(instance)),
        }
    }

    /// Weight of the edge joining `a` and `b`
    pub fn weight(&self, a: VertexId, b: VertexId) -> TspResult<Weight> {
        let edge = match self {
            EdgeWeights::Scan(instance) => instance.find_edge(a, b)?,
            EdgeWeights::Indexed(index) => index.find_edge(a, b)?,
        };
        Ok(edge.weight)
    }
}

/// Where a vertex goes: between `tour[position]` and `tour[position + 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub position: usize,
    /// Marginal cost. `None` when the tour was a one-vertex seed `[v, v]`.
    pub cost: Option<Weight>,
}

/// Build the seed tour `[v0, nearest(v0), v0]`.
///
/// `v0` is the smallest vertex id of the instance.
pub fn initialize(instance: &GraphInstance) -> TspResult<Vec<VertexId>> {
    let first = *instance
        .sorted_vertices()
        .first()
        .ok_or(TspError::EmptyGraph)?;
    let nearest = instance.nearest_vertex(first)?;

    Ok(vec![first, nearest, first])
}

/// Find the cheapest position to insert `vertex` into a closed `tour`
pub fn best_insertion(weights: &EdgeWeights<'_>, tour: &[VertexId], vertex: VertexId) -> TspResult<Insertion> {
    if tour.len() < 2 {
        return Err(TspError::TourTooShort(tour.len()));
    }
    if tour.len() == 2 && tour[0] == tour[1] {
        return Ok(Insertion { position: 0, cost: None });
    }

    let mut best: Option<(usize, Weight)> = None;

    for (position, pair) in tour.windows(2).enumerate() {
        let (prev, next) = (pair[0], pair[1]);
        let cost = marginal_cost(
            weights.weight(prev, vertex)?,
            weights.weight(vertex, next)?,
            weights.weight(prev, next)?,
        )?;
        trace!("vertex {} between {} and {}: cost {}", vertex, prev, next, cost);

        match best {
            Some((_, best_cost)) if cost >= best_cost => {}
            _ => best = Some((position, cost)),
        }
    }

    // windows(2) over at least two entries yields a candidate
    let (position, cost) = best.ok_or(TspError::TourTooShort(tour.len()))?;
    Ok(Insertion { position, cost: Some(cost) })
}

/// `to + from - replaced`, exact even when the partial sum exceeds `Weight`
fn marginal_cost(to: Weight, from: Weight, replaced: Weight) -> TspResult<Weight> {
    let cost = to as i128 + from as i128 - replaced as i128;
    Weight::try_from(cost)
        .map_err(|_| TspError::WeightOverflow(format!("computing insertion cost {}", cost)))
}

/// Return a copy of `tour` with `vertex` inserted at its cheapest position
pub fn insert_vertex(weights: &EdgeWeights<'_>, tour: &[VertexId], vertex: VertexId) -> TspResult<Vec<VertexId>> {
    let insertion = best_insertion(weights, tour, vertex)?;
    let mut result = tour.to_vec();
    result.insert(insertion.position + 1, vertex);
    Ok(result)
}

/// Construction progress of a [`TourBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Uninitialized,
    Seeded,
    /// `k` vertices inserted after seeding
    Growing(usize),
    Complete,
}

/// One applied insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionStep {
    pub vertex: VertexId,
    pub position: usize,
    pub cost: Option<Weight>,
}

/// Step-by-step tour construction over one instance.
///
/// The vertices left after seeding are fixed once, in ascending id order, and
/// consumed one per [`step`](TourBuilder::step).
pub struct TourBuilder<'a> {
    instance: &'a GraphInstance,
    weights: EdgeWeights<'a>,
    tour: Vec<VertexId>,
    remaining: Vec<VertexId>,
    next: usize,
    state: BuildState,
}

impl<'a> TourBuilder<'a> {
    pub fn new(instance: &'a GraphInstance, lookup: EdgeLookup) -> Self {
        TourBuilder {
            instance,
            weights: EdgeWeights::new(instance, lookup),
            tour: Vec::new(),
            remaining: Vec::new(),
            next: 0,
            state: BuildState::Uninitialized,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Current closed tour (empty before seeding)
    pub fn tour(&self) -> &[VertexId] {
        &self.tour
    }

    /// Vertices not yet inserted
    pub fn remaining(&self) -> &[VertexId] {
        &self.remaining[self.next..]
    }

    /// Seed the tour. Does nothing once seeded.
    pub fn seed(&mut self) -> TspResult<&[VertexId]> {
        if self.state == BuildState::Uninitialized {
            self.tour = initialize(self.instance)?;
            self.remaining = self
                .instance
                .sorted_vertices()
                .into_iter()
                .filter(|v| !self.tour.contains(v))
                .collect();
            self.next = 0;
            self.state = BuildState::Seeded;
            debug!("seed tour {:?}, {} vertices left", self.tour, self.remaining.len());
        }
        Ok(self.tour.as_slice())
    }

    /// Insert the next remaining vertex.
    ///
    /// Returns `None` once every vertex is in the tour.
    pub fn step(&mut self) -> TspResult<Option<InsertionStep>> {
        self.seed()?;

        let inserted = match self.state {
            BuildState::Complete => return Ok(None),
            BuildState::Growing(k) => k,
            _ => 0,
        };

        let Some(&vertex) = self.remaining.get(self.next) else {
            self.state = BuildState::Complete;
            return Ok(None);
        };

        let insertion = best_insertion(&self.weights, &self.tour, vertex)?;
        self.tour.insert(insertion.position + 1, vertex);
        self.next += 1;
        self.state = BuildState::Growing(inserted + 1);

        debug!(
            "inserted {} after position {} (cost {:?})",
            vertex, insertion.position, insertion.cost
        );

        Ok(Some(InsertionStep {
            vertex,
            position: insertion.position,
            cost: insertion.cost,
        }))
    }

    /// Run to completion and return the closed tour
    pub fn run(mut self) -> TspResult<Vec<VertexId>> {
        while self.step()?.is_some() {}
        Ok(self.tour)
    }
}

/// Nearest insertion of an arbitrary city
pub struct NearestInsertionHeuristic {
    pub lookup: EdgeLookup,
}

impl NearestInsertionHeuristic {
    pub fn new() -> Self {
        NearestInsertionHeuristic { lookup: EdgeLookup::Scan }
    }

    pub fn indexed() -> Self {
        NearestInsertionHeuristic { lookup: EdgeLookup::Indexed }
    }

    pub fn with_lookup(lookup: EdgeLookup) -> Self {
        NearestInsertionHeuristic { lookup }
    }
}

impl Default for NearestInsertionHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestInsertionHeuristic {
    fn construct(&self, instance: &GraphInstance) -> TspResult<Solution> {
        let start = std::time::Instant::now();
        info!(
            "{}: building tour over {} edges with {:?} lookup",
            instance.name,
            instance.num_edges(),
            self.lookup
        );

        let mut builder = TourBuilder::new(instance, self.lookup);
        builder.seed()?;
        let iterations = builder.remaining().len();
        let tour = builder.run()?;

        let mut solution = Solution::from_tour(instance, tour, self.name())?;
        solution.iterations = iterations;
        solution.computation_time = start.elapsed().as_secs_f64();

        info!(
            "{}: tour of {} vertices, weight {}",
            instance.name,
            solution.tour.len().saturating_sub(1),
            solution.weight
        );
        Ok(solution)
    }

    fn name(&self) -> &str {
        match self.lookup {
            EdgeLookup::Scan => "NearestInsertion",
            EdgeLookup::Indexed => "NearestInsertion-Indexed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GraphInstance {
        GraphInstance::parse("triangle", "1 2 5\n2 3 7\n1 3 9\n").unwrap()
    }

    /// Vertex 4 is far from 1 and 2 but close to 3
    fn square() -> GraphInstance {
        GraphInstance::parse(
            "square",
            "1 2 1\n2 3 1\n1 3 1\n1 4 10\n2 4 10\n3 4 1\n",
        )
        .unwrap()
    }

    #[test]
    fn test_initialize() {
        assert_eq!(initialize(&triangle()).unwrap(), vec![1, 2, 1]);

        let empty = GraphInstance::new("empty", Vec::new());
        assert!(matches!(initialize(&empty), Err(TspError::EmptyGraph)));
    }

    #[test]
    fn test_initialize_uses_smallest_id() {
        let instance = GraphInstance::parse("t", "9 4 3\n4 7 1\n9 7 2\n").unwrap();
        assert_eq!(initialize(&instance).unwrap(), vec![4, 7, 4]);
    }

    #[test]
    fn test_edge_weights_debug() {
        let instance = triangle();
        let scan = format!("{:?}", EdgeWeights::new(&instance, EdgeLookup::Scan));
        let indexed = format!("{:?}", EdgeWeights::new(&instance, EdgeLookup::Indexed));
        assert!(scan.starts_with("Scan("));
        assert!(indexed.starts_with("Indexed("));
    }

    #[test]
    fn test_triangle_tie_takes_first_position() {
        let instance = triangle();
        let weights = EdgeWeights::new(&instance, EdgeLookup::Scan);

        let insertion = best_insertion(&weights, &[1, 2, 1], 3).unwrap();
        assert_eq!(insertion, Insertion { position: 0, cost: Some(11) });
        assert_eq!(insert_vertex(&weights, &[1, 2, 1], 3).unwrap(), vec![1, 3, 2, 1]);
    }

    #[test]
    fn test_cheapest_position_with_later_tie() {
        let instance = square();
        let weights = EdgeWeights::new(&instance, EdgeLookup::Scan);

        // positions: (1,2) = 19, (2,3) = 10, (3,1) = 10
        let insertion = best_insertion(&weights, &[1, 2, 3, 1], 4).unwrap();
        assert_eq!(insertion, Insertion { position: 1, cost: Some(10) });
        assert_eq!(insert_vertex(&weights, &[1, 2, 3, 1], 4).unwrap(), vec![1, 2, 4, 3, 1]);
    }

    #[test]
    fn test_degenerate_seed_shortcut() {
        let instance = triangle();
        let weights = EdgeWeights::new(&instance, EdgeLookup::Scan);

        assert_eq!(insert_vertex(&weights, &[1, 1], 3).unwrap(), vec![1, 3, 1]);
        assert_eq!(insert_vertex(&weights, &[2, 2], 3).unwrap(), vec![2, 3, 2]);
    }

    #[test]
    fn test_insert_into_short_tour_fails() {
        let instance = triangle();
        let weights = EdgeWeights::new(&instance, EdgeLookup::Scan);

        assert!(matches!(best_insertion(&weights, &[], 3), Err(TspError::TourTooShort(0))));
        assert!(matches!(best_insertion(&weights, &[1], 3), Err(TspError::TourTooShort(1))));
    }

    #[test]
    fn test_insert_fails_on_incomplete_graph() {
        let instance = GraphInstance::parse("path", "1 2 1\n2 3 1\n").unwrap();
        let weights = EdgeWeights::new(&instance, EdgeLookup::Indexed);

        let err = best_insertion(&weights, &[1, 2, 1], 3).unwrap_err();
        assert!(matches!(err, TspError::IncompleteGraph { first: 1, second: 3 }));
    }

    #[test]
    fn test_builder_state_transitions() {
        let instance = square();
        let mut builder = TourBuilder::new(&instance, EdgeLookup::Scan);
        assert_eq!(builder.state(), BuildState::Uninitialized);
        assert!(builder.tour().is_empty());

        assert_eq!(builder.seed().unwrap(), &[1, 2, 1]);
        assert_eq!(builder.state(), BuildState::Seeded);
        assert_eq!(builder.remaining(), &[3, 4]);

        let step = builder.step().unwrap().unwrap();
        assert_eq!(step, InsertionStep { vertex: 3, position: 0, cost: Some(1) });
        assert_eq!(builder.state(), BuildState::Growing(1));
        assert_eq!(builder.tour(), &[1, 3, 2, 1]);

        let step = builder.step().unwrap().unwrap();
        assert_eq!(step, InsertionStep { vertex: 4, position: 0, cost: Some(10) });
        assert_eq!(builder.state(), BuildState::Growing(2));
        assert_eq!(builder.tour(), &[1, 4, 3, 2, 1]);

        assert_eq!(builder.step().unwrap(), None);
        assert_eq!(builder.state(), BuildState::Complete);
        assert_eq!(builder.step().unwrap(), None);
    }

    #[test]
    fn test_step_seeds_lazily() {
        let instance = triangle();
        let mut builder = TourBuilder::new(&instance, EdgeLookup::Scan);

        let step = builder.step().unwrap().unwrap();
        assert_eq!(step.vertex, 3);
        assert_eq!(builder.tour(), &[1, 3, 2, 1]);
    }

    #[test]
    fn test_two_vertex_graph() {
        let instance = GraphInstance::parse("pair", "1 2 5\n").unwrap();
        let solution = NearestInsertionHeuristic::new().construct(&instance).unwrap();

        assert_eq!(solution.tour, vec![1, 2, 1]);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.render(), "10\n1,2\n");
    }

    #[test]
    fn test_nearest_insertion_triangle() {
        let solution = NearestInsertionHeuristic::new().construct(&triangle()).unwrap();

        assert_eq!(solution.tour, vec![1, 3, 2, 1]);
        assert_eq!(solution.weight, 21);
        assert_eq!(solution.iterations, 1);
        assert_eq!(solution.algorithm, "NearestInsertion");
        assert_eq!(solution.render(), "21\n1,3,2\n");
    }

    #[test]
    fn test_lookup_strategies_agree() {
        let instance = GraphInstance::parse(
            "four",
            "3 2 3\n4 1 18\n4 3 27\n1 3 8\n2 4 19\n1 2 19\n",
        )
        .unwrap();

        let scan = NearestInsertionHeuristic::new().construct(&instance).unwrap();
        let indexed = NearestInsertionHeuristic::indexed().construct(&instance).unwrap();

        assert_eq!(scan.tour, vec![1, 4, 2, 3, 1]);
        assert_eq!(scan.weight, 48);
        assert_eq!(scan.tour, indexed.tour);
        assert_eq!(scan.weight, indexed.weight);
        assert_eq!(indexed.algorithm, "NearestInsertion-Indexed");
    }

    #[test]
    fn test_large_weights_insertion_cost_is_exact() {
        let w = i64::MAX / 2 + 1;
        let instance = GraphInstance::parse("big", &format!("1 2 {w}\n2 3 {w}\n1 3 {w}\n")).unwrap();
        let weights = EdgeWeights::new(&instance, EdgeLookup::Scan);

        let insertion = best_insertion(&weights, &[1, 2, 1], 3).unwrap();
        assert_eq!(insertion, Insertion { position: 0, cost: Some(w) });
    }

    #[test]
    fn test_insertion_cost_overflow() {
        let instance = GraphInstance::parse(
            "huge",
            &format!("1 2 0\n2 3 {max}\n1 3 {max}\n", max = i64::MAX),
        )
        .unwrap();
        let weights = EdgeWeights::new(&instance, EdgeLookup::Indexed);

        let err = best_insertion(&weights, &[1, 2, 1], 3).unwrap_err();
        assert!(matches!(err, TspError::WeightOverflow(_)));
    }

    #[test]
    fn test_construct_large_weights() {
        let w = i64::MAX / 2;
        let pair = GraphInstance::parse("pair", &format!("1 2 {w}\n")).unwrap();
        let solution = NearestInsertionHeuristic::new().construct(&pair).unwrap();
        assert_eq!(solution.weight, i64::MAX - 1);

        let triangle = GraphInstance::parse("big", &format!("1 2 {w}\n2 3 {w}\n1 3 {w}\n")).unwrap();
        let err = NearestInsertionHeuristic::new().construct(&triangle).unwrap_err();
        assert!(matches!(err, TspError::WeightOverflow(_)));
    }

    #[test]
    fn test_construct_empty_graph_fails() {
        let empty = GraphInstance::new("empty", Vec::new());
        let err = NearestInsertionHeuristic::new().construct(&empty).unwrap_err();
        assert!(matches!(err, TspError::EmptyGraph));
    }

    #[test]
    fn test_construct_incomplete_graph_fails() {
        let instance = GraphInstance::parse("star", "1 2 1\n1 3 1\n1 4 1\n").unwrap();
        let err = NearestInsertionHeuristic::new().construct(&instance).unwrap_err();
        assert!(matches!(err, TspError::IncompleteGraph { .. }));
    }
}
