//! Nearest Insertion TSP Library
//!
//! Approximate Traveling Salesman tours over complete weighted graphs given
//! as edge lists, built with the "nearest insertion of an arbitrary city"
//! heuristic.
//!
//! # Features
//!
//! - Edge-list parsing (`first second weight` per line)
//! - Seeded insertion heuristic with deterministic tie-breaking
//! - Step-by-step construction through `TourBuilder`
//! - Linear-scan or hash-indexed edge lookup with identical results
//! - Result file output, fixture verification and benchmarking
//!
//! # Example
//!
//! ```
//! use nearest_insertion_tsp::instance::GraphInstance;
//! use nearest_insertion_tsp::heuristics::construction::{ConstructionHeuristic, NearestInsertionHeuristic};
//!
//! let instance = GraphInstance::parse("triangle", "1 2 5\n2 3 7\n1 3 9\n").unwrap();
//! let solution = NearestInsertionHeuristic::new().construct(&instance).unwrap();
//!
//! assert_eq!(solution.tour, vec![1, 3, 2, 1]);
//! assert_eq!(solution.render(), "21\n1,3,2\n");
//! ```

pub mod error;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod benchmark;

pub use error::{TspError, TspResult};
pub use instance::GraphInstance;
pub use solution::Solution;
