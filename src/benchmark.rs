//! Benchmarking and fixture verification.
//!
//! Runs the heuristic over a directory of edge-list files with every lookup
//! strategy, collects timings, and checks that the strategies agree on the
//! tour they build.

use crate::error::{TspError, TspResult};
use crate::heuristics::construction::{ConstructionHeuristic, EdgeLookup, NearestInsertionHeuristic};
use crate::instance::{GraphInstance, Weight};
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub algorithm: String,
    pub instance: String,
    pub num_vertices: usize,
    pub num_edges: usize,
    /// Run index within the instance
    pub run: usize,
    /// Tour weight, absent when construction failed
    pub weight: Option<Weight>,
    /// Open tour, comma-separated
    pub tour: Option<String>,
    /// Computation time in seconds
    pub time: f64,
    pub error: Option<String>,
}

impl AlgorithmResult {
    pub fn solved(&self) -> bool {
        self.weight.is_some()
    }
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    /// Number of recorded runs
    pub num_runs: usize,
    /// Number of runs that produced a tour
    pub num_solved: usize,
    pub avg_weight: f64,
    pub best_weight: Weight,
    pub worst_weight: Weight,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of runs per instance and lookup strategy
    pub num_runs: usize,
    /// Lookup strategies to compare
    pub lookups: Vec<EdgeLookup>,
    /// Run instances in parallel
    pub parallel: bool,
    /// Show a progress bar
    pub progress: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            lookups: vec![EdgeLookup::Scan, EdgeLookup::Indexed],
            parallel: true,
            progress: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    /// Instances on which lookup strategies built different tours
    mismatches: Vec<String>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            mismatches: Vec::new(),
        }
    }

    /// Run every configured strategy on one instance
    pub fn run_instance(&self, instance: &GraphInstance) -> Vec<AlgorithmResult> {
        info!("Running benchmark on instance: {}", instance.name);

        let num_vertices = instance.num_vertices();
        let mut results = Vec::new();

        for &lookup in &self.config.lookups {
            let heuristic = NearestInsertionHeuristic::with_lookup(lookup);
            for run in 0..self.config.num_runs {
                let mut result = AlgorithmResult {
                    algorithm: heuristic.name().to_string(),
                    instance: instance.name.clone(),
                    num_vertices,
                    num_edges: instance.num_edges(),
                    run,
                    weight: None,
                    tour: None,
                    time: 0.0,
                    error: None,
                };

                match heuristic.construct(instance) {
                    Ok(solution) => {
                        result.weight = Some(solution.weight);
                        result.tour = Some(open_tour(&solution));
                        result.time = solution.computation_time;
                    }
                    Err(e) => {
                        warn!("{} failed on {}: {}", heuristic.name(), instance.name, e);
                        result.error = Some(e.to_string());
                    }
                }

                results.push(result);
            }
        }

        results
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[GraphInstance]) {
        let bar = if self.config.progress {
            ProgressBar::new(instances.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
            bar.set_style(style);
        }

        let per_instance: Vec<Vec<AlgorithmResult>> = if self.config.parallel {
            instances
                .par_iter()
                .map(|instance| {
                    let results = self.run_instance(instance);
                    bar.inc(1);
                    results
                })
                .collect()
        } else {
            instances
                .iter()
                .map(|instance| {
                    bar.set_message(instance.name.clone());
                    let results = self.run_instance(instance);
                    bar.inc(1);
                    results
                })
                .collect()
        };
        bar.finish_and_clear();

        for results in per_instance {
            self.check_agreement(&results);
            self.results.extend(results);
        }
    }

    /// Record the instance if its solved runs did not all build the same tour
    fn check_agreement(&mut self, results: &[AlgorithmResult]) {
        let mut tours = results.iter().filter_map(|r| r.tour.as_ref());
        if let Some(first) = tours.next() {
            if tours.any(|tour| tour != first) {
                let name = results[0].instance.clone();
                warn!("{}: lookup strategies built different tours", name);
                self.mismatches.push(name);
            }
        }
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map.entry(result.algorithm.clone())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let solved: Vec<_> = results.iter().filter(|r| r.solved()).collect();
            if solved.is_empty() {
                continue;
            }

            let weights: Vec<Weight> = solved.iter().filter_map(|r| r.weight).collect();
            let times: Vec<f64> = solved.iter().map(|r| r.time).collect();

            let total_time = times.iter().sum::<f64>();

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_runs: results.len(),
                num_solved: solved.len(),
                avg_weight: weights.iter().map(|&w| w as f64).sum::<f64>() / weights.len() as f64,
                best_weight: weights.iter().copied().min().unwrap_or_default(),
                worst_weight: weights.iter().copied().max().unwrap_or_default(),
                avg_time: total_time / times.len() as f64,
                total_time,
            });
        }

        statistics.sort_by(|a, b| a.algorithm.cmp(&b.algorithm));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("   Nearest Insertion Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!("{:<28} {:>10} {:>12} {:>10} {:>10} {:>10}\n",
            "Algorithm", "Solved", "Avg Weight", "Best", "Worst", "Avg Time"));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!("{:<28} {:>10} {:>12.2} {:>10} {:>10} {:>10.6}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_solved, stat.num_runs),
                stat.avg_weight,
                stat.best_weight,
                stat.worst_weight,
                stat.avg_time));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        report.push_str("\nTour Weight per Instance:\n");

        let mut per_instance: BTreeMap<&str, &AlgorithmResult> = BTreeMap::new();
        for result in self.results.iter().filter(|r| r.solved()) {
            per_instance.entry(result.instance.as_str()).or_insert(result);
        }
        for (instance, result) in &per_instance {
            report.push_str(&format!("  {}: {} (n={})\n",
                instance,
                result.weight.unwrap_or_default(),
                result.num_vertices));
        }

        if self.mismatches.is_empty() {
            report.push_str("\nAll lookup strategies agree.\n");
        } else {
            report.push_str(&format!("\nStrategy mismatches: {}\n", self.mismatches.join(", ")));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Instances where lookup strategies disagreed
    pub fn mismatches(&self) -> &[String] {
        &self.mismatches
    }
}

fn open_tour(solution: &Solution) -> String {
    solution.open_sequence()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Helper function to load instances from a directory
///
/// Every `.txt` file that parses as an edge list is loaded. Instances are
/// sorted by vertex count, then by name.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> TspResult<Vec<GraphInstance>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| TspError::io(dir, e))?;

    let mut instances = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "txt").unwrap_or(false) {
            match GraphInstance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    instances.sort_by(|a, b| {
        a.num_vertices().cmp(&b.num_vertices()).then_with(|| a.name.cmp(&b.name))
    });

    Ok(instances)
}

/// Solve `instance` and compare the rendered result with the file at `expected`
pub fn verify_output<H, P>(heuristic: &H, instance: &GraphInstance, expected: P) -> TspResult<Solution>
where
    H: ConstructionHeuristic,
    P: AsRef<Path>,
{
    let expected_path = expected.as_ref();
    let expected = std::fs::read_to_string(expected_path).map_err(|e| TspError::io(expected_path, e))?;

    let solution = heuristic.construct(instance)?;
    let actual = solution.render();
    if actual != expected {
        return Err(TspError::FixtureMismatch { expected, actual });
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances() -> Vec<GraphInstance> {
        vec![
            GraphInstance::parse("triangle", "1 2 5\n2 3 7\n1 3 9\n").unwrap(),
            GraphInstance::parse("four", "3 2 3\n4 1 18\n4 3 27\n1 3 8\n2 4 19\n1 2 19\n").unwrap(),
            GraphInstance::parse("path", "1 2 1\n2 3 1\n").unwrap(),
        ]
    }

    fn quiet_config() -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs: 2,
            progress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert_eq!(config.lookups, vec![EdgeLookup::Scan, EdgeLookup::Indexed]);
    }

    #[test]
    fn test_run_records_every_run() {
        let mut benchmark = Benchmark::new(quiet_config());
        benchmark.run_on_instances(&instances());

        // 3 instances x 2 lookups x 2 runs
        assert_eq!(benchmark.results().len(), 12);
        assert!(benchmark.mismatches().is_empty());

        let failed: Vec<_> = benchmark.results().iter().filter(|r| !r.solved()).collect();
        assert_eq!(failed.len(), 4);
        assert!(failed.iter().all(|r| r.instance == "path" && r.error.is_some()));
    }

    #[test]
    fn test_statistics() {
        let mut benchmark = Benchmark::new(BenchmarkConfig { parallel: false, ..quiet_config() });
        benchmark.run_on_instances(&instances());

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].algorithm, "NearestInsertion");
        assert_eq!(stats[0].num_runs, 6);
        assert_eq!(stats[0].num_solved, 4);
        assert_eq!(stats[0].best_weight, 21);
        assert_eq!(stats[0].worst_weight, 48);

        let report = benchmark.generate_report();
        assert!(report.contains("triangle: 21 (n=3)"));
        assert!(report.contains("All lookup strategies agree."));
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut benchmark = Benchmark::new(quiet_config());
        benchmark.run_on_instances(&instances()[..1]);

        let path = dir.path().join("results.csv");
        benchmark.export_to_csv(&path).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with("algorithm,instance,num_vertices"));
        assert_eq!(csv.lines().count(), 5);
    }

    #[test]
    fn test_load_instances_skips_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "1 2 5\n2 3 7\n1 3 9\n").unwrap();
        std::fs::write(dir.path().join("a.txt"), "1 2 5\n").unwrap();
        std::fs::write(dir.path().join("bad.txt"), "21\n1,3,2\n").unwrap();
        std::fs::write(dir.path().join("other.csv"), "1 2 5\n").unwrap();

        let instances = load_instances_from_dir(dir.path()).unwrap();
        let names: Vec<_> = instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_verify_output() {
        let dir = tempfile::tempdir().unwrap();
        let instance = instances().remove(0);
        let heuristic = NearestInsertionHeuristic::new();

        let good = dir.path().join("good.txt");
        std::fs::write(&good, "21\n1,3,2\n").unwrap();
        let solution = verify_output(&heuristic, &instance, &good).unwrap();
        assert_eq!(solution.weight, 21);

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "21\n1,2,3\n").unwrap();
        let err = verify_output(&heuristic, &instance, &bad).unwrap_err();
        assert!(matches!(err, TspError::FixtureMismatch { .. }));
    }
}
