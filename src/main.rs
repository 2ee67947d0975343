//! Nearest Insertion TSP - Command Line Interface

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use nearest_insertion_tsp::benchmark::{load_instances_from_dir, verify_output, Benchmark, BenchmarkConfig};
use nearest_insertion_tsp::heuristics::construction::{ConstructionHeuristic, EdgeLookup, NearestInsertionHeuristic};
use nearest_insertion_tsp::instance::GraphInstance;
use nearest_insertion_tsp::{TspError, TspResult};

use std::path::{Path, PathBuf};
use std::process::ExitCode;

const RESULT_SUFFIX: &str = "_nearest_insertion_of_arbitrary_city.txt";

#[derive(Parser)]
#[command(name = "nearest-insertion-tsp")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Approximate TSP tours by nearest insertion of an arbitrary city")]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a tour for an edge-list file and write the result file
    Solve {
        /// Path to the edge-list file
        #[arg(short, long)]
        input: PathBuf,

        /// Result file (defaults to <input>_nearest_insertion_of_arbitrary_city.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Edge lookup strategy
        #[arg(long, value_enum, default_value = "scan")]
        lookup: Lookup,

        /// Also save the solution as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the edge-list file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Solve an instance and compare against an expected result file
    Verify {
        /// Path to the edge-list file
        #[arg(short, long)]
        input: PathBuf,

        /// Expected result file
        #[arg(short, long)]
        expected: PathBuf,

        /// Edge lookup strategy
        #[arg(long, value_enum, default_value = "scan")]
        lookup: Lookup,
    },

    /// Run benchmarks on a directory of edge-list files
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per instance and lookup strategy
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Run instances one after another
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Lookup {
    /// Linear scan of the edge list
    Scan,
    /// Hash index built once per run
    Indexed,
}

impl From<Lookup> for EdgeLookup {
    fn from(lookup: Lookup) -> Self {
        match lookup {
            Lookup::Scan => EdgeLookup::Scan,
            Lookup::Indexed => EdgeLookup::Indexed,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Solve { input, output, lookup, json } => {
            solve_instance(&input, output, lookup.into(), json)
        }
        Commands::Analyze { input } => analyze_instance(&input),
        Commands::Verify { input, expected, lookup } => {
            verify_instance(&input, &expected, lookup.into())
        }
        Commands::Benchmark { dir, output, runs, sequential } => {
            run_benchmark(&dir, &output, runs, !sequential)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", stem, RESULT_SUFFIX))
}

fn solve_instance(
    path: &Path,
    output: Option<PathBuf>,
    lookup: EdgeLookup,
    json: Option<PathBuf>,
) -> TspResult<()> {
    info!("Loading instance from {:?}...", path);
    let instance = GraphInstance::from_file(path)?;

    let heuristic = NearestInsertionHeuristic::with_lookup(lookup);
    let solution = heuristic.construct(&instance)?;

    println!("\n========== Results ==========");
    print!("{}", solution);

    let out_path = output.unwrap_or_else(|| default_output_path(path));
    solution.write_to_file(&out_path)?;
    println!("\nResult saved to {:?}", out_path);

    if let Some(json_path) = json {
        let json = serde_json::to_string_pretty(&solution)
            .map_err(|e| TspError::io(&json_path, e.into()))?;
        std::fs::write(&json_path, json).map_err(|e| TspError::io(&json_path, e))?;
        println!("Solution saved to {:?}", json_path);
    }

    Ok(())
}

fn analyze_instance(path: &Path) -> TspResult<()> {
    let instance = GraphInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    print!("{}", instance.statistics());

    let duplicates = instance.duplicate_pairs();
    if !duplicates.is_empty() {
        println!("\nDuplicate pairs (first listed edge wins):");
        for (a, b) in duplicates {
            println!("  {}-{}", a, b);
        }
    }

    Ok(())
}

fn verify_instance(path: &Path, expected: &Path, lookup: EdgeLookup) -> TspResult<()> {
    let instance = GraphInstance::from_file(path)?;
    let heuristic = NearestInsertionHeuristic::with_lookup(lookup);

    let solution = verify_output(&heuristic, &instance, expected)?;
    println!("{}: OK (weight {})", instance.name, solution.weight);
    Ok(())
}

fn run_benchmark(dir: &Path, output: &Path, runs: usize, parallel: bool) -> TspResult<()> {
    info!("Loading instances from {:?}...", dir);

    let instances = load_instances_from_dir(dir)?;
    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return Ok(());
    }

    std::fs::create_dir_all(output).map_err(|e| TspError::io(output, e))?;

    let config = BenchmarkConfig {
        num_runs: runs,
        parallel,
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(&instances);

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path).map_err(|e| TspError::io(&results_path, e))?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path).map_err(|e| TspError::io(&stats_path, e))?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).map_err(|e| TspError::io(&report_path, e))?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}
