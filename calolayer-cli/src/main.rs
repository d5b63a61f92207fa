//!
//! Command-line driver: loads a shower dataset and exports the per-layer
//! energy table, distributions and event hit lists as CSV.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use calolayer_algorithms::{
    AggregationStrategy, Histogram1D, LayerEnergyAggregator, LayerEnergyTable, LayerMap,
    HITS_PER_EVENT_BINS, TRUE_ENERGY_BINS,
};
use calolayer_core::ShowerDataset;
use calolayer_io::{
    dataset_names, read_shower_hdf5, CsvWriter, OutOfCoreConfig, PathsConfig,
    DEFAULT_CONFIG_FILE, DEFAULT_DATA_FILE,
};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    CalolayerIo(#[from] calolayer_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] calolayer_core::Error),

    #[error("dataset {0} has no 'target' column")]
    MissingTarget(PathBuf),
}

/// Per-layer energy aggregation for calorimeter shower data.
#[derive(Parser)]
#[command(name = "calolayer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Paths config (JSON with `data_dir` and `figures_dir`)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the per-event, per-layer average-energy table
    Layers {
        /// Dataset file, relative to `data_dir`
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,

        /// Events per window (batched aggregation)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Size windows from this fraction of available memory
        #[arg(long, conflicts_with = "batch_size")]
        memory_fraction: Option<f64>,

        /// Size windows from an explicit memory budget (bytes)
        #[arg(long, conflicts_with_all = ["batch_size", "memory_fraction"])]
        memory_budget: Option<usize>,

        /// Worker threads for window processing
        #[arg(short, long)]
        threads: Option<usize>,

        /// Fail if the dataset has no events
        #[arg(long)]
        require_events: bool,

        /// Rows to print after aggregation
        #[arg(long, default_value = "5")]
        preview: usize,

        /// Output CSV (default: <figures_dir>/layer_energy.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one event's hits for 3D display
    Event {
        /// Dataset file, relative to `data_dir`
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,

        /// Event index
        #[arg(short, long, default_value = "200", allow_negative_numbers = true)]
        index: i64,

        /// Output CSV (default: <figures_dir>/event_display_<index>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Histogram of hits per event
    HitsHist {
        /// Dataset file, relative to `data_dir`
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,

        /// Number of bins
        #[arg(long, default_value_t = HITS_PER_EVENT_BINS)]
        bins: usize,

        /// Output CSV (default: <figures_dir>/hits_per_event.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Histogram of true shower energy
    EnergyHist {
        /// Dataset file, relative to `data_dir`
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,

        /// Number of bins
        #[arg(long, default_value_t = TRUE_ENERGY_BINS)]
        bins: usize,

        /// Output CSV (default: <figures_dir>/true_energy_distribution.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the distinct layer positions
    LayerPositions {
        /// Dataset file, relative to `data_dir`
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,

        /// Output CSV (default: <figures_dir>/layer_positions.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show information about a dataset
    Info {
        /// Dataset file, relative to `data_dir`
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = PathsConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Layers {
            input,
            batch_size,
            memory_fraction,
            memory_budget,
            threads,
            require_events,
            preview,
            output,
        } => {
            let dataset = load(&config, &input)?;

            let start = Instant::now();
            let strategy = if memory_fraction.is_some() || memory_budget.is_some() {
                let mut sizing = OutOfCoreConfig::default();
                if let Some(fraction) = memory_fraction {
                    sizing = sizing.with_memory_fraction(fraction);
                }
                if let Some(bytes) = memory_budget {
                    sizing = sizing.with_memory_budget_bytes(bytes);
                }
                if let Some(threads) = threads {
                    sizing = sizing.try_with_parallelism(threads)?;
                }
                let n_layers = LayerMap::from_positions(&dataset.hits().z).len();
                sizing.strategy(dataset.n_events(), dataset.total_hits(), n_layers)?
            } else {
                choose_strategy(dataset.n_events(), batch_size, threads)?
            };
            log::info!("strategy: {:?}", strategy);

            let table = LayerEnergyAggregator::new(strategy)
                .with_require_events(require_events)
                .aggregate_dataset(&dataset)?;
            let elapsed = start.elapsed();

            print_preview(&table, preview);
            println!(
                "{} events x {} layers prepared in {:.6} seconds",
                table.n_events(),
                table.n_layers(),
                elapsed.as_secs_f64()
            );

            let path = output_path(&config, output, "layer_energy.csv")?;
            CsvWriter::create(&path)?.write_layer_table(&table)?;
            println!("Saved table as {}", path.display());
        }

        Commands::Event {
            input,
            index,
            output,
        } => {
            let dataset = load(&config, &input)?;
            let index = usize::try_from(index).map_err(|_| {
                calolayer_core::Error::InvalidInput(format!("event index {index} is negative"))
            })?;
            let event = dataset.event(index)?;

            match event.true_energy {
                Some(true_energy) => println!(
                    "Event {}: {} hits, True E = {:.1} GeV",
                    index,
                    event.len(),
                    true_energy
                ),
                None => println!("Event {}: {} hits", index, event.len()),
            }
            println!("Deposited energy: {:.2} MIP", event.total_energy());

            let path = output_path(&config, output, &format!("event_display_{index}.csv"))?;
            CsvWriter::create(&path)?.write_event_hits(&event)?;
            println!("Saved event hits as {}", path.display());
        }

        Commands::HitsHist {
            input,
            bins,
            output,
        } => {
            let dataset = load(&config, &input)?;
            let hist = Histogram1D::from_counts(dataset.nhits(), bins)?;
            let path = output_path(&config, output, "hits_per_event.csv")?;
            CsvWriter::create(&path)?.write_histogram(&hist)?;
            println!(
                "Histogram of {} events in {} bins saved as {}",
                hist.total(),
                hist.bins(),
                path.display()
            );
        }

        Commands::EnergyHist {
            input,
            bins,
            output,
        } => {
            let dataset = load(&config, &input)?;
            let target = dataset
                .target()
                .ok_or_else(|| CliError::MissingTarget(config.data_file(&input)))?;
            let hist = Histogram1D::from_values(target, bins)?;
            let path = output_path(&config, output, "true_energy_distribution.csv")?;
            CsvWriter::create(&path)?.write_histogram(&hist)?;
            println!(
                "Histogram of {} events in {} bins saved as {}",
                hist.total(),
                hist.bins(),
                path.display()
            );
        }

        Commands::LayerPositions { input, output } => {
            let dataset = load(&config, &input)?;
            let layers = LayerMap::from_positions(&dataset.hits().z);
            println!("Unique Layer Positions (z): {:?}", layers.positions());
            let path = output_path(&config, output, "layer_positions.csv")?;
            CsvWriter::create(&path)?.write_layer_positions(&layers)?;
        }

        Commands::Info { input } => {
            let path = config.data_file(&input);
            let dataset = load(&config, &input)?;
            let layers = LayerMap::from_positions(&dataset.hits().z);

            println!("File: {}", path.display());
            println!("Datasets: {}", dataset_names(&path)?.join(", "));
            println!("Events: {}", dataset.n_events());
            println!("Hits: {}", dataset.total_hits());
            println!("Layers: {}", layers.len());

            let nhits = dataset.nhits();
            if let (Some(min), Some(max)) = (nhits.iter().min(), nhits.iter().max()) {
                let mean = dataset.total_hits() as f64 / nhits.len() as f64;
                println!("Hits per event: {} - {} (mean {:.1})", min, max, mean);
            }
            if let (Some(first), Some(last)) = (layers.positions().first(), layers.positions().last())
            {
                println!("z range: {} - {}", first, last);
            }
            if let Some(target) = dataset.target() {
                let min = target.iter().copied().fold(f64::INFINITY, f64::min);
                let max = target.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if min <= max {
                    println!("True energy range: {:.1} - {:.1} GeV", min, max);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load(config: &PathsConfig, input: &Path) -> Result<ShowerDataset> {
    Ok(read_shower_hdf5(config.data_file(input))?)
}

fn output_path(config: &PathsConfig, output: Option<PathBuf>, default: &str) -> Result<PathBuf> {
    match output {
        Some(path) => Ok(path),
        None => Ok(config.figures_file(default)?),
    }
}

/// Explicit batch size and thread count win; otherwise threads alone split
/// the events evenly and no option at all runs a single pass.
fn choose_strategy(
    n_events: usize,
    batch_size: Option<usize>,
    threads: Option<usize>,
) -> Result<AggregationStrategy> {
    if threads == Some(0) {
        return Err(calolayer_core::Error::InvalidInput(
            "threads must be at least 1".to_string(),
        )
        .into());
    }
    Ok(match (batch_size, threads) {
        (Some(batch_size), Some(threads)) if threads > 1 => AggregationStrategy::Parallel {
            batch_size,
            threads,
        },
        (Some(batch_size), _) => AggregationStrategy::Batched { batch_size },
        (None, Some(threads)) if threads > 1 => AggregationStrategy::Parallel {
            batch_size: n_events.div_ceil(threads).max(1),
            threads,
        },
        (None, _) => AggregationStrategy::Whole,
    })
}

fn print_preview(table: &LayerEnergyTable, rows: usize) {
    if rows == 0 || table.is_empty() {
        return;
    }
    let names = table.column_names();
    let shown = names.len().min(6);
    println!("{}", names[..shown].join("  "));
    for row in table.to_rows().iter().take(rows) {
        let cells: Vec<String> = row
            .iter()
            .take(shown)
            .enumerate()
            .map(|(i, v)| if i == 0 { format!("{v}") } else { format!("{v:.4}") })
            .collect();
        println!("{}", cells.join("  "));
    }
    if names.len() > shown {
        println!("... {} more columns", names.len() - shown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_selection() {
        assert_eq!(
            choose_strategy(10, None, None).unwrap(),
            AggregationStrategy::Whole
        );
        assert_eq!(
            choose_strategy(10, None, Some(1)).unwrap(),
            AggregationStrategy::Whole
        );
        assert_eq!(
            choose_strategy(10, Some(3), None).unwrap(),
            AggregationStrategy::Batched { batch_size: 3 }
        );
        assert_eq!(
            choose_strategy(10, Some(3), Some(4)).unwrap(),
            AggregationStrategy::Parallel {
                batch_size: 3,
                threads: 4
            }
        );
        assert_eq!(
            choose_strategy(10, None, Some(4)).unwrap(),
            AggregationStrategy::Parallel {
                batch_size: 3,
                threads: 4
            }
        );
        assert_eq!(
            choose_strategy(0, None, Some(4)).unwrap(),
            AggregationStrategy::Parallel {
                batch_size: 1,
                threads: 4
            }
        );
    }

    #[test]
    fn zero_threads_rejected() {
        for batch_size in [None, Some(4)] {
            let err = choose_strategy(10, batch_size, Some(0)).unwrap_err();
            assert!(matches!(
                err,
                CliError::Core(calolayer_core::Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn cli_parses_layers_options() {
        let cli = Cli::try_parse_from([
            "calolayer",
            "layers",
            "data.h5",
            "--batch-size",
            "128",
            "--threads",
            "2",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Layers {
                input,
                batch_size,
                threads,
                ..
            } => {
                assert_eq!(input, PathBuf::from("data.h5"));
                assert_eq!(batch_size, Some(128));
                assert_eq!(threads, Some(2));
            }
            _ => panic!("expected layers command"),
        }
    }

    #[test]
    fn cli_rejects_conflicting_sizing() {
        let result = Cli::try_parse_from([
            "calolayer",
            "layers",
            "--batch-size",
            "8",
            "--memory-fraction",
            "0.25",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_accepts_negative_event_index() {
        let cli = Cli::try_parse_from(["calolayer", "event", "--index", "-3"]).unwrap();
        match cli.command {
            Commands::Event { index, .. } => assert_eq!(index, -3),
            _ => panic!("expected event command"),
        }
    }
}
