use calolayer_algorithms::{Histogram1D, LayerEnergyAggregator};
use calolayer_core::{HitColumns, ShowerDataset};
use calolayer_io::{CsvWriter, OutOfCoreConfig, PathsConfig};
use std::fs;
use tempfile::tempdir;

fn showers() -> ShowerDataset {
    let mut hits = HitColumns::with_capacity(6);
    hits.push(0.0, 0.0, 1.0, 2.0);
    hits.push(0.1, 0.0, 1.0, 4.0);
    hits.push(0.2, 0.0, 2.0, 5.0);
    hits.push(0.0, 0.3, 2.0, 1.0);
    hits.push(0.0, 0.4, 3.0, 7.0);
    hits.push(0.5, 0.5, 1.0, 9.0);
    ShowerDataset::new(vec![3, 0, 2, 1], hits, Some(vec![10.0, 20.0, 30.0, 40.0])).unwrap()
}

#[test]
fn budget_sized_table_written_to_figures_dir() {
    let dir = tempdir().unwrap();
    let config = PathsConfig {
        data_dir: dir.path().to_path_buf(),
        figures_dir: dir.path().join("figures"),
    };
    let dataset = showers();
    let sizing = OutOfCoreConfig::default().with_memory_budget_bytes(64);
    let strategy = sizing.strategy(dataset.n_events(), dataset.total_hits(), 3).unwrap();

    let table = LayerEnergyAggregator::new(strategy)
        .aggregate_dataset(&dataset)
        .unwrap();
    let path = config.figures_file("layer_energy.csv").unwrap();
    CsvWriter::create(&path)
        .unwrap()
        .write_layer_table(&table)
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "event_no,z_1_average_energy,z_2_average_energy,z_3_average_energy",
            "0,3,5,0",
            "1,0,0,0",
            "2,0,1,7",
            "3,9,0,0",
        ]
    );
}

#[test]
fn true_energy_histogram_written() {
    let dir = tempdir().unwrap();
    let dataset = showers();
    let hist = Histogram1D::from_values(dataset.target().unwrap(), 3).unwrap();
    let path = dir.path().join("true_energy_distribution.csv");
    CsvWriter::create(&path)
        .unwrap()
        .write_histogram(&hist)
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 4);
    assert!(content.ends_with("30,40,2\n"));
}
