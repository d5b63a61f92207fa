//! CSV writers for aggregation tables, histograms and event hits.

use crate::Result;
use calolayer_algorithms::Histogram1D;
use calolayer_core::{EventView, LayerEnergyTable, LayerMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Buffered CSV writer for calolayer data products.
pub struct CsvWriter<W: Write = BufWriter<File>> {
    writer: W,
}

impl CsvWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wraps an arbitrary writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the layer-energy table with an `event_no` column.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_layer_table(&mut self, table: &LayerEnergyTable) -> Result<()> {
        writeln!(self.writer, "{}", table.column_names().join(","))?;
        for (event, row) in table.values().rows().into_iter().enumerate() {
            write!(self.writer, "{event}")?;
            for value in row {
                write!(self.writer, ",{value}")?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes histogram bins.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_histogram(&mut self, histogram: &Histogram1D) -> Result<()> {
        writeln!(self.writer, "bin_low,bin_high,count")?;
        for (low, high, count) in histogram.iter() {
            writeln!(self.writer, "{low},{high},{count}")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes one event's hits for 3D display.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_event_hits(&mut self, event: &EventView<'_>) -> Result<()> {
        writeln!(self.writer, "x,y,z,energy")?;
        for i in 0..event.len() {
            writeln!(
                self.writer,
                "{},{},{},{}",
                event.x[i], event.y[i], event.z[i], event.energy[i]
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes layer positions with their 1-based layer number.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_layer_positions(&mut self, layers: &LayerMap) -> Result<()> {
        writeln!(self.writer, "layer,z")?;
        for (index, z) in layers.positions().iter().enumerate() {
            writeln!(self.writer, "{},{z}", index + 1)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Consumes the writer and returns the inner sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
