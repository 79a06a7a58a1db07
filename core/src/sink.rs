//! Result sinks. A finished run is handed to each sink exactly once,
//! after simulation. Sinks never see partial row sets.

use crate::{error::SimResult, results::SimulationOutput};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

pub trait ResultSink {
    fn name(&self) -> &'static str;

    fn write_run(&mut self, output: &SimulationOutput) -> SimResult<()>;
}

/// Writes the whole output (metadata, report, rows) as one JSON document.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for JsonFileSink {
    fn name(&self) -> &'static str {
        "json"
    }

    fn write_run(&mut self, output: &SimulationOutput) -> SimResult<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, output)?;
        writer.flush()?;
        log::debug!("json: wrote run {} to {}", output.metadata.run_id, self.path.display());
        Ok(())
    }
}

/// Hand a finished run to every sink, in order. Stops at the first failure.
pub fn persist(output: &SimulationOutput, sinks: &mut [&mut dyn ResultSink]) -> SimResult<()> {
    for sink in sinks.iter_mut() {
        sink.write_run(output)?;
        log::info!(
            "persisted run {} via {} ({} rows)",
            output.metadata.run_id,
            sink.name(),
            output.rows.len()
        );
    }
    Ok(())
}
