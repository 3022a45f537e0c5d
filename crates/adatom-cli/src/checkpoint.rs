//! JSON-lines checkpoint writer.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use adatom_core::{CheckpointSink, EngineSnapshot};
use adatom_types::{AdatomError, AdatomResult};

/// Appends one JSON object per checkpoint.
pub struct JsonLinesCheckpoints {
    writer: BufWriter<File>,
}

impl JsonLinesCheckpoints {
    pub fn create(path: impl AsRef<Path>) -> AdatomResult<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl CheckpointSink for JsonLinesCheckpoints {
    fn checkpoint(&mut self, snapshot: &EngineSnapshot) -> AdatomResult<()> {
        let line = serde_json::to_string(snapshot).map_err(|e| AdatomError::Serialization(e.to_string()))?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json_lines"
    }
}

/// Reads every checkpoint from a file written by [`JsonLinesCheckpoints`].
pub fn read_checkpoints(path: impl AsRef<Path>) -> AdatomResult<Vec<EngineSnapshot>> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line).map_err(|e| AdatomError::Serialization(e.to_string()))?);
    }
    Ok(out)
}
