use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::app::ports::EnrichOutputPort;
use crate::error::{PipelineError, Result};
use crate::pipeline::enrich::EnrichedRecord;

/// NDJSON sink: one enriched record per line, truncating any previous run.
pub struct FileEnrichOutputAdapter {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    written: AtomicUsize,
}

impl FileEnrichOutputAdapter {
    /// Create the file (and its parent directories)
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_truncated(&path).map_err(|source| PipelineError::Output {
            path: path.display().to_string(),
            source,
        })?;
        debug!("enriched output goes to {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            written: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, BufWriter<File>> {
        // A writer that panicked mid-line leaves at worst a torn last line
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn output_error(&self, source: std::io::Error) -> PipelineError {
        PipelineError::Output {
            path: self.path.display().to_string(),
            source,
        }
    }
}

fn open_truncated(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    File::create(path)
}

#[async_trait::async_trait]
impl EnrichOutputPort for FileEnrichOutputAdapter {
    async fn write_enriched_record(&self, record: &EnrichedRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.lock(), "{}", line).map_err(|e| self.output_error(e))?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.lock().flush().map_err(|e| self.output_error(e))?;
        info!("wrote {} enriched records to {}", self.written(), self.path.display());
        Ok(())
    }
}

/// NDJSON on stdout, for piping into other tools
pub struct StdoutEnrichOutputAdapter;

#[async_trait::async_trait]
impl EnrichOutputPort for StdoutEnrichOutputAdapter {
    async fn write_enriched_record(&self, record: &EnrichedRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(std::io::stdout().lock(), "{}", line)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }
}
