//! Replays confirmed ledger events from a JSON-lines file.
//!
//! One [`ConfirmedEvent`] per line; blank lines and lines starting with `#`
//! are skipped. Used for backfills and for driving the engine from an
//! indexer's export.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::domain::event::ConfirmedEvent;
use crate::error::{Error, Result};
use crate::port::outbound::ledger::Ledger;

pub struct JsonlLedger {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl JsonlLedger {
    /// Open `path` for replay.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| Error::Ledger(format!("open {}: {e}", path.display())))?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }

    /// Line number of the last line read.
    #[must_use]
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

#[async_trait]
impl Ledger for JsonlLedger {
    async fn next_event(&mut self) -> Result<Option<ConfirmedEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return serde_json::from_str(trimmed).map(Some).map_err(|e| {
                Error::Parse(format!("{}:{}: {e}", self.path.display(), self.line_no))
            });
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
