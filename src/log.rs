// src/log.rs
use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub fn default_log_path(dir: &Path) -> PathBuf {
    dir.join("chanmsg.log")
}

/// Append-only request log. One line per HTTP round trip.
pub struct RequestLog {
    file: Mutex<fs::File>,
}

impl RequestLog {
    /// Open (or create) the log file in append mode.
    pub fn open(log_path: &Path) -> Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Record a finished request. `outcome` is a status code or an error summary.
    pub fn record(&self, method: &str, path: &str, outcome: &str) -> Result<()> {
        let now = chrono::Utc::now();
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("request log lock poisoned"))?;
        writeln!(
            file,
            "[{}] {method} {path} -> {outcome}",
            now.format("%Y-%m-%dT%H:%M:%SZ")
        )?;
        file.flush()?;
        Ok(())
    }
}

pub fn read_log(log_path: &Path) -> Result<Vec<String>> {
    if !log_path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(log_path)?;
    Ok(contents.lines().map(str::to_string).collect())
}
