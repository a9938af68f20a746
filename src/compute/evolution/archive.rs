//! Run archive for storing generation results on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::schema::{GenerationResult, RunSummary};

/// Subdirectory every archive writes into.
const DATA_DIR: &str = "data-v1";
const SUMMARY_FILE: &str = "summary.json";

/// JSON archive of one run, laid out as `<root>/data-v1/generation_NNNN.json`
/// plus a `summary.json`.
#[derive(Debug, Clone)]
pub struct RunArchive {
    dir: PathBuf,
}

impl RunArchive {
    /// Open or create an archive under `root`.
    pub fn create<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let dir = root.as_ref().join(DATA_DIR);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory the records are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn generation_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("generation_{generation:04}.json"))
    }

    /// Write one generation's result, replacing any earlier record.
    pub fn record_generation(&self, result: &GenerationResult) -> io::Result<PathBuf> {
        let path = self.generation_path(result.generation);
        write_json(&path, result)?;
        log::debug!("Archived generation {} to {}", result.generation, path.display());
        Ok(path)
    }

    /// Write the run summary.
    pub fn record_summary(&self, summary: &RunSummary) -> io::Result<PathBuf> {
        let path = self.dir.join(SUMMARY_FILE);
        write_json(&path, summary)?;
        Ok(path)
    }

    pub fn load_generation(&self, generation: usize) -> io::Result<GenerationResult> {
        read_json(self.generation_path(generation))
    }

    pub fn load_summary(&self) -> io::Result<RunSummary> {
        read_json(self.dir.join(SUMMARY_FILE))
    }

    /// Indices of the archived generations, ascending.
    pub fn generations(&self) -> io::Result<Vec<usize>> {
        let mut generations = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            if let Some(index) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix("generation_"))
                .and_then(|s| s.parse().ok())
            {
                generations.push(index);
            }
        }
        generations.sort_unstable();
        Ok(generations)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> io::Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
