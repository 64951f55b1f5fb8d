//! # Persistent TOC cache
//!
//! The param and log tables of content (TOC) of a Crazyflie only change with the firmware. Caching them, indexed
//! by their CRC32, makes reconnecting much faster. [FileTocCache] keeps them in memory and mirrors them to a JSON
//! file so that the cache survives between runs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crazyflie_lib::TocCache;
use log::{debug, warn};

use crate::Result;

/// # TOC cache backed by a JSON file
///
/// Cloning is cheap, all clones share the same cache.
#[derive(Debug, Clone, Default)]
pub struct FileTocCache {
    path: Option<PathBuf>,
    tocs: Arc<Mutex<HashMap<u32, String>>>,
}

impl FileTocCache {
    /// Cache that never stores anything
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open a cache file, creating it on the first store.
    ///
    /// A missing or unreadable file results in an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let tocs = match Self::read(&path) {
            Ok(tocs) => {
                debug!("Loaded {} TOC(s) from {}", tocs.len(), path.display());
                tocs
            }
            Err(e) => {
                debug!("Starting with an empty TOC cache, {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            tocs: Arc::new(Mutex::new(tocs)),
        }
    }

    /// Open the cache file if a path is given, otherwise disable caching
    pub fn from_path(path: Option<&Path>) -> Self {
        path.map(Self::open).unwrap_or_else(Self::disabled)
    }

    /// Number of cached TOCs
    pub fn len(&self) -> usize {
        self.tocs.lock().map(|tocs| tocs.len()).unwrap_or(0)
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(path: &Path) -> Result<HashMap<u32, String>> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    fn write(path: &Path, tocs: &HashMap<u32, String>) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string(tocs).map_err(std::io::Error::from)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl TocCache for FileTocCache {
    fn get_toc(&self, crc32: u32) -> Option<String> {
        self.path.as_ref()?;
        self.tocs.lock().ok()?.get(&crc32).cloned()
    }

    fn store_toc(&self, crc32: u32, toc: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let Ok(mut tocs) = self.tocs.lock() else {
            return;
        };

        tocs.insert(crc32, toc.to_owned());
        if let Err(e) = Self::write(path, &tocs) {
            warn!("Could not write TOC cache {}: {}", path.display(), e);
        }
    }
}
