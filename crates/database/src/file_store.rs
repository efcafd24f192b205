use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::NamedTempFile;

use crate::KeyValueStore;

const DEFAULT_FILE_NAME: &str = "planner.json";

/// Store backed by a single JSON object on disk, one top-level field per key.
///
/// Writes are read-modify-write of the whole file, serialized by an in-process lock.
/// The new file is written beside the old one and renamed over it, so a crash
/// mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (and if needed initializes) the store.
    ///
    /// # Arguments
    /// * `store_path` - Path to the JSON file, or to a directory that will hold `planner.json`
    pub fn open<P: AsRef<Path>>(store_path: P) -> Result<Self> {
        let path = resolve_store_path(store_path.as_ref());
        ensure_store_exists(&path)?;
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("Cannot open store at {:?}", self.path))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "store file is not a JSON object, treating as empty");
                Ok(Map::new())
            }
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<()> {
        let formatted = serde_json::to_string_pretty(document)?;
        replace_file(&self.path, formatted.as_bytes())
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut document = self.read_document()?;
        Ok(document.remove(key))
    }

    fn write(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value);
        self.write_document(&document)
            .with_context(|| format!("Writing key '{}' to {:?}", key, self.path))
    }

    fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(self.read_document()?.keys().cloned().collect())
    }
}

/// Writes `contents` to a temp file in the target's directory, then renames it
/// over `path`.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("Cannot stage store file in {:?}", dir))?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged
        .persist(path)
        .with_context(|| format!("Cannot replace store file at {:?}", path))?;
    Ok(())
}

fn resolve_store_path(path: &Path) -> PathBuf {
    if path.is_dir() || (!path.exists() && !path.to_string_lossy().ends_with(".json")) {
        path.join(DEFAULT_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Creates an empty store when the file is missing or holds something other
/// than a JSON object.
fn ensure_store_exists(path: &Path) -> Result<()> {
    let needs_initialization = match File::open(path) {
        Ok(mut file) => {
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            !matches!(serde_json::from_str::<Value>(&contents), Ok(Value::Object(_)))
        }
        Err(_) => true,
    };

    if needs_initialization {
        replace_file(path, b"{}")?;
        tracing::info!(path = %path.display(), "initialized empty store");
    }

    Ok(())
}
