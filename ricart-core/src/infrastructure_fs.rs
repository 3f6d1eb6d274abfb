//! Filesystem-backed collaborators: one file per resource under a root
//! directory, and an append-only text access log.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::StoreError;
use crate::infrastructure::{AccessLog, AccessRecord, ResourceStore};
use crate::types::{Access, ClientId, ResourceName, Timestamp};

/// Resources are plain files directly under `root`.
#[derive(Debug, Clone)]
pub struct DirectoryResourceStore {
    root: PathBuf,
}

impl DirectoryResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Only single, plain file names are accepted; anything that could
    /// escape `root` is reported as not found.
    fn path_of(&self, name: &ResourceName) -> Result<PathBuf, StoreError> {
        let relative = Path::new(name.as_str());
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(relative)),
            _ => Err(StoreError::NotFound(name.clone())),
        }
    }
}

fn io_error(name: &ResourceName, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::NotFound(name.clone())
    } else {
        StoreError::Io {
            name: name.clone(),
            message: err.to_string(),
        }
    }
}

impl ResourceStore for DirectoryResourceStore {
    fn open(&self, name: &ResourceName) -> Result<String, StoreError> {
        self.read(name)
    }

    fn read(&self, name: &ResourceName) -> Result<String, StoreError> {
        let path = self.path_of(name)?;
        fs::read_to_string(&path).map_err(|e| io_error(name, e))
    }

    fn write(&self, name: &ResourceName, content: &str) -> Result<(), StoreError> {
        let path = self.path_of(name)?;
        fs::write(&path, content).map_err(|e| StoreError::Io {
            name: name.clone(),
            message: e.to_string(),
        })
    }
}

/// Appends `Client {id} {Read|Write} file {name} at timestamp {t}` lines.
#[derive(Debug, Clone)]
pub struct FileAccessLog {
    path: PathBuf,
}

impl FileAccessLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

impl AccessLog for FileAccessLog {
    fn record(&self, client: ClientId, access: Access, resource: &ResourceName, timestamp: Timestamp) {
        let record = AccessRecord {
            client,
            access,
            resource: resource.clone(),
            timestamp,
        };
        if let Err(e) = self.append(&record.to_string()) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to append access log");
        }
    }
}
