use std::path::PathBuf;
use std::sync::Arc;

use ricart_core::infrastructure::{AccessLog, ResourceStore};
use ricart_core::infrastructure_fs::{DirectoryResourceStore, FileAccessLog};
use ricart_core::infrastructure_in_memory::{InMemoryResourceStore, TracingAccessLog};

/// Parsed `--storage` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSpec {
    Memory,
    Directory(PathBuf),
    Sqlite(String),
}

impl StorageSpec {
    pub fn parse(storage: &str) -> Result<Self, String> {
        if storage == "memory" {
            Ok(StorageSpec::Memory)
        } else if let Some(path) = storage.strip_prefix("dir:") {
            Ok(StorageSpec::Directory(PathBuf::from(path)))
        } else if let Some(path) = storage.strip_prefix("sqlite:") {
            Ok(StorageSpec::Sqlite(path.to_string()))
        } else {
            Err(format!(
                "Unknown storage backend: '{}'. Use 'memory', 'dir:<path>' or 'sqlite:<path>'",
                storage
            ))
        }
    }

    /// An in-memory store starts empty, so it always needs a seed
    pub fn needs_seed(&self) -> bool {
        matches!(self, StorageSpec::Memory)
    }
}

pub fn create_store(spec: &StorageSpec) -> Result<Arc<dyn ResourceStore>, String> {
    match spec {
        StorageSpec::Memory => {
            tracing::info!("💾 Storage backend: in-memory (content will not persist)");
            Ok(Arc::new(InMemoryResourceStore::new()))
        }
        StorageSpec::Directory(root) => {
            tracing::info!("💾 Storage backend: directory ({})", root.display());
            Ok(Arc::new(DirectoryResourceStore::new(root.clone())))
        }
        StorageSpec::Sqlite(path) => {
            #[cfg(feature = "sqlite")]
            {
                tracing::info!("💾 Storage backend: SQLite ({})", path);
                ricart_core::infrastructure_sqlite::SqliteResourceStore::open(path)
                    .map(|store| Arc::new(store) as Arc<dyn ResourceStore>)
                    .map_err(|e| format!("Failed to open SQLite database at '{}': {}", path, e))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(format!(
                    "SQLite storage '{}' requested but `sqlite` feature is not enabled. \
                     Rebuild with: cargo build --features sqlite",
                    path
                ))
            }
        }
    }
}

pub fn create_access_log(path: Option<&PathBuf>) -> Arc<dyn AccessLog> {
    match path {
        Some(path) => {
            tracing::info!("📝 Access log: {}", path.display());
            Arc::new(FileAccessLog::new(path.clone()))
        }
        None => Arc::new(TracingAccessLog),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_backend() {
        assert_eq!(StorageSpec::parse("memory"), Ok(StorageSpec::Memory));
        assert_eq!(
            StorageSpec::parse("dir:/tmp/files"),
            Ok(StorageSpec::Directory(PathBuf::from("/tmp/files")))
        );
        assert_eq!(
            StorageSpec::parse("sqlite:ricart.db"),
            Ok(StorageSpec::Sqlite("ricart.db".to_string()))
        );
        assert!(StorageSpec::parse("redis://x").is_err());
    }

    #[test]
    fn only_memory_needs_a_seed() {
        assert!(StorageSpec::Memory.needs_seed());
        assert!(!StorageSpec::Directory(PathBuf::from(".")).needs_seed());
    }

    #[test]
    fn directory_store_reads_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file1.txt"), "hi").unwrap();
        let store = create_store(&StorageSpec::Directory(dir.path().to_path_buf())).unwrap();
        assert_eq!(store.read(&"file1.txt".into()).unwrap(), "hi");
    }
}
