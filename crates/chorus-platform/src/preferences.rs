//! Persisted skill enablement preferences.
//!
//! An [`EnablementStore`] is an async `skill id -> enabled` map. The
//! registry reads it on every dispatch; the settings surface writes it.
//! A missing entry means "enabled".
//!
//! Two implementations are provided:
//!
//! - [`MemoryEnablementStore`] -- process-local, for tests and embedding.
//! - [`FileEnablementStore`] -- a JSON object on disk, loaded lazily and
//!   rewritten atomically on each change.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use chorus_types::{ChorusError, Result};

use crate::fs::FileSystem;

/// Async key -> boolean preference map for skill enablement.
#[async_trait]
pub trait EnablementStore: Send + Sync {
    /// The stored preference for `skill_id`, if any.
    async fn get(&self, skill_id: &str) -> Result<Option<bool>>;

    /// Store a preference.
    async fn set(&self, skill_id: &str, enabled: bool) -> Result<()>;

    /// All stored preferences.
    async fn snapshot(&self) -> Result<BTreeMap<String, bool>>;

    /// Effective enablement: the stored value, defaulting to `true`.
    async fn is_enabled(&self, skill_id: &str) -> Result<bool> {
        Ok(self.get(skill_id).await?.unwrap_or(true))
    }
}

/// In-memory enablement store.
#[derive(Debug, Default)]
pub struct MemoryEnablementStore {
    values: RwLock<BTreeMap<String, bool>>,
}

impl MemoryEnablementStore {
    /// Create a store seeded with initial values.
    pub fn new(initial: impl IntoIterator<Item = (String, bool)>) -> Self {
        Self {
            values: RwLock::new(initial.into_iter().collect()),
        }
    }
}

#[async_trait]
impl EnablementStore for MemoryEnablementStore {
    async fn get(&self, skill_id: &str) -> Result<Option<bool>> {
        Ok(self.values.read().await.get(skill_id).copied())
    }

    async fn set(&self, skill_id: &str, enabled: bool) -> Result<()> {
        self.values.write().await.insert(skill_id.to_string(), enabled);
        Ok(())
    }

    async fn snapshot(&self) -> Result<BTreeMap<String, bool>> {
        Ok(self.values.read().await.clone())
    }
}

/// JSON-file backed enablement store.
///
/// Defaults passed to [`new`](Self::new) (typically from configuration)
/// are overridden by values found in the file. The file is read on first
/// access; every [`set`](EnablementStore::set) rewrites it.
pub struct FileEnablementStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    defaults: BTreeMap<String, bool>,
    cache: RwLock<Option<BTreeMap<String, bool>>>,
}

impl FileEnablementStore {
    /// Create a store persisted at `path`.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        path: PathBuf,
        defaults: impl IntoIterator<Item = (String, bool)>,
    ) -> Self {
        Self {
            path,
            fs,
            defaults: defaults.into_iter().collect(),
            cache: RwLock::new(None),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, bool>> {
        if let Some(values) = self.cache.read().await.as_ref() {
            return Ok(values.clone());
        }

        let mut values = self.defaults.clone();
        if self.fs.exists(&self.path).await {
            let content = self.fs.read_to_string(&self.path).await?;
            match serde_json::from_str::<BTreeMap<String, bool>>(&content) {
                Ok(stored) => values.extend(stored),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "ignoring corrupt skill preference file"
                    );
                }
            }
        }

        *self.cache.write().await = Some(values.clone());
        Ok(values)
    }
}

#[async_trait]
impl EnablementStore for FileEnablementStore {
    async fn get(&self, skill_id: &str) -> Result<Option<bool>> {
        Ok(self.load().await?.get(skill_id).copied())
    }

    async fn set(&self, skill_id: &str, enabled: bool) -> Result<()> {
        let mut values = self.load().await?;
        values.insert(skill_id.to_string(), enabled);

        let json = serde_json::to_string_pretty(&values)?;
        self.fs
            .write_string(&self.path, &json)
            .await
            .map_err(|e| ChorusError::Preferences(format!("{}: {e}", self.path.display())))?;
        debug!(skill = %skill_id, enabled, path = %self.path.display(), "saved skill preference");

        *self.cache.write().await = Some(values);
        Ok(())
    }

    async fn snapshot(&self) -> Result<BTreeMap<String, bool>> {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::NativeFileSystem;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path(prefix: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        std::env::temp_dir()
            .join(format!("chorus_prefs_{prefix}_{pid}_{id}"))
            .join("skills.json")
    }

    #[tokio::test]
    async fn memory_store_defaults_to_enabled() {
        let store = MemoryEnablementStore::default();
        assert_eq!(store.get("telephone").await.unwrap(), None);
        assert!(store.is_enabled("telephone").await.unwrap());

        store.set("telephone", false).await.unwrap();
        assert!(!store.is_enabled("telephone").await.unwrap());
        assert_eq!(store.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let path = temp_path("persist");
        let fs: Arc<dyn FileSystem> = Arc::new(NativeFileSystem);

        {
            let store = FileEnablementStore::new(fs.clone(), path.clone(), []);
            store.set("current_time", false).await.unwrap();
        }

        let store = FileEnablementStore::new(fs.clone(), path.clone(), []);
        assert_eq!(store.get("current_time").await.unwrap(), Some(false));
        assert!(store.is_enabled("telephone").await.unwrap());

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn file_values_override_defaults() {
        let path = temp_path("override");
        let fs: Arc<dyn FileSystem> = Arc::new(NativeFileSystem);
        fs.write_string(&path, r#"{"telephone": true}"#).await.unwrap();

        let store = FileEnablementStore::new(
            fs.clone(),
            path.clone(),
            [("telephone".to_string(), false), ("current_time".to_string(), false)],
        );
        let snap = store.snapshot().await.unwrap();
        assert_eq!(snap.get("telephone"), Some(&true));
        assert_eq!(snap.get("current_time"), Some(&false));

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_defaults() {
        let path = temp_path("corrupt");
        let fs: Arc<dyn FileSystem> = Arc::new(NativeFileSystem);
        fs.write_string(&path, "not json").await.unwrap();

        let store =
            FileEnablementStore::new(fs.clone(), path.clone(), [("telephone".to_string(), false)]);
        assert_eq!(store.get("telephone").await.unwrap(), Some(false));

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}
