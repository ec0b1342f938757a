// # File Config Store
//
// File-based implementation of ConfigStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "settings": {
//     "apikey": "...",
//     "email": "ops@example.com",
//     "zone": "023e105f4ecef8ad9ca31a8372d0c353"
//   }
// }
// ```
//
// The file holds the API key, so it is created with mode 0600 on Unix.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::ConfigStore;

/// Settings file format version
/// Used for future migration if format changes
pub(crate) const FILE_FORMAT_VERSION: &str = "1.0";

/// Serializable settings file format
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct SettingsFileFormat {
    version: String,
    #[serde(default)]
    settings: BTreeMap<String, String>,
}

/// File-based settings store with crash recovery
///
/// Every write is flushed to disk before `set` returns.
///
/// # Example
///
/// ```rust,no_run
/// use cfzone_core::store::FileConfigStore;
/// use cfzone_core::traits::ConfigStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("/var/lib/cfzone/settings.json").await?;
///
///     store.set("zone", "023e105f4ecef8ad9ca31a8372d0c353").await?;
///     assert!(store.get("zone").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    settings: Arc<RwLock<BTreeMap<String, String>>>,
}

impl FileConfigStore {
    /// Create or load a file settings store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing file
    /// 3. If corruption detected, try to load from backup
    /// 4. If both fail, start empty
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path).await?;

        let file: SettingsFileFormat = load_json_with_recovery(&path).await?;
        if !file.version.is_empty() && file.version != FILE_FORMAT_VERSION {
            tracing::warn!(
                "Settings file version mismatch: expected {}, got {}. Attempting to load anyway.",
                FILE_FORMAT_VERSION,
                file.version
            );
        }
        tracing::debug!("Loaded {} setting(s) from {}", file.settings.len(), path.display());

        Ok(Self {
            path,
            settings: Arc::new(RwLock::new(file.settings)),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, settings: &BTreeMap<String, String>) -> Result<(), Error> {
        let file = SettingsFileFormat {
            version: FILE_FORMAT_VERSION.to_string(),
            settings: settings.clone(),
        };
        write_json_atomic(&self.path, &file).await
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.settings.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        // Hold the write lock across the write so files land in call order
        let mut guard = self.settings.write().await;
        guard.insert(key.to_string(), value.to_string());
        self.persist(&guard).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.settings.write().await;
        if guard.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&guard).await
    }

    async fn all(&self) -> Result<BTreeMap<String, String>, Error> {
        let guard = self.settings.read().await;
        Ok(guard.clone())
    }
}

/// Create the parent directory of `path` if it doesn't exist
pub(crate) async fn ensure_parent_dir(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).await.map_err(|e| {
            Error::config(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Load a JSON document with automatic recovery
///
/// Recovery strategy:
/// 1. Try to load the main file (missing file → default value)
/// 2. If JSON parse error, try loading backup and restore it over the main file
/// 3. If backup also fails, start from the default value
pub(crate) async fn load_json_with_recovery<T>(path: &Path) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    match load_json(path).await {
        Ok(value) => Ok(value),
        Err(Error::Json(e)) => {
            tracing::warn!(
                "File {} appears corrupted: {}. Attempting recovery from backup.",
                path.display(),
                e
            );

            let backup = backup_path(path);
            if !backup.exists() {
                tracing::warn!("No backup file found. Starting with empty state.");
                return Ok(T::default());
            }

            match load_json(&backup).await {
                Ok(value) => {
                    tracing::info!("Recovered state from backup {}", backup.display());
                    if let Err(restore_err) = fs::copy(&backup, path).await {
                        tracing::error!(
                            "Failed to restore {} from backup: {}",
                            path.display(),
                            restore_err
                        );
                    }
                    Ok(value)
                }
                Err(backup_err) => {
                    tracing::error!(
                        "Backup also corrupted: {}. Starting with empty state.",
                        backup_err
                    );
                    Ok(T::default())
                }
            }
        }
        Err(e) => Err(e),
    }
}

/// Load a JSON document; parse failures surface as `Error::Json`
async fn load_json<T>(path: &Path) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!("File does not exist: {}", path.display());
        return Ok(T::default());
    }

    let content = fs::read_to_string(path).await.map_err(|e| {
        Error::store(format!("Failed to read {}: {}", path.display(), e))
    })?;

    Ok(serde_json::from_str(&content)?)
}

/// Write a JSON document atomically
///
/// The document goes to `<file>.tmp` first; the previous file is copied to
/// `<file>.backup`; then the temp file is renamed over `path`.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(value)?;

    let temp = temp_path(path);
    {
        let mut file = fs::File::create(&temp).await.map_err(|e| {
            Error::store(format!("Failed to create temp file {}: {}", temp.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| {
                    Error::store(format!(
                        "Failed to restrict permissions on {}: {}",
                        temp.display(),
                        e
                    ))
                })?;
        }

        file.write_all(json.as_bytes()).await.map_err(|e| {
            Error::store(format!("Failed to write to temp file {}: {}", temp.display(), e))
        })?;

        file.flush().await.map_err(|e| {
            Error::store(format!("Failed to flush temp file {}: {}", temp.display(), e))
        })?;
    }

    if path.exists() {
        let backup = backup_path(path);
        if let Err(e) = fs::copy(path, &backup).await {
            tracing::warn!("Failed to create backup: {}", e);
        }
    }

    fs::rename(&temp, path).await.map_err(|e| {
        Error::store(format!(
            "Failed to rename {} to {}: {}",
            temp.display(),
            path.display(),
            e
        ))
    })?;

    tracing::trace!("State written to file: {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    sidecar_path(path, "tmp")
}

pub(crate) fn backup_path(path: &Path) -> PathBuf {
    sidecar_path(path, "backup")
}

/// `<file name>.<suffix>` next to `path`, so `a.json` and `a.state` never share sidecars
fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        assert!(store.all().await.unwrap().is_empty());

        store.set("apikey", "k-123").await.unwrap();
        store.set("email", "ops@example.com").await.unwrap();
        assert_eq!(store.get("apikey").await.unwrap().as_deref(), Some("k-123"));
        assert!(path.exists());

        let reloaded = FileConfigStore::new(&path).await.unwrap();
        assert_eq!(
            reloaded.get("email").await.unwrap().as_deref(),
            Some("ops@example.com")
        );
    }

    #[tokio::test]
    async fn test_file_store_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        store.set("zone", "abc").await.unwrap();
        store.remove("zone").await.unwrap();
        store.remove("never-set").await.unwrap();

        let reloaded = FileConfigStore::new(&path).await.unwrap();
        assert_eq!(reloaded.get("zone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        store.set("zone", "first").await.unwrap();
        // Second write leaves the first one in the backup
        store.set("zone", "second").await.unwrap();
        assert!(backup_path(&path).exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let recovered = FileConfigStore::new(&path).await.unwrap();
        assert_eq!(
            recovered.get("zone").await.unwrap().as_deref(),
            Some("first"),
            "Backup should contain previous state, not latest"
        );
    }

    #[tokio::test]
    async fn test_file_store_corrupt_without_backup_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let store = FileConfigStore::new(&path).await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("settings.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        store.set("apikey", "k").await.unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileConfigStore::new(&path).await.unwrap();
        store.set("apikey", "secret").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_sidecars_not_shared_by_same_stem() {
        let dir = tempdir().unwrap();
        let settings_path = dir.path().join("site.json");
        let rate_path = dir.path().join("site.state");

        assert_eq!(backup_path(&settings_path), dir.path().join("site.json.backup"));
        assert_ne!(backup_path(&settings_path), backup_path(&rate_path));
        assert_ne!(temp_path(&settings_path), temp_path(&rate_path));

        let store = FileConfigStore::new(&settings_path).await.unwrap();
        store.set("apikey", "k-123").await.unwrap();
        store.set("email", "ops@example.com").await.unwrap();

        let rate = crate::rate::FileRateState::new(&rate_path, Default::default())
            .await
            .unwrap();
        crate::traits::RateState::increment_api_rate_count(&rate).await.unwrap();
        crate::traits::RateState::increment_api_rate_count(&rate).await.unwrap();

        fs::write(&settings_path, b"corrupted json data").await.unwrap();

        let recovered = FileConfigStore::new(&settings_path).await.unwrap();
        assert_eq!(
            recovered.get("apikey").await.unwrap().as_deref(),
            Some("k-123"),
            "Settings must recover from their own backup"
        );
    }
}
