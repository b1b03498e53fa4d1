//! Directory-backed configuration store.
//!
//! # Responsibilities
//! - One `<name>.json` file per proxy configuration
//! - Atomic replacement through a temp sibling and `rename`
//! - Enumerate, read and remove committed configurations
//!
//! # Design Decisions
//! - No in-process lock: two concurrent writes to one name both commit and
//!   the later rename wins. Readers always see one complete generation.
//! - Every writer gets its own temp file, so concurrent writers never share
//!   bytes before the rename
//! - Payloads are stored verbatim, never re-encoded
//! - Only temp files older than [`STALE_TEMP_AGE`] are swept on open. During
//!   a graceful upgrade the outgoing process may still be mid-write.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::store::error::StoreError;
use crate::store::proxy::{name_from_file, validate_name, ProxyConfig, CONFIG_EXTENSION, TEMP_SUFFIX};

/// Age after which a leftover temp file is treated as abandoned.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(5 * 60);

/// Atomic CRUD over a directory of proxy configuration files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    ///
    /// Temp files left behind by an interrupted write are removed once
    /// they are older than [`STALE_TEMP_AGE`].
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::io(format!("failed to create {}", dir.display()), e))?;

        let store = Self { dir };
        let swept = store.sweep_temp_files()?;
        if swept > 0 {
            tracing::warn!(dir = %store.dir.display(), count = swept, "Removed stale temp files");
        }

        tracing::info!(dir = %store.dir.display(), "Config store opened");
        Ok(store)
    }

    /// Directory holding the configuration files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of all committed configurations, in directory order.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| StoreError::io(format!("failed to read {}", self.dir.display()), e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| StoreError::io(format!("failed to read {}", self.dir.display()), e))?;

            // Entries can vanish between readdir and stat.
            match entry.file_type() {
                Ok(file_type) if file_type.is_file() => {}
                _ => continue,
            }

            if let Some(name) = entry.file_name().to_str().and_then(name_from_file) {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    /// Exact bytes stored under `name`.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::io(format!("failed to read {}", path.display()), e),
        })
    }

    /// Validate `raw` and atomically replace the configuration under `name`.
    ///
    /// Nothing touches the filesystem unless validation passes. On failure
    /// the previous content (or absence) of `name` is left intact.
    pub fn write(&self, name: &str, raw: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        ProxyConfig::from_slice(raw)?;

        let temp = self.temp_path_for(&path);
        if let Err(e) = write_synced(&temp, raw) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::io(format!("failed to write {}", temp.display()), e));
        }

        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::io(format!("failed to commit {}", path.display()), e));
        }

        // The rename is already visible; a failed directory sync only
        // weakens crash durability.
        if let Err(e) = sync_dir(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "Directory sync failed");
        }

        tracing::debug!(name = %name, bytes = raw.len(), "Proxy config committed");
        Ok(())
    }

    /// Remove the configuration stored under `name`.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::io(format!("failed to remove {}", path.display()), e),
        })?;

        tracing::debug!(name = %name, "Proxy config removed");
        Ok(())
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{CONFIG_EXTENSION}")))
    }

    /// `<name>.json.<uuid>.temp`, next to the final file so the rename
    /// never crosses a filesystem boundary.
    fn temp_path_for(&self, path: &Path) -> PathBuf {
        let mut file_name = path.file_name().unwrap_or_default().to_os_string();
        file_name.push(format!(".{}.{TEMP_SUFFIX}", Uuid::new_v4().simple()));
        path.with_file_name(file_name)
    }

    fn sweep_temp_files(&self) -> Result<usize, StoreError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| StoreError::io(format!("failed to read {}", self.dir.display()), e))?;

        let suffix = format!(".{CONFIG_EXTENSION}");
        let mut removed = 0;
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let is_temp = file_name
                .strip_suffix(TEMP_SUFFIX)
                .and_then(|rest| rest.strip_suffix('.'))
                .is_some_and(|rest| rest.contains(&suffix));

            if is_temp && is_stale(&entry) && fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Whether `entry` was last modified more than [`STALE_TEMP_AGE`] ago.
/// Unknown or future timestamps count as fresh.
fn is_stale(entry: &fs::DirEntry) -> bool {
    entry
        .metadata()
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= STALE_TEMP_AGE)
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::error::ValidationError;
    use crate::store::proxy::MAX_NAME_LEN;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    const EXAMPLE: &[u8] = br#"{"domainNames":["example.com"],"proxyTo":"10.0.0.5:25565"}"#;

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().expect("should create temp dir");
        let store = ConfigStore::open(dir.path()).expect("should open store");
        (dir, store)
    }

    fn write_aged(path: &Path, data: &[u8]) {
        fs::write(path, data).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - 2 * STALE_TEMP_AGE).unwrap();
    }

    fn payload(i: usize) -> Vec<u8> {
        format!(
            r#"{{"domainNames":["host{i}.example.com"],"proxyTo":"10.0.0.{i}:25565","padding":"{}"}}"#,
            "x".repeat(i * 512)
        )
        .into_bytes()
    }

    #[test]
    fn write_then_read_is_byte_identical() {
        let (_dir, store) = store();
        let raw = b"{ \"proxyTo\" : \"10.0.0.5:25565\",\n  \"domainNames\": [\"a.com\", \"b.com\"], \"x\": 1.50 }";
        store.write("example", raw).unwrap();
        assert_eq!(store.read("example").unwrap(), raw.to_vec());
    }

    #[test]
    fn write_creates_named_file() {
        let (dir, store) = store();
        store.write("example", EXAMPLE).unwrap();
        let on_disk = fs::read(dir.path().join("example.json")).unwrap();
        assert_eq!(on_disk, EXAMPLE);
    }

    #[test]
    fn overwrite_replaces_content() {
        let (_dir, store) = store();
        store.write("example", EXAMPLE).unwrap();
        store.write("example", &payload(2)).unwrap();
        assert_eq!(store.read("example").unwrap(), payload(2));
    }

    #[test]
    fn invalid_write_leaves_no_file() {
        let (dir, store) = store();
        let err = store.write("bad", b"{}").unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::MissingDomainNames)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn invalid_write_keeps_previous_content() {
        let (_dir, store) = store();
        store.write("example", EXAMPLE).unwrap();
        assert!(store.write("example", br#"{"domainNames":["a"]}"#).is_err());
        assert!(store.write("example", b"").is_err());
        assert_eq!(store.read("example").unwrap(), EXAMPLE);
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(store.read("missing"), Err(StoreError::NotFound(n)) if n == "missing"));
    }

    #[test]
    fn delete_removes_file() {
        let (dir, store) = store();
        store.write("example", EXAMPLE).unwrap();
        store.delete("example").unwrap();
        assert!(!dir.path().join("example.json").exists());
        assert!(matches!(store.read("example"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("example"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_returns_committed_names_only() {
        let (dir, store) = store();
        store.write("alpha", EXAMPLE).unwrap();
        store.write("beta.example.com", EXAMPLE).unwrap();
        fs::write(dir.path().join("gamma.json.abc.temp"), b"partial").unwrap();
        fs::write(dir.path().join("README.md"), b"notes").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let names: HashSet<String> = store.list().unwrap().into_iter().collect();
        let expected: HashSet<String> = ["alpha", "beta.example.com"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn list_empty_directory() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_fails_when_directory_is_gone() {
        let (dir, store) = store();
        fs::remove_dir_all(dir.path()).unwrap();
        assert!(matches!(store.list(), Err(StoreError::Io { .. })));
    }

    #[test]
    fn write_fails_cleanly_when_directory_is_gone() {
        let (dir, store) = store();
        fs::remove_dir_all(dir.path()).unwrap();
        assert!(matches!(store.write("example", EXAMPLE), Err(StoreError::Io { .. })));
    }

    #[test]
    fn traversal_names_are_rejected_everywhere() {
        let (_dir, store) = store();
        for name in ["../escape", "a/b", "..", ""] {
            assert!(matches!(store.write(name, EXAMPLE), Err(StoreError::InvalidName(_))));
            assert!(matches!(store.read(name), Err(StoreError::InvalidName(_))));
            assert!(matches!(store.delete(name), Err(StoreError::InvalidName(_))));
        }
    }

    #[test]
    fn open_sweeps_stale_temp_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("example.json"), EXAMPLE).unwrap();
        write_aged(&dir.path().join("example.json.0123abcd.temp"), b"{\"dom");
        write_aged(&dir.path().join("other.json.temp"), b"");

        let store = ConfigStore::open(dir.path()).unwrap();
        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(remaining, vec!["example.json".to_string()]);
        assert_eq!(store.read("example").unwrap(), EXAMPLE);
    }

    #[test]
    fn open_keeps_in_flight_temp_files() {
        let dir = TempDir::new().unwrap();
        let in_flight = dir.path().join("example.json.0123abcd.temp");
        fs::write(&in_flight, EXAMPLE).unwrap();

        let store = ConfigStore::open(dir.path()).unwrap();
        assert!(in_flight.exists());
        assert!(store.list().unwrap().is_empty());

        // A writer that started before the open can still commit.
        fs::rename(&in_flight, dir.path().join("example.json")).unwrap();
        assert_eq!(store.read("example").unwrap(), EXAMPLE);
    }

    #[test]
    fn longest_name_round_trips() {
        let (dir, store) = store();
        let name = "n".repeat(MAX_NAME_LEN);

        store.write(&name, EXAMPLE).unwrap();
        assert_eq!(store.read(&name).unwrap(), EXAMPLE);
        assert_eq!(store.list().unwrap(), vec![name.clone()]);
        store.delete(&name).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn overlong_name_is_invalid_not_io() {
        let (_dir, store) = store();
        let name = "n".repeat(MAX_NAME_LEN + 1);

        assert!(matches!(store.write(&name, EXAMPLE), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.read(&name), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.delete(&name), Err(StoreError::InvalidName(_))));
    }

    #[test]
    fn open_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("proxies").join("live");
        let store = ConfigStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }

    #[test]
    fn concurrent_writes_leave_one_complete_payload() {
        let (dir, store) = store();
        let store = Arc::new(store);
        let payloads: Vec<Vec<u8>> = (1..=16).map(payload).collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|p| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.write("race", &p))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let stored = store.read("race").unwrap();
        assert!(payloads.contains(&stored), "stored content must be one submitted payload");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "no temp files left behind");
    }
}
