use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::models::WorkspaceStore;
use crate::seed::seeded_store;

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(100);

/// Saves and loads the workspace YAML file. A sidecar lock file guards
/// concurrent CLI invocations.
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl Storage {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let mut lock_name = file_path.clone().into_os_string();
        lock_name.push(".lock");
        Self {
            file_path,
            lock_file_path: PathBuf::from(lock_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Exclusive lock for writers. The handle must be held for the whole
    /// operation; dropping it releases the lock.
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(|| FileExt::try_lock_exclusive(&lock_file))?;

        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        Ok(lock_file)
    }

    /// Shared lock for readers; `None` when no writer has ever locked the file
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(|| FileExt::try_lock_shared(&lock_file))?;
        Ok(Some(lock_file))
    }

    fn wait_for_lock<F>(&self, mut try_lock: F) -> Result<()>
    where
        F: FnMut() -> std::io::Result<()>,
    {
        let start = Instant::now();
        loop {
            match try_lock() {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another process may be editing: {:?}",
                            self.file_path
                        );
                    }
                    log::debug!("Waiting for lock on {:?}", self.lock_file_path);
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to acquire lock on {:?}", self.lock_file_path))
                }
            }
        }
    }

    fn read_store(&self) -> Result<WorkspaceStore> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        let store: WorkspaceStore = serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))?;
        check_lanes(&store)?;
        check_feature_interest(&store)?;
        Ok(store)
    }

    fn write_store(&self, store: &WorkspaceStore) -> Result<()> {
        let yaml = serde_yaml::to_string(store)?;
        fs::write(&self.file_path, yaml)
            .with_context(|| format!("Failed to write workspace to {:?}", self.file_path))
    }

    /// Loads the workspace. A missing file is created from the sample data
    /// laid out per `config`.
    pub fn load(&self, config: &AppConfig) -> Result<WorkspaceStore> {
        if !self.file_path.exists() {
            log::info!("No workspace at {:?}, creating one", self.file_path);
            let store = seeded_store(config)?;
            self.save(&store)?;
            return Ok(store);
        }

        let _lock = self.acquire_read_lock()?;
        self.read_store()
    }

    /// Writes `config`'s sample workspace, replacing any existing file
    pub fn initialize(&self, config: &AppConfig) -> Result<WorkspaceStore> {
        let store = seeded_store(config)?;
        self.save(&store)?;
        Ok(store)
    }

    pub fn save(&self, store: &WorkspaceStore) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = self.acquire_write_lock()?;
        self.write_store(store)
    }

    /// Re-reads the file under an exclusive lock, applies `update_fn` and
    /// saves. When `update_fn` fails nothing is written.
    pub fn update_atomically<F, T>(&self, update_fn: F) -> Result<(WorkspaceStore, T)>
    where
        F: FnOnce(&mut WorkspaceStore) -> Result<T>,
    {
        let _lock = self.acquire_write_lock()?;

        let mut store = self.read_store()?;
        let output = update_fn(&mut store)?;
        self.write_store(&store)?;

        Ok((store, output))
    }
}

/// Every task must sit in one of the board's lanes
fn check_lanes(store: &WorkspaceStore) -> Result<()> {
    if let Some(task) = store
        .board
        .tasks()
        .iter()
        .find(|t| !store.board.has_lane(&t.status))
    {
        anyhow::bail!("Task {} is in unknown lane '{}'", task.id, task.status);
    }
    if !store.board.has_lane(store.board.done_lane()) {
        anyhow::bail!("Done lane '{}' is not on the board", store.board.done_lane());
    }
    Ok(())
}

/// Feature interest scores are percentages
fn check_feature_interest(store: &WorkspaceStore) -> Result<()> {
    if let Some(item) = store.feature_interest.iter().find(|i| i.value > 100) {
        anyhow::bail!(
            "Feature interest '{}' has value {}, expected 0-100",
            item.label,
            item.value
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpsError;
    use crate::models::{ExpenseFrequency, NewExpense};
    use crate::money::Money;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> Storage {
        Storage::new(dir.path().join("workspace.yaml"))
    }

    #[test]
    fn test_load_missing_file_creates_seeded_workspace() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        assert!(!storage.exists());

        let store = storage.load(&AppConfig::default()).unwrap();
        assert!(storage.exists());
        assert_eq!(store.board.tasks().len(), 7);
        assert_eq!(store.team.len(), 4);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let config = AppConfig::default();

        let mut store = storage.load(&config).unwrap();
        store.board.move_task("t6", "done", 0).unwrap();
        store.add_team_member("Dana Ops".into(), "Member".into(), "dana@startupops.com".into());
        storage.save(&store).unwrap();

        let loaded = storage.load(&config).unwrap();
        assert_eq!(loaded.board.tasks(), store.board.tasks());
        assert_eq!(loaded.team, store.team);
        assert_eq!(loaded.feedback, store.feedback);
        assert_eq!(loaded.financials, store.financials);
        assert_eq!(loaded.next_record_id, store.next_record_id);
    }

    #[test]
    fn test_task_counter_survives_reload() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let config = AppConfig::default();

        let mut store = storage.load(&config).unwrap();
        store.board.add_task("Pitch deck".into(), "Beta".into(), "AF".into()).unwrap();
        storage.save(&store).unwrap();

        let mut loaded = storage.load(&config).unwrap();
        let id = loaded.board.add_task("Hire".into(), "Growth".into(), "AF".into()).unwrap();
        assert_eq!(id, "t9");
    }

    #[test]
    fn test_update_atomically_applies_and_saves() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let config = AppConfig::default();
        let before = storage.load(&config).unwrap().financials.monthly_burn;

        let (store, id) = storage
            .update_atomically(|store| {
                Ok(store.add_expense(NewExpense {
                    merchant: "Notion".into(),
                    category: None,
                    amount: Money::from_units(100),
                    frequency: ExpenseFrequency::Monthly,
                })?)
            })
            .unwrap();
        assert_eq!(store.financials.monthly_burn, before + Money::from_units(100));

        let reloaded = storage.load(&config).unwrap();
        assert_eq!(reloaded.financials.monthly_burn, before + Money::from_units(100));
        assert_eq!(reloaded.expenses[0].id, id);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let config = AppConfig::default();
        storage.load(&config).unwrap();
        let before = fs::read_to_string(storage.path()).unwrap();

        let result: Result<(WorkspaceStore, ())> = storage.update_atomically(|store| {
            store.financials.mrr = Money::from_units(1);
            Err(OpsError::PermissionDenied("edit financials").into())
        });
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(storage.path()).unwrap(), before);
    }

    #[test]
    fn test_load_rejects_task_in_unknown_lane() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let config = AppConfig::default();
        storage.load(&config).unwrap();

        let yaml = fs::read_to_string(storage.path()).unwrap();
        fs::write(storage.path(), yaml.replace("status: backlog", "status: icebox")).unwrap();

        let err = storage.load(&config).unwrap_err();
        assert!(err.to_string().contains("unknown lane 'icebox'"));
    }

    #[test]
    fn test_load_rejects_out_of_range_interest() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let config = AppConfig::default();
        storage.load(&config).unwrap();

        let yaml = fs::read_to_string(storage.path()).unwrap();
        fs::write(storage.path(), yaml.replace("value: 80", "value: 250")).unwrap();

        let err = storage.load(&config).unwrap_err();
        assert!(err.to_string().contains("value 250, expected 0-100"));
    }

    #[test]
    fn test_lock_file_sits_next_to_workspace() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.save(&WorkspaceStore::default()).unwrap();

        assert!(dir.path().join("workspace.yaml.lock").exists());
    }
}
