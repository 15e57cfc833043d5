//! Where the current plan and the profile that produced it live between
//! commands. Nothing here is durable beyond the chosen store.

use anyhow::{Context, Result};
use fs_err as fs;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::CoachError;
use crate::profile::UserProfile;
use crate::wire::FitnessPlan;

pub const PLAN_KEY: &str = "fitnessPlan";
pub const USER_KEY: &str = "userDetails";

pub trait PlanStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn clear(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl PlanStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// All keys in one JSON object at `<dir>/session.json`, replaced atomically
/// on every write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join("session.json"), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn write(&self, doc: &Map<String, Value>) -> Result<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(doc)?.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl PlanStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _g = self.lock.lock();
        Ok(self.read()?.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _g = self.lock.lock();
        let mut doc = self.read()?;
        doc.insert(key.to_string(), Value::String(value.to_string()));
        self.write(&doc)
    }

    fn clear(&self, key: &str) -> Result<()> {
        let _g = self.lock.lock();
        let mut doc = self.read()?;
        if doc.remove(key).is_some() {
            self.write(&doc)?;
        }
        Ok(())
    }
}

/// Typed view over a [`PlanStore`]: values are stored as JSON strings under
/// [`PLAN_KEY`] and [`USER_KEY`].
pub struct PlanSession<S: PlanStore> {
    store: S,
}

fn store_err(e: anyhow::Error) -> CoachError {
    CoachError::Store(format!("{e:#}"))
}

impl<S: PlanStore> PlanSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&self, plan: &FitnessPlan, profile: &UserProfile) -> Result<(), CoachError> {
        self.replace_plan(plan)?;
        let user = serde_json::to_string(profile).map_err(|e| CoachError::Store(e.to_string()))?;
        self.store.set(USER_KEY, &user).map_err(store_err)
    }

    /// Swap the plan wholesale; the profile is left alone.
    pub fn replace_plan(&self, plan: &FitnessPlan) -> Result<(), CoachError> {
        let raw = serde_json::to_string(plan).map_err(|e| CoachError::Store(e.to_string()))?;
        self.store.set(PLAN_KEY, &raw).map_err(store_err)
    }

    /// Both keys must be present and readable, otherwise the caller is sent
    /// back to the entry step with [`CoachError::MissingSession`].
    pub fn load(&self) -> Result<(FitnessPlan, UserProfile), CoachError> {
        Ok((self.load_plan()?, self.load_profile()?))
    }

    pub fn load_profile(&self) -> Result<UserProfile, CoachError> {
        self.read_key(USER_KEY)
    }

    fn load_plan(&self) -> Result<FitnessPlan, CoachError> {
        self.read_key(PLAN_KEY)
    }

    fn read_key<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T, CoachError> {
        let raw = self.store.get(key).map_err(store_err)?.ok_or(CoachError::MissingSession)?;
        serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!("stored {} is unreadable: {}", key, e);
            CoachError::MissingSession
        })
    }

    pub fn clear(&self) -> Result<(), CoachError> {
        self.store.clear(PLAN_KEY).map_err(store_err)?;
        self.store.clear(USER_KEY).map_err(store_err)
    }
}
