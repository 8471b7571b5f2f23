use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::UserProfile,
};

/// Owns the user-id → profile mapping
///
/// Profiles live in an in-memory cache backed by one JSON snapshot file per
/// user. Each cache entry hands out an `Arc<Mutex<UserProfile>>`; a request
/// holds that per-user lock for its whole read-modify-write cycle, so
/// concurrent requests for the same user serialize instead of racing.
pub struct ProfileStore {
    storage_dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<Mutex<UserProfile>>>>,
}

impl ProfileStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn snapshot_path(&self, user_id: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", user_id))
    }

    /// Returns the profile handle for `user_id`, creating an empty profile on
    /// first reference
    ///
    /// Never fails the caller: a corrupt or unreadable snapshot degrades to a
    /// fresh empty profile rather than propagating an error upward.
    pub async fn get_or_create(&self, user_id: &str) -> Arc<Mutex<UserProfile>> {
        if let Some(profile) = self.cache.read().await.get(user_id) {
            return Arc::clone(profile);
        }

        let mut cache = self.cache.write().await;
        // Another request may have loaded it between the read and write lock
        if let Some(profile) = cache.get(user_id) {
            return Arc::clone(profile);
        }

        let profile = self
            .load_snapshot(user_id)
            .await
            .unwrap_or_else(|| UserProfile::new(user_id));

        let handle = Arc::new(Mutex::new(profile));
        cache.insert(user_id.to_string(), Arc::clone(&handle));
        handle
    }

    /// Returns the profile handle for `user_id` only if it already exists,
    /// either cached or as a durable snapshot
    pub async fn get(&self, user_id: &str) -> Option<Arc<Mutex<UserProfile>>> {
        if let Some(profile) = self.cache.read().await.get(user_id) {
            return Some(Arc::clone(profile));
        }

        let mut cache = self.cache.write().await;
        if let Some(profile) = cache.get(user_id) {
            return Some(Arc::clone(profile));
        }

        let profile = self.load_snapshot(user_id).await?;
        let handle = Arc::new(Mutex::new(profile));
        cache.insert(user_id.to_string(), Arc::clone(&handle));
        Some(handle)
    }

    async fn load_snapshot(&self, user_id: &str) -> Option<UserProfile> {
        let path = self.snapshot_path(user_id);
        let bytes = tokio::fs::read(&path).await.ok()?;

        match serde_json::from_slice::<UserProfile>(&bytes) {
            Ok(profile) => Some(profile),
            Err(e) => {
                // Degrade to "new user" rather than failing the request
                tracing::warn!(
                    error = %e,
                    user_id,
                    path = %path.display(),
                    "Corrupt profile snapshot, starting fresh"
                );
                None
            }
        }
    }

    /// Writes the profile's full state to its snapshot file, overwriting any
    /// prior snapshot (last-write-wins)
    ///
    /// Persistence is a side channel of the response: callers log a failure
    /// and continue, leaving the in-memory state updated but not durable.
    pub async fn persist(&self, user_id: &str, profile: &UserProfile) -> AppResult<()> {
        let json = serde_json::to_vec(profile)
            .map_err(|e| AppError::Storage(format!("serialize profile {}: {}", user_id, e)))?;

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "create {}: {}",
                    self.storage_dir.display(),
                    e
                ))
            })?;

        let path = self.snapshot_path(user_id);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {}", path.display(), e)))?;

        Ok(())
    }
}
