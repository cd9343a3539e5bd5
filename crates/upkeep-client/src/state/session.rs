/*
[INPUT]:  SessionStore (durable key-value), operator actions
[OUTPUT]: Typed session facts: token, selected equipment, counter updates, feature flags
[POS]:    State layer - single source of session facts for the core
[UPDATE]: When a new session key is introduced
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use upkeep_adapter::Equipment;

use super::storage::{Result, SessionStore};

/// Store key of the session token.
pub const TOKEN_KEY: &str = "auth.token";
/// Store key of the selected equipment id.
pub const SELECTED_EQUIPMENT_KEY: &str = "equipment.selected";
/// Store key of the `equipment id -> CounterUpdate` map.
pub const COUNTER_UPDATES_KEY: &str = "equipment.counter_updates";
/// Store key of the `flag name -> bool` map.
pub const FEATURE_FLAGS_KEY: &str = "features";

/// Feature flag enabling the classification wizard shortcut.
pub const SKIP_SHORTCUT_FLAG: &str = "wizard.skip_shortcut";

/// Last hour-counter reading recorded for an equipment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterUpdate {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFacts {
    pub token: Option<String>,
    pub selected_equipment_id: Option<String>,
    pub counter_updates: HashMap<String, CounterUpdate>,
    pub feature_flags: HashMap<String, bool>,
}

/// In-memory view of the session, written through to a [`SessionStore`].
///
/// Memory is updated before the store, so a failed write leaves the running
/// session correct and only durability is lost.
pub struct SessionCache {
    store: Arc<dyn SessionStore>,
    facts: SessionFacts,
    equipment: Option<Equipment>,
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("facts", &self.facts)
            .field("equipment", &self.equipment)
            .finish_non_exhaustive()
    }
}

impl SessionCache {
    /// Load every known key from `store`. Values that no longer decode are
    /// dropped with a warning rather than failing the session.
    pub async fn load(store: Arc<dyn SessionStore>) -> Result<Self> {
        let facts = SessionFacts {
            token: read_key(store.as_ref(), TOKEN_KEY).await?,
            selected_equipment_id: read_key(store.as_ref(), SELECTED_EQUIPMENT_KEY).await?,
            counter_updates: read_key(store.as_ref(), COUNTER_UPDATES_KEY)
                .await?
                .unwrap_or_default(),
            feature_flags: read_key(store.as_ref(), FEATURE_FLAGS_KEY)
                .await?
                .unwrap_or_default(),
        };
        debug!(
            signed_in = facts.token.is_some(),
            selected_equipment = ?facts.selected_equipment_id,
            "session loaded"
        );
        Ok(Self {
            store,
            facts,
            equipment: None,
        })
    }

    pub fn facts(&self) -> &SessionFacts {
        &self.facts
    }

    pub fn token(&self) -> Option<&str> {
        self.facts.token.as_deref()
    }

    pub async fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.facts.token = Some(token.clone());
        self.store.set(TOKEN_KEY, Value::String(token)).await
    }

    pub async fn clear_token(&mut self) -> Result<()> {
        self.facts.token = None;
        self.store.remove(TOKEN_KEY).await
    }

    pub fn selected_equipment_id(&self) -> Option<&str> {
        self.facts.selected_equipment_id.as_deref()
    }

    /// The selected equipment record, once one was provided this run.
    pub fn equipment(&self) -> Option<&Equipment> {
        self.equipment.as_ref()
    }

    /// Replace the selected equipment wholesale. Returns `true` when the
    /// selection moved to a different equipment id, which callers use to
    /// reset state tied to the previous machine.
    pub async fn select_equipment(&mut self, equipment: Equipment) -> Result<bool> {
        let changed = self.facts.selected_equipment_id.as_deref() != Some(equipment.id.as_str());
        self.facts.selected_equipment_id = Some(equipment.id.clone());
        let id = equipment.id.clone();
        self.equipment = Some(equipment);
        if changed {
            self.store.set(SELECTED_EQUIPMENT_KEY, Value::String(id)).await?;
        }
        Ok(changed)
    }

    pub fn last_counter_update(&self, equipment_id: &str) -> Option<&CounterUpdate> {
        self.facts.counter_updates.get(equipment_id)
    }

    /// Record a counter reading. The in-memory equipment record follows the
    /// reading when it belongs to the selected equipment.
    pub async fn record_counter_update(
        &mut self,
        equipment_id: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.facts
            .counter_updates
            .insert(equipment_id.to_string(), CounterUpdate { value, timestamp });
        if let Some(equipment) = self.equipment.as_mut().filter(|eq| eq.id == equipment_id) {
            equipment.hour_counter = Some(value);
        }
        let encoded = serde_json::to_value(&self.facts.counter_updates)?;
        self.store.set(COUNTER_UPDATES_KEY, encoded).await
    }

    pub fn feature_flag(&self, name: &str) -> Option<bool> {
        self.facts.feature_flags.get(name).copied()
    }

    pub async fn set_feature_flag(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.facts.feature_flags.insert(name.to_string(), enabled);
        let encoded = serde_json::to_value(&self.facts.feature_flags)?;
        self.store.set(FEATURE_FLAGS_KEY, encoded).await
    }
}

async fn read_key<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Result<Option<T>> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(err) => {
            warn!(key, error = %err, "ignoring undecodable session value");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::storage::MemorySessionStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn equipment(id: &str) -> Equipment {
        Equipment {
            id: id.to_string(),
            name: format!("Machine {id}"),
            technical_id: String::new(),
            hour_counter: Some(100.0),
            location: None,
        }
    }

    #[tokio::test]
    async fn facts_survive_reload_from_store() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let ts = Utc.with_ymd_and_hms(2026, 4, 2, 7, 30, 0).unwrap();

        let mut cache = SessionCache::load(store.clone()).await.unwrap();
        cache.set_token("tok").await.unwrap();
        cache.select_equipment(equipment("eq-1")).await.unwrap();
        cache.record_counter_update("eq-1", 1234.0, ts).await.unwrap();
        cache.set_feature_flag(SKIP_SHORTCUT_FLAG, false).await.unwrap();

        let reloaded = SessionCache::load(store).await.unwrap();
        assert_eq!(reloaded.token(), Some("tok"));
        assert_eq!(reloaded.selected_equipment_id(), Some("eq-1"));
        assert_eq!(
            reloaded.last_counter_update("eq-1"),
            Some(&CounterUpdate { value: 1234.0, timestamp: ts })
        );
        assert_eq!(reloaded.feature_flag(SKIP_SHORTCUT_FLAG), Some(false));
        // The equipment record itself is not durable.
        assert!(reloaded.equipment().is_none());
    }

    #[tokio::test]
    async fn select_equipment_reports_change() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let mut cache = SessionCache::load(store).await.unwrap();

        assert!(cache.select_equipment(equipment("eq-1")).await.unwrap());
        assert!(!cache.select_equipment(equipment("eq-1")).await.unwrap());
        assert!(cache.select_equipment(equipment("eq-2")).await.unwrap());
        assert_eq!(cache.equipment().map(|eq| eq.id.as_str()), Some("eq-2"));
    }

    #[tokio::test]
    async fn counter_update_refreshes_selected_equipment() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let mut cache = SessionCache::load(store).await.unwrap();
        cache.select_equipment(equipment("eq-1")).await.unwrap();

        cache.record_counter_update("eq-2", 50.0, Utc::now()).await.unwrap();
        assert_eq!(cache.equipment().and_then(|eq| eq.hour_counter), Some(100.0));

        cache.record_counter_update("eq-1", 180.0, Utc::now()).await.unwrap();
        assert_eq!(cache.equipment().and_then(|eq| eq.hour_counter), Some(180.0));
    }

    #[tokio::test]
    async fn undecodable_values_are_dropped() {
        let store = Arc::new(MemorySessionStore::new());
        store.set(TOKEN_KEY, json!(42)).await.unwrap();
        store.set(COUNTER_UPDATES_KEY, json!("garbage")).await.unwrap();

        let cache = SessionCache::load(store).await.unwrap();
        assert_eq!(cache.token(), None);
        assert!(cache.facts().counter_updates.is_empty());
    }

    #[tokio::test]
    async fn clear_token_removes_key() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let mut cache = SessionCache::load(store.clone()).await.unwrap();
        cache.set_token("tok").await.unwrap();
        cache.clear_token().await.unwrap();

        assert_eq!(cache.token(), None);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    }
}
