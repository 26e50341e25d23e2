//! JSON-file persistence for automation records.
//!
//! The store is a single JSON array of automations read on every access;
//! callers serialize writes touching the same file.

use std::path::PathBuf;

use cadence_types::Automation;
use chrono::Utc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Automation not found")]
    NotFound,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct AutomationStore {
    path: PathBuf,
}

impl AutomationStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// List all automations. A missing file is an empty list.
    pub fn list(&self) -> Result<Vec<Automation>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, automations: &[Automation]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = serde_json::to_string_pretty(automations)?;
        content.push('\n');
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Automation, StoreError> {
        self.list()?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)
    }

    pub fn create(&self, automation: Automation) -> Result<Automation, StoreError> {
        let mut automations = self.list()?;
        automations.push(automation.clone());
        self.write(&automations)?;
        Ok(automation)
    }

    /// Apply a mutation to the automation with the given id, bumping its
    /// `updated_at`.
    pub fn update<F>(&self, id: &str, mutate: F) -> Result<Automation, StoreError>
    where
        F: FnOnce(&mut Automation),
    {
        let mut automations = self.list()?;
        let automation = automations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        mutate(automation);
        automation.updated_at = Utc::now();
        let updated = automation.clone();
        self.write(&automations)?;
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut automations = self.list()?;
        let before = automations.len();
        automations.retain(|a| a.id != id);
        if automations.len() == before {
            return Err(StoreError::NotFound);
        }
        self.write(&automations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_types::{AgentStep, Schedule, SourceConfig, TriggerConfig};

    fn sample(id: &str) -> Automation {
        Automation {
            id: id.to_string(),
            name: format!("automation {id}"),
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            schedule: Schedule::interval(30),
            source: SourceConfig {
                kind: "github".into(),
                config: Default::default(),
            },
            trigger: TriggerConfig {
                event_types: vec![],
                on_new_item: true,
            },
            agent: AgentStep {
                enabled: false,
                prompt: String::new(),
            },
            outputs: vec![],
            last_run: None,
        }
    }

    fn store() -> (tempfile::TempDir, AutomationStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AutomationStore::new(dir.path().join("automations.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty_list() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, store) = store();
        store.create(sample("a1")).unwrap();
        store.create(sample("a2")).unwrap();

        assert_eq!(store.list().unwrap().len(), 2);
        assert_eq!(store.get("a2").unwrap().name, "automation a2");
        assert!(matches!(store.get("nope"), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_update_bumps_updated_at() {
        let (_dir, store) = store();
        let created = store.create(sample("a1")).unwrap();
        let updated = store.update("a1", |a| a.enabled = false).unwrap();
        assert!(!updated.enabled);
        assert!(updated.updated_at >= created.updated_at);
        assert!(!store.get("a1").unwrap().enabled);
    }

    #[test]
    fn test_update_unknown_id() {
        let (_dir, store) = store();
        let err = store.update("ghost", |_| {}).unwrap_err();
        assert_eq!(err.to_string(), "Automation not found");
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        store.create(sample("a1")).unwrap();
        store.delete("a1").unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.delete("a1"), Err(StoreError::NotFound)));
    }
}
