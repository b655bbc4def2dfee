use crate::output::OutputWriter;
use async_trait::async_trait;
use guds_core::ports::Transport;
use guds_core::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;

/// Represents a planned action in dry-run mode
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    pub action_type: ActionType,
    pub description: String,
    pub details: Vec<String>,
}

/// Types of remote writes that can be planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Modify,
    PlaceFile,
    Delete,
    Download,
}

impl PlannedAction {
    /// Create a new planned action
    pub fn new(action_type: ActionType, description: impl Into<String>) -> Self {
        Self {
            action_type,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// Add a detail to the planned action
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}

/// Transport that reads through to the server and records every write
pub struct DryRunTransport<T: Transport> {
    inner: T,
    actions: Mutex<Vec<PlannedAction>>,
}

impl<T: Transport> DryRunTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            actions: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, action: PlannedAction) {
        tracing::debug!("Planned {:?}: {}", action.action_type, action.description);
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(action);
    }

    /// Actions recorded so far, in request order
    pub fn actions(&self) -> Vec<PlannedAction> {
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl<T: Transport> Transport for DryRunTransport<T> {
    async fn get(&self, resource: &str) -> Result<Value> {
        self.inner.get(resource).await
    }

    async fn post(&self, resource: &str, payload: &Value) -> Result<()> {
        self.record(
            PlannedAction::new(ActionType::Create, format!("POST {}", resource))
                .with_detail(payload.to_string()),
        );
        Ok(())
    }

    async fn put(&self, resource: &str, payload: &Value) -> Result<()> {
        self.record(
            PlannedAction::new(ActionType::Modify, format!("PUT {}", resource))
                .with_detail(payload.to_string()),
        );
        Ok(())
    }

    async fn put_body(&self, resource: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.record(
            PlannedAction::new(ActionType::PlaceFile, format!("PUT {}", resource))
                .with_detail(format!("{} bytes of {}", body.len(), content_type)),
        );
        Ok(())
    }

    async fn delete(&self, resource: &str, params: &[(&str, &str)]) -> Result<()> {
        let mut action = PlannedAction::new(ActionType::Delete, format!("DELETE {}", resource));
        for (key, value) in params {
            action = action.with_detail(format!("{}={}", key, value));
        }
        self.record(action);
        Ok(())
    }

    async fn grab(&self, resource: &str, dest: &Path) -> Result<u64> {
        self.record(
            PlannedAction::new(ActionType::Download, format!("GET {}", resource))
                .with_detail(format!("Destination: {}", dest.display())),
        );
        Ok(0)
    }
}

/// Display planned actions in dry-run mode
pub fn display_planned_actions(output: &OutputWriter, actions: &[PlannedAction]) {
    if output.is_json() {
        let _ = output.result(serde_json::json!({
            "dry_run": true,
            "planned_actions": actions,
        }));
    } else {
        output.section("Planned Actions (Dry Run)");
        if actions.is_empty() {
            output.info("Nothing would be written.");
        }
        for (i, action) in actions.iter().enumerate() {
            output.info(format!("{}. {:?}: {}", i + 1, action.action_type, action.description));
            for detail in &action.details {
                output.info(format!("   - {}", detail));
            }
        }
        output.info("No changes were made. Run without --dry_run to execute these actions.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guds_core::memory::MemoryCatalog;
    use serde_json::json;

    #[test]
    fn test_action_type_serialization() {
        let action = PlannedAction::new(ActionType::PlaceFile, "PUT resource/basins/kings/a.tif");
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("place_file"));
    }

    #[tokio::test]
    async fn test_reads_pass_through_and_writes_are_recorded() {
        let catalog = MemoryCatalog::new().with_workspace("kings");
        let dry = DryRunTransport::new(catalog.clone());

        let listing = dry.get("workspaces").await.unwrap();
        assert_eq!(listing["workspaces"]["workspace"][0]["name"], "kings");

        dry.post("workspaces", &json!({"workspace": {"name": "brb"}}))
            .await
            .unwrap();
        dry.delete("workspaces/kings/coveragestores/a.json", &[("recurse", "true")])
            .await
            .unwrap();

        assert!(!catalog.has_workspace("brb"));
        assert!(catalog.writes().is_empty());

        let actions = dry.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action_type, ActionType::Create);
        assert_eq!(actions[1].details, vec!["recurse=true".to_string()]);
    }

    #[tokio::test]
    async fn test_grab_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("masked_snow_20190418.nc");
        let dry = DryRunTransport::new(MemoryCatalog::new());

        assert_eq!(dry.grab("resource/basins/kings/masked_snow_20190418.nc", &dest).await.unwrap(), 0);
        assert!(!dest.exists());
        assert_eq!(dry.actions()[0].action_type, ActionType::Download);
    }
}
