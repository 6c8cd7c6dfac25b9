//! Maintenance work-order creation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{Tool, ToolArgs, ToolResult};

const PRIORITIES: [&str; 3] = ["Low", "Medium", "High"];

/// Create a maintenance work order (simulated backend).
pub struct CreateWorkOrder;

#[async_trait]
impl Tool for CreateWorkOrder {
    fn name(&self) -> &str {
        "create_work_order"
    }

    fn description(&self) -> &str {
        "Create a maintenance work order. Args: equipmentId (string), summary (string), priority (Low|Medium|High)."
    }

    async fn execute(&self, args: &ToolArgs, cancel: &CancellationToken) -> anyhow::Result<ToolResult> {
        // Argument problems are returned as results so the model can respond to them.
        let Some(equipment_id) = args.get("equipmentId").map(|s| s.trim()).filter(|s| !s.is_empty())
        else {
            return Ok(rejected("Missing 'equipmentId' argument"));
        };
        let summary = args.get("summary").map(|s| s.trim()).unwrap_or_default();
        let priority = match normalize_priority(args.get("priority").map(String::as_str)) {
            Ok(priority) => priority,
            Err(raw) => {
                return Ok(rejected(&format!(
                    "Invalid priority '{}': expected Low, Medium or High",
                    raw
                )))
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(anyhow::anyhow!("Work order creation cancelled"));
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }

        let work_order_id = Uuid::new_v4();
        tracing::info!(%work_order_id, equipment_id, priority, "Created work order");

        Ok(json!({
            "workOrderId": work_order_id.to_string(),
            "equipmentId": equipment_id,
            "summary": summary,
            "priority": priority,
        }))
    }
}

fn rejected(reason: &str) -> ToolResult {
    tracing::debug!(reason, "Work order request rejected");
    json!({ "error": reason })
}

/// Map a priority onto its canonical spelling; blank means `Medium`.
/// Returns the trimmed input when it is not a known priority.
fn normalize_priority(raw: Option<&str>) -> Result<&'static str, &str> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok("Medium");
    };
    PRIORITIES
        .iter()
        .copied()
        .find(|p| p.eq_ignore_ascii_case(raw))
        .ok_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> ToolArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn creates_work_order_with_defaults() {
        let result = CreateWorkOrder
            .execute(&args(&[("equipmentId", "PUMP-ALPHA")]), &CancellationToken::new())
            .await
            .expect("execute");

        assert_eq!(result["equipmentId"], "PUMP-ALPHA");
        assert_eq!(result["priority"], "Medium");
        let id = result["workOrderId"].as_str().expect("id string");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn priority_is_case_insensitive() {
        let result = CreateWorkOrder
            .execute(
                &args(&[("equipmentId", "PUMP-1"), ("summary", "Seal leak"), ("priority", "high")]),
                &CancellationToken::new(),
            )
            .await
            .expect("execute");
        assert_eq!(result["priority"], "High");
        assert_eq!(result["summary"], "Seal leak");
    }

    #[tokio::test]
    async fn unknown_priority_is_reported_in_result() {
        let result = CreateWorkOrder
            .execute(
                &args(&[("equipmentId", "PUMP-1"), ("priority", "Urgent")]),
                &CancellationToken::new(),
            )
            .await
            .expect("execute");
        let error = result["error"].as_str().expect("error text");
        assert!(error.contains("Invalid priority 'Urgent'"));
        assert!(result.get("workOrderId").is_none());
    }

    #[tokio::test]
    async fn missing_equipment_id_is_reported_in_result() {
        let result = CreateWorkOrder
            .execute(&args(&[("summary", "noise")]), &CancellationToken::new())
            .await
            .expect("execute");
        assert_eq!(result["error"], "Missing 'equipmentId' argument");
    }

    #[test]
    fn blank_priority_defaults_to_medium() {
        assert_eq!(normalize_priority(None), Ok("Medium"));
        assert_eq!(normalize_priority(Some("  ")), Ok("Medium"));
        assert_eq!(normalize_priority(Some(" low ")), Ok("Low"));
        assert_eq!(normalize_priority(Some("Urgent")), Err("Urgent"));
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = CreateWorkOrder
            .execute(&args(&[("equipmentId", "PUMP-1")]), &cancel)
            .await;
        assert!(result.is_err());
    }
}
