//! Console commands and their text rendering
//!
//! Every command refreshes the coordinator from the store first; the console
//! process starts with an empty cache. Reports are rendered in full, failures
//! included, and a command only counts as clean when nothing failed.

use activation_core::{
    ActivationPlan, ActivationReport, CallFailure, CollectionStatus, Coordinator,
    DeactivationReport, Entity, EntityId, ReconcileReport, RemoteStore, Result,
};
use clap::Subcommand;
use std::collections::BTreeMap;

/// Longest label shown for an entity
const LABEL_WIDTH: usize = 50;

/// Console commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List entities and flag a multiple-active violation
    Status,

    /// Show what activating an entity would change
    Plan {
        /// Entity ID
        id: String,
    },

    /// Make an entity the only active one
    Activate {
        /// Entity ID
        id: String,
    },

    /// Switch an entity off
    Deactivate {
        /// Entity ID
        id: String,
    },

    /// Keep the newest active entity and switch off the rest
    Reconcile,
}

/// Rendered command result
#[derive(Debug)]
pub struct CommandOutput {
    pub text: String,
    /// Nothing failed and no violation is left
    pub clean: bool,
}

/// Execute a console command
pub async fn execute_command<S: RemoteStore>(
    coordinator: &Coordinator<S>,
    command: Commands,
    label_field: &str,
) -> Result<CommandOutput> {
    match command {
        Commands::Status => {
            let status = coordinator.refresh().await?;
            let entities = coordinator.snapshot().await;
            Ok(CommandOutput {
                text: format_status(&status, &entities, label_field),
                clean: !status.violation(),
            })
        }

        Commands::Plan { id } => {
            coordinator.refresh().await?;
            let plan = coordinator.plan_activation(&EntityId::from(id)).await?;
            Ok(CommandOutput {
                text: format_plan(&plan),
                clean: true,
            })
        }

        Commands::Activate { id } => {
            coordinator.refresh().await?;
            let report = coordinator.activate(&EntityId::from(id)).await?;
            Ok(CommandOutput {
                clean: !report.has_failures(),
                text: format_activation(&report),
            })
        }

        Commands::Deactivate { id } => {
            coordinator.refresh().await?;
            let report = coordinator.deactivate(&EntityId::from(id)).await?;
            Ok(CommandOutput {
                clean: !report.failed,
                text: format_deactivation(&report),
            })
        }

        Commands::Reconcile => {
            let report = coordinator.refresh_and_reconcile().await?;
            Ok(CommandOutput {
                clean: !report.has_residue(),
                text: format_reconcile(&report),
            })
        }
    }
}

/// Format the collection for display
fn format_status(status: &CollectionStatus, entities: &[Entity], label_field: &str) -> String {
    let mut output = format!(
        "Total: {} | Active: {} | Inactive: {}\n",
        status.total, status.active, status.inactive
    );

    if !entities.is_empty() {
        output.push('\n');
    }
    for entity in entities {
        output.push_str(&format!(
            "  [{}] {:<12} {:<22} {}\n",
            if entity.active { "ON " } else { "OFF" },
            entity.id,
            format_created(entity),
            format_label(entity, label_field)
        ));
    }

    if status.violation() {
        output.push_str(&format!(
            "\nWARNING: {} entities are active ({}). Only one should be active; run `activation reconcile`.\n",
            status.active,
            join_ids(status.active_ids.iter())
        ));
    }

    output
}

/// Format an activation preview
fn format_plan(plan: &ActivationPlan) -> String {
    if plan.is_noop() {
        return format!("{} is already the only active entity; nothing to do\n", plan.target);
    }

    let mut output = String::new();
    if !plan.already_active {
        output.push_str(&format!("Activate {}\n", plan.target));
    }
    if !plan.to_deactivate.is_empty() {
        output.push_str(&format!(
            "Deactivate {} other active entit{}: {}\n",
            plan.to_deactivate.len(),
            if plan.to_deactivate.len() == 1 { "y" } else { "ies" },
            join_ids(plan.to_deactivate.iter())
        ));
    }
    output.push_str(&format!("{} call(s) would be issued\n", plan.call_count()));
    output
}

/// Format an activation report
fn format_activation(report: &ActivationReport) -> String {
    let mut output = String::new();

    if !report.has_failures() {
        output.push_str(&format!(
            "SUCCESS: {} is the only active entity ({} call(s))\n",
            report.activated_id, report.calls_issued
        ));
    } else if report.activated {
        output.push_str(&format!(
            "PARTIAL: {} is active, but other entities may still be active\n",
            report.activated_id
        ));
    } else {
        output.push_str(&format!("FAILED: {} could not be activated\n", report.activated_id));
    }

    if !report.deactivated_ids.is_empty() {
        output.push_str(&format!("Deactivated: {}\n", join_ids(report.deactivated_ids.iter())));
    }
    output.push_str(&format_failures(&report.failures));
    output
}

/// Format a deactivation report
fn format_deactivation(report: &DeactivationReport) -> String {
    match &report.failure {
        None => format!("SUCCESS: {} is inactive\n", report.deactivated_id),
        Some(failure) => format!("FAILED: {} was not deactivated: {}\n", report.deactivated_id, failure),
    }
}

/// Format a reconciliation report
fn format_reconcile(report: &ReconcileReport) -> String {
    if !report.violation_found {
        return match &report.kept_active_id {
            Some(id) => format!("No violation: {} is the only active entity\n", id),
            None => "No violation: no entity is active\n".to_string(),
        };
    }

    let mut output = String::new();
    if let Some(id) = &report.kept_active_id {
        output.push_str(&format!("Kept {} active (newest)\n", id));
    }
    if !report.deactivated_ids.is_empty() {
        output.push_str(&format!("Deactivated: {}\n", join_ids(report.deactivated_ids.iter())));
    }
    if report.has_residue() {
        output.push_str("PARTIAL: violation remains; re-run `activation reconcile`\n");
        output.push_str(&format_failures(&report.failures));
    }
    output
}

fn format_failures(failures: &BTreeMap<EntityId, CallFailure>) -> String {
    let mut output = String::new();
    for (id, failure) in failures {
        output.push_str(&format!("Failed: {} ({})\n", id, failure));
    }
    output
}

fn format_created(entity: &Entity) -> String {
    entity
        .created_at
        .map(|ts| ts.format("%b %-d, %Y %-I:%M %p").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_label(entity: &Entity, label_field: &str) -> String {
    let label = entity
        .payload
        .get(label_field)
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if label.chars().count() > LABEL_WIDTH {
        let cut: String = label.chars().take(LABEL_WIDTH).collect();
        format!("{}...", cut)
    } else {
        label.to_string()
    }
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a EntityId>) -> String {
    ids.map(EntityId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use activation_core::{MockStore, StoreError};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn question(id: &str, active: bool, hour: u32, text: &str) -> Entity {
        Entity::new(id, active)
            .with_created_at(Utc.with_ymd_and_hms(2024, 3, 5, hour, 30, 0).unwrap())
            .with_field("question", json!(text))
    }

    fn console(entities: Vec<Entity>) -> Coordinator<MockStore> {
        Coordinator::new(MockStore::new().with_entities(entities))
    }

    #[tokio::test]
    async fn test_status_lists_entities_and_warns() {
        let coordinator = console(vec![
            question("q1", true, 9, "Tea or coffee?"),
            question("q2", true, 10, "Cats or dogs?"),
            question("q3", false, 11, "Mountains or sea?"),
        ]);

        let output = execute_command(&coordinator, Commands::Status, "question").await.unwrap();

        assert!(!output.clean);
        assert!(output.text.starts_with("Total: 3 | Active: 2 | Inactive: 1"));
        assert!(output.text.contains("[ON ] q1"));
        assert!(output.text.contains("Mar 5, 2024 9:30 AM"));
        assert!(output.text.contains("Mountains or sea?"));
        assert!(output.text.contains("WARNING: 2 entities are active (q1, q2)"));
    }

    #[tokio::test]
    async fn test_plan_issues_no_calls() {
        let coordinator = console(vec![question("q1", true, 9, "a"), question("q2", false, 10, "b")]);

        let output = execute_command(&coordinator, Commands::Plan { id: "q2".into() }, "question")
            .await
            .unwrap();

        assert!(output.text.contains("Activate q2"));
        assert!(output.text.contains("Deactivate 1 other active entity: q1"));
        assert_eq!(coordinator.store().call_count(), 0);
    }

    #[tokio::test]
    async fn test_activation_failure_is_never_reported_as_success() {
        let coordinator = console(vec![
            question("q1", true, 9, "a"),
            question("q2", true, 10, "b"),
            question("q3", false, 11, "c"),
        ]);
        coordinator
            .store()
            .fail_on("q1", StoreError::Unavailable("503".into()));

        let output = execute_command(&coordinator, Commands::Activate { id: "q3".into() }, "question")
            .await
            .unwrap();

        assert!(!output.clean);
        assert!(!output.text.contains("SUCCESS"));
        assert!(output.text.contains("PARTIAL: q3 is active"));
        assert!(output.text.contains("Deactivated: q2"));
        assert!(output.text.contains("Failed: q1"));
    }

    #[tokio::test]
    async fn test_activate_unknown_is_an_error() {
        let coordinator = console(vec![question("q1", true, 9, "a")]);

        let result =
            execute_command(&coordinator, Commands::Activate { id: "nope".into() }, "question").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reconcile_output() {
        let coordinator = console(vec![question("old", true, 8, "a"), question("new", true, 9, "b")]);

        let output = execute_command(&coordinator, Commands::Reconcile, "question").await.unwrap();

        assert!(output.clean);
        assert!(output.text.contains("Kept new active"));
        assert!(output.text.contains("Deactivated: old"));

        let again = execute_command(&coordinator, Commands::Reconcile, "question").await.unwrap();
        assert_eq!(again.text, "No violation: new is the only active entity\n");
    }

    #[tokio::test]
    async fn test_deactivate_output() {
        let coordinator = console(vec![question("q1", true, 9, "a")]);

        let output = execute_command(&coordinator, Commands::Deactivate { id: "q1".into() }, "question")
            .await
            .unwrap();

        assert!(output.clean);
        assert_eq!(output.text, "SUCCESS: q1 is inactive\n");
    }

    #[test]
    fn test_long_labels_are_truncated() {
        let long = "x".repeat(80);
        let entity = Entity::new("q", false).with_field("question", json!(long));

        let label = format_label(&entity, "question");

        assert_eq!(label.len(), LABEL_WIDTH + 3);
        assert!(label.ends_with("..."));
        assert_eq!(format_label(&entity, "missing"), "");
    }
}
