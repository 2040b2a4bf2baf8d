// Migration engine: step executor and direct (plan-less) migration.
//
// The wizard invokes `execute_step` once per to-do item from a worker
// thread, strictly in order; each invocation reports a detail string or an
// error back through the UI channel. Placeholder steps acknowledge their
// to-do item after an artificial delay; the terminal step re-reads the
// source, applies the plan's recommended ordering, converts, and writes
// the enhanced output document.

use chrono::Local;
use log::{info, warn};
use serde_json::json;
use tokio::time::Duration;

use crate::conversion;
use crate::error::MigrationError;
use crate::models::config::MigrationConfig;
use crate::models::plan::{MigrationPlan, StepKind};
use crate::models::records::{PhoneSystemFormat, RingCentralPhoneSystem, TwilioPhoneSystem, TwilioUser};

/// Marker recorded in the enhanced output metadata.
pub const ENHANCED_BY: &str = "pbx-migrate planner";

/// Delay applied to each step in the interactive wizard, modeling a
/// non-instant unit of work. Tests pass `Duration::ZERO`.
pub const STEP_DELAY: Duration = Duration::from_millis(750);

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Execute the to-do item at `step_index`, returning its detail string.
///
/// An index at or beyond the to-do list is answered with an empty detail
/// rather than panicking; the wizard's own bound check makes this
/// unreachable in practice.
pub async fn execute_step(
    config: &MigrationConfig,
    plan: &MigrationPlan,
    step_index: usize,
    delay: Duration,
) -> Result<String, MigrationError> {
    tokio::time::sleep(delay).await;

    if step_index >= plan.todo_list.len() {
        warn!(
            "[PHASE: execution] Step index {} beyond plan length {}",
            step_index,
            plan.todo_list.len()
        );
        return Ok(String::new());
    }

    let todo = &plan.todo_list[step_index];
    match plan.step_kind(step_index) {
        StepKind::Placeholder => {
            info!(
                "[PHASE: execution] [STEP: {}] Acknowledged: {}",
                todo.step, todo.description
            );
            Ok(placeholder_detail(step_index, plan))
        }
        StepKind::Real => {
            info!(
                "[PHASE: execution] [STEP: {}] Running enhanced conversion and write",
                todo.step
            );
            run_enhanced_migration(config, plan)?;
            Ok("✓ Migration file generated successfully".to_string())
        }
    }
}

/// Canned acknowledgment for a placeholder step, mirroring the to-do
/// item's description. The user-migration step also reports how many users
/// the plan ordered.
fn placeholder_detail(step_index: usize, plan: &MigrationPlan) -> String {
    let description = &plan.todo_list[step_index].description;
    let lowered = description.to_lowercase();
    if lowered.contains("user") && lowered.contains("migrat") {
        format!(
            "✓ Migrated {} users according to the recommended order",
            plan.recommended_order.len()
        )
    } else {
        format!("✓ {} completed", description)
    }
}

/// The terminal step's real work: re-read and re-parse the source, reorder
/// users per the plan, convert, and write the enhanced output document.
fn run_enhanced_migration(
    config: &MigrationConfig,
    plan: &MigrationPlan,
) -> Result<(), MigrationError> {
    if config.source_format != PhoneSystemFormat::Twilio
        || config.target_format != PhoneSystemFormat::RingCentral
    {
        return Err(MigrationError::UnsupportedPath {
            source_format: config.source_format.to_string(),
            target_format: config.target_format.to_string(),
        });
    }

    let mut system = read_twilio_source(&config.source_file)?;
    system.users = reorder_users_by_plan(system.users, plan);

    let converted = conversion::twilio_to_ringcentral(&system);
    let document = enhanced_output_document(plan, &converted, config);

    let serialized = serde_json::to_vec_pretty(&document)
        .map_err(|e| MigrationError::parse_failure("enhanced output document", e))?;
    std::fs::write(&config.target_file, serialized)
        .map_err(|e| MigrationError::write_failure(&config.target_file, e))?;

    info!(
        "[PHASE: execution] Enhanced output written to {}",
        config.target_file
    );
    Ok(())
}

/// Reorder source users to match the plan's recommended order, matching by
/// user id. With a non-empty recommended order the output contains exactly
/// the matched entries: plan entries that reference no current source
/// record are dropped with a warning, and source users the plan never
/// names are dropped as well. Both drops mirror the upstream behavior and
/// are documented rather than corrected.
fn reorder_users_by_plan(users: Vec<TwilioUser>, plan: &MigrationPlan) -> Vec<TwilioUser> {
    if plan.recommended_order.is_empty() {
        return users;
    }

    let mut remaining = users;
    let mut ordered = Vec::with_capacity(remaining.len());

    for entry in &plan.recommended_order {
        match remaining.iter().position(|u| u.id == entry.account.id) {
            Some(idx) => ordered.push(remaining.remove(idx)),
            None => warn!(
                "[PHASE: execution] Plan entry {} has no matching source record; dropped",
                entry.account.id
            ),
        }
    }

    ordered
}

fn enhanced_output_document(
    plan: &MigrationPlan,
    converted: &RingCentralPhoneSystem,
    config: &MigrationConfig,
) -> serde_json::Value {
    json!({
        "migration_plan": plan,
        "converted_data": converted,
        "migration_metadata": {
            "enhanced_by": ENHANCED_BY,
            "migration_time": Local::now().format(TIME_FORMAT).to_string(),
            "source_format": config.source_format.as_str(),
            "target_format": config.target_format.as_str(),
            "execution_mode": "step-by-step",
        },
    })
}

/// Direct migration for the skip-planner path: a single atomic
/// read → convert → write with no step tracking.
pub fn migrate_direct(config: &MigrationConfig) -> Result<(), MigrationError> {
    let source_data = std::fs::read(&config.source_file)
        .map_err(|e| MigrationError::read_failure(&config.source_file, e))?;

    let target_data: Vec<u8> = match (config.source_format, config.target_format) {
        (PhoneSystemFormat::Twilio, PhoneSystemFormat::RingCentral) => {
            let system: TwilioPhoneSystem = serde_json::from_slice(&source_data)
                .map_err(|e| MigrationError::parse_failure(&config.source_file, e))?;
            let converted = conversion::twilio_to_ringcentral(&system);
            serde_json::to_vec_pretty(&converted)
                .map_err(|e| MigrationError::parse_failure("converted document", e))?
        }
        (PhoneSystemFormat::RingCentral, PhoneSystemFormat::Twilio) => {
            let system: RingCentralPhoneSystem = serde_json::from_slice(&source_data)
                .map_err(|e| MigrationError::parse_failure(&config.source_file, e))?;
            let converted = conversion::ringcentral_to_twilio(&system);
            serde_json::to_vec_pretty(&converted)
                .map_err(|e| MigrationError::parse_failure("converted document", e))?
        }
        (source, target) if source == target => source_data,
        (source, target) => {
            return Err(MigrationError::UnsupportedPath {
                source_format: source.to_string(),
                target_format: target.to_string(),
            })
        }
    };

    std::fs::write(&config.target_file, target_data)
        .map_err(|e| MigrationError::write_failure(&config.target_file, e))?;

    info!(
        "[PHASE: execution] Direct migration written to {} ({} -> {})",
        config.target_file, config.source_format, config.target_format
    );
    Ok(())
}

fn read_twilio_source(path: &str) -> Result<TwilioPhoneSystem, MigrationError> {
    let data = std::fs::read(path).map_err(|e| MigrationError::read_failure(path, e))?;
    serde_json::from_slice(&data).map_err(|e| MigrationError::parse_failure(path, e))
}
