// Migration plan and execution-step tracking types.
//
// A `MigrationPlan` is produced once per session by the plan service. The
// wizard derives one `ExecutionStep` per to-do item when the user approves
// the plan, then advances through them one at a time.

use serde::{Deserialize, Serialize};

use super::records::TwilioUser;

/// Structured migration recommendation returned by the plan service.
/// Fields the service omits deserialize to their empty values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationPlan {
    pub recommended_order: Vec<PrioritizedAccount>,
    pub reasoning: String,
    pub risk_assessment: String,
    pub todo_list: Vec<TodoItem>,
    pub estimated_time: String,
}

/// One source user wrapped with its migration priority and rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedAccount {
    pub account: TwilioUser,
    pub priority: u32,
    pub reason: String,
    #[serde(rename = "risk_level")]
    pub risk: String,
}

/// One planned unit of migration work. 1-indexed and contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub step: u32,
    pub description: String,
    pub action: String,
    pub risk: String,
    #[serde(default)]
    pub completed: bool,
}

/// Runtime status of one execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

/// Whether a step performs real work or is a scripted acknowledgment.
///
/// Only the terminal to-do item performs the conversion + write; every
/// earlier item is confirmed with canned detail text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Placeholder,
    Real,
}

/// Runtime tracking record for one to-do item's attempted execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStep {
    pub step_number: u32,
    pub description: String,
    pub status: StepStatus,
    pub detail: Option<String>,
    pub error: Option<String>,
    pub kind: StepKind,
}

impl MigrationPlan {
    /// Kind of the step at `index`: the final to-do item is the one that
    /// actually converts and writes, everything before it is scripted.
    pub fn step_kind(&self, index: usize) -> StepKind {
        if !self.todo_list.is_empty() && index == self.todo_list.len() - 1 {
            StepKind::Real
        } else {
            StepKind::Placeholder
        }
    }

    /// Derive execution steps from the to-do list. The first step starts
    /// `Running`, the rest `Pending`.
    pub fn build_execution_steps(&self) -> Vec<ExecutionStep> {
        let mut steps: Vec<ExecutionStep> = self
            .todo_list
            .iter()
            .enumerate()
            .map(|(i, todo)| ExecutionStep {
                step_number: todo.step,
                description: todo.description.clone(),
                status: StepStatus::Pending,
                detail: None,
                error: None,
                kind: self.step_kind(i),
            })
            .collect();

        if let Some(first) = steps.first_mut() {
            first.status = StepStatus::Running;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(step: u32, description: &str) -> TodoItem {
        TodoItem {
            step,
            description: description.to_string(),
            action: format!("do {}", description),
            risk: "low".to_string(),
            completed: false,
        }
    }

    fn plan_with_steps(n: u32) -> MigrationPlan {
        MigrationPlan {
            todo_list: (1..=n).map(|i| todo(i, &format!("step {}", i))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn execution_steps_start_with_first_running_rest_pending() {
        let plan = plan_with_steps(4);
        let steps = plan.build_execution_steps();

        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].status, StepStatus::Running);
        for step in &steps[1..] {
            assert_eq!(step.status, StepStatus::Pending);
            assert!(step.detail.is_none());
            assert!(step.error.is_none());
        }
    }

    #[test]
    fn step_numbers_and_descriptions_are_copied_from_todo_list() {
        let plan = plan_with_steps(3);
        let steps = plan.build_execution_steps();

        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.step_number, (i + 1) as u32);
            assert_eq!(step.description, format!("step {}", i + 1));
        }
    }

    #[test]
    fn only_terminal_step_is_real() {
        let plan = plan_with_steps(3);
        assert_eq!(plan.step_kind(0), StepKind::Placeholder);
        assert_eq!(plan.step_kind(1), StepKind::Placeholder);
        assert_eq!(plan.step_kind(2), StepKind::Real);

        let steps = plan.build_execution_steps();
        assert_eq!(steps[2].kind, StepKind::Real);
        assert_eq!(steps[0].kind, StepKind::Placeholder);
    }

    #[test]
    fn noncontiguous_step_numbers_are_copied_without_renumbering() {
        // The plan service is asked for 1-indexed contiguous step numbers,
        // but execution keys on list position, so a reply that violates
        // that still runs in list order with its numbers copied verbatim.
        let plan = MigrationPlan {
            todo_list: vec![todo(1, "first"), todo(3, "second"), todo(7, "third")],
            ..Default::default()
        };

        let steps = plan.build_execution_steps();
        let numbers: Vec<u32> = steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 3, 7]);
        assert_eq!(steps[0].status, StepStatus::Running);
        assert_eq!(steps[2].kind, StepKind::Real);
    }

    #[test]
    fn empty_todo_list_yields_no_steps() {
        let plan = MigrationPlan::default();
        assert!(plan.build_execution_steps().is_empty());
    }

    #[test]
    fn plan_parses_from_service_document() {
        let doc = r#"{
            "recommended_order": [
                {
                    "account": {
                        "account_sid": "AC1",
                        "friendly_name": "Jane",
                        "email": "jane@x.com",
                        "phone_number": "+15550001",
                        "status": "active"
                    },
                    "priority": 1,
                    "reason": "Admin user",
                    "risk_level": "low"
                }
            ],
            "reasoning": "migrate admins first",
            "risk_assessment": "low overall",
            "todo_list": [
                {"step": 1, "description": "Backup", "action": "back up data", "risk": "low"},
                {"step": 2, "description": "Migrate", "action": "run migration", "risk": "high"}
            ],
            "estimated_time": "15 minutes"
        }"#;

        let plan: MigrationPlan = serde_json::from_str(doc).unwrap();
        assert_eq!(plan.recommended_order.len(), 1);
        assert_eq!(plan.recommended_order[0].account.id, "AC1");
        assert_eq!(plan.recommended_order[0].risk, "low");
        assert_eq!(plan.todo_list.len(), 2);
        assert!(!plan.todo_list[0].completed);
        assert_eq!(plan.estimated_time, "15 minutes");
    }
}
