// Plan service client.
//
// Asks an LLM text-generation endpoint for a migration plan over the
// source user records and parses the structured reply. One attempt per
// call, 30 second timeout, no retry; any failure is terminal for the
// wizard session.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::error::MigrationError;
use crate::models::plan::MigrationPlan;
use crate::models::records::TwilioUser;
use crate::utils::logging::mask_sensitive;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const MODEL: &str = "claude-3-sonnet-20240229";
const MAX_TOKENS: u32 = 4000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
struct ApiRequest {
    model: &'static str,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ApiContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiContent {
    #[serde(default)]
    text: String,
}

pub struct Planner {
    api_key: String,
    client: reqwest::Client,
}

impl Planner {
    /// Build a planner from the process environment. A missing credential
    /// is a precondition failure before any network call is attempted.
    pub fn from_env() -> Result<Self, MigrationError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(MigrationError::CredentialMissing)?;
        Self::new(api_key)
    }

    pub fn new(api_key: String) -> Result<Self, MigrationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MigrationError::PlanService(e.to_string()))?;
        Ok(Self { api_key, client })
    }

    /// Request a migration plan for the given source users.
    pub async fn plan_migration_order(
        &self,
        users: &[TwilioUser],
    ) -> Result<MigrationPlan, MigrationError> {
        let users_json = serde_json::to_string_pretty(users)
            .map_err(|e| MigrationError::parse_failure("source users", e))?;

        info!(
            "[PHASE: planning] Requesting migration plan for {} users (key {})",
            users.len(),
            mask_sensitive(&self.api_key)
        );

        let reply = self.call(&build_plan_prompt(&users_json)).await?;
        let document = extract_json_document(&reply)?;

        serde_json::from_str(document)
            .map_err(|e| MigrationError::parse_failure("plan service reply", e))
    }

    /// Free-text migration-readiness commentary over the source users.
    /// Callers treat failure as non-fatal.
    pub async fn analyze_data_quality(
        &self,
        users: &[TwilioUser],
    ) -> Result<String, MigrationError> {
        let users_json = serde_json::to_string_pretty(users)
            .map_err(|e| MigrationError::parse_failure("source users", e))?;
        self.call(&build_quality_prompt(&users_json)).await
    }

    async fn call(&self, prompt: &str) -> Result<String, MigrationError> {
        let request = ApiRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| MigrationError::PlanService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "[PHASE: planning] Plan service returned HTTP {}: {}",
                status, body
            );
            return Err(MigrationError::PlanService(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| MigrationError::parse_failure("plan service response", e))?;

        match parsed.content.into_iter().next() {
            Some(content) if !content.text.is_empty() => Ok(content.text),
            _ => Err(MigrationError::PlanService(
                "no content in plan service response".to_string(),
            )),
        }
    }
}

/// Isolate the JSON document embedded in a free-text reply: everything
/// from the first `{` through the last `}`. Missing either brace is a
/// parse failure.
fn extract_json_document(reply: &str) -> Result<&str, MigrationError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(MigrationError::parse_failure(
            "plan service reply",
            "no JSON document found in response text",
        )),
    }
}

fn build_plan_prompt(users_json: &str) -> String {
    format!(
        r#"You are a phone system migration expert. Create a comprehensive migration plan with a detailed to-do list.

User Accounts to Migrate:
{users_json}

Please provide a detailed migration plan with:
1. Analysis of the accounts and optimal order
2. A step-by-step to-do list for the migration process
3. Risk assessment and mitigation strategies
4. Estimated time for completion

Respond with a JSON object in this exact format:
{{
  "recommended_order": [
    {{
      "account": {{
        "account_sid": "AC123",
        "friendly_name": "John Doe",
        "email": "john@example.com",
        "phone_number": "+1234567890",
        "status": "active"
      }},
      "priority": 1,
      "reason": "Admin user - needs to be migrated first to maintain system management",
      "risk_level": "low"
    }}
  ],
  "reasoning": "Overall strategy explanation focusing on minimizing business disruption",
  "risk_assessment": "Detailed risk analysis and mitigation strategies",
  "todo_list": [
    {{
      "step": 1,
      "description": "Backup current system data",
      "action": "Create full backup of the source configuration and user data",
      "risk": "low"
    }},
    {{
      "step": 2,
      "description": "Validate data integrity",
      "action": "Check for missing fields, invalid phone numbers, duplicate accounts",
      "risk": "medium"
    }},
    {{
      "step": 3,
      "description": "Begin user migration in priority order",
      "action": "Migrate users according to recommended order with validation",
      "risk": "high"
    }}
  ],
  "estimated_time": "15-20 minutes including validation steps"
}}

Create a comprehensive to-do list with 5-8 steps that covers the entire migration process from preparation to completion."#
    )
}

fn build_quality_prompt(users_json: &str) -> String {
    format!(
        r#"Analyze this phone system data for migration readiness:

{users_json}

Please check for:
- Missing or invalid phone numbers
- Incomplete user information (missing emails, names)
- Data inconsistencies
- Potential duplicate accounts
- Format issues that could cause migration problems

Provide a concise analysis with specific recommendations for data cleanup before migration."#
    )
}
