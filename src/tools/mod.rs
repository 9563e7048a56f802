//! The tool dispatcher: a closed set of operations the model may invoke
//! mid-conversation. Every dispatch returns a JSON value, success payload or
//! `{"error": ...}`; nothing here propagates an error into the orchestrator,
//! so the model can always narrate the failure to the user.

use crate::extract::{Extractor, OutputMode};
use crate::llm::{Function, Tool};
use crate::los::LosClient;
use crate::schema::LOAN_APPLICATION_SCHEMA;
use crate::store::Session;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Every operation the dispatcher knows. Dispatch matches exhaustively, so a
/// new variant will not compile until it is wired through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    GetApplicationsByNic,
    GetApplicationById,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::GetApplicationsByNic, ToolKind::GetApplicationById];

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetApplicationsByNic => "get_applications_by_nic",
            Self::GetApplicationById => "get_application_by_id",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            Self::GetApplicationsByNic => "Fetches applications linked to a given NIC.",
            Self::GetApplicationById => "get application details by application ID",
        }
    }

    fn parameters(&self) -> Value {
        match self {
            Self::GetApplicationsByNic => json!({
                "type": "object",
                "properties": {
                    "nic": {"type": "string", "description": "The user's NIC number"}
                },
                "required": ["nic"],
            }),
            Self::GetApplicationById => json!({
                "type": "object",
                "properties": {
                    "applicationId": {"type": "string", "description": "The application's ID"}
                },
                "required": ["applicationId"],
            }),
        }
    }
}

/// A tool call as requested by the model: the operation name and its raw
/// argument object. Consumed once by `dispatch`.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
}

pub struct ToolRegistry {
    los: Arc<dyn LosClient>,
    extractor: Extractor,
}

impl ToolRegistry {
    pub fn new(los: Arc<dyn LosClient>, extractor: Extractor) -> Self {
        Self { los, extractor }
    }

    /// Tool declarations handed to the model provider.
    pub fn definitions(&self) -> Vec<Tool> {
        ToolKind::ALL
            .iter()
            .map(|kind| Tool {
                tool_type: "function".to_string(),
                function: Function {
                    name: kind.name().to_string(),
                    description: kind.description().to_string(),
                    parameters: kind.parameters(),
                },
            })
            .collect()
    }

    /// Runs one invocation. Always returns a JSON value: unknown names,
    /// malformed arguments, missing sessions, and upstream failures all come
    /// back error-shaped.
    pub async fn dispatch(&self, invocation: &ToolInvocation, session: Option<&Session>) -> Value {
        debug!(tool = %invocation.name, "dispatching tool invocation");

        let Some(kind) = ToolKind::from_name(&invocation.name) else {
            warn!(tool = %invocation.name, "unknown tool requested");
            return error_result(format!("Unknown tool: {}", invocation.name));
        };

        match self.execute(kind, &invocation.arguments, session).await {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %invocation.name, error = %e, "tool execution failed");
                error_result(format!("Error: {}", e))
            }
        }
    }

    async fn execute(
        &self,
        kind: ToolKind,
        arguments: &Value,
        session: Option<&Session>,
    ) -> Result<Value> {
        match kind {
            ToolKind::GetApplicationsByNic => {
                let nic = required_str(arguments, "nic")?;
                self.los.search_by_nic(nic).await
            }
            ToolKind::GetApplicationById => {
                let application_id = required_str(arguments, "applicationId")?;
                let session = session.ok_or_else(|| {
                    Error::unauthenticated("User is not signed in to perform this action!")
                })?;

                let applicant_details = self
                    .los
                    .application_detail(application_id, &session.access_token)
                    .await?;

                // The normalized application object is produced for the trace
                // only; the raw payload is what goes back to the model, which
                // matches what the UI renderer expects.
                let prompt = format!(
                    "Application details for applicant {} {}",
                    applicant_details["personalData"]["primaryFirstName"]
                        .as_str()
                        .unwrap_or_default(),
                    applicant_details["personalData"]["primaryLastName"]
                        .as_str()
                        .unwrap_or_default(),
                );
                let application_details = self
                    .extractor
                    .extract(&prompt, LOAN_APPLICATION_SCHEMA, OutputMode::Single)
                    .await?;
                debug!(application_id, "extracted application details: {}", application_details);

                Ok(applicant_details)
            }
        }
    }
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::validation(format!("missing required argument '{}'", key)))
}

fn error_result(message: impl Into<String>) -> Value {
    json!({"error": message.into()})
}
