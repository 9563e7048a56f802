use super::fsm::{TurnEvent, TurnStateMachine};
use crate::llm::{
    ChatCompletionRequest, ChatMessage, FunctionCall, LlmClient, StreamFinishReason, ToolCall,
    ToolCallChunk,
};
use crate::store::{ChatStore, Session, StoredMessage};
use crate::tools::{ToolInvocation, ToolRegistry};
use crate::{Error, Result};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

/// Upper bound on provider calls within one turn; a turn that keeps asking
/// for tools past this is cut off rather than looped forever.
const MAX_PROVIDER_ROUNDS: usize = 5;

/// Drives one conversation turn: forwards history to the model provider,
/// streams content deltas to the caller, executes requested tools one at a
/// time, and persists the finished transcript.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    store: Arc<ChatStore>,
    system_prompt: Option<String>,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        store: Arc<ChatStore>,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            llm,
            tools,
            store,
            system_prompt,
        }
    }

    /// Starts a turn and returns the stream of assistant text deltas. The
    /// turn runs until the provider stops requesting tools; dropping the
    /// returned stream aborts it without persisting anything.
    pub fn stream_turn(
        &self,
        chat_id: String,
        incoming: Vec<ChatMessage>,
        session: Session,
    ) -> ReceiverStream<Result<String>> {
        let (tx, rx) = mpsc::channel(32);

        let llm = Arc::clone(&self.llm);
        let tools = Arc::clone(&self.tools);
        let store = Arc::clone(&self.store);
        let system_prompt = self
            .system_prompt
            .clone()
            .unwrap_or_else(default_system_prompt);

        tokio::spawn(async move {
            let result = run_turn(
                llm,
                tools,
                store,
                system_prompt,
                chat_id,
                incoming,
                session,
                tx.clone(),
            )
            .await;

            if let Err(e) = result {
                error!(error = %e, "conversation turn failed");
                let _ = tx.send(Err(e)).await;
            }
        });

        ReceiverStream::new(rx)
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_turn(
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    store: Arc<ChatStore>,
    system_prompt: String,
    chat_id: String,
    incoming: Vec<ChatMessage>,
    session: Session,
    tx: mpsc::Sender<Result<String>>,
) -> Result<()> {
    let mut fsm = TurnStateMachine::new();

    // Empty-content entries fail provider-side validation, so they never
    // make it into the forwarded history.
    let filtered: Vec<ChatMessage> = incoming
        .into_iter()
        .filter(|m| !m.content.is_empty())
        .collect();
    debug!(chat_id, "starting turn with {} messages", filtered.len());

    let mut messages = Vec::with_capacity(filtered.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(filtered);

    fsm.transition(TurnEvent::Begin)?;
    let mut rounds = 0;

    while !fsm.is_terminal() {
        if rounds >= MAX_PROVIDER_ROUNDS {
            fsm.transition(TurnEvent::ErrorOccurred)?;
            return Err(Error::MaxTurnsExceeded {
                max_turns: MAX_PROVIDER_ROUNDS,
            });
        }
        rounds += 1;

        let request = ChatCompletionRequest {
            messages: messages.clone(),
            tools: tools.definitions(),
            max_tokens: None,
            temperature: None,
            response_format: None,
        };

        let mut stream = match llm.create_chat_completion_stream(request).await {
            Ok(stream) => stream,
            Err(e) => {
                fsm.transition(TurnEvent::ErrorOccurred)?;
                return Err(e);
            }
        };

        let mut content = String::new();
        let mut pending: Vec<PendingToolCall> = Vec::new();
        let mut finish: Option<StreamFinishReason> = None;

        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    fsm.transition(TurnEvent::ErrorOccurred)?;
                    return Err(e);
                }
            };

            if let Some(delta) = chunk.content {
                content.push_str(&delta);
                if tx.send(Ok(delta)).await.is_err() {
                    info!(chat_id, "caller went away, aborting turn without persisting");
                    return Ok(());
                }
            }
            for tool_call in chunk.tool_calls {
                accumulate_tool_call(&mut pending, tool_call);
            }
            if let Some(reason) = chunk.finish_reason {
                finish = Some(reason);
            }
        }

        if finish == Some(StreamFinishReason::ToolCalls) || !pending.is_empty() {
            fsm.transition(TurnEvent::ModelRequestedTools)?;
            debug!(chat_id, "model requested {} tool calls", pending.len());

            let tool_calls: Vec<ToolCall> = pending
                .iter()
                .map(|call| ToolCall {
                    id: call.id.clone(),
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect();
            messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: content.clone(),
                tool_calls: Some(tool_calls),
                tool_call_id: None,
                name: None,
            });

            // One at a time, in the order the model asked for them.
            for call in &pending {
                let arguments: Value =
                    serde_json::from_str(&call.arguments).unwrap_or(Value::Null);
                let invocation = ToolInvocation {
                    name: call.name.clone(),
                    arguments,
                };
                let result = tools.dispatch(&invocation, Some(&session)).await;
                messages.push(ChatMessage::tool(call.id.clone(), result.to_string()));
            }

            fsm.transition(TurnEvent::ToolsCompleted)?;
        } else {
            if !content.is_empty() {
                messages.push(ChatMessage::assistant(content.clone()));
            }
            fsm.transition(TurnEvent::StreamEnded)?;
        }
    }

    // Best-effort persistence by policy: the streamed reply has already been
    // delivered, so a failed save is logged and swallowed rather than
    // retracting the turn.
    let transcript: Vec<StoredMessage> = messages
        .iter()
        .skip(1) // the system prompt is not part of the transcript
        .map(|m| StoredMessage::new(m.role.clone(), m.content.clone()))
        .collect();
    if let Err(e) = store.save_chat(&chat_id, &session.user_id, &transcript).await {
        warn!(chat_id, error = %e, "failed to save chat transcript");
    }

    Ok(())
}

#[derive(Debug, Clone, Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Tool-call fragments arrive keyed by index; id and name usually land in
/// the first fragment while arguments trickle in over many.
fn accumulate_tool_call(pending: &mut Vec<PendingToolCall>, chunk: ToolCallChunk) {
    if pending.len() <= chunk.index {
        pending.resize(chunk.index + 1, PendingToolCall::default());
    }
    let slot = &mut pending[chunk.index];
    if let Some(id) = chunk.id {
        slot.id = id;
    }
    if let Some(name) = chunk.name {
        slot.name.push_str(&name);
    }
    if let Some(arguments) = chunk.arguments {
        slot.arguments.push_str(&arguments);
    }
}

pub(crate) fn default_system_prompt() -> String {
    format!(
        "\
- You help users retrieve information about applications linked to their NIC!
- Keep your responses limited to a sentence.
- DO NOT output lists.
- After every tool call, pretend you're showing the result to the user and keep your response limited to a phrase.
- Today's date is {}.
- Ask follow-up questions to guide the user smoothly through the process.
- Ask for any details you don't know, like the NIC number.
- Here's the optimal flow:
  - Ask the user to enter their NIC.
  - Retrieve applications linked to that NIC.
  - Have the user select an application from the list.
  - Provide details about the selected application.",
        chrono::Utc::now().format("%Y-%m-%d")
    )
}
