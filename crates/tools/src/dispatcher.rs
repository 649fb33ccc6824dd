//! Tool execution under scheduling policies.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use duplex_core::ToolCallRequest;

use crate::{ActionResponse, ToolRegistry, ToolType};

/// A completed background tool run, waiting to be spoken once the
/// conversation goes idle.
#[derive(Debug, Clone)]
pub struct IdleResult {
    pub tool: String,
    pub outcome: ActionResponse,
}

/// Executes resolved tool calls per their [`ToolType`] policy.
///
/// Synchronous policies (`WAIT`, `SCHEDULER`, `ADD_SYS_PROMPT`) block
/// the caller and return the tool's own outcome. `NONE` runs in the
/// background with the result discarded. `TIME_CONSUMING` runs in the
/// background, returns a spoken acknowledgement immediately, and parks
/// the eventual result on the idle queue.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    busy_acknowledgement: String,
    idle_tx: mpsc::UnboundedSender<IdleResult>,
    idle_rx: Mutex<mpsc::UnboundedReceiver<IdleResult>>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, busy_acknowledgement: impl Into<String>) -> Self {
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            busy_acknowledgement: busy_acknowledgement.into(),
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one tool call. Never returns an error: failures are
    /// folded into an action the orchestrator can act on (`NOTFOUND`
    /// or a silent `NONE`), keeping the conversation loop alive.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> ActionResponse {
        let Some(tool) = self.registry.lookup(&call.name) else {
            warn!(tool = %call.name, "tool not found");
            return ActionResponse::not_found();
        };

        let args = match parse_args(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "unparseable tool arguments");
                return ActionResponse::none();
            }
        };
        if let Err(e) = self.registry.validate_args(tool.as_ref(), &args) {
            warn!(tool = %call.name, error = %e, "tool arguments rejected");
            return ActionResponse::none();
        }

        match tool.tool_type() {
            ToolType::Wait | ToolType::Scheduler | ToolType::AddSysPrompt => {
                match tool.call(args).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "tool failed");
                        ActionResponse::none()
                    }
                }
            }
            ToolType::None => {
                let name = call.name.clone();
                tokio::spawn(async move {
                    if let Err(e) = tool.call(args).await {
                        warn!(tool = %name, error = %e, "background tool failed");
                    }
                });
                ActionResponse::none()
            }
            ToolType::TimeConsuming => {
                let name = call.name.clone();
                let idle_tx = self.idle_tx.clone();
                tokio::spawn(async move {
                    match tool.call(args).await {
                        Ok(outcome) => {
                            debug!(tool = %name, "background tool finished");
                            let _ = idle_tx.send(IdleResult {
                                tool: name,
                                outcome,
                            });
                        }
                        Err(e) => {
                            warn!(tool = %name, error = %e, "background tool failed");
                        }
                    }
                });
                ActionResponse::response(self.busy_acknowledgement.clone())
            }
        }
    }

    /// Dequeue one completed background result, if any. Non-blocking;
    /// the orchestrator polls this only when idle.
    pub fn try_take_idle_result(&self) -> Option<IdleResult> {
        self.idle_rx.lock().try_recv().ok()
    }
}

/// Empty argument strings mean "no arguments".
fn parse_args(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        Ok(Value::Object(serde_json::Map::new()))
    } else {
        serde_json::from_str(raw)
    }
}
