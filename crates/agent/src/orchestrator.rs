//! The duplex state machine.
//!
//! One loop consumes classified VAD events in capture order. Between a
//! `start` and its matching `end` it buffers frames; on `end` it
//! recognizes the utterance and dispatches a chat turn. Turns run as
//! spawned tasks so the loop keeps listening while the agent speaks,
//! which is what makes barge-in possible: a `start` during an active
//! response interrupts playback, supersedes the running turn, and the
//! new utterance begins immediately.
//!
//! State the turn task shares with the loop (`chat_lock`, the turn
//! epoch, the dialogue) is mutated only through atomics and a mutex;
//! everything else flows through channels.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use duplex_core::{
    AudioFrame, Dialogue, LanguageModel, Message, Recorder, Role, SpeechRecognizer,
    TokenStream, ToolCallAccumulator, ToolCallRequest, VadEvent, VadStatus,
    VoiceActivityDetector,
};
use duplex_pipeline::{spawn_capture, SegmentBuffer, SpeechPipeline};
use duplex_tools::{Action, ActionResponse, ToolDispatcher};

use crate::AgentError;

/// Invoked with `(role, content)` at every user and assistant turn
/// boundary.
pub type TurnListener = Arc<dyn Fn(Role, &str) + Send + Sync>;

/// Capacity of the classified-event channel feeding the duplex loop.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Turn-loop tuning.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub system_prompt: String,
    /// Whether user speech may interrupt an active response.
    pub interrupt_enabled: bool,
    /// Directory for dialogue history dumps; `None` disables them.
    pub history_path: Option<PathBuf>,
    /// Maximum REQLLM/ADDSYSTEMSPEAK chain length within one turn.
    pub max_tool_chain_depth: usize,
}

/// Everything the orchestrator drives.
pub struct Collaborators {
    pub recorder: Arc<dyn Recorder>,
    pub vad: Arc<dyn VoiceActivityDetector>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub model: Arc<dyn LanguageModel>,
    pub dispatcher: Arc<ToolDispatcher>,
    pub pipeline: Arc<SpeechPipeline>,
}

pub struct DuplexOrchestrator {
    recorder: Arc<dyn Recorder>,
    vad: Arc<dyn VoiceActivityDetector>,
    shared: Arc<Shared>,
    shutdown_requested: AtomicBool,
    shutdown_notify: Notify,
}

/// State shared between the duplex loop and spawned turn tasks.
struct Shared {
    recognizer: Arc<dyn SpeechRecognizer>,
    model: Arc<dyn LanguageModel>,
    dispatcher: Arc<ToolDispatcher>,
    pipeline: Arc<SpeechPipeline>,
    dialogue: Mutex<Dialogue>,
    listeners: Mutex<Vec<TurnListener>>,
    /// True while a chat turn is in flight.
    chat_lock: AtomicBool,
    /// Bumped on barge-in; a turn that observes a newer epoch is
    /// superseded and stops scheduling speech.
    turn_epoch: AtomicU64,
    config: OrchestratorConfig,
}

impl DuplexOrchestrator {
    pub fn new(collaborators: Collaborators, config: OrchestratorConfig) -> Self {
        let mut dialogue = Dialogue::new(&config.system_prompt);
        if let Some(path) = &config.history_path {
            dialogue = dialogue.with_history_path(path);
        }
        Self {
            recorder: collaborators.recorder,
            vad: collaborators.vad,
            shared: Arc::new(Shared {
                recognizer: collaborators.recognizer,
                model: collaborators.model,
                dispatcher: collaborators.dispatcher,
                pipeline: collaborators.pipeline,
                dialogue: Mutex::new(dialogue),
                listeners: Mutex::new(Vec::new()),
                chat_lock: AtomicBool::new(false),
                turn_epoch: AtomicU64::new(0),
                config,
            }),
            shutdown_requested: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
        }
    }

    /// Register a listener for user/assistant turn boundaries.
    pub fn listen(&self, listener: TurnListener) {
        self.shared.listeners.lock().push(listener);
    }

    /// Start capture and block on the duplex loop until [`shutdown`]
    /// is called or the capture stream ends.
    ///
    /// [`shutdown`]: DuplexOrchestrator::shutdown
    pub async fn run(&self) -> Result<(), AgentError> {
        info!("starting duplex loop");
        let (events, classifier) =
            spawn_capture(self.recorder.clone(), self.vad.clone(), EVENT_CHANNEL_CAPACITY)
                .await
                .map_err(AgentError::Core)?;

        self.drive(events).await;

        self.recorder.stop().await;
        self.shared.pipeline.interrupt();
        classifier.abort();
        info!("duplex loop stopped");
        Ok(())
    }

    /// Stop the duplex loop. Idempotent; safe to call while a turn is
    /// in flight (the turn's remaining output is discarded).
    pub fn shutdown(&self) {
        if !self.shutdown_requested.swap(true, Ordering::SeqCst) {
            info!("shutdown requested");
        }
        self.shutdown_notify.notify_waiters();
    }

    /// Run the duplex loop over an already-classified event stream.
    /// [`run`] wires capture and calls this; embedders with their own
    /// VAD stage can call it directly.
    ///
    /// [`run`]: DuplexOrchestrator::run
    pub async fn drive(&self, mut events: mpsc::Receiver<VadEvent>) {
        let mut speech: Vec<AudioFrame> = Vec::new();
        let mut listening = false;

        loop {
            // register for the wakeup before checking the flag, so a
            // shutdown landing between the two is not lost
            let shutdown = self.shutdown_notify.notified();
            tokio::pin!(shutdown);
            shutdown.as_mut().enable();
            if self.shutdown_requested.load(Ordering::SeqCst) {
                break;
            }
            let event = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => event,
                    None => {
                        debug!("event stream ended");
                        break;
                    }
                },
                _ = &mut shutdown => break,
            };
            self.handle_event(event, &mut speech, &mut listening).await;
        }
    }

    async fn handle_event(&self, event: VadEvent, speech: &mut Vec<AudioFrame>, listening: &mut bool) {
        match event.status {
            Some(VadStatus::Start) => {
                if *listening {
                    // spurious start mid-utterance; the frame still
                    // belongs to the utterance
                    speech.push(event.frame);
                    return;
                }
                let responding = self.shared.chat_lock.load(Ordering::SeqCst)
                    || self.shared.pipeline.is_playing();
                if responding {
                    if !self.shared.config.interrupt_enabled {
                        debug!("speech start during response, interruption disabled");
                        return;
                    }
                    info!("barge-in, interrupting active response");
                    self.shared.supersede();
                }
                speech.clear();
                speech.push(event.frame);
                *listening = true;
            }
            Some(VadStatus::End) => {
                if !*listening {
                    return;
                }
                speech.push(event.frame);
                *listening = false;
                let frames = std::mem::take(speech);
                debug!(frames = frames.len(), "utterance complete, recognizing");
                match self.shared.recognizer.recognize(&frames).await {
                    Ok(text) => {
                        let text = text.trim().to_string();
                        if text.is_empty() {
                            debug!("empty recognition, utterance discarded");
                        } else {
                            self.dispatch_turn(text);
                        }
                    }
                    Err(e) => warn!(error = %e, "recognition failed, utterance dropped"),
                }
            }
            None => {
                if *listening {
                    speech.push(event.frame);
                } else {
                    self.shared.maybe_inject_idle_result();
                }
            }
        }
    }

    fn dispatch_turn(&self, text: String) {
        let epoch = self.shared.turn_epoch.load(Ordering::SeqCst);
        self.shared.chat_lock.store(true, Ordering::SeqCst);
        info!(text = %text, "dispatching chat turn");
        let shared = self.shared.clone();
        tokio::spawn(shared.chat_turn(text, epoch));
    }

    /// True while a chat turn is in flight.
    pub fn is_responding(&self) -> bool {
        self.shared.chat_lock.load(Ordering::SeqCst)
    }

    /// Snapshot of the dialogue so far.
    pub fn dialogue_messages(&self) -> Vec<Message> {
        self.shared.dialogue.lock().messages().to_vec()
    }
}

/// Outcome of consuming one token stream.
enum StreamOutcome {
    /// Plain text response; all segments already submitted.
    Text(String),
    /// The model requested tool calls. `spoken` is any text streamed
    /// (and already submitted) before the calls.
    ToolCalls {
        calls: Vec<ToolCallRequest>,
        spoken: String,
    },
    /// Superseded by barge-in; carries the text accumulated so far.
    Interrupted(String),
    Failed,
}

impl Shared {
    fn superseded(&self, epoch: u64) -> bool {
        self.turn_epoch.load(Ordering::SeqCst) != epoch
    }

    /// Barge-in: discard the active turn's remaining output.
    fn supersede(&self) {
        self.turn_epoch.fetch_add(1, Ordering::SeqCst);
        self.pipeline.interrupt();
        self.chat_lock.store(false, Ordering::SeqCst);
    }

    /// Release the chat lock unless a newer turn now owns it.
    fn release(&self, epoch: u64) {
        if !self.superseded(epoch) {
            self.chat_lock.store(false, Ordering::SeqCst);
        }
    }

    fn notify_listeners(&self, role: Role, content: &str) {
        for listener in self.listeners.lock().iter() {
            listener(role, content);
        }
    }

    /// One complete chat turn: user message, model loop with bounded
    /// tool-call chaining, assistant message, persistence.
    async fn chat_turn(self: Arc<Self>, text: String, epoch: u64) {
        self.dialogue.lock().push(Message::user(&text));
        self.notify_listeners(Role::User, &text);

        let mut depth = 0usize;
        let final_text = loop {
            if self.superseded(epoch) {
                debug!("turn superseded, skipping model query");
                return;
            }
            let (view, tools) = {
                let dialogue = self.dialogue.lock();
                (dialogue.model_view(), self.dispatcher.registry().definitions())
            };
            let stream = if tools.is_empty() {
                self.model.stream(view)
            } else {
                self.model.stream_with_tools(view, &tools)
            };

            match self.consume_stream(stream, epoch).await {
                StreamOutcome::Text(full) => break full,
                StreamOutcome::Interrupted(partial) => {
                    debug!("turn superseded mid-stream");
                    let partial = partial.trim().to_string();
                    if !partial.is_empty() {
                        self.dialogue.lock().push(Message::assistant(partial));
                    }
                    return;
                }
                StreamOutcome::Failed => {
                    self.release(epoch);
                    return;
                }
                StreamOutcome::ToolCalls { calls, spoken } => {
                    match self.run_tool_calls(calls, spoken, epoch).await {
                        ToolTurn::Continue => {
                            depth += 1;
                            if depth >= self.config.max_tool_chain_depth {
                                error!(
                                    depth,
                                    "tool chain depth limit reached, aborting turn"
                                );
                                self.release(epoch);
                                return;
                            }
                        }
                        ToolTurn::Finish(text) => break text,
                        ToolTurn::Abort => {
                            self.release(epoch);
                            return;
                        }
                    }
                }
            }
        };

        let final_text = final_text.trim().to_string();
        if !final_text.is_empty() {
            self.dialogue.lock().push(Message::assistant(&final_text));
            self.notify_listeners(Role::Assistant, &final_text);
        }
        if let Err(e) = self.dialogue.lock().persist_turn() {
            warn!(error = %e, "failed to persist dialogue turn");
        }
        self.release(epoch);
    }

    /// Pull the stream to completion, speaking segments as they cut.
    async fn consume_stream(&self, mut stream: TokenStream, epoch: u64) -> StreamOutcome {
        let mut segments = SegmentBuffer::new();
        let mut accumulator = ToolCallAccumulator::new();

        while let Some(delta) = stream.next().await {
            if self.superseded(epoch) {
                return StreamOutcome::Interrupted(segments.full_text().to_string());
            }
            match delta {
                Ok(delta) => {
                    if let Some(token) = delta.token {
                        if let Some(segment) = segments.push(&token) {
                            self.pipeline.submit(segment);
                        }
                    }
                    if let Some(fragment) = delta.tool_call {
                        accumulator.push(fragment);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "model stream failed, aborting turn");
                    return StreamOutcome::Failed;
                }
            }
        }
        if self.superseded(epoch) {
            return StreamOutcome::Interrupted(segments.full_text().to_string());
        }

        let calls = accumulator.finish();
        if calls.is_empty() {
            if let Some(tail) = segments.flush_tail() {
                self.pipeline.submit(tail);
            }
            StreamOutcome::Text(segments.full_text().to_string())
        } else {
            StreamOutcome::ToolCalls {
                calls,
                spoken: segments.full_text().to_string(),
            }
        }
    }

    /// Dispatch the model's tool calls and apply the resulting action.
    async fn run_tool_calls(
        &self,
        calls: Vec<ToolCallRequest>,
        spoken: String,
        epoch: u64,
    ) -> ToolTurn {
        // one call per assistant turn; extras are recorded but not run
        if calls.len() > 1 {
            warn!(extra = calls.len() - 1, "multiple tool calls, executing the first only");
        }
        let call = calls[0].clone();
        info!(tool = %call.name, "executing tool call");
        let outcome = self.dispatcher.dispatch(&call).await;
        if self.superseded(epoch) {
            debug!(tool = %call.name, "turn superseded during tool call, outcome discarded");
            return ToolTurn::Abort;
        }
        debug!(tool = %call.name, action = ?outcome.action, "tool outcome");

        match outcome.action {
            Action::NotFound | Action::None => ToolTurn::Abort,
            Action::Response => {
                let response = outcome.response.unwrap_or_default();
                if !self.superseded(epoch) && !response.is_empty() {
                    self.pipeline.submit(response.clone());
                }
                ToolTurn::Finish(response)
            }
            Action::ReqLlm => {
                let result = render_result(outcome.result.as_ref());
                let mut assistant = Message::assistant_tool_calls(calls);
                if !spoken.trim().is_empty() {
                    assistant.content = Some(spoken);
                }
                let mut dialogue = self.dialogue.lock();
                dialogue.push(assistant);
                dialogue.push(Message::tool(result, &call.id));
                ToolTurn::Continue
            }
            Action::AddSystem => {
                self.inject_messages(&outcome);
                ToolTurn::Abort
            }
            Action::AddSystemSpeak => {
                self.inject_messages(&outcome);
                if let Some(response) = &outcome.response {
                    if !self.superseded(epoch) && !response.is_empty() {
                        self.pipeline.submit(response.clone());
                    }
                }
                ToolTurn::Continue
            }
        }
    }

    /// Append the injected message(s) an ADDSYSTEM-style action carries.
    fn inject_messages(&self, outcome: &ActionResponse) {
        let Some(result) = &outcome.result else {
            return;
        };
        let items: Vec<&Value> = match result {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let mut dialogue = self.dialogue.lock();
        for item in items {
            let message = match item {
                Value::String(s) => Message::system(s),
                Value::Object(map) => {
                    let content = map
                        .get("content")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    match map.get("role").and_then(Value::as_str) {
                        Some("user") => Message::user(content),
                        _ => Message::system(content),
                    }
                }
                other => Message::system(other.to_string()),
            };
            dialogue.push(message);
        }
    }

    /// Speak one completed background-tool result when nothing else is
    /// happening: idle, player quiet, no chat turn in flight.
    fn maybe_inject_idle_result(&self) {
        if self.chat_lock.load(Ordering::SeqCst) || !self.pipeline.is_idle() {
            return;
        }
        let Some(idle) = self.dispatcher.try_take_idle_result() else {
            return;
        };
        let Some(text) = idle.outcome.speakable_text() else {
            return;
        };
        info!(tool = %idle.tool, "delivering background tool result");
        self.pipeline.submit(text.clone());
        self.dialogue.lock().push(Message::assistant(&text));
        self.notify_listeners(Role::Assistant, &text);
        if let Err(e) = self.dialogue.lock().persist_turn() {
            warn!(error = %e, "failed to persist dialogue turn");
        }
    }
}

enum ToolTurn {
    /// Re-query the model with the updated dialogue.
    Continue,
    /// Turn complete; this text is the assistant message.
    Finish(String),
    /// Abort silently.
    Abort,
}

/// Render a tool result for a `role=tool` message.
fn render_result(result: Option<&Value>) -> String {
    match result {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
