//! Engine actor owning the work-item registry.
//!
//! Every state transition goes through this actor's mailbox, so the registry
//! has a single writer. Computations run on spawned tasks and report back with
//! `EngineMessage::Completed`, tagged with the run token they were started with.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use ractor::concurrency::OneshotReceiver;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use relay_core::{
    ProcessingInput, ProcessingResult, ProcessingState, ProcessingStatus, WorkEvent, reasons,
};
use tokio::sync::broadcast;

use crate::computation::Computation;
use crate::messages::{EngineError, EngineMessage, EngineStats};

/// Default ceiling for a single computation.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(60);

/// A tracked work item.
#[derive(Debug, Clone)]
struct WorkItem {
    state: ProcessingState,
    /// Token of the computation run that owns this item.
    run: u64,
}

/// A caller waiting for the outcome of a run.
#[derive(Debug)]
struct Waiter {
    id: String,
    reply: RpcReplyPort<ProcessingResult>,
    /// Terminal result recorded before the run finished (duplicate id).
    verdict: Option<ProcessingResult>,
}

/// Arguments for spawning the engine.
pub struct EngineArgs {
    pub computation: Arc<dyn Computation>,
    pub max_duration: Duration,
    pub event_tx: Option<broadcast::Sender<WorkEvent>>,
}

impl EngineArgs {
    pub fn new(computation: Arc<dyn Computation>) -> Self {
        Self {
            computation,
            max_duration: DEFAULT_MAX_DURATION,
            event_tx: None,
        }
    }

    /// Set the ceiling for a single computation.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Set the event broadcaster.
    pub fn with_event_tx(mut self, tx: broadcast::Sender<WorkEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }
}

/// State for the engine actor.
pub struct EngineState {
    /// Tracked items by id.
    items: HashMap<String, WorkItem>,
    /// Waiting callers by run token.
    waiters: HashMap<u64, Waiter>,
    computation: Arc<dyn Computation>,
    max_duration: Duration,
    next_run: u64,
    event_tx: Option<broadcast::Sender<WorkEvent>>,
}

impl EngineState {
    fn new(args: EngineArgs) -> Self {
        Self {
            items: HashMap::new(),
            waiters: HashMap::new(),
            computation: args.computation,
            max_duration: args.max_duration,
            next_run: 0,
            event_tx: args.event_tx,
        }
    }

    /// Broadcast an event.
    fn broadcast(&self, event: WorkEvent) {
        tracing::debug!("{}", event.description());
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn next_run(&mut self) -> u64 {
        self.next_run += 1;
        self.next_run
    }

    fn stats(&self) -> EngineStats {
        let mut stats = EngineStats {
            tracked: self.items.len(),
            awaiting: self.waiters.len(),
            ..Default::default()
        };
        for item in self.items.values() {
            match item.state.status {
                ProcessingStatus::New => stats.new += 1,
                ProcessingStatus::Processing => stats.processing += 1,
                ProcessingStatus::Done => stats.done += 1,
                ProcessingStatus::Error => stats.error += 1,
            }
        }
        stats
    }

    /// Reject a submission whose id is already tracked.
    fn reject_duplicate(&mut self, id: &str) -> ProcessingResult {
        let rejection = ProcessingResult::failure(id, reasons::DUPLICATE_ID);

        let Some(item) = self.items.get_mut(id) else {
            return rejection;
        };
        if item.state.is_terminal() {
            // First terminal state wins.
            return rejection;
        }

        item.state.finish(rejection.clone());
        let run = item.run;
        if let Some(waiter) = self.waiters.get_mut(&run) {
            waiter.verdict = Some(rejection.clone());
        }
        self.broadcast(WorkEvent::Failed {
            id: id.to_string(),
            reason: reasons::DUPLICATE_ID.to_string(),
            timestamp: Utc::now(),
        });
        rejection
    }

    /// Register a new item and start its computation.
    fn start(
        &mut self,
        myself: ActorRef<EngineMessage>,
        input: ProcessingInput,
        reply: RpcReplyPort<ProcessingResult>,
    ) {
        let id = input.id.clone();
        let run = self.next_run();

        self.items.insert(
            id.clone(),
            WorkItem {
                state: ProcessingState::new(&id),
                run,
            },
        );
        self.broadcast(WorkEvent::Created {
            id: id.clone(),
            timestamp: Utc::now(),
        });

        self.waiters.insert(
            run,
            Waiter {
                id: id.clone(),
                reply,
                verdict: None,
            },
        );

        if let Some(item) = self.items.get_mut(&id) {
            item.state.status = ProcessingStatus::Processing;
        }
        self.broadcast(WorkEvent::Started {
            id: id.clone(),
            timestamp: Utc::now(),
        });

        let computation = self.computation.clone();
        let max_duration = self.max_duration;
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(max_duration, computation.run(&input)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(reasons::DEADLINE_EXCEEDED.to_string()),
            };
            let duration_ms = started.elapsed().as_millis() as u64;
            if myself
                .send_message(EngineMessage::Completed {
                    id: input.id,
                    run,
                    outcome,
                    duration_ms,
                })
                .is_err()
            {
                tracing::warn!("Engine stopped before run {} completed", run);
            }
        });
    }

    /// Apply the outcome of a computation run.
    fn complete(&mut self, id: String, run: u64, outcome: Result<i64, String>, duration_ms: u64) {
        let computed = match &outcome {
            Ok(value) => ProcessingResult::success(&id, *value),
            Err(error) => ProcessingResult::failure(&id, error.clone()),
        };

        let mut delivered = computed.clone();
        match self.items.get_mut(&id) {
            Some(item) if item.run == run && !item.state.is_terminal() => {
                item.state.finish(computed);
                let event = match outcome {
                    Ok(value) => WorkEvent::Completed {
                        id: id.clone(),
                        value,
                        duration_ms,
                        timestamp: Utc::now(),
                    },
                    Err(reason) => WorkEvent::Failed {
                        id: id.clone(),
                        reason,
                        timestamp: Utc::now(),
                    },
                };
                self.broadcast(event);
            }
            Some(item) if item.run == run => {
                if let Some(recorded) = item.state.result.clone() {
                    delivered = recorded;
                }
            }
            _ => {
                tracing::debug!("Discarding result of abandoned run {} for {}", run, id);
            }
        }

        if let Some(waiter) = self.waiters.remove(&run) {
            let result = waiter.verdict.unwrap_or(delivered);
            if waiter.reply.send(result).is_err() {
                tracing::debug!("Caller for {} went away before completion", waiter.id);
            }
        }
    }

    /// Remove every terminal item.
    fn clear(&mut self) -> usize {
        let evicted: Vec<(String, ProcessingStatus)> = self
            .items
            .iter()
            .filter(|(_, item)| item.state.is_terminal())
            .map(|(id, item)| (id.clone(), item.state.status))
            .collect();

        for (id, status) in &evicted {
            self.items.remove(id);
            self.broadcast(WorkEvent::Evicted {
                id: id.clone(),
                status: *status,
                timestamp: Utc::now(),
            });
        }
        evicted.len()
    }

    /// Force-finish and remove every item in `Processing`.
    fn terminate(&mut self) -> usize {
        let running: Vec<(String, u64)> = self
            .items
            .iter()
            .filter(|(_, item)| item.state.status == ProcessingStatus::Processing)
            .map(|(id, item)| (id.clone(), item.run))
            .collect();

        for (id, run) in &running {
            if let Some(waiter) = self.waiters.remove(run) {
                let _ = waiter
                    .reply
                    .send(ProcessingResult::failure(id, reasons::TERMINATED));
            }
            self.items.remove(id);
            self.broadcast(WorkEvent::Terminated {
                id: id.clone(),
                timestamp: Utc::now(),
            });
        }
        running.len()
    }
}

/// Engine actor that tracks work items.
pub struct EngineActor;

impl Actor for EngineActor {
    type Msg = EngineMessage;
    type State = EngineState;
    type Arguments = EngineArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting work engine: computation={}, max_duration={:?}",
            args.computation.name(),
            args.max_duration
        );
        Ok(EngineState::new(args))
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            EngineMessage::Submit { input, reply } => {
                if state.items.contains_key(&input.id) {
                    tracing::warn!("Duplicate submission for {}", input.id);
                    let rejection = state.reject_duplicate(&input.id);
                    let _ = reply.send(rejection);
                    return Ok(());
                }
                state.start(myself, input, reply);
            }

            EngineMessage::Completed {
                id,
                run,
                outcome,
                duration_ms,
            } => {
                state.complete(id, run, outcome, duration_ms);
            }

            EngineMessage::GetState { id, reply } => {
                let snapshot = state
                    .items
                    .get(&id)
                    .map(|item| item.state.clone())
                    .unwrap_or_else(|| ProcessingState::not_found(&id));
                let _ = reply.send(snapshot);
            }

            EngineMessage::Clear => {
                let evicted = state.clear();
                tracing::info!("Cleared {} finished items", evicted);
            }

            EngineMessage::Terminate => {
                let terminated = state.terminate();
                tracing::info!("Terminated {} running items", terminated);
            }

            EngineMessage::Stats { reply } => {
                let _ = reply.send(state.stats());
            }

            EngineMessage::Shutdown => {
                tracing::info!("Shutting down work engine");
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }
}

/// Answer to a message already queued in the engine's mailbox.
pub struct EngineReply<T> {
    rx: OneshotReceiver<T>,
}

impl<T> EngineReply<T> {
    /// Wait for the engine to answer.
    pub async fn recv(self) -> Result<T, EngineError> {
        self.rx
            .await
            .map_err(|_| EngineError::Unavailable("reply dropped".into()))
    }
}

/// Client handle for the engine actor.
#[derive(Clone)]
pub struct WorkEngine {
    actor: ActorRef<EngineMessage>,
}

impl WorkEngine {
    pub fn new(actor: ActorRef<EngineMessage>) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorRef<EngineMessage> {
        &self.actor
    }

    /// Submit an input and wait for its terminal result.
    pub async fn submit(&self, input: ProcessingInput) -> Result<ProcessingResult, EngineError> {
        self.enqueue_submit(input)?.recv().await
    }

    /// Queue a submission without waiting.
    ///
    /// The submission is ordered before any message sent after this returns,
    /// so a `terminate` issued next sees the item in `Processing`.
    pub fn enqueue_submit(
        &self,
        input: ProcessingInput,
    ) -> Result<EngineReply<ProcessingResult>, EngineError> {
        self.enqueue(|reply| EngineMessage::Submit { input, reply })
    }

    /// Snapshot the state of an item.
    pub async fn get_state(&self, id: &str) -> Result<ProcessingState, EngineError> {
        self.enqueue_get_state(id)?.recv().await
    }

    /// Queue a state snapshot without waiting.
    pub fn enqueue_get_state(&self, id: &str) -> Result<EngineReply<ProcessingState>, EngineError> {
        let id = id.to_string();
        self.enqueue(|reply| EngineMessage::GetState { id, reply })
    }

    /// Get registry counters.
    pub async fn stats(&self) -> Result<EngineStats, EngineError> {
        self.call(|reply| EngineMessage::Stats { reply }).await
    }

    /// Remove every terminal item.
    pub fn clear(&self) -> Result<(), EngineError> {
        self.actor
            .send_message(EngineMessage::Clear)
            .map_err(|e| EngineError::Unavailable(e.to_string()))
    }

    /// Force-finish every running item.
    pub fn terminate(&self) -> Result<(), EngineError> {
        self.actor
            .send_message(EngineMessage::Terminate)
            .map_err(|e| EngineError::Unavailable(e.to_string()))
    }

    /// Stop the engine actor.
    pub fn shutdown(&self) {
        let _ = self.actor.send_message(EngineMessage::Shutdown);
    }

    fn enqueue<T, F>(&self, build: F) -> Result<EngineReply<T>, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(RpcReplyPort<T>) -> EngineMessage,
    {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(build(tx.into()))
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;
        Ok(EngineReply { rx })
    }

    async fn call<T, F>(&self, build: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(RpcReplyPort<T>) -> EngineMessage,
    {
        match ractor::rpc::call(&self.actor, build, None).await {
            Ok(ractor::rpc::CallResult::Success(value)) => Ok(value),
            Ok(ractor::rpc::CallResult::Timeout) => Err(EngineError::Timeout),
            Ok(ractor::rpc::CallResult::SenderError) => {
                Err(EngineError::Unavailable("reply dropped".into()))
            }
            Err(e) => Err(EngineError::Unavailable(e.to_string())),
        }
    }
}

/// Start the engine with the given arguments.
pub async fn start_engine(
    args: EngineArgs,
) -> Result<(WorkEngine, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    let (actor, handle) = Actor::spawn(None, EngineActor, args).await?;
    Ok((WorkEngine::new(actor), handle))
}
