//! Correlation actor matching broker responses to waiting requests.
//!
//! One actor instance exists per response kind (results and state snapshots).
//! A pending entry is keyed by id and guarded by a token, so a late `Cancel`
//! or `Expire` never removes a newer registration for the same id.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use relay_core::{ProcessingResult, ProcessingState, reasons};
use tokio::sync::oneshot;

use crate::messages::{CorrelationError, CorrelationMessage};

/// Default time a request waits for its response.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// A response that can be matched to its request by id.
pub trait Correlated: fmt::Debug + Send + 'static {
    /// Name used in logs.
    const KIND: &'static str;

    /// Id of the request this response answers.
    fn correlation_id(&self) -> &str;

    /// Response delivered when the broker never answers.
    fn transport_failure(id: &str, reason: String) -> Self;
}

impl Correlated for ProcessingResult {
    const KIND: &'static str = "result";

    fn correlation_id(&self) -> &str {
        &self.id
    }

    fn transport_failure(id: &str, reason: String) -> Self {
        ProcessingResult::failure(id, format!("{}: {}", reasons::TRANSPORT_ERROR, reason))
    }
}

impl Correlated for ProcessingState {
    const KIND: &'static str = "status";

    fn correlation_id(&self) -> &str {
        &self.id
    }

    fn transport_failure(id: &str, reason: String) -> Self {
        ProcessingState::failed(id, format!("{}: {}", reasons::TRANSPORT_ERROR, reason))
    }
}

#[derive(Debug)]
struct Pending<R> {
    waiter: oneshot::Sender<R>,
    token: u64,
}

/// State for the correlation actor.
pub struct CorrelationState<R> {
    pending: HashMap<String, Pending<R>>,
    deadline: Duration,
    next_token: u64,
}

impl<R: Correlated> CorrelationState<R> {
    fn register(
        &mut self,
        myself: &ActorRef<CorrelationMessage<R>>,
        id: String,
        waiter: oneshot::Sender<R>,
    ) -> Result<u64, CorrelationError> {
        if let Some(existing) = self.pending.get(&id) {
            if !existing.waiter.is_closed() {
                return Err(CorrelationError::AlreadyPending(id));
            }
            tracing::debug!("Replacing abandoned {} request for {}", R::KIND, id);
        }

        self.next_token += 1;
        let token = self.next_token;
        self.pending
            .insert(id.clone(), Pending { waiter, token });

        let deadline = self.deadline;
        let myself = myself.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let _ = myself.send_message(CorrelationMessage::Expire { id, token });
        });

        Ok(token)
    }

    fn resolve(&mut self, response: R) {
        let id = response.correlation_id().to_string();
        match self.pending.remove(&id) {
            Some(pending) => {
                if pending.waiter.send(response).is_err() {
                    tracing::debug!("Waiter for {} {} went away", R::KIND, id);
                }
            }
            None => {
                tracing::warn!("Unrequested {} received, id: {}", R::KIND, id);
            }
        }
    }

    fn is_pending(&self, id: &str) -> bool {
        self.pending
            .get(id)
            .is_some_and(|pending| !pending.waiter.is_closed())
    }

    /// Remove the entry for `id` if it still carries `token`.
    fn take(&mut self, id: &str, token: u64) -> Option<Pending<R>> {
        match self.pending.get(id) {
            Some(pending) if pending.token == token => self.pending.remove(id),
            _ => None,
        }
    }
}

/// Actor owning the pending-completion table for one response kind.
pub struct CorrelationActor<R>(PhantomData<fn() -> R>);

impl<R> CorrelationActor<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for CorrelationActor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Correlated> Actor for CorrelationActor<R> {
    type Msg = CorrelationMessage<R>;
    type State = CorrelationState<R>;
    type Arguments = Duration;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        deadline: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting {} correlation table: deadline={:?}",
            R::KIND,
            deadline
        );
        Ok(CorrelationState {
            pending: HashMap::new(),
            deadline,
            next_token: 0,
        })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if !state.pending.is_empty() {
            tracing::warn!(
                "Dropping {} pending {} requests",
                state.pending.len(),
                R::KIND
            );
        }
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CorrelationMessage::Register { id, waiter, reply } => {
                let _ = reply.send(state.register(&myself, id, waiter));
            }

            CorrelationMessage::Resolve { response } => {
                state.resolve(response);
            }

            CorrelationMessage::Cancel { id, token } => {
                if state.take(&id, token).is_some() {
                    tracing::debug!("Cancelled {} request for {}", R::KIND, id);
                }
            }

            CorrelationMessage::Expire { id, token } => {
                if let Some(pending) = state.take(&id, token) {
                    tracing::warn!("No {} received for {} within {:?}", R::KIND, id, state.deadline);
                    let failure = R::transport_failure(
                        &id,
                        format!("no response within {:?}", state.deadline),
                    );
                    let _ = pending.waiter.send(failure);
                }
            }

            CorrelationMessage::IsPending { id, reply } => {
                let _ = reply.send(state.is_pending(&id));
            }

            CorrelationMessage::PendingCount { reply } => {
                let _ = reply.send(state.pending.len());
            }
        }

        Ok(())
    }
}

/// Client handle for a correlation actor.
pub struct CorrelationTable<R: Correlated> {
    actor: ActorRef<CorrelationMessage<R>>,
}

impl<R: Correlated> Clone for CorrelationTable<R> {
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
        }
    }
}

impl<R: Correlated> CorrelationTable<R> {
    pub fn new(actor: ActorRef<CorrelationMessage<R>>) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorRef<CorrelationMessage<R>> {
        &self.actor
    }

    /// Register a pending completion for `id`, run `send`, and wait for the response.
    ///
    /// Registration happens before `send` runs, so a response that arrives
    /// immediately after publishing still finds its waiter.
    pub async fn register_and_send<F, Fut, E>(&self, id: &str, send: F) -> Result<R, CorrelationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let (waiter, response) = oneshot::channel();
        let registration = ractor::rpc::call(
            &self.actor,
            |reply| CorrelationMessage::<R>::Register {
                id: id.to_string(),
                waiter,
                reply,
            },
            None,
        )
        .await;

        let token = match registration {
            Ok(ractor::rpc::CallResult::Success(result)) => result?,
            Ok(_) => return Err(CorrelationError::Unavailable("registration dropped".into())),
            Err(e) => return Err(CorrelationError::Unavailable(e.to_string())),
        };

        if let Err(e) = send().await {
            let _ = self.actor.send_message(CorrelationMessage::Cancel {
                id: id.to_string(),
                token,
            });
            return Err(CorrelationError::Publish {
                id: id.to_string(),
                reason: e.to_string(),
            });
        }

        response
            .await
            .map_err(|_| CorrelationError::Dropped(id.to_string()))
    }

    /// Complete the pending request matching the response's id.
    pub fn resolve(&self, response: R) -> Result<(), CorrelationError> {
        self.actor
            .send_message(CorrelationMessage::Resolve { response })
            .map_err(|e| CorrelationError::Unavailable(e.to_string()))
    }

    /// Whether a caller is still waiting on `id`.
    pub async fn is_pending(&self, id: &str) -> Result<bool, CorrelationError> {
        let id = id.to_string();
        self.query(|reply| CorrelationMessage::<R>::IsPending { id, reply })
            .await
    }

    /// Number of requests still waiting.
    pub async fn pending(&self) -> Result<usize, CorrelationError> {
        self.query(|reply| CorrelationMessage::<R>::PendingCount { reply })
            .await
    }

    async fn query<T, F>(&self, build: F) -> Result<T, CorrelationError>
    where
        T: Send + 'static,
        F: FnOnce(ractor::RpcReplyPort<T>) -> CorrelationMessage<R>,
    {
        match ractor::rpc::call(&self.actor, build, None).await {
            Ok(ractor::rpc::CallResult::Success(value)) => Ok(value),
            Ok(_) => Err(CorrelationError::Unavailable("reply dropped".into())),
            Err(e) => Err(CorrelationError::Unavailable(e.to_string())),
        }
    }

    /// Stop the correlation actor. Pending requests fail with `Dropped`.
    pub fn shutdown(&self) {
        self.actor.stop(None);
    }
}

/// Start a correlation table whose requests wait at most `deadline`.
pub async fn start_correlation<R: Correlated>(
    deadline: Duration,
) -> Result<(CorrelationTable<R>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    let (actor, handle) = Actor::spawn(None, CorrelationActor::<R>::new(), deadline).await?;
    Ok((CorrelationTable::new(actor), handle))
}
