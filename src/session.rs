use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::constants::{FALLBACK_NOTICE, SUCCESS_NOTICE};
use crate::error::{PredictionError, SessionError};
use crate::fallback::fallback_prediction;
use crate::gemini::GeminiClient;
use crate::locale::Locale;
use crate::prediction::PredictionResult;
use crate::product::ProductAttributes;
use crate::prompt::build_prompt;

/// What the user ends up seeing for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source")]
pub enum PredictionOutcome {
    /// Prediction returned by the model.
    #[serde(rename = "model")]
    Predicted {
        message: String,
        prediction: PredictionResult,
    },
    /// The request failed and placeholder figures are shown instead.
    #[serde(rename = "fallback")]
    Fallback {
        notice: String,
        prediction: PredictionResult,
    },
}

impl PredictionOutcome {
    pub fn predicted(prediction: PredictionResult) -> Self {
        PredictionOutcome::Predicted {
            message: SUCCESS_NOTICE.to_string(),
            prediction,
        }
    }

    pub fn fallback(locale: Locale) -> Self {
        PredictionOutcome::Fallback {
            notice: FALLBACK_NOTICE.to_string(),
            prediction: fallback_prediction(locale),
        }
    }

    /// Maps the finished request task to an outcome. Only a cancelled task
    /// has no outcome; a failed or panicked one falls back.
    fn from_task(
        joined: Result<Result<PredictionResult, PredictionError>, JoinError>,
        locale: Locale,
    ) -> Option<Self> {
        match joined {
            Ok(Ok(prediction)) => {
                info!(confidence = prediction.confidence, "Prediction succeeded");
                Some(PredictionOutcome::predicted(prediction))
            }
            Ok(Err(e)) => {
                warn!(error = %e, kind = ?e.kind(), "Prediction failed, using fallback");
                Some(PredictionOutcome::fallback(locale))
            }
            Err(join_error) if join_error.is_cancelled() => None,
            Err(join_error) => {
                warn!(error = %join_error, "Prediction task panicked, using fallback");
                Some(PredictionOutcome::fallback(locale))
            }
        }
    }

    pub fn prediction(&self) -> &PredictionResult {
        match self {
            PredictionOutcome::Predicted { prediction, .. } => prediction,
            PredictionOutcome::Fallback { prediction, .. } => prediction,
        }
    }

    /// Failure notice, present only on fallback outcomes.
    pub fn notice(&self) -> Option<&str> {
        match self {
            PredictionOutcome::Predicted { .. } => None,
            PredictionOutcome::Fallback { notice, .. } => Some(notice),
        }
    }

    /// Success message, present only on model outcomes.
    pub fn message(&self) -> Option<&str> {
        match self {
            PredictionOutcome::Predicted { message, .. } => Some(message),
            PredictionOutcome::Fallback { .. } => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PredictionOutcome::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub attributes: ProductAttributes,
    pub outcome: PredictionOutcome,
}

#[derive(Default)]
struct SessionState {
    generation: u64,
    cancelled: Option<u64>,
    in_flight: Option<AbortHandle>,
    last: Option<Submission>,
}

impl SessionState {
    fn stale_reason(&self, generation: u64) -> SessionError {
        if self.cancelled == Some(generation) {
            SessionError::Cancelled
        } else {
            SessionError::Superseded
        }
    }

    /// Records a finished submission unless a newer one or a cancel moved
    /// the generation on.
    fn complete(&mut self, generation: u64, submission: Submission) -> Result<Submission, SessionError> {
        if self.generation != generation {
            return Err(self.stale_reason(generation));
        }
        self.in_flight = None;
        self.last = Some(submission.clone());
        Ok(submission)
    }
}

/// Coordinates prediction requests for one user.
///
/// Only one request is outstanding at a time. A new submission aborts the
/// previous one, and a result that arrives for a superseded submission is
/// dropped instead of overwriting the newer slot. The slot is updated by a
/// background task, so a caller that stops waiting does not leave the
/// session busy.
pub struct PredictionSession {
    client: GeminiClient,
    locale: Locale,
    state: Arc<Mutex<SessionState>>,
}

impl PredictionSession {
    pub fn new(client: GeminiClient, locale: Locale) -> Self {
        Self {
            client,
            locale,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[instrument(skip(self, attributes), fields(product = %attributes.name))]
    pub async fn submit(&self, attributes: ProductAttributes) -> Result<Submission, SessionError> {
        let prompt = build_prompt(&attributes, self.locale);
        let client = self.client.clone();

        let completion = {
            let mut state = self.state.lock().await;
            let request = tokio::spawn(async move { client.predict(&prompt).await }.in_current_span());
            if let Some(previous) = state.in_flight.replace(request.abort_handle()) {
                info!("Superseding in-flight prediction request");
                previous.abort();
            }
            state.generation += 1;
            tokio::spawn(
                finish(self.state.clone(), request, state.generation, attributes, self.locale)
                    .in_current_span(),
            )
        };

        match completion.await {
            Ok(result) => result,
            Err(join_error) => {
                warn!(error = %join_error, "Prediction bookkeeping task failed");
                Err(SessionError::Cancelled)
            }
        }
    }

    /// Aborts the outstanding request, if any. Its caller gets
    /// [`SessionError::Cancelled`].
    pub async fn cancel(&self) -> bool {
        let mut state = self.state.lock().await;
        match state.in_flight.take() {
            Some(handle) => {
                info!("Cancelling in-flight prediction request");
                state.cancelled = Some(state.generation);
                state.generation += 1;
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn is_busy(&self) -> bool {
        self.state.lock().await.in_flight.is_some()
    }

    /// The most recent completed submission.
    pub async fn last(&self) -> Option<Submission> {
        self.state.lock().await.last.clone()
    }
}

async fn finish(
    state: Arc<Mutex<SessionState>>,
    request: JoinHandle<Result<PredictionResult, PredictionError>>,
    generation: u64,
    attributes: ProductAttributes,
    locale: Locale,
) -> Result<Submission, SessionError> {
    let outcome = PredictionOutcome::from_task(request.await, locale);
    let mut state = state.lock().await;
    match outcome {
        Some(outcome) => state.complete(generation, Submission { attributes, outcome }),
        None => Err(state.stale_reason(generation)),
    }
}

/// How long an idle browser session is kept.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

struct StoreEntry {
    session: Arc<PredictionSession>,
    last_seen: Instant,
}

/// Per-client [`PredictionSession`]s keyed by an opaque id, so that one
/// visitor's submissions never abort or reveal another's.
pub struct SessionStore {
    client: GeminiClient,
    locale: Locale,
    sessions: Mutex<HashMap<Uuid, StoreEntry>>,
}

impl SessionStore {
    pub fn new(client: GeminiClient, locale: Locale) -> Self {
        Self {
            client,
            locale,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Returns the session for `id`, creating a fresh one under a new id
    /// when `id` is missing or unknown. The flag is true for new sessions.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<PredictionSession>, bool) {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < SESSION_IDLE_TTL);

        if let Some((id, entry)) = id.and_then(|id| sessions.get_mut(&id).map(|entry| (id, entry))) {
            entry.last_seen = now;
            return (id, entry.session.clone(), false);
        }

        let id = Uuid::new_v4();
        debug!(session = %id, "Creating prediction session");
        let session = Arc::new(PredictionSession::new(self.client.clone(), self.locale));
        sessions.insert(
            id,
            StoreEntry {
                session: session.clone(),
                last_seen: now,
            },
        );
        (id, session, true)
    }

    /// Returns the session for `id` without creating one.
    pub async fn get(&self, id: Uuid) -> Option<Arc<PredictionSession>> {
        self.sessions.lock().await.get(&id).map(|entry| entry.session.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of sessions with a request in flight.
    pub async fn busy_count(&self) -> usize {
        let sessions: Vec<Arc<PredictionSession>> = self
            .sessions
            .lock()
            .await
            .values()
            .map(|entry| entry.session.clone())
            .collect();
        let mut busy = 0;
        for session in sessions {
            if session.is_busy().await {
                busy += 1;
            }
        }
        busy
    }
}
