//! Chat web surface: the page, a small JSON API and per-session transcripts.

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use trip_nexus_core::{
    AssistantReply, ChatTurn, DocumentRetriever, ImageSource, ServiceError, TextGenerator,
    Transcript, TravelAssistant, QUICK_SUGGESTIONS,
};
use uuid::Uuid;

const CHAT_PAGE: &str = include_str!("../static/index.html");

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn reply(
        &self,
        transcript: &mut Transcript,
        query: &str,
    ) -> Result<AssistantReply, ServiceError>;
}

#[async_trait]
impl<R, G, I> ChatService for TravelAssistant<R, G, I>
where
    R: DocumentRetriever + Send + Sync,
    G: TextGenerator + Send + Sync,
    I: ImageSource + Send + Sync,
{
    async fn reply(
        &self,
        transcript: &mut Transcript,
        query: &str,
    ) -> Result<AssistantReply, ServiceError> {
        self.handle(transcript, query).await
    }
}

type SessionHandle = Arc<Mutex<Transcript>>;

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct SessionEntry {
    transcript: SessionHandle,
    last_used: Instant,
}

/// Each session owns one transcript. The transcript lock is held for a whole
/// exchange so turns of one session never interleave.
///
/// Sessions idle for longer than `idle_ttl` are dropped, and at most `capacity`
/// are kept; creating one more evicts the least recently used.
pub struct SessionStore {
    sessions: StdMutex<HashMap<Uuid, SessionEntry>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: StdMutex::new(HashMap::new()),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn create(&self) -> Uuid {
        self.create_at(Instant::now())
    }

    fn create_at(&self, now: Instant) -> Uuid {
        let mut sessions = self.lock();
        self.drop_idle(&mut sessions, now);

        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!(session = %id, "evicted least recently used session");
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            SessionEntry {
                transcript: Arc::new(Mutex::new(Transcript::new())),
                last_used: now,
            },
        );
        id
    }

    /// Looks a session up and marks it as used.
    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.get_at(id, Instant::now())
    }

    fn get_at(&self, id: &Uuid, now: Instant) -> Option<SessionHandle> {
        let mut sessions = self.lock();
        self.drop_idle(&mut sessions, now);
        let entry = sessions.get_mut(id)?;
        entry.last_used = now;
        Some(entry.transcript.clone())
    }

    /// Forgets a session. Returns false when it was already gone.
    pub fn end(&self, id: &Uuid) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.lock();
        self.drop_idle(&mut sessions, now)
    }

    fn drop_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_used) <= self.idle_ttl);
        before - sessions.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct AppState {
    pub assistant: Arc<dyn ChatService>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(assistant: Arc<dyn ChatService>, sessions: SessionStore) -> Self {
        Self {
            assistant,
            sessions,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(Uuid),
    BadRequest(String),
    Upstream(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::SessionNotFound(id) => (StatusCode::NOT_FOUND, format!("unknown session {id}")),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct SuggestionView {
    index: usize,
    label: &'static str,
    query: &'static str,
}

#[derive(Serialize)]
struct CreatedSession {
    session_id: Uuid,
}

#[derive(Serialize)]
pub struct SessionView {
    session_id: Uuid,
    turns: Vec<ChatTurn>,
    history: Vec<String>,
}

impl SessionView {
    fn from_transcript(session_id: Uuid, transcript: &Transcript) -> Self {
        Self {
            session_id,
            turns: transcript.turns().to_vec(),
            history: transcript.history_previews(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    suggestion: Option<usize>,
}

impl MessageRequest {
    fn query(self) -> Result<String, ApiError> {
        if let Some(index) = self.suggestion {
            return QUICK_SUGGESTIONS
                .get(index)
                .map(|suggestion| suggestion.query.to_string())
                .ok_or_else(|| ApiError::BadRequest(format!("no quick suggestion {index}")));
        }

        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ApiError::BadRequest("message text is empty".to_string())),
        }
    }
}

#[derive(Serialize)]
struct RecordView {
    id: u64,
    destination: String,
    location: String,
    score: f32,
}

#[derive(Serialize)]
struct ReplyView {
    answer: String,
    image: Option<String>,
    retrieval_ran: bool,
    records: Vec<RecordView>,
    session: SessionView,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/api/suggestions", get(suggestions))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(end_session))
        .route("/api/sessions/{id}/turns", delete(clear_session))
        .route("/api/sessions/{id}/messages", post(post_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "trip nexus listening");

    let sweeper = tokio::spawn(sweep_sessions(state.clone()));

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    served?;

    info!("server shut down");
    Ok(())
}

async fn sweep_sessions(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(SWEEP_PERIOD);
    loop {
        ticker.tick().await;
        let evicted = state.sessions.evict_idle();
        if evicted > 0 {
            info!(evicted, remaining = state.sessions.len(), "idle sessions dropped");
        }
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c");
    }
}

async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn suggestions() -> Json<Vec<SuggestionView>> {
    Json(
        QUICK_SUGGESTIONS
            .iter()
            .enumerate()
            .map(|(index, suggestion)| SuggestionView {
                index,
                label: suggestion.label,
                query: suggestion.query,
            })
            .collect(),
    )
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.sessions.create();
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let transcript = session.lock().await;
    Ok(Json(SessionView::from_transcript(id, &transcript)))
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.end(&id) {
        return Err(ApiError::SessionNotFound(id));
    }
    info!(session = %id, "session ended");
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let mut transcript = session.lock().await;
    transcript.clear();
    info!(session = %id, "transcript cleared");
    Ok(Json(SessionView::from_transcript(id, &transcript)))
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<ReplyView>, ApiError> {
    let session = state.sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let query = request.query()?;

    let mut transcript = session.lock().await;
    let reply = state
        .assistant
        .reply(&mut transcript, &query)
        .await
        .map_err(|error| {
            warn!(session = %id, error = %error, "exchange failed");
            ApiError::Upstream(error.to_string())
        })?;

    let image = reply.image.as_ref().map(|image| {
        format!("data:{};base64,{}", image.content_type, STANDARD.encode(&image.bytes))
    });

    Ok(Json(ReplyView {
        answer: reply.answer,
        image,
        retrieval_ran: reply.retrieval_ran,
        records: reply
            .records
            .iter()
            .map(|record| RecordView {
                id: record.document.id,
                destination: record.document.metadata.destination.clone(),
                location: record.document.metadata.location.clone(),
                score: record.score,
            })
            .collect(),
        session: SessionView::from_transcript(id, &transcript),
    }))
}
