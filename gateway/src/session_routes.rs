//! Viewer session routes
//!
//! Each session holds one viewer's dataset view state, hover, selection and
//! table page. Transitions arrive as small POST events and every response
//! carries the full snapshot.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use choropleth::{ColorScale, FeatureStyle};
use geo_resolver::RegionMatch;
use map_session::{DatasetSession, LoadedDataset, Overview, Popup, SelectionState, TablePage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::state::AppState;

pub struct SessionEntry {
    pub session: DatasetSession,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionEntry {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            session: DatasetSession::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

type SharedEntry = Arc<RwLock<SessionEntry>>;

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedEntry>>,
    /// Sessions untouched for longer are dropped; zero keeps them forever
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Drop idle sessions. Entries locked by an in-flight request are kept.
    pub async fn prune(&self) -> usize {
        if self.idle_ttl.is_zero() {
            return 0;
        }

        let now = Utc::now();
        let idle_ttl = self.idle_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_read() {
            Ok(guard) => now
                .signed_duration_since(guard.updated_at)
                .to_std()
                .map_or(true, |idle| idle <= idle_ttl),
            Err(_) => true,
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Pruned {} idle sessions, {} remain", removed, sessions.len());
        }
        removed
    }

    pub async fn create(&self) -> (Uuid, SharedEntry) {
        self.prune().await;
        let id = Uuid::new_v4();
        let entry = Arc::new(RwLock::new(SessionEntry::new()));
        self.sessions.write().await.insert(id, Arc::clone(&entry));
        (id, entry)
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedEntry, GatewayError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(GatewayError::SessionNotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), GatewayError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(GatewayError::SessionNotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// ========== Request/Response Types ==========

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CountryRequest {
    pub country: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStep {
    Next,
    Previous,
}

/// Either an absolute page or a step
#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: Option<usize>,
    pub step: Option<PageStep>,
}

/// Outline and fill for a hovered or selected region
#[derive(Debug, Serialize)]
pub struct Highlight {
    pub country: String,
    pub style: FeatureStyle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    /// `no_dataset`, `loading`, `failed` or `ready`
    pub state: &'static str,
    pub url: Option<String>,
    pub message: Option<String>,
    pub overview: Option<Overview>,
    pub parse_warnings: usize,
    pub selection: SelectionState,
    pub popup: Option<Popup>,
    pub highlights: Vec<Highlight>,
    pub table: TablePage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    fn of(id: Uuid, entry: &SessionEntry, sequence_base_url: &str) -> Self {
        let session = &entry.session;
        let view = session.view();
        let selection = session.selection();

        Self {
            id,
            state: view.kind(),
            url: view.url().map(str::to_string),
            message: view.message().map(str::to_string),
            overview: session.overview(),
            parse_warnings: session.dataset().map(|d| d.warnings.len()).unwrap_or(0),
            selection: selection.state(),
            popup: selection.popup(),
            highlights: highlights(session),
            table: selection.table_page(sequence_base_url),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// Styles for the hovered and selected regions; all others use the plain style
fn highlights(session: &DatasetSession) -> Vec<Highlight> {
    let selection = session.selection();
    let scale = ColorScale::from_summary(selection.summary());
    let hovered = selection.hovered_country();
    let selected = selection.selected_country();

    let mut names: Vec<&str> = selected.into_iter().collect();
    if let Some(name) = hovered.filter(|h| Some(*h) != selected) {
        names.push(name);
    }

    names
        .into_iter()
        .filter_map(|name| {
            let bucket = selection.bucket_for(name)?;
            let region = RegionMatch {
                display_name: Some(name.to_string()),
                matched_count: bucket.count,
                has_data: true,
            };
            Some(Highlight {
                country: name.to_string(),
                style: FeatureStyle::for_region(&scale, &region, hovered == Some(name), selected == Some(name)),
            })
        })
        .collect()
}

// ========== Route Handlers ==========

/// Fetch `url` into a session. The session lock is not held while the
/// fetch is in flight; only the most recently issued load is applied.
async fn load_into(state: &AppState, entry: &SharedEntry, url: &str) {
    let ticket = {
        let mut guard = entry.write().await;
        guard.touch();
        guard.session.begin_load(url)
    };

    let outcome = state
        .client
        .fetch(url)
        .await
        .map(|dataset| {
            let summary = dataset.summarize();
            // Without geometry the bucket lookup alone decides what responds
            let map_regions = state
                .geometry
                .collection()
                .ok()
                .map(|collection| state.resolver.resolve(&summary, collection).regions);
            LoadedDataset {
                url: url.to_string(),
                summary: Arc::new(summary),
                warnings: dataset.warnings.clone(),
                map_regions,
            }
        })
        .map_err(|e| e.to_string());

    let mut guard = entry.write().await;
    if guard.session.complete(ticket, outcome) {
        guard.touch();
    }
}

async fn snapshot(state: &AppState, id: Uuid, entry: &SharedEntry) -> Json<SessionSnapshot> {
    let guard = entry.read().await;
    Json(SessionSnapshot::of(id, &guard, &state.sequence_base_url))
}

pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionSnapshot>), GatewayError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let (id, entry) = state.sessions.create().await;
    info!("Created session {}", id);

    if let Some(url) = url {
        load_into(&state, &entry, &url).await;
    }

    Ok((StatusCode::CREATED, snapshot(&state, id, &entry).await))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, GatewayError> {
    let entry = state.sessions.get(id).await?;
    Ok(snapshot(&state, id, &entry).await)
}

pub async fn load_dataset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LoadRequest>,
) -> Result<Json<SessionSnapshot>, GatewayError> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(GatewayError::MissingUrl);
    }

    let entry = state.sessions.get(id).await?;
    load_into(&state, &entry, url).await;
    Ok(snapshot(&state, id, &entry).await)
}

pub async fn hover(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CountryRequest>,
) -> Result<Json<SessionSnapshot>, GatewayError> {
    let entry = state.sessions.get(id).await?;
    {
        let mut guard = entry.write().await;
        if guard.session.selection_mut().pointer_enter(&req.country) {
            guard.touch();
        }
    }
    Ok(snapshot(&state, id, &entry).await)
}

pub async fn leave(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, GatewayError> {
    let entry = state.sessions.get(id).await?;
    {
        let mut guard = entry.write().await;
        guard.session.selection_mut().pointer_leave();
        guard.touch();
    }
    Ok(snapshot(&state, id, &entry).await)
}

pub async fn click(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CountryRequest>,
) -> Result<Json<SessionSnapshot>, GatewayError> {
    let entry = state.sessions.get(id).await?;
    {
        let mut guard = entry.write().await;
        if guard.session.selection_mut().click(&req.country) {
            guard.touch();
        }
    }
    Ok(snapshot(&state, id, &entry).await)
}

pub async fn change_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PageRequest>,
) -> Result<Json<SessionSnapshot>, GatewayError> {
    let entry = state.sessions.get(id).await?;
    {
        let mut guard = entry.write().await;
        let selection = guard.session.selection_mut();
        let page = match (req.page, req.step) {
            (Some(n), None) => selection.go_to_page(n),
            (None, Some(PageStep::Next)) => selection.next_page(),
            (None, Some(PageStep::Previous)) => selection.previous_page(),
            _ => {
                return Err(GatewayError::BadRequest(
                    "Exactly one of 'page' or 'step' is required".to_string(),
                ))
            }
        };
        debug!("Session {} now on page {}", id, page);
        guard.touch();
    }
    Ok(snapshot(&state, id, &entry).await)
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, GatewayError> {
    state.sessions.remove(id).await?;
    info!("Removed session {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// ========== Router ==========

pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/load", post(load_dataset))
        .route("/:id/hover", post(hover))
        .route("/:id/leave", post(leave))
        .route("/:id/click", post(click))
        .route("/:id/page", post(change_page))
}
