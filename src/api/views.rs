use crate::api::errors::ApiError;
use crate::report::dataset::{ReportName, UnknownReport};
use crate::storage::cache::DatasetCache;
use crate::storage::loader::{DataSource, FsDataSource, LoadStats};
use crate::viewer::{Transition, ViewSnapshot, Viewer};
use axum::extract::State;
use axum::Json;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Selection summary readable without waiting on the viewer, which stays
/// locked for the whole of a dataset load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStatus {
    pub site: Option<String>,
    pub period: Option<String>,
    pub page: Option<ReportName>,
}

impl SelectionStatus {
    fn of<S: DataSource>(viewer: &Viewer<S>) -> Self {
        Self {
            site: viewer.site().map(str::to_string),
            period: viewer.period().map(|p| p.code().to_string()),
            page: viewer.page(),
        }
    }
}

/// Shared application state: the single viewer and the handles used for
/// health and metrics reporting.
pub struct AppState {
    pub viewer: Mutex<Viewer<FsDataSource>>,
    pub cache: DatasetCache,
    pub load_stats: Arc<LoadStats>,
    pub data_dir: PathBuf,
    status: RwLock<SelectionStatus>,
}

impl AppState {
    pub fn new(source: FsDataSource) -> Self {
        let cache = source.cache().clone();
        let load_stats = source.stats();
        let data_dir = source.data_dir().to_path_buf();
        Self {
            viewer: Mutex::new(Viewer::new(source)),
            cache,
            load_stats,
            data_dir,
            status: RwLock::new(SelectionStatus::default()),
        }
    }

    /// Copy the viewer's selection into the status read by `/health/detailed`
    /// and `/metrics`. Call while still holding the viewer lock.
    pub fn publish(&self, viewer: &Viewer<FsDataSource>) {
        *self.status.write() = SelectionStatus::of(viewer);
    }

    pub fn status(&self) -> SelectionStatus {
        self.status.read().clone()
    }
}

/// Run `f` against the viewer on the blocking pool. Loads are synchronous
/// file reads, and the mutex keeps selection changes one at a time.
async fn with_viewer<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut Viewer<FsDataSource>) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut viewer = state.viewer.lock();
        let result = f(&mut viewer);
        state.publish(&viewer);
        result
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Viewer task panicked: {e}")))?
}

fn snapshot_of(viewer: &Viewer<FsDataSource>) -> Result<ViewSnapshot, ApiError> {
    viewer
        .snapshot()
        .ok_or_else(|| ApiError::NotFound("No site is selected".to_string()))
}

fn log_transition(transition: Transition, viewer: &Viewer<FsDataSource>) {
    match transition {
        Transition::Unchanged => tracing::debug!("Selection unchanged"),
        Transition::FirstLoad => {
            tracing::info!(fragment = viewer.fragment(), "First site selected");
        }
        Transition::Updated => tracing::debug!(fragment = viewer.fragment(), "Selection updated"),
    }
}

/// GET /api/sites: Site ids from `sites.json`.
pub async fn get_sites(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let sites = with_viewer(state, |viewer| Ok(viewer.source().sites()?)).await?;
    Ok(Json(sites))
}

/// GET /api/view: View model of the current selection.
pub async fn get_view(State(state): State<Arc<AppState>>) -> Result<Json<ViewSnapshot>, ApiError> {
    with_viewer(state, |viewer| snapshot_of(viewer)).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct FragmentPayload {
    #[serde(default)]
    pub fragment: String,
}

/// POST /api/view/fragment: Restore the selection from a bookmarked fragment.
pub async fn restore_fragment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FragmentPayload>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    with_viewer(state, move |viewer| {
        let transition = viewer.restore(&payload.fragment)?;
        log_transition(transition, viewer);
        snapshot_of(viewer)
    })
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct SitePayload {
    pub site: String,
    pub period: Option<String>,
}

/// POST /api/view/site: Select a site (and optionally a period).
pub async fn select_site(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SitePayload>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    with_viewer(state, move |viewer| {
        let transition = viewer.select_site(&payload.site, payload.period.as_deref())?;
        log_transition(transition, viewer);
        snapshot_of(viewer)
    })
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct PeriodPayload {
    pub period: String,
}

/// POST /api/view/period: Select a period of the current site.
pub async fn select_period(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PeriodPayload>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    with_viewer(state, move |viewer| {
        let transition = viewer.select_period(&payload.period)?;
        log_transition(transition, viewer);
        snapshot_of(viewer)
    })
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct PagePayload {
    pub page: String,
}

/// POST /api/view/page: Switch the active report tab.
pub async fn show_page(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PagePayload>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    let page: ReportName = payload
        .page
        .parse()
        .map_err(|e: UnknownReport| ApiError::BadRequest(e.to_string()))?;
    with_viewer(state, move |viewer| {
        viewer.show_page(page)?;
        snapshot_of(viewer)
    })
    .await
    .map(Json)
}
