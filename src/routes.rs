use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthResolver, CookieAuth};
use crate::client::BackendClient;
use crate::config::{RuntimeMode, StatsConfig};
use crate::error::StatsResult;
use crate::mock::{Fallback, TimeSeriesParams};
use crate::models::{
    AdminDashboard, ChartSeries, ChartsBundle, DailyEvents, DashboardSummary, DocumentosStats,
    EventCounts, EventType, EventTypes, EventsDashboard, EventsTable, LotesStats, NewEvent,
    RecentActivity, TimeSeries, TypeDistribution, UserActivity, UsersStats,
};
use crate::page::PageLoad;
use crate::readers::StatsReader;
use crate::recorder::EventRecorder;

const DEFAULT_ACTIVITY_DAYS: u32 = 30;
const DEFAULT_EVENT_DAYS: u32 = 7;
const DEFAULT_TABLE_LIMIT: u32 = 10;
const MAX_WINDOW_DAYS: u32 = 366;
const MAX_TABLE_LIMIT: u32 = 500;

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub mode: RuntimeMode,
    pub reader: StatsReader,
    pub recorder: EventRecorder,
}

impl AppState {
    pub fn from_config(config: &StatsConfig) -> StatsResult<Self> {
        let secure = config.mode == RuntimeMode::Production;
        let client = BackendClient::new(config)?;
        let auth: Arc<dyn AuthResolver> = Arc::new(
            CookieAuth::new(config.auth_cookie.clone(), config.refresh_cookie.clone())
                .secure(secure),
        );
        let fallback = Fallback::for_mode(config.mode);

        Ok(Self {
            mode: config.mode,
            reader: StatsReader::new(client.clone(), auth.clone(), fallback.clone()),
            recorder: EventRecorder::new(client, auth, fallback, secure),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/events", post(record_event))
        .route("/dashboard/admin", get(admin_dashboard))
        .route("/dashboard/owner", get(owner_dashboard))
        .route("/dashboard/events", get(events_dashboard))
        .route("/stats/over-time", get(stats_over_time))
        .route("/charts", get(charts))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Lote360 Stats API v0.1.0"
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "mode": state.mode,
    }))
}

#[derive(Debug, Serialize)]
struct RecordResponse {
    success: bool,
    session_id: String,
}

/// Track one interaction. Always answers 200; `success` tells whether the
/// backend accepted it.
async fn record_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<NewEvent>,
) -> impl IntoResponse {
    let outcome = state.recorder.record(&headers, event).await;
    (
        outcome.headers,
        Json(RecordResponse {
            success: outcome.success,
            session_id: outcome.session_id,
        }),
    )
}

#[derive(Debug, Default, Deserialize)]
struct WindowQuery {
    days: Option<u32>,
    limit: Option<u32>,
}

impl WindowQuery {
    fn days(&self, default: u32) -> u32 {
        self.days.map_or(default, |d| d.clamp(1, MAX_WINDOW_DAYS))
    }

    fn limit(&self) -> u32 {
        self.limit
            .map_or(DEFAULT_TABLE_LIMIT, |l| l.clamp(1, MAX_TABLE_LIMIT))
    }
}

#[derive(Debug, Serialize)]
struct AdminDashboardView {
    stats: AdminDashboard,
    users: UsersStats,
    lotes: LotesStats,
    documentos: DocumentosStats,
    recent_activity: RecentActivity,
    summary: DashboardSummary,
}

async fn admin_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(window): Query<WindowQuery>,
) -> impl IntoResponse {
    let days = window.days(DEFAULT_EVENT_DAYS);
    let reader = &state.reader;
    let (recorded, stats, users, lotes, documentos, recent, summary) = tokio::join!(
        state
            .recorder
            .record(&headers, NewEvent::new(EventType::View, "admin_dashboard")),
        reader.admin_dashboard_stats(&headers),
        reader.users_stats(&headers),
        reader.lotes_stats(&headers),
        reader.documentos_stats(&headers),
        reader.recent_activity(&headers, days),
        reader.dashboard_summary(&headers),
    );

    let mut load = PageLoad::with_headers(recorded.headers);
    let view = AdminDashboardView {
        stats: load.settle(stats),
        users: load.settle(users),
        lotes: load.settle(lotes),
        documentos: load.settle(documentos),
        recent_activity: load.settle(recent),
        summary: load.settle(summary),
    };
    let (headers, page) = load.finish(view);
    (headers, Json(page))
}

#[derive(Debug, Serialize)]
struct OwnerDashboardView {
    activity: UserActivity,
    #[serde(flatten)]
    daily: DailyEvents,
}

async fn owner_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(window): Query<WindowQuery>,
) -> impl IntoResponse {
    let days = window.days(DEFAULT_ACTIVITY_DAYS);
    let (recorded, activity, daily) = tokio::join!(
        state
            .recorder
            .record(&headers, NewEvent::new(EventType::View, "owner_dashboard")),
        state.reader.user_activity(&headers, days),
        state.reader.daily_events(&headers, days),
    );

    let mut load = PageLoad::with_headers(recorded.headers);
    let view = OwnerDashboardView {
        activity: load.settle(activity),
        daily: load.settle(daily),
    };
    let (headers, page) = load.finish(view);
    (headers, Json(page))
}

#[derive(Debug, Serialize)]
struct EventsView {
    dashboard: EventsDashboard,
    counts: EventCounts,
    #[serde(flatten)]
    daily: DailyEvents,
    #[serde(flatten)]
    types: EventTypes,
    table: EventsTable,
}

async fn events_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(window): Query<WindowQuery>,
) -> impl IntoResponse {
    let days = window.days(DEFAULT_EVENT_DAYS);
    let limit = window.limit();
    let reader = &state.reader;
    let (dashboard, counts, daily, types, table) = tokio::join!(
        reader.events_dashboard(&headers, days),
        reader.events_counts(&headers, days),
        reader.daily_events(&headers, days),
        reader.event_types(&headers, days),
        reader.events_table(&headers, limit),
    );

    let mut load = PageLoad::new();
    let view = EventsView {
        dashboard: load.settle(dashboard),
        counts: load.settle(counts),
        daily: load.settle(daily),
        types: load.settle(types),
        table: load.settle(table),
    };
    let (headers, page) = load.finish(view);
    (headers, Json(page))
}

async fn stats_over_time(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TimeSeriesParams>,
) -> impl IntoResponse {
    let mut load = PageLoad::new();
    let series: TimeSeries = load.settle(state.reader.stats_over_time(&headers, &params).await);
    let (headers, page) = load.finish(series);
    (headers, Json(page))
}

#[derive(Debug, Serialize)]
struct ChartsView {
    bundle: ChartsBundle,
    lotes_summary: ChartSeries,
    documents_count: ChartSeries,
    documents_by_month: ChartSeries,
    event_distribution: TypeDistribution,
}

async fn charts(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let reader = &state.reader;
    let (bundle, lotes_summary, documents_count, documents_by_month, event_distribution) = tokio::join!(
        reader.charts(&headers),
        reader.lotes_summary_chart(&headers),
        reader.documents_count_chart(&headers),
        reader.documents_by_month_chart(&headers),
        reader.event_distribution_chart(&headers),
    );

    let mut load = PageLoad::new();
    let view = ChartsView {
        bundle: load.settle(bundle),
        lotes_summary: load.settle(lotes_summary),
        documents_count: load.settle(documents_count),
        documents_by_month: load.settle(documents_by_month),
        event_distribution: load.settle(event_distribution),
    };
    let (headers, page) = load.finish(view);
    (headers, Json(page))
}
