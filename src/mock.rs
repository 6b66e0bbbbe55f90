use std::sync::Arc;

use chrono::{Days, Months, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthContext;
use crate::client::Query;
use crate::config::RuntimeMode;
use crate::models::{distribution_from_counts, EventType, TimeSeriesPoint};
use crate::readers::Endpoint;

/// Inclusive bounds of generated counts.
pub const MOCK_COUNT_MIN: u64 = 10;
pub const MOCK_COUNT_MAX: u64 = 59;
const DEFAULT_SPAN_DAYS: u64 = 30;
const DEFAULT_DAYS: u64 = 7;
const DEFAULT_ROWS: u64 = 10;

/// Upper bounds on caller-supplied windows when generating mock data.
pub const MAX_MOCK_DAYS: u64 = 366;
pub const MAX_MOCK_ROWS: u64 = 500;
pub const MAX_MOCK_POINTS: usize = 5_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Day,
    Week,
    Month,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Week => "week",
            Interval::Month => "month",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "day" => Some(Interval::Day),
            "week" => Some(Interval::Week),
            "month" => Some(Interval::Month),
            _ => None,
        }
    }

    fn nth_step(self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Interval::Day => start.checked_add_days(Days::new(n as u64)),
            Interval::Week => start.checked_add_days(Days::new(7 * n as u64)),
            Interval::Month => start.checked_add_months(Months::new(n)),
        }
    }

    fn label(self, date: NaiveDate) -> String {
        match self {
            Interval::Day | Interval::Week => date.format("%Y-%m-%d").to_string(),
            Interval::Month => date.format("%Y-%m").to_string(),
        }
    }
}

/// Filters accepted by `/over-time/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesParams {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub interval: Option<Interval>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
}

impl TimeSeriesParams {
    /// Wire form; unset filters are left out.
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(start) = self.start_date {
            query.push(("start_date", start.to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("end_date", end.to_string()));
        }
        if let Some(interval) = self.interval {
            query.push(("interval", interval.as_str().to_string()));
        }
        if let Some(t) = &self.event_type {
            query.push(("type", t.clone()));
        }
        query
    }

    fn from_query(query: &Query) -> Self {
        Self {
            start_date: query_value(query, "start_date").and_then(|v| v.parse().ok()),
            end_date: query_value(query, "end_date").and_then(|v| v.parse().ok()),
            interval: query_value(query, "interval").and_then(Interval::parse),
            event_type: query_value(query, "type").map(str::to_string),
        }
    }
}

/// Random counts for every step from start to end, inclusive.
///
/// Missing `end_date` means today; missing `start_date` means 30 days before
/// the end. A reversed range yields nothing. Output stops at
/// [`MAX_MOCK_POINTS`].
pub fn generate_mock_time_series(params: &TimeSeriesParams) -> Vec<TimeSeriesPoint> {
    let end = params.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = params
        .start_date
        .or_else(|| end.checked_sub_days(Days::new(DEFAULT_SPAN_DAYS)))
        .unwrap_or(end);
    let interval = params.interval.unwrap_or_default();
    let event_type = params.event_type.clone().unwrap_or_else(|| "all".to_string());

    let mut rng = rand::thread_rng();
    let mut points = Vec::new();
    let mut n = 0u32;
    while let Some(date) = interval.nth_step(start, n) {
        if date > end || points.len() >= MAX_MOCK_POINTS {
            break;
        }
        points.push(TimeSeriesPoint {
            period: interval.label(date),
            count: rng.gen_range(MOCK_COUNT_MIN..=MOCK_COUNT_MAX),
            event_type: Some(event_type.clone()),
        });
        n += 1;
    }
    points
}

pub(crate) fn query_value<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

/// Produces JSON in the shape the real backend returns for `endpoint`.
pub trait MockDataProvider: Send + Sync {
    fn mock(&self, endpoint: Endpoint, query: &Query) -> Value;
}

/// Default provider: fixed literals, plus random series where the
/// dashboards plot time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticData;

impl SyntheticData {
    fn bounded(query: &Query, key: &str, default: u64, max: u64) -> u64 {
        query_value(query, key)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .map_or(default, |n| n.min(max))
    }

    fn days(query: &Query) -> u64 {
        Self::bounded(query, "days", DEFAULT_DAYS, MAX_MOCK_DAYS)
    }

    fn daily(days: u64) -> Vec<Value> {
        let end = Utc::now().date_naive();
        let params = TimeSeriesParams {
            start_date: end.checked_sub_days(Days::new(days.saturating_sub(1))),
            end_date: Some(end),
            interval: Some(Interval::Day),
            event_type: None,
        };
        generate_mock_time_series(&params)
            .into_iter()
            .map(|p| json!({"date": p.period, "count": p.count}))
            .collect()
    }

    fn type_counts() -> Vec<(&'static str, u64)> {
        vec![
            (EventType::View.as_str(), 120),
            (EventType::Search.as_str(), 45),
            (EventType::Action.as_str(), 30),
            (EventType::Api.as_str(), 18),
            (EventType::Error.as_str(), 4),
            (EventType::Other.as_str(), 3),
        ]
    }

    fn distribution() -> Value {
        json!(distribution_from_counts(Self::type_counts()))
    }

    fn sample_events(count: usize) -> Vec<Value> {
        let names = ["dashboard", "lote_detail", "search_lotes", "upload_document"];
        let types = ["view", "view", "search", "action"];
        let now = Utc::now();
        (0..count)
            .map(|i| {
                json!({
                    "type": types[i % types.len()],
                    "name": names[i % names.len()],
                    "value": {},
                    "timestamp": (now - chrono::Duration::hours(i as i64 * 3)).to_rfc3339(),
                })
            })
            .collect()
    }

    fn month_chart() -> Value {
        json!({
            "labels": ["Ene", "Feb", "Mar", "Abr", "May", "Jun"],
            "values": [4.0, 7.0, 5.0, 9.0, 12.0, 8.0],
        })
    }
}

impl MockDataProvider for SyntheticData {
    fn mock(&self, endpoint: Endpoint, query: &Query) -> Value {
        match endpoint {
            Endpoint::LatestSummary => json!({
                "date": Utc::now().date_naive(),
                "total_events": 220,
                "unique_users": 18,
                "unique_sessions": 37,
                "events_by_type": {"view": 120, "search": 45, "action": 30, "api": 18, "error": 4, "other": 3},
            }),
            Endpoint::OverTime => {
                let params = TimeSeriesParams::from_query(query);
                json!({"results": generate_mock_time_series(&params)})
            }
            Endpoint::UserActivity => {
                let recent = Self::sample_events(5);
                let now = Utc::now();
                json!({
                    "total_events": 42,
                    "events_by_type": {"view": 30, "search": 8, "action": 4},
                    "recent_events": recent,
                    "first_activity": now
                        .checked_sub_days(Days::new(Self::days(query)))
                        .unwrap_or(now)
                        .to_rfc3339(),
                    "last_activity": now.to_rfc3339(),
                })
            }
            Endpoint::AdminDashboard => json!({
                "total_users": 25,
                "total_lotes": 64,
                "total_documentos": 143,
                "total_events": 220,
            }),
            Endpoint::UsersStats => json!({
                "total": 25,
                "active": 19,
                "by_role": {"admin": 2, "owner": 15, "developer": 8},
                "new_last_30_days": 6,
            }),
            Endpoint::LotesStats => json!({
                "total": 64,
                "by_status": {"active": 41, "pending": 15, "archived": 8},
                "total_area": 18250.5,
            }),
            Endpoint::DocumentosStats => json!({
                "total": 143,
                "by_type": {"ctl": 52, "planos": 47, "otros": 44},
                "pending_review": 11,
            }),
            Endpoint::RecentActivity => json!({
                "days": Self::days(query),
                "events": Self::sample_events(8),
            }),
            Endpoint::DashboardSummary => json!({
                "users": 25,
                "lotes": 64,
                "documentos": 143,
                "events_today": 17,
                "events_last_30_days": 220,
            }),
            Endpoint::EventsTable => {
                let limit = Self::bounded(query, "limit", DEFAULT_ROWS, MAX_MOCK_ROWS);
                json!({"total": 220, "events": Self::sample_events(limit as usize)})
            }
            Endpoint::EventsDistribution | Endpoint::EventDistributionChart => json!({
                "total": 220,
                "distribution": Self::distribution(),
            }),
            Endpoint::Charts => json!({
                "lotes_summary": {"labels": ["Activos", "Pendientes", "Archivados"], "values": [41.0, 15.0, 8.0]},
                "documents_count": {"labels": ["CTL", "Planos", "Otros"], "values": [52.0, 47.0, 44.0]},
                "documents_by_month": Self::month_chart(),
                "event_distribution": Self::distribution(),
            }),
            Endpoint::LotesSummaryChart => json!({
                "labels": ["Activos", "Pendientes", "Archivados"],
                "values": [41.0, 15.0, 8.0],
            }),
            Endpoint::DocumentsCountChart => json!({
                "labels": ["CTL", "Planos", "Otros"],
                "values": [52.0, 47.0, 44.0],
            }),
            Endpoint::DocumentsByMonthChart => Self::month_chart(),
            Endpoint::EventsDashboard => {
                let days = Self::days(query);
                json!({
                    "total_events": 220,
                    "unique_sessions": 37,
                    "daily": Self::daily(days),
                    "types": Self::distribution(),
                    "top_events": [
                        {"name": "dashboard", "count": 64},
                        {"name": "lote_detail", "count": 41},
                        {"name": "search_lotes", "count": 29},
                    ],
                })
            }
            Endpoint::EventsCounts => json!({
                "total": 220,
                "by_type": {"view": 120, "search": 45, "action": 30, "api": 18, "error": 4, "other": 3},
            }),
            Endpoint::DailyEvents => Value::Array(Self::daily(Self::days(query))),
            Endpoint::EventTypes => Self::distribution(),
            Endpoint::RecordEvent => json!({}),
        }
    }
}

/// When readers substitute synthetic data for a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Always hit the backend.
    Never,
    /// Serve mock data to requests without a bearer token.
    WhenUnauthenticated,
    /// Never touch the network.
    Always,
}

impl FallbackPolicy {
    pub fn for_mode(mode: RuntimeMode) -> Self {
        match mode {
            RuntimeMode::Development => FallbackPolicy::Always,
            RuntimeMode::Production => FallbackPolicy::WhenUnauthenticated,
        }
    }
}

/// Injected capability deciding, once per call, whether to go offline.
#[derive(Clone)]
pub struct Fallback {
    policy: FallbackPolicy,
    provider: Arc<dyn MockDataProvider>,
}

impl std::fmt::Debug for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fallback")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Fallback {
    pub fn new(policy: FallbackPolicy, provider: Arc<dyn MockDataProvider>) -> Self {
        Self { policy, provider }
    }

    pub fn for_mode(mode: RuntimeMode) -> Self {
        Self::new(FallbackPolicy::for_mode(mode), Arc::new(SyntheticData))
    }

    /// Whether events should be logged locally instead of sent.
    pub fn is_offline(&self) -> bool {
        self.policy == FallbackPolicy::Always
    }

    pub fn applies(&self, auth: &AuthContext) -> bool {
        match self.policy {
            FallbackPolicy::Never => false,
            FallbackPolicy::WhenUnauthenticated => !auth.is_authenticated(),
            FallbackPolicy::Always => true,
        }
    }

    pub fn data(&self, endpoint: Endpoint, query: &Query) -> Value {
        self.provider.mock(endpoint, query)
    }
}
