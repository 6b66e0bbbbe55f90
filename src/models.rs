use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six kinds of tracked interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    View,
    Search,
    Action,
    Api,
    Error,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::View,
        EventType::Search,
        EventType::Action,
        EventType::Api,
        EventType::Error,
        EventType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::View => "view",
            EventType::Search => "search",
            EventType::Action => "action",
            EventType::Api => "api",
            EventType::Error => "error",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event as handed to the recorder by a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Map<String, Value>>,
}

impl NewEvent {
    pub fn new(event_type: EventType, name: impl Into<String>) -> Self {
        Self {
            event_type,
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: Map<String, Value>) -> Self {
        self.value = Some(value);
        self
    }
}

/// Wire body for `POST /events/record/`. Always carries one session id.
#[derive(Debug, Serialize)]
pub struct OutboundEvent<'a> {
    pub session_id: &'a str,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: &'a str,
    pub value: &'a Map<String, Value>,
}

/// Event as echoed back by the backend in activity listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedEvent {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordedEvent {
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Parse a backend timestamp. Offsets are honoured; naive values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// One step of a time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub period: String,
    pub count: u64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<TimeSeriesPoint>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

/// Share of one event type within a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeShare {
    #[serde(rename = "type")]
    pub event_type: String,
    pub count: u64,
    pub percentage: f64,
}

/// Percentages of a set of counts, largest first. Empty input gives zeros.
pub fn distribution_from_counts<I, S>(counts: I) -> Vec<TypeShare>
where
    I: IntoIterator<Item = (S, u64)>,
    S: Into<String>,
{
    let counts: Vec<(String, u64)> = counts.into_iter().map(|(k, v)| (k.into(), v)).collect();
    let total: u64 = counts.iter().map(|(_, c)| c).sum();

    let mut shares: Vec<TypeShare> = counts
        .into_iter()
        .map(|(event_type, count)| TypeShare {
            event_type,
            count,
            percentage: if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDistribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<TypeShare>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_users: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_sessions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_by_type: Option<BTreeMap<String, u64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_by_type: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_events: Option<Vec<RecordedEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserActivity {
    pub fn first_activity_utc(&self) -> Option<DateTime<Utc>> {
        self.first_activity.as_deref().and_then(parse_timestamp)
    }

    pub fn last_activity_utc(&self) -> Option<DateTime<Utc>> {
        self.last_activity.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminDashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_users: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_lotes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_documentos: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_role: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_last_30_days: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LotesStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_status: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_area: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentosStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_type: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_review: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<RecordedEvent>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lotes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentos: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_today: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_last_30_days: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<RecordedEvent>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Labelled series as plotted by the dashboard charts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type LotesSummaryChart = ChartSeries;
pub type DocumentsCountChart = ChartSeries;
pub type DocumentsByMonthChart = ChartSeries;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartsBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lotes_summary: Option<ChartSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_count: Option<ChartSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_by_month: Option<ChartSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_distribution: Option<Vec<TypeShare>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsDashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_sessions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<Vec<DailyCount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<TypeShare>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_events: Option<Vec<NamedCount>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventCounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_type: Option<BTreeMap<String, u64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `/events/daily/` renamed for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyEvents {
    #[serde(rename = "dailyEvents")]
    pub daily_events: Vec<DailyCount>,
}

/// `/events/types/` renamed for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTypes {
    #[serde(rename = "eventTypes")]
    pub event_types: Vec<TypeShare>,
}
