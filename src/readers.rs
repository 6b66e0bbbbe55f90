use std::sync::Arc;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthResolver;
use crate::client::{BackendClient, Query};
use crate::error::{StatsError, StatsResult};
use crate::mock::{Fallback, TimeSeriesParams};
use crate::models::{
    AdminDashboard, ChartsBundle, DailyCount, DailyEvents, DailySummary, DashboardSummary,
    DocumentosStats, DocumentsByMonthChart, DocumentsCountChart, EventCounts, EventTypes,
    EventsDashboard, EventsTable, LotesStats, LotesSummaryChart, RecentActivity, TimeSeries,
    TypeDistribution, TypeShare, UserActivity, UsersStats,
};

/// Every backend path this crate talks to, relative to `{API_URL}/api/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    RecordEvent,
    LatestSummary,
    OverTime,
    UserActivity,
    AdminDashboard,
    UsersStats,
    LotesStats,
    DocumentosStats,
    RecentActivity,
    DashboardSummary,
    EventsTable,
    EventsDistribution,
    Charts,
    LotesSummaryChart,
    DocumentsCountChart,
    DocumentsByMonthChart,
    EventDistributionChart,
    EventsDashboard,
    EventsCounts,
    DailyEvents,
    EventTypes,
}

impl Endpoint {
    pub const READERS: [Endpoint; 20] = [
        Endpoint::LatestSummary,
        Endpoint::OverTime,
        Endpoint::UserActivity,
        Endpoint::AdminDashboard,
        Endpoint::UsersStats,
        Endpoint::LotesStats,
        Endpoint::DocumentosStats,
        Endpoint::RecentActivity,
        Endpoint::DashboardSummary,
        Endpoint::EventsTable,
        Endpoint::EventsDistribution,
        Endpoint::Charts,
        Endpoint::LotesSummaryChart,
        Endpoint::DocumentsCountChart,
        Endpoint::DocumentsByMonthChart,
        Endpoint::EventDistributionChart,
        Endpoint::EventsDashboard,
        Endpoint::EventsCounts,
        Endpoint::DailyEvents,
        Endpoint::EventTypes,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::RecordEvent => "/events/record/",
            Endpoint::LatestSummary => "/summaries/latest/",
            Endpoint::OverTime => "/over-time/",
            Endpoint::UserActivity => "/user/",
            Endpoint::AdminDashboard => "/dashboard/",
            Endpoint::UsersStats => "/dashboard/users/",
            Endpoint::LotesStats => "/dashboard/lotes/",
            Endpoint::DocumentosStats => "/dashboard/documentos/",
            Endpoint::RecentActivity => "/dashboard/recent-activity/",
            Endpoint::DashboardSummary => "/dashboard/summary/",
            Endpoint::EventsTable => "/dashboard/events/table/",
            Endpoint::EventsDistribution => "/dashboard/events/distribution/",
            Endpoint::Charts => "/charts/",
            Endpoint::LotesSummaryChart => "/charts/lotes-summary/",
            Endpoint::DocumentsCountChart => "/charts/documents-count/",
            Endpoint::DocumentsByMonthChart => "/charts/documents-by-month/",
            Endpoint::EventDistributionChart => "/charts/event-distribution/",
            Endpoint::EventsDashboard => "/events/dashboard/",
            Endpoint::EventsCounts => "/events/counts/",
            Endpoint::DailyEvents => "/events/daily/",
            Endpoint::EventTypes => "/events/types/",
        }
    }
}

/// Reader output plus any `Set-Cookie` headers the auth layer produced.
#[derive(Debug, Clone, Default)]
pub struct Fetched<T> {
    pub data: T,
    pub headers: HeaderMap,
}

#[derive(Clone)]
pub struct StatsReader {
    client: BackendClient,
    auth: Arc<dyn AuthResolver>,
    fallback: Fallback,
}

fn days_query(days: u32) -> Query {
    vec![("days", days.to_string())]
}

/// Accept either a bare array or an object holding it under one of `keys`.
fn unwrap_list(raw: Value, keys: &[&str]) -> Value {
    match raw {
        Value::Object(mut map) => keys
            .iter()
            .find_map(|k| map.remove(*k))
            .unwrap_or_else(|| Value::Array(Vec::new())),
        other => other,
    }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, raw: Value) -> StatsResult<T> {
    serde_json::from_value(raw).map_err(|e| StatsError::Decode {
        path: endpoint.path().to_string(),
        reason: e.to_string(),
    })
}

impl StatsReader {
    pub fn new(client: BackendClient, auth: Arc<dyn AuthResolver>, fallback: Fallback) -> Self {
        Self {
            client,
            auth,
            fallback,
        }
    }

    async fn fetch_raw(
        &self,
        headers: &HeaderMap,
        endpoint: Endpoint,
        query: Query,
    ) -> StatsResult<Fetched<Value>> {
        let auth = self.auth.resolve(headers);
        let data = if self.fallback.applies(&auth) {
            debug!(path = endpoint.path(), "serving synthetic stats");
            self.fallback.data(endpoint, &query)
        } else {
            self.client
                .get_json(endpoint.path(), &query, auth.token.as_deref())
                .await?
        };
        Ok(Fetched {
            data,
            headers: auth.set_cookies,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        headers: &HeaderMap,
        endpoint: Endpoint,
        query: Query,
    ) -> StatsResult<Fetched<T>> {
        let raw = self.fetch_raw(headers, endpoint, query).await?;
        let data = decode(endpoint, raw.data)?;
        Ok(Fetched {
            data,
            headers: raw.headers,
        })
    }

    pub async fn latest_summary(&self, headers: &HeaderMap) -> StatsResult<Fetched<DailySummary>> {
        self.fetch(headers, Endpoint::LatestSummary, Query::new()).await
    }

    pub async fn stats_over_time(
        &self,
        headers: &HeaderMap,
        params: &TimeSeriesParams,
    ) -> StatsResult<Fetched<TimeSeries>> {
        self.fetch(headers, Endpoint::OverTime, params.to_query()).await
    }

    pub async fn user_activity(
        &self,
        headers: &HeaderMap,
        days: u32,
    ) -> StatsResult<Fetched<UserActivity>> {
        self.fetch(headers, Endpoint::UserActivity, days_query(days)).await
    }

    pub async fn admin_dashboard_stats(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<AdminDashboard>> {
        self.fetch(headers, Endpoint::AdminDashboard, Query::new()).await
    }

    pub async fn users_stats(&self, headers: &HeaderMap) -> StatsResult<Fetched<UsersStats>> {
        self.fetch(headers, Endpoint::UsersStats, Query::new()).await
    }

    pub async fn lotes_stats(&self, headers: &HeaderMap) -> StatsResult<Fetched<LotesStats>> {
        self.fetch(headers, Endpoint::LotesStats, Query::new()).await
    }

    pub async fn documentos_stats(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<DocumentosStats>> {
        self.fetch(headers, Endpoint::DocumentosStats, Query::new()).await
    }

    pub async fn recent_activity(
        &self,
        headers: &HeaderMap,
        days: u32,
    ) -> StatsResult<Fetched<RecentActivity>> {
        self.fetch(headers, Endpoint::RecentActivity, days_query(days)).await
    }

    pub async fn dashboard_summary(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<DashboardSummary>> {
        self.fetch(headers, Endpoint::DashboardSummary, Query::new()).await
    }

    pub async fn events_table(
        &self,
        headers: &HeaderMap,
        limit: u32,
    ) -> StatsResult<Fetched<EventsTable>> {
        let query = vec![("limit", limit.to_string())];
        self.fetch(headers, Endpoint::EventsTable, query).await
    }

    pub async fn events_distribution(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<TypeDistribution>> {
        self.fetch(headers, Endpoint::EventsDistribution, Query::new()).await
    }

    pub async fn charts(&self, headers: &HeaderMap) -> StatsResult<Fetched<ChartsBundle>> {
        self.fetch(headers, Endpoint::Charts, Query::new()).await
    }

    pub async fn lotes_summary_chart(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<LotesSummaryChart>> {
        self.fetch(headers, Endpoint::LotesSummaryChart, Query::new()).await
    }

    pub async fn documents_count_chart(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<DocumentsCountChart>> {
        self.fetch(headers, Endpoint::DocumentsCountChart, Query::new()).await
    }

    pub async fn documents_by_month_chart(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<DocumentsByMonthChart>> {
        self.fetch(headers, Endpoint::DocumentsByMonthChart, Query::new()).await
    }

    pub async fn event_distribution_chart(
        &self,
        headers: &HeaderMap,
    ) -> StatsResult<Fetched<TypeDistribution>> {
        self.fetch(headers, Endpoint::EventDistributionChart, Query::new()).await
    }

    pub async fn events_dashboard(
        &self,
        headers: &HeaderMap,
        days: u32,
    ) -> StatsResult<Fetched<EventsDashboard>> {
        self.fetch(headers, Endpoint::EventsDashboard, days_query(days)).await
    }

    pub async fn events_counts(
        &self,
        headers: &HeaderMap,
        days: u32,
    ) -> StatsResult<Fetched<EventCounts>> {
        self.fetch(headers, Endpoint::EventsCounts, days_query(days)).await
    }

    /// Daily counts, renamed to `dailyEvents` for display.
    pub async fn daily_events(
        &self,
        headers: &HeaderMap,
        days: u32,
    ) -> StatsResult<Fetched<DailyEvents>> {
        let raw = self
            .fetch_raw(headers, Endpoint::DailyEvents, days_query(days))
            .await?;
        let headers = raw.headers;
        let list = unwrap_list(raw.data, &["daily_events", "dailyEvents", "results"]);
        let daily_events: Vec<DailyCount> = decode(Endpoint::DailyEvents, list)?;
        Ok(Fetched {
            data: DailyEvents { daily_events },
            headers,
        })
    }

    /// Type distribution, renamed to `eventTypes` for display.
    pub async fn event_types(
        &self,
        headers: &HeaderMap,
        days: u32,
    ) -> StatsResult<Fetched<EventTypes>> {
        let raw = self
            .fetch_raw(headers, Endpoint::EventTypes, days_query(days))
            .await?;
        let headers = raw.headers;
        let list = unwrap_list(raw.data, &["event_types", "eventTypes", "results"]);
        let event_types: Vec<TypeShare> = decode(Endpoint::EventTypes, list)?;
        Ok(Fetched {
            data: EventTypes { event_types },
            headers,
        })
    }
}
