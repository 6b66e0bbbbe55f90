#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use axum::extract::{Query, State};
    use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::{RuntimeMode, StatsConfig};
    use crate::models::{DailyCount, EventType, NewEvent};
    use crate::page::STATS_ERROR_BANNER;
    use crate::readers::Endpoint;
    use crate::routes::{router, AppState};

    #[derive(Clone, Default)]
    struct Captured {
        posts: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn record(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.posts.lock().unwrap().push((auth, body));
        (StatusCode::CREATED, Json(json!({})))
    }

    async fn over_time(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        Json(json!({
            "results": [{"period": q.get("start_date").cloned().unwrap_or_default(), "count": 9}],
            "interval": q.get("interval").cloned().unwrap_or_default(),
        }))
    }

    fn backend(captured: Captured) -> Router {
        Router::new()
            .route("/api/stats/events/record/", post(record))
            .route(
                "/api/stats/events/daily/",
                get(|| async { Json(json!([{"date": "2024-01-01", "count": 3}])) }),
            )
            .route(
                "/api/stats/events/types/",
                get(|| async {
                    Json(json!({"results": [{"type": "view", "count": 2, "percentage": 100.0}]}))
                }),
            )
            .route("/api/stats/over-time/", get(over_time))
            .route(
                "/api/stats/dashboard/users/",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/api/stats/dashboard/lotes/",
                get(|| async { Json(json!({"total": 4, "total_area": null})) }),
            )
            .route(
                "/api/stats/user/",
                get(|| async {
                    Json(json!({
                        "total_events": 2,
                        "first_activity": "2024-05-01T08:00:00.123456",
                        "last_activity": null,
                    }))
                }),
            )
            .route(
                "/api/stats/dashboard/",
                get(|| async { Json(json!({"total_users": 3, "total_lotes": 5, "region": "Antioquia"})) }),
            )
            .with_state(captured)
    }

    async fn spawn_backend(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn production(api_url: String) -> AppState {
        let config = StatsConfig {
            api_url,
            mode: RuntimeMode::Production,
            request_timeout_secs: 5,
            ..StatsConfig::default()
        };
        AppState::from_config(&config).unwrap()
    }

    fn authed(extra: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = format!("l360_access_token=tok-1; {}", extra);
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_recorded_event_body_reaches_backend() {
        let captured = Captured::default();
        let url = spawn_backend(backend(captured.clone())).await;
        let state = production(url);

        let mut value = serde_json::Map::new();
        value.insert("a".to_string(), json!(1));
        let outcome = state
            .recorder
            .record(
                &authed("l360_stats_sid=sid-42"),
                NewEvent::new(EventType::Action, "upload_document").with_value(value),
            )
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.session_id, "sid-42");

        let posts = captured.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let (auth, body) = &posts[0];
        assert_eq!(auth.as_deref(), Some("Bearer tok-1"));
        assert_eq!(body["value"]["a"], json!(1));
        assert_eq!(body["session_id"], json!("sid-42"));
        assert_eq!(body["type"], json!("action"));
        assert_eq!(body["name"], json!("upload_document"));
    }

    #[tokio::test]
    async fn test_anonymous_event_still_sent_with_fresh_session() {
        let captured = Captured::default();
        let url = spawn_backend(backend(captured.clone())).await;
        let state = production(url);

        let outcome = state
            .recorder
            .record(&HeaderMap::new(), NewEvent::new(EventType::View, "home"))
            .await;

        assert!(outcome.success);
        let posts = captured.posts.lock().unwrap();
        let (auth, body) = &posts[0];
        assert!(auth.is_none());
        assert_eq!(body["session_id"], json!(outcome.session_id));
        assert_eq!(body["value"], json!({}));
    }

    #[tokio::test]
    async fn test_daily_events_shape_is_preserved() {
        let url = spawn_backend(backend(Captured::default())).await;
        let state = production(url);

        let fetched = state.reader.daily_events(&authed(""), 7).await.unwrap();
        assert_eq!(
            fetched.data.daily_events,
            vec![DailyCount {
                date: "2024-01-01".to_string(),
                count: 3
            }]
        );
        let rendered = serde_json::to_value(&fetched.data).unwrap();
        assert_eq!(rendered, json!({"dailyEvents": [{"date": "2024-01-01", "count": 3}]}));
        assert!(fetched.headers.is_empty());
    }

    #[tokio::test]
    async fn test_event_types_unwraps_results() {
        let url = spawn_backend(backend(Captured::default())).await;
        let state = production(url);

        let fetched = state.reader.event_types(&authed(""), 7).await.unwrap();
        assert_eq!(fetched.data.event_types.len(), 1);
        assert_eq!(fetched.data.event_types[0].event_type, "view");
    }

    #[tokio::test]
    async fn test_over_time_forwards_filters() {
        let url = spawn_backend(backend(Captured::default())).await;
        let state = production(url);

        let params = crate::mock::TimeSeriesParams {
            start_date: Some("2024-03-01".parse().unwrap()),
            end_date: Some("2024-03-31".parse().unwrap()),
            interval: Some(crate::mock::Interval::Week),
            event_type: None,
        };
        let fetched = state
            .reader
            .stats_over_time(&authed(""), &params)
            .await
            .unwrap();
        assert_eq!(fetched.data.results.as_ref().unwrap()[0].period, "2024-03-01");
        assert_eq!(fetched.data.extra["interval"], json!("week"));
    }

    #[tokio::test]
    async fn test_non_ok_status_is_an_error() {
        let url = spawn_backend(backend(Captured::default())).await;
        let state = production(url);

        let err = state.reader.users_stats(&authed("")).await.unwrap_err();
        assert!(matches!(
            err,
            crate::StatsError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert_eq!(err.path(), Some(Endpoint::UsersStats.path()));
    }

    #[tokio::test]
    async fn test_rotated_token_cookie_is_forwarded() {
        let url = spawn_backend(backend(Captured::default())).await;
        let state = production(url);

        let fetched = state
            .reader
            .daily_events(&authed("l360_refresh_token=tok-2"), 7)
            .await
            .unwrap();
        let set = fetched.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set.starts_with("l360_access_token=tok-2"));
        assert!(set.contains("Secure"));
    }

    #[tokio::test]
    async fn test_production_without_token_uses_synthetic_data() {
        let state = production("http://127.0.0.1:9".to_string());
        let fetched = state
            .reader
            .daily_events(&HeaderMap::new(), 5)
            .await
            .unwrap();
        assert_eq!(fetched.data.daily_events.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_record_still_sets_session_cookie() {
        let failing = Router::new().route(
            "/api/stats/events/record/",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let url = spawn_backend(failing).await;
        let state = production(url);

        let outcome = state
            .recorder
            .record(&authed(""), NewEvent::new(EventType::View, "home"))
            .await;

        assert!(!outcome.success);
        let set = outcome.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set.starts_with(&format!("l360_stats_sid={};", outcome.session_id)));
    }

    #[tokio::test]
    async fn test_null_and_naive_fields_pass_through() {
        let url = spawn_backend(backend(Captured::default())).await;
        let state = production(url);

        let lotes = state.reader.lotes_stats(&authed("")).await.unwrap();
        assert_eq!(lotes.data.total, Some(4));
        assert!(lotes.data.total_area.is_none());
        let rendered = serde_json::to_value(&lotes.data).unwrap();
        assert_eq!(rendered, json!({"total": 4}));

        let activity = state.reader.user_activity(&authed(""), 30).await.unwrap();
        assert_eq!(
            activity.data.first_activity.as_deref(),
            Some("2024-05-01T08:00:00.123456")
        );
        assert!(activity.data.first_activity_utc().is_some());
        assert!(activity.data.last_activity.is_none());
        assert!(activity.data.recent_events.is_none());
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_admin_page_degrades_with_banner() {
        let url = spawn_backend(backend(Captured::default())).await;
        let app = router(production(url));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard/admin")
                    .header(COOKIE, "l360_access_token=tok-1; l360_stats_sid=sid-7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let set = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
        assert!(set.starts_with("l360_stats_sid=sid-7;"));

        let body = body_json(resp).await;
        assert_eq!(body["error"], json!(STATS_ERROR_BANNER));
        assert_eq!(body["data"]["stats"]["total_lotes"], json!(5));
        assert_eq!(body["data"]["stats"]["region"], json!("Antioquia"));
        assert!(body["data"]["users"]["total"].is_null());
    }

    #[tokio::test]
    async fn test_dev_mode_pages_render_without_backend() {
        let config = StatsConfig::default();
        let app = router(AppState::from_config(&config).unwrap());

        for uri in [
            "/dashboard/admin",
            "/dashboard/owner?days=10",
            "/dashboard/events?days=7&limit=3",
            "/stats/over-time?start_date=2024-01-01&end_date=2024-01-05",
            "/charts",
        ] {
            let resp = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
            let body = body_json(resp).await;
            assert!(body["error"].is_null(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_oversized_windows_are_clamped() {
        let app = router(AppState::from_config(&StatsConfig::default()).unwrap());

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/dashboard/owner?days=100000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert!(body["error"].is_null());
        assert_eq!(body["data"]["dailyEvents"].as_array().map(Vec::len), Some(366));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard/events?limit=4000000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["table"]["events"].as_array().map(Vec::len), Some(500));
    }

    #[tokio::test]
    async fn test_rotated_token_is_set_once_per_page() {
        let app = router(AppState::from_config(&StatsConfig::default()).unwrap());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard/admin")
                    .header(COOKIE, "l360_access_token=a; l360_refresh_token=b")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let set: Vec<_> = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            set.iter().filter(|v| v.starts_with("l360_access_token=")).count(),
            1
        );
        assert_eq!(
            set.iter().filter(|v| v.starts_with("l360_stats_sid=")).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_owner_page_flattens_daily_events() {
        let app = router(AppState::from_config(&StatsConfig::default()).unwrap());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard/owner?days=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.headers().contains_key(SET_COOKIE));
        let body = body_json(resp).await;
        assert_eq!(body["data"]["dailyEvents"].as_array().map(Vec::len), Some(10));
    }

    #[tokio::test]
    async fn test_over_time_route_generates_requested_range() {
        let app = router(AppState::from_config(&StatsConfig::default()).unwrap());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/stats/over-time?start_date=2024-01-01&end_date=2024-01-05")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["results"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn test_post_event_sets_session_cookie() {
        let app = router(AppState::from_config(&StatsConfig::default()).unwrap());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/events")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"search","name":"lotes","value":{"q":"medellin"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let set = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
        let body = body_json(resp).await;
        assert_eq!(body["success"], json!(true));
        let sid = body["session_id"].as_str().unwrap();
        assert!(set.starts_with(&format!("l360_stats_sid={};", sid)));
    }

    #[tokio::test]
    async fn test_post_event_rejects_unknown_type() {
        let app = router(AppState::from_config(&StatsConfig::default()).unwrap());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/events")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"click","name":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }
}
