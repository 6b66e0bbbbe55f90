use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::Map;
use tracing::{info, warn};

use crate::auth::AuthResolver;
use crate::client::BackendClient;
use crate::cookie;
use crate::mock::Fallback;
use crate::models::{NewEvent, OutboundEvent};
use crate::readers::Endpoint;
use crate::session::SessionId;

#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub success: bool,
    pub session_id: String,
    /// Session `Set-Cookie` plus anything the auth layer forwarded.
    pub headers: HeaderMap,
}

/// Sends each event at most once. Failures are logged and reported through
/// [`RecordOutcome::success`], never as an error.
#[derive(Clone)]
pub struct EventRecorder {
    client: BackendClient,
    auth: Arc<dyn AuthResolver>,
    fallback: Fallback,
    secure_cookies: bool,
}

impl EventRecorder {
    pub fn new(
        client: BackendClient,
        auth: Arc<dyn AuthResolver>,
        fallback: Fallback,
        secure_cookies: bool,
    ) -> Self {
        Self {
            client,
            auth,
            fallback,
            secure_cookies,
        }
    }

    pub async fn record(&self, request: &HeaderMap, event: NewEvent) -> RecordOutcome {
        let session = SessionId::resolve(request);
        let auth = self.auth.resolve(request);

        let mut headers = HeaderMap::new();
        cookie::append_set_cookie(&mut headers, &session.cookie(self.secure_cookies));
        cookie::merge_set_cookies(&mut headers, &auth.set_cookies);

        if self.fallback.is_offline() {
            info!(
                session_id = %session,
                event_type = %event.event_type,
                name = %event.name,
                value = ?event.value,
                "stats event (offline)"
            );
            return RecordOutcome {
                success: true,
                session_id: session.to_string(),
                headers,
            };
        }

        let empty = Map::new();
        let body = OutboundEvent {
            session_id: session.as_str(),
            event_type: event.event_type,
            name: &event.name,
            value: event.value.as_ref().unwrap_or(&empty),
        };

        let success = match self
            .client
            .post_json(Endpoint::RecordEvent.path(), &body, auth.token.as_deref())
            .await
        {
            Ok(status) if status.is_success() => true,
            Ok(status) => {
                warn!(%status, name = %event.name, "stats backend rejected event");
                false
            }
            Err(e) => {
                warn!(error = %e, name = %event.name, "failed to record stats event");
                false
            }
        };

        RecordOutcome {
            success,
            session_id: session.to_string(),
            headers,
        }
    }
}
