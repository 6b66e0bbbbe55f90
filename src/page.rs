use axum::http::HeaderMap;
use serde::Serialize;
use tracing::warn;

use crate::cookie;
use crate::error::StatsResult;
use crate::readers::Fetched;

pub const STATS_ERROR_BANNER: &str =
    "No se pudieron cargar las estadísticas. Intente de nuevo más tarde.";

/// Data handed to a view, with an optional error banner.
#[derive(Debug, Clone, Serialize)]
pub struct PageData<T> {
    pub data: T,
    pub error: Option<String>,
}

/// Accumulates `Set-Cookie` headers and the banner across several readers.
#[derive(Debug, Default)]
pub struct PageLoad {
    headers: HeaderMap,
    failed: bool,
}

impl PageLoad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(headers: HeaderMap) -> Self {
        Self {
            headers,
            failed: false,
        }
    }

    /// Take a reader result, falling back to `T::default()` on error.
    pub fn settle<T: Default>(&mut self, result: StatsResult<Fetched<T>>) -> T {
        match result {
            Ok(fetched) => {
                cookie::merge_set_cookies(&mut self.headers, &fetched.headers);
                fetched.data
            }
            Err(e) => {
                warn!(error = %e, path = e.path().unwrap_or("-"), "stats reader failed");
                self.failed = true;
                T::default()
            }
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn finish<T>(self, data: T) -> (HeaderMap, PageData<T>) {
        let error = self.failed.then(|| STATS_ERROR_BANNER.to_string());
        (self.headers, PageData { data, error })
    }
}
