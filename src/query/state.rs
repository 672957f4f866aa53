use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::app::ApiError;

/// Type-erased cached value shared by every subscriber of a key.
pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Entry contents as broadcast to subscribers.
#[derive(Clone)]
pub(crate) struct RawState {
    pub status: QueryStatus,
    pub data: Option<AnyValue>,
    pub error: Option<ApiError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl RawState {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
        }
    }

    pub fn typed<T: Send + Sync + 'static>(&self, key: &impl fmt::Display) -> QueryState<T> {
        let data = match self.data.clone().map(|d| d.downcast::<T>()) {
            None => None,
            Some(Ok(data)) => Some(data),
            Some(Err(_)) => {
                return QueryState {
                    status: QueryStatus::Error,
                    data: None,
                    error: Some(ApiError::TypeMismatch(key.to_string())),
                    fetched_at: self.fetched_at,
                }
            }
        };

        QueryState {
            status: self.status,
            data,
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

/// Snapshot of a query as seen by one subscriber.
///
/// `data` keeps the last successful value through later loading and error
/// transitions, so stale data stays displayable.
#[derive(Debug)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<ApiError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    /// Fetching with nothing cached to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_none()
    }

    /// Any fetch in progress, including background refreshes.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}
