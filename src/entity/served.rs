use serde::{Deserialize, Serialize};

/// Where a served value came from.
///
/// Variants are ordered from best to worst so that combining several
/// results can keep the weakest one with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Stored data that was still within the freshness threshold
    Store,
    /// Freshly fetched from the provider
    Upstream,
    /// Stored data returned because the provider could not be reached
    StaleFallback,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Store => write!(f, "store"),
            DataSource::Upstream => write!(f, "upstream"),
            DataSource::StaleFallback => write!(f, "stale_fallback"),
        }
    }
}

/// A value together with the freshness of its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Served<T> {
    pub fn store(data: T) -> Self {
        Self {
            data,
            source: DataSource::Store,
        }
    }

    pub fn upstream(data: T) -> Self {
        Self {
            data,
            source: DataSource::Upstream,
        }
    }

    pub fn stale(data: T) -> Self {
        Self {
            data,
            source: DataSource::StaleFallback,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.source == DataSource::StaleFallback
    }
}
