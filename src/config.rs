use std::time::Duration;

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Files at or below this size are treated as samples or trailers.
pub const DEFAULT_MIN_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// TMDB asks clients to keep well under its request rate limit.
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Settings shared by every component of a run.
///
/// Built once in `main` and passed by reference; nothing reads the
/// environment after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub tmdb_base_url: String,
    pub tmdb_api_key: Option<String>,
    pub tmdb_token: Option<String>,
    pub min_file_size: u64,
    pub request_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_base_url: TMDB_BASE_URL.to_string(),
            tmdb_api_key: None,
            tmdb_token: None,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            request_delay: MIN_REQUEST_DELAY,
        }
    }
}

impl Config {
    /// Read TMDB credentials from `TMDB_API_KEY` and `TMDB_API_TOKEN`.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a local `.env` file.
    pub fn from_env() -> Self {
        Self {
            tmdb_api_key: non_empty_var("TMDB_API_KEY"),
            tmdb_token: non_empty_var("TMDB_API_TOKEN"),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_min_file_size_mb(mut self, megabytes: u64) -> Self {
        self.min_file_size = megabytes.saturating_mul(1024 * 1024);
        self
    }

    /// Delays shorter than [`MIN_REQUEST_DELAY`] are raised to it.
    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay.max(MIN_REQUEST_DELAY);
        self
    }

    pub fn has_tmdb_credentials(&self) -> bool {
        self.tmdb_api_key.is_some() || self.tmdb_token.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
