use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Key names used in both storage scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct StorageKeys {
    pub token: String,
    pub user: String,
    pub refresh_token: String,
    /// Only ever written to the durable scope.
    pub remember_me: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            token: "auth_token".into(),
            user: "user_data".into(),
            refresh_token: "refresh_token".into(),
            remember_me: "remember_me".into(),
        }
    }
}

/// Client configuration.
///
/// Use [`from_env()`](ClientConfig::from_env) for convention-based setup,
/// or [`new()`](ClientConfig::new) with `with_*` methods for full control.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) api_url: Url,
    pub(crate) storage_keys: StorageKeys,
    pub(crate) refresh_lead: Duration,
    pub(crate) filter_debounce: Duration,
    pub(crate) page_size: usize,
    pub(crate) login_path: String,
    pub(crate) landing_path: String,
}

impl ClientConfig {
    /// Create a configuration pointing at `api_url`; everything else uses defaults.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            storage_keys: StorageKeys::default(),
            refresh_lead: Duration::from_secs(5 * 60),
            filter_debounce: Duration::from_millis(300),
            page_size: 10,
            login_path: "/login".into(),
            landing_path: "/dashboard".into(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Optional env vars
    /// - `FINPORTAL_API_URL`: API base URL (default `http://localhost:3000`)
    /// - `FINPORTAL_REFRESH_LEAD_SECS`: refresh this long before expiry (default 300)
    /// - `FINPORTAL_FILTER_DEBOUNCE_MS`: filter quiescence window (default 300)
    /// - `FINPORTAL_PAGE_SIZE`: catalog page size (default 10)
    /// - `FINPORTAL_LOGIN_PATH`: login destination (default `/login`)
    /// - `FINPORTAL_LANDING_PATH`: default landing destination (default `/dashboard`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        let api_url: Url = std::env::var("FINPORTAL_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.into())
            .parse()
            .map_err(|e| Error::Config(format!("FINPORTAL_API_URL: {e}")))?;

        let mut config = Self::new(api_url);

        if let Some(secs) = env_number::<u64>("FINPORTAL_REFRESH_LEAD_SECS")? {
            config = config.with_refresh_lead(Duration::from_secs(secs));
        }
        if let Some(ms) = env_number::<u64>("FINPORTAL_FILTER_DEBOUNCE_MS")? {
            config = config.with_filter_debounce(Duration::from_millis(ms));
        }
        if let Some(size) = env_number::<usize>("FINPORTAL_PAGE_SIZE")? {
            if size == 0 {
                return Err(Error::Config("FINPORTAL_PAGE_SIZE must be positive".into()));
            }
            config = config.with_page_size(size);
        }
        if let Ok(path) = std::env::var("FINPORTAL_LOGIN_PATH") {
            config = config.with_login_path(path);
        }
        if let Ok(path) = std::env::var("FINPORTAL_LANDING_PATH") {
            config = config.with_landing_path(path);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_storage_keys(mut self, keys: StorageKeys) -> Self {
        self.storage_keys = keys;
        self
    }

    #[must_use]
    pub fn with_refresh_lead(mut self, lead: Duration) -> Self {
        self.refresh_lead = lead;
        self
    }

    #[must_use]
    pub fn with_filter_debounce(mut self, window: Duration) -> Self {
        self.filter_debounce = window;
        self
    }

    /// Zero is ignored; a page always holds at least one item.
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// API base URL.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    #[must_use]
    pub fn storage_keys(&self) -> &StorageKeys {
        &self.storage_keys
    }

    /// How long before expiry the session is refreshed.
    #[must_use]
    pub fn refresh_lead(&self) -> Duration {
        self.refresh_lead
    }

    #[must_use]
    pub fn filter_debounce(&self) -> Duration {
        self.filter_debounce
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// Joins an API path (`/auth/login`) onto the base URL, keeping any base path prefix.
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        // A constant absolute http URL; parsing it cannot fail.
        let url = Url::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL is a valid URL");
        Self::new(url)
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}
