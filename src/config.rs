use std::time::Duration;
use url::Url;

/// Where the backend lives and how patient we are with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: Url,
    /// Applied to every request; there are no retries.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Config {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8080";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Config {
            base_url: Url::parse(base_url)?,
            ..Config::default()
        })
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Config { timeout, ..self }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: Url::parse(Config::DEFAULT_BASE_URL)
                .expect("The default base URL is always valid"),
            timeout: Config::DEFAULT_TIMEOUT,
            user_agent: String::from(crate::DEFAULT_USER_AGENT),
        }
    }
}
