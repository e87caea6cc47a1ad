use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BOOKS_API_URL: &str = "https://www.googleapis.com/books/v1/volumes";
pub const DEFAULT_CLIENT_API_URL: &str = "http://localhost:5000/api";

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env()
});

/// How a recommendation category is turned into a provider query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationQueryStyle {
    /// `subject:<category>`
    Subject,
    /// The category term as-is.
    Raw,
}

impl RecommendationQueryStyle {
    pub fn query_for(&self, category: &str) -> String {
        match self {
            RecommendationQueryStyle::Subject => format!("subject:{category}"),
            RecommendationQueryStyle::Raw => category.to_string(),
        }
    }
}

impl FromStr for RecommendationQueryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subject" => Ok(RecommendationQueryStyle::Subject),
            "raw" => Ok(RecommendationQueryStyle::Raw),
            other => Err(format!("unknown recommendation query style: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub books_api_key: Option<String>,
    pub books_api_url: String,
    pub port: u16,
    pub serve_static: bool,
    pub static_dir: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,
    pub popular_latency_budget: Duration,
    pub recommendation_query_style: RecommendationQueryStyle,
    pub client_api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            books_api_key: None,
            books_api_url: DEFAULT_BOOKS_API_URL.to_string(),
            port: 5000,
            serve_static: false,
            static_dir: "client/build".to_string(),
            rate_limit_window: Duration::from_secs(15 * 60),
            rate_limit_max_requests: 100,
            popular_latency_budget: Duration::from_secs(25),
            recommendation_query_style: RecommendationQueryStyle::Subject,
            client_api_url: DEFAULT_CLIENT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Config {
        let defaults = Config::default();
        let environment = get_env_opt("APP_ENV").or_else(|| get_env_opt("NODE_ENV"));

        Config {
            books_api_key: get_env_opt("GOOGLE_BOOKS_API_KEY"),
            books_api_url: get_env_or_default("GOOGLE_BOOKS_API_URL", DEFAULT_BOOKS_API_URL),
            port: get_env_parsed("PORT", defaults.port),
            serve_static: environment.as_deref() == Some("production"),
            static_dir: get_env_or_default("STATIC_DIR", &defaults.static_dir),
            rate_limit_window: Duration::from_secs(get_env_parsed(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window.as_secs(),
            )),
            rate_limit_max_requests: get_env_parsed(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            ),
            popular_latency_budget: Duration::from_secs(get_env_parsed(
                "POPULAR_LATENCY_BUDGET_SECS",
                defaults.popular_latency_budget.as_secs(),
            )),
            recommendation_query_style: get_env_parsed(
                "RECOMMENDATION_QUERY_STYLE",
                defaults.recommendation_query_style,
            ),
            client_api_url: get_env_or_default("READNEXT_API_URL", DEFAULT_CLIENT_API_URL),
        }
    }
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_env_opt(key).unwrap_or_else(|| default.to_string())
}

fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match get_env_opt(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid value for {key}: {raw:?}");
            default
        }),
        None => default,
    }
}
