use crate::model::SourceDescriptor;
use std::env;
use std::path::PathBuf;

/// Preset for how the validation gates compose into one acceptance decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyPreset {
    /// Keyword/feature, sentiment and feedback gates must all pass.
    Strict,
    /// Only the keyword/feature gate applies.
    Lenient,
    /// Use the individual `ACCEPT_REQUIRE_*` environment variables.
    Custom,
}

impl PolicyPreset {
    pub fn from_env() -> Self {
        match env::var("TOOLSCOUT_POLICY")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "strict" | "all" => Self::Strict,
            "lenient" | "keywords-only" => Self::Lenient,
            _ => Self::Custom,
        }
    }
}

/// Which gates beyond keyword/feature matching a tool must pass.
///
/// The keyword/feature gate always applies. A tool whose feedback is absent
/// or fails the quality thresholds is rejected only when `require_feedback`
/// is set; otherwise it is accepted without feedback signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptancePolicy {
    pub require_sentiment: bool,
    pub require_feedback: bool,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            require_sentiment: true,
            require_feedback: false,
        }
    }
}

impl AcceptancePolicy {
    pub fn keywords_only() -> Self {
        Self {
            require_sentiment: false,
            require_feedback: false,
        }
    }

    pub fn strict() -> Self {
        Self {
            require_sentiment: true,
            require_feedback: true,
        }
    }

    fn from_env() -> anyhow::Result<Self> {
        Ok(match PolicyPreset::from_env() {
            PolicyPreset::Strict => Self::strict(),
            PolicyPreset::Lenient => Self::keywords_only(),
            PolicyPreset::Custom => Self {
                require_sentiment: parse_bool("ACCEPT_REQUIRE_SENTIMENT", true)?,
                require_feedback: parse_bool("ACCEPT_REQUIRE_FEEDBACK", false)?,
            },
        })
    }
}

/// Ranking knobs shared by the recommender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    /// Score assumed for tools without feedback, for ranking and reports.
    pub missing_score: f64,
    pub default_top_n: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            missing_score: 2.5,
            default_top_n: 5,
        }
    }
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Sources used by `/pipeline/run` when the request names none.
    pub sources: Vec<SourceDescriptor>,
    /// WebDriver endpoint for dynamic sources.
    pub webdriver_url: Option<String>,
    /// Sentiment service endpoint. Required when sentiment gating is on.
    pub sentiment_url: Option<String>,
    /// Optional JSON file of feedback records.
    pub feedback_path: Option<PathBuf>,
    pub policy: AcceptancePolicy,
    pub ranking: RankingConfig,
    /// Fan-out width for per-source fetches and per-tool validation.
    pub max_concurrency: usize,
    pub fetch_timeout_secs: u64,
    /// Maximum tools accepted in one request body.
    pub max_pool_size: usize,
    /// Maximum sources accepted by one `/pipeline/run` request.
    pub max_sources: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 30,
            sources: Vec::new(),
            webdriver_url: None,
            sentiment_url: None,
            feedback_path: None,
            policy: AcceptancePolicy::default(),
            ranking: RankingConfig::default(),
            max_concurrency: 8,
            fetch_timeout_secs: 10,
            max_pool_size: 10_000,
            max_sources: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// `TOOLSCOUT_POLICY` selects a gate preset:
    /// - `strict`: keyword/feature, sentiment and feedback gates
    /// - `lenient`: keyword/feature gate only
    /// - Unset or other: `ACCEPT_REQUIRE_SENTIMENT` (default true) and
    ///   `ACCEPT_REQUIRE_FEEDBACK` (default false)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            sources: env::var("SOURCES")
                .map(|s| parse_sources(&s))
                .unwrap_or_default(),
            webdriver_url: env::var("WEBDRIVER_URL").ok(),
            sentiment_url: env::var("SENTIMENT_URL").ok(),
            feedback_path: env::var("FEEDBACK_PATH").ok().map(PathBuf::from),
            policy: AcceptancePolicy::from_env()?,
            ranking: RankingConfig {
                missing_score: env::var("MISSING_SCORE_DEFAULT")
                    .unwrap_or_else(|_| "2.5".to_string())
                    .parse()?,
                default_top_n: env::var("TOP_N")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            },
            max_concurrency: env::var("MAX_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()?,
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            max_pool_size: env::var("MAX_POOL_SIZE")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()?,
            max_sources: env::var("MAX_SOURCES")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
        };

        config.check()?;
        Ok(config)
    }

    /// Reject combinations the service cannot honor.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.policy.require_sentiment && self.sentiment_url.is_none() {
            anyhow::bail!(
                "SENTIMENT_URL must be set when sentiment gating is enabled \
                 (set ACCEPT_REQUIRE_SENTIMENT=false or TOOLSCOUT_POLICY=lenient to disable)"
            );
        }
        if !(0.0..=5.0).contains(&self.ranking.missing_score) {
            anyhow::bail!(
                "MISSING_SCORE_DEFAULT must lie within 0.0..=5.0, got {}",
                self.ranking.missing_score
            );
        }
        if self.max_concurrency == 0 {
            anyhow::bail!("MAX_CONCURRENCY must be at least 1");
        }
        Ok(())
    }
}

/// Split a comma separated source list, ignoring blank entries.
pub fn parse_sources(raw: &str) -> Vec<SourceDescriptor> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(SourceDescriptor::parse)
        .collect()
}

fn parse_bool(var: &str, default: bool) -> anyhow::Result<bool> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{} must be a boolean, got '{}'", var, other),
        },
    }
}
