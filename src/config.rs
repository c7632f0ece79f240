use std::time::Duration;

use clap::Parser;

use crate::search::DatePosted;
use crate::upstream::jsearch;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobhunt", about = "Job search and application tracking backend")]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    /// Redis URL for the search cache; in-process cache when unset or unreachable
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// RapidAPI key for JSearch
    #[arg(long, env = "RAPIDAPI_KEY", hide_env_values = true)]
    pub rapidapi_key: String,

    #[arg(long, env = "JSEARCH_BASE_URL", default_value = jsearch::DEFAULT_BASE_URL)]
    pub jsearch_base_url: String,

    #[arg(long, env = "JSEARCH_HOST", default_value = jsearch::DEFAULT_HOST)]
    pub jsearch_host: String,

    /// Search cache time-to-live in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "7200")]
    pub cache_ttl_secs: u64,

    /// Per-operation timeout for the Redis cache, in milliseconds
    #[arg(long, env = "CACHE_TIMEOUT_MS", default_value = "500")]
    pub cache_timeout_ms: u64,

    /// Upper bound on provider pages fetched per search
    #[arg(
        long,
        env = "MAX_PAGES",
        default_value = "3",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_pages: u32,

    /// Jobs returned when a request does not ask for a count
    #[arg(long, env = "DEFAULT_JOB_COUNT", default_value = "100")]
    pub default_job_count: usize,

    /// Largest job count a request may ask for
    #[arg(long, env = "MAX_JOB_COUNT", default_value = "100")]
    pub max_job_count: usize,

    /// Per-page upstream request timeout in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "15")]
    pub upstream_timeout_secs: u64,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web server (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Run a single search and print the results as JSON
    Search {
        #[arg(long)]
        query: String,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long)]
        max_jobs: Option<usize>,

        #[arg(long, value_enum, default_value_t = DatePosted::All)]
        date_posted: DatePosted,

        #[arg(long)]
        force_refresh: bool,
    },
    /// Create an API token for a user and print it
    IssueToken {
        #[arg(long)]
        user_id: i32,

        /// Label for the token
        #[arg(long, default_value = "cli")]
        name: String,
    },
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Requested job count, defaulted and clamped to `1..=max_job_count`.
    pub fn job_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_job_count)
            .clamp(1, self.max_job_count.max(1))
    }
}
