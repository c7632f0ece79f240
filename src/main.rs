mod auth;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod search;
mod state;
mod upstream;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config};
use crate::models::exclusions::PgExclusions;
use crate::search::paginate::Paginator;
use crate::search::{JobSearch, SearchQuery};
use crate::state::AppState;
use crate::upstream::jsearch::JSearch;

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(pool: PgPool) -> impl IntoResponse {
    let result: Result<(i32,), _> = sqlx::query_as("SELECT 1").fetch_one(&pool).await;
    match result {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready"),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobhunt=info,tower_http=info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_search(config: &Config, pool: &PgPool) -> anyhow::Result<JobSearch> {
    let source = JSearch::new(
        &config.jsearch_base_url,
        &config.jsearch_host,
        &config.rapidapi_key,
        config.upstream_timeout(),
    )?;
    let paginator = Paginator::new(Arc::new(source), config.max_pages, config.upstream_timeout());
    let cache = search::cache::connect(
        config.redis_url.as_deref(),
        config.cache_ttl(),
        config.cache_timeout(),
    )
    .await;
    Ok(JobSearch::new(
        paginator,
        cache,
        Arc::new(PgExclusions::new(pool.clone())),
    ))
}

async fn serve(config: Config, pool: PgPool, listen_addr: &str) -> anyhow::Result<()> {
    let search = build_search(&config, &pool).await?;
    let state = AppState {
        pool: pool.clone(),
        search: Arc::new(search),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(move || readyz(pool.clone())))
        .merge(routes::api::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(config.log_json);

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
        tracing::info!("Migrations complete");
    }

    match config.resolved_command() {
        Command::Serve { listen_addr } => serve(config, pool, &listen_addr).await,
        Command::Search {
            query,
            location,
            max_jobs,
            date_posted,
            force_refresh,
        } => {
            let search = build_search(&config, &pool).await?;
            let query = SearchQuery {
                location,
                date_posted,
                force_refresh,
                ..SearchQuery::new(query, config.job_count(max_jobs))
            };
            let outcome = search.search(&query, None).await?;
            tracing::info!("{}", outcome.message);
            println!("{}", serde_json::to_string_pretty(&outcome.listings)?);
            Ok(())
        }
        Command::IssueToken { user_id, name } => {
            let token = auth::issue_token(&pool, user_id, &name).await?;
            println!("{token}");
            Ok(())
        }
    }
}
