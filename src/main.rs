use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

mod actions;
mod cache;
mod config;
mod error;
mod filters;
mod pinboard;
mod post;
mod render;
mod server;
mod sync;


use crate::cache::Cache;
use crate::config::{load_config, Args};
use crate::pinboard::{Bookmarks, PinboardClient};
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    fs::create_dir_all(&config.directory)
        .with_context(|| format!("create directory {}", config.directory.display()))?;
    info!(
        "caching into {} every {}s",
        config.directory.display(),
        config.sync_interval.as_secs()
    );

    let upstream: Arc<dyn Bookmarks> =
        Arc::new(PinboardClient::new(&config.api_base, &config.token)?);
    let cache = Arc::new(Cache::new(config.posts_path(), config.marker_path()));
    let config = Arc::new(config);

    sync::start_sync_loop(upstream.clone(), cache.clone(), config.sync_interval);

    server::serve(AppState {
        config,
        upstream,
        cache,
    })
    .await
}
