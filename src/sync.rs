use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{error, info};
use tokio::time::MissedTickBehavior;

use crate::cache::Cache;
use crate::pinboard::Bookmarks;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SyncOutcome {
    Unchanged,
    Refreshed { update_time: String, bytes: u64 },
}

/// One compare-and-refresh cycle. The marker is only written once the
/// snapshot has been persisted, so a failed download leaves both untouched.
pub(crate) async fn sync_once(upstream: &dyn Bookmarks, cache: &Cache) -> Result<SyncOutcome> {
    let (disk, api) = tokio::try_join!(cache.read_marker(), upstream.update_time())?;
    info!("disk: {:?}, api: {}", disk, api);
    if disk.as_deref() == Some(api.as_str()) {
        return Ok(SyncOutcome::Unchanged);
    }

    info!("fetching posts");
    let body = upstream.all_posts().await?;
    info!("writing to {}", cache.posts_path().display());
    let bytes = cache.write_snapshot(body).await?;
    info!("wrote {} bytes", bytes);
    cache.write_marker(&api).await?;

    Ok(SyncOutcome::Refreshed {
        update_time: api,
        bytes,
    })
}

pub(crate) fn start_sync_loop(upstream: Arc<dyn Bookmarks>, cache: Arc<Cache>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(err) = sync_once(upstream.as_ref(), &cache).await {
                error!("sync failed: {:#}", err);
            }
        }
    });
}
