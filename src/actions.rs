use anyhow::{Context, Result};
use log::info;

use crate::pinboard::Bookmarks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Read,
    Delete,
}

impl Action {
    /// A missing `action` parameter means "read", which is all older clients send.
    pub(crate) fn parse(raw: Option<&str>) -> Option<Action> {
        match raw {
            None | Some("read") => Some(Action::Read),
            Some("delete") => Some(Action::Delete),
            Some(_) => None,
        }
    }
}

pub(crate) async fn perform(upstream: &dyn Bookmarks, action: Action, url: &str) -> Result<()> {
    match action {
        Action::Read => mark_read(upstream, url).await,
        Action::Delete => delete(upstream, url).await,
    }
}

/// Re-reads the post from upstream rather than the cache, which may be stale,
/// and writes it back with `toread` cleared.
pub(crate) async fn mark_read(upstream: &dyn Bookmarks, url: &str) -> Result<()> {
    info!("marking read: {}", url);
    let current = upstream
        .get_post(url)
        .await
        .with_context(|| format!("fetch {}", url))?;
    upstream
        .overwrite_post(&current.marked_read())
        .await
        .with_context(|| format!("overwrite {}", url))
}

pub(crate) async fn delete(upstream: &dyn Bookmarks, url: &str) -> Result<()> {
    info!("deleting: {}", url);
    upstream
        .delete_post(url)
        .await
        .with_context(|| format!("delete {}", url))
}
