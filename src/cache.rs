use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::pinboard::ByteStream;
use crate::post::Post;

/// On-disk copy of the last full download plus the update marker that goes with it.
#[derive(Debug, Clone)]
pub(crate) struct Cache {
    posts_path: PathBuf,
    marker_path: PathBuf,
}

impl Cache {
    pub(crate) fn new(posts_path: PathBuf, marker_path: PathBuf) -> Self {
        Cache {
            posts_path,
            marker_path,
        }
    }

    pub(crate) fn posts_path(&self) -> &Path {
        &self.posts_path
    }

    pub(crate) async fn read_posts(&self) -> Result<Vec<Post>> {
        let json = tokio::fs::read(&self.posts_path)
            .await
            .with_context(|| format!("read {}", self.posts_path.display()))?;
        serde_json::from_slice(&json)
            .with_context(|| format!("parse {}", self.posts_path.display()))
    }

    /// `None` when no sync has completed yet.
    pub(crate) async fn read_marker(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.marker_path).await {
            Ok(date) => Ok(Some(date.trim().to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("read {}", self.marker_path.display()))
            }
        }
    }

    pub(crate) async fn write_marker(&self, date: &str) -> Result<()> {
        let path = self.marker_path.clone();
        let data = date.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || atomic_write(&path, &data))
            .await
            .context("marker write task failed")?
    }

    /// Streams the body into a sibling temp file and renames it over the snapshot.
    /// The old snapshot stays in place if the stream or any write fails.
    pub(crate) async fn write_snapshot(&self, mut body: ByteStream) -> Result<u64> {
        let dir = parent_dir(&self.posts_path)?.to_path_buf();
        let (tmp, std_file) = tokio::task::spawn_blocking(move || -> Result<_> {
            fs::create_dir_all(&dir).with_context(|| format!("create dir {}", dir.display()))?;
            let tmp = tempfile::NamedTempFile::new_in(&dir)
                .with_context(|| format!("create temp file in {}", dir.display()))?;
            let file = tmp.reopen().context("reopen temp file")?;
            Ok((tmp, file))
        })
        .await
        .context("temp file task failed")??;
        let mut file = tokio::fs::File::from_std(std_file);

        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("download posts")?;
            file.write_all(&chunk).await.context("write temp file")?;
            written += chunk.len() as u64;
        }
        file.flush().await.context("flush temp file")?;
        file.sync_all().await.context("sync temp file")?;
        drop(file);

        let target = self.posts_path.clone();
        tokio::task::spawn_blocking(move || {
            tmp.persist(&target)
                .map(drop)
                .map_err(|e| anyhow!("persist {}: {}", target.display(), e.error))
        })
        .await
        .context("persist task failed")??;
        Ok(written)
    }
}

fn parent_dir(path: &Path) -> Result<&Path> {
    path.parent()
        .ok_or_else(|| anyhow!("no parent dir for {}", path.display()))
}

pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = parent_dir(path)?;
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("write temp file")?;
    tmp.flush().context("flush temp file")?;
    tmp.as_file_mut().sync_all().context("sync temp file")?;
    tmp.persist(path)
        .map_err(|e| anyhow!("persist temp file: {}", e))?;
    Ok(())
}
