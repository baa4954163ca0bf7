use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::UpstreamError;
use crate::post::Post;

pub(crate) type ByteStream = BoxStream<'static, Result<Bytes>>;

/// The bookmarking service the proxy mirrors and writes back to.
#[async_trait]
pub(crate) trait Bookmarks: Send + Sync {
    /// Opaque timestamp of the last change to the account.
    async fn update_time(&self) -> Result<String>;

    /// Raw JSON array of every post, in the exact form stored on disk.
    async fn all_posts(&self) -> Result<ByteStream>;

    /// Every post upstream holds for `url`.
    async fn posts_for(&self, url: &str) -> Result<Vec<Post>>;

    /// Upsert keyed by `href`; every field is resent.
    async fn overwrite_post(&self, post: &Post) -> Result<()>;

    async fn delete_post(&self, url: &str) -> Result<()>;

    /// The single canonical post for `url`. Any other count is an integrity error.
    async fn get_post(&self, url: &str) -> Result<Post> {
        let mut posts = self.posts_for(url).await?;
        if posts.len() != 1 {
            return Err(UpstreamError::Cardinality {
                url: url.to_string(),
                count: posts.len(),
            }
            .into());
        }
        Ok(posts.remove(0))
    }
}

#[derive(Deserialize)]
struct UpdateResponse {
    update_time: String,
}

#[derive(Deserialize)]
struct GetResponse {
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct WriteResponse {
    #[serde(default)]
    result_code: Option<String>,
}

pub(crate) struct PinboardClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl PinboardClient {
    pub(crate) fn new(api_base: &str, token: &str) -> Result<Self> {
        let base = Url::parse(api_base).with_context(|| format!("parse api base {}", api_base))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(PinboardClient {
            http,
            base,
            token: token.to_string(),
        })
    }

    async fn call(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let url = self
            .base
            .join(endpoint)
            .with_context(|| format!("build url for {}", endpoint))?;
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .query(&[("format", "json"), ("auth_token", self.token.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { endpoint, source })?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpstreamError::Status { endpoint, status }.into());
        }
        Ok(response)
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let body = self
            .call(endpoint, params)
            .await?
            .bytes()
            .await
            .map_err(|source| UpstreamError::Transport { endpoint, source })?;
        let parsed = serde_json::from_slice(&body)
            .map_err(|source| UpstreamError::Json { endpoint, source })?;
        Ok(parsed)
    }

    async fn call_write(&self, endpoint: &'static str, params: &[(&str, &str)]) -> Result<()> {
        let response: WriteResponse = self.call_json(endpoint, params).await?;
        match response.result_code {
            Some(code) if code != "done" => Err(UpstreamError::Rejected { endpoint, code }.into()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Bookmarks for PinboardClient {
    async fn update_time(&self) -> Result<String> {
        let response: UpdateResponse = self.call_json("posts/update", &[]).await?;
        Ok(response.update_time.trim().to_string())
    }

    async fn all_posts(&self) -> Result<ByteStream> {
        let response = self.call("posts/all", &[]).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|source| {
                    anyhow::Error::from(UpstreamError::Transport {
                        endpoint: "posts/all",
                        source,
                    })
                })
            })
            .boxed();
        Ok(stream)
    }

    async fn posts_for(&self, url: &str) -> Result<Vec<Post>> {
        let response: GetResponse = self.call_json("posts/get", &[("url", url)]).await?;
        Ok(response.posts)
    }

    async fn overwrite_post(&self, post: &Post) -> Result<()> {
        let tags = post.tags.joined();
        let params = [
            ("url", post.href.as_str()),
            ("description", post.description.as_str()),
            ("extended", post.extended.as_str()),
            ("tags", tags.as_str()),
            ("dt", post.time.as_str()),
            ("shared", post.shared.as_str()),
            ("toread", post.toread.as_str()),
        ];
        self.call_write("posts/add", &params).await?;
        info!("overwrote {}", post.href);
        Ok(())
    }

    async fn delete_post(&self, url: &str) -> Result<()> {
        self.call_write("posts/delete", &[("url", url)]).await?;
        info!("deleted {}", url);
        Ok(())
    }
}
