use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, info};

#[derive(thiserror::Error, Debug)]
pub(crate) enum ConfigError {
    #[error("no {0} configured")]
    Missing(&'static str),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum UpstreamError {
    #[error("pinboard {endpoint} responded {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("pinboard {endpoint} sent malformed JSON: {source}")]
    Json {
        endpoint: &'static str,
        source: serde_json::Error,
    },
    #[error("pinboard {endpoint} rejected the write: {code}")]
    Rejected { endpoint: &'static str, code: String },
    #[error("{count} posts for {url}")]
    Cardinality { url: String, count: usize },
    #[error("pinboard {endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        source: reqwest::Error,
    },
}

/// Error returned from HTTP handlers; the body is always empty.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(&'static str),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(reason) => {
                info!("bad request: {}", reason);
                StatusCode::BAD_REQUEST.into_response()
            }
            ApiError::Internal(err) => {
                error!("{:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;
