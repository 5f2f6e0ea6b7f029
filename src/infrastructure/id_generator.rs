// Identifier Service - remote generation and local resolution of prefix-typed IDs
//
// Generation is delegated to the generator service, which owns suffix uniqueness.
// Resolution is a pure string transform onto the CDN layout `<base>/<prefix>/<id>`,
// so any layer holding an identifier can locate the asset without a lookup.

use axum::{extract::Query, routing::get, Router};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::core::{IdPrefix, Identifier};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct IdService {
    /// CDN base, validated once at construction
    cdn_url: Url,
    /// Fully built `/generate` endpoint of the generator service
    generate_url: Url,
    client: reqwest::Client,
}

/// Make sure a base URL ends in `/` so relative joins append rather than replace.
fn as_base(raw: &str, what: &str) -> AppResult<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| AppError::ConfigurationError(format!("invalid {} '{}': {}", what, raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(AppError::ConfigurationError(format!(
            "{} '{}' cannot be used as a base URL",
            what, raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl IdService {
    pub fn new(cdn_uri: &str, generator_uri: &str, timeout: Duration) -> AppResult<Self> {
        let cdn_url = as_base(cdn_uri, "CDN URI")?;
        let generate_url = as_base(generator_uri, "identifier generator URI")?
            .join("generate")
            .map_err(|e| AppError::ConfigurationError(format!("bad generator endpoint: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigurationError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            cdn_url,
            generate_url,
            client,
        })
    }

    /// Request a fresh identifier for `prefix` from the generator service.
    ///
    /// Nothing is reserved locally, so a dropped or failed call leaves no trace.
    #[instrument(skip(self), fields(prefix = %prefix))]
    pub async fn generate(&self, prefix: IdPrefix) -> AppResult<Identifier> {
        let mut url = self.generate_url.clone();
        url.query_pairs_mut().append_pair("prefix", prefix.as_str());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!("identifier generator request failed: {}", e);
                AppError::GenerationUnavailable(format!("generator request failed: {}", e))
            })?;

        let body = response.text().await.map_err(|e| {
            AppError::GenerationUnavailable(format!("unreadable generator response: {}", e))
        })?;

        let id = Identifier::parse(body.trim())
            .ok()
            .filter(|id| id.prefix() == prefix)
            .ok_or_else(|| {
                AppError::GenerationUnavailable(format!(
                    "generator returned malformed {} identifier {:?}",
                    prefix, body
                ))
            })?;

        debug!(id = %id, "generated identifier");
        Ok(id)
    }

    /// Map an identifier string to its CDN location. No I/O.
    pub fn resolve(&self, id: &str) -> AppResult<Url> {
        Ok(self.locate(&Identifier::parse(id)?))
    }

    /// Map an already-parsed identifier to its CDN location.
    pub fn locate(&self, id: &Identifier) -> Url {
        let mut url = self.cdn_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(id.prefix().as_str())
                .push(id.as_str());
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct GenerateParams {
    prefix: String,
}

async fn generate_locally(Query(params): Query<GenerateParams>) -> AppResult<String> {
    let prefix: IdPrefix = params.prefix.parse()?;
    Ok(format!("{}-{}", prefix, Uuid::new_v4().simple()))
}

/// Development stand-in for the generator service: `GET /generate?prefix=`.
pub fn local_generator_router() -> Router {
    Router::new().route("/generate", get(generate_locally))
}
