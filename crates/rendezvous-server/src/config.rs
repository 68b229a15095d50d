use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors: CorsSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorsSettings {
    pub allow_origins: Vec<String>,
    pub allow_credentials: bool,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

impl Settings {
    /// Read `RENDEZVOUS_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("RENDEZVOUS_PORT", "3000");
        let port: u16 = port
            .parse()
            .with_context(|| format!("RENDEZVOUS_PORT is not a valid port: '{port}'"))?;

        let credentials = var("RENDEZVOUS_CORS_ALLOW_CREDENTIALS", "true");

        Ok(Self {
            host: var("RENDEZVOUS_HOST", "0.0.0.0"),
            port,
            db_path: var("RENDEZVOUS_DB_PATH", "rendezvous.db").into(),
            cors: CorsSettings {
                allow_origins: parse_list(&var("RENDEZVOUS_CORS_ALLOW_ORIGINS", WILDCARD)),
                allow_credentials: parse_bool(&credentials)
                    .context("RENDEZVOUS_CORS_ALLOW_CREDENTIALS")?,
                allow_methods: parse_list(&var("RENDEZVOUS_CORS_ALLOW_METHODS", WILDCARD)),
                allow_headers: parse_list(&var("RENDEZVOUS_CORS_ALLOW_HEADERS", WILDCARD)),
            },
        })
    }
}

impl CorsSettings {
    /// Browsers reject a literal `*` on credentialed requests, so with
    /// credentials on a wildcard mirrors whatever the request asked for.
    pub fn layer(&self) -> Result<CorsLayer> {
        let origin = if is_wildcard(&self.allow_origins) {
            if self.allow_credentials {
                AllowOrigin::mirror_request()
            } else {
                AllowOrigin::any()
            }
        } else {
            let origins = self
                .allow_origins
                .iter()
                .map(|o| HeaderValue::from_str(o).with_context(|| format!("Bad CORS origin '{o}'")))
                .collect::<Result<Vec<_>>>()?;
            AllowOrigin::list(origins)
        };

        let methods = if is_wildcard(&self.allow_methods) {
            if self.allow_credentials {
                AllowMethods::mirror_request()
            } else {
                AllowMethods::any()
            }
        } else {
            let methods = self
                .allow_methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.to_uppercase().as_bytes())
                        .with_context(|| format!("Bad CORS method '{m}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            AllowMethods::list(methods)
        };

        let headers = if is_wildcard(&self.allow_headers) {
            if self.allow_credentials {
                AllowHeaders::mirror_request()
            } else {
                AllowHeaders::any()
            }
        } else {
            let headers = self
                .allow_headers
                .iter()
                .map(|h| HeaderName::from_bytes(h.as_bytes()).with_context(|| format!("Bad CORS header '{h}'")))
                .collect::<Result<Vec<_>>>()?;
            AllowHeaders::list(headers)
        };

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(self.allow_credentials))
    }
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == WILDCARD)
}

/// Comma-separated, whitespace-tolerant, empty entries dropped.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}
