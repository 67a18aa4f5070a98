//! Proxy configuration: store names, manifest, pattern groups and limits.
//!
//! Loaded from YAML or JSON, then adjusted by environment overrides:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `CACHE_PROXY_CONFIG` | path read by [`ProxyConfig::from_env`] |
//! | `CACHE_PROXY_GENERATION` | `generation_id` |
//! | `CACHE_PROXY_HTTP_TIMEOUT_SECS` | `http.timeout_secs` |
//! | `CACHE_PROXY_PROXY_URL` | `http.proxy_url` |

use crate::cache::StoreLimits;
use crate::fallback::OfflineDocument;
use crate::lifecycle::Generation;
use crate::routing::{RoutesConfig, StrategyClassifier};
use crate::transport::HttpConfig;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use url::Url;

pub const CONFIG_PATH_ENV: &str = "CACHE_PROXY_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub generation_id: String,
    pub static_store: String,
    pub dynamic_store: String,
    /// Base for relative manifest entries.
    pub origin: Option<String>,
    /// Static asset manifest, pre-cached on install.
    pub precache: Vec<String>,
    pub routes: RoutesConfig,
    pub offline: OfflineDocument,
    pub limits: StoreLimits,
    pub http: HttpConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            generation_id: "v1".to_string(),
            static_store: "static-v1".to_string(),
            dynamic_store: "dynamic-v1".to_string(),
            origin: None,
            precache: Vec::new(),
            routes: RoutesConfig::default(),
            offline: OfflineDocument::default(),
            limits: StoreLimits::default(),
            http: HttpConfig::default(),
        }
    }
}

impl ProxyConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file and apply environment
    /// overrides.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&raw)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw)?,
            other => {
                return Err(Error::configuration_with_context(
                    "unsupported config file type",
                    ErrorContext::new()
                        .with_details(format!(
                            "expected .json, .yaml or .yml, got {:?}",
                            other.unwrap_or("")
                        ))
                        .with_source(path.display().to_string()),
                ))
            }
        };
        config.apply_env_overrides();
        debug!(path = %path.display(), generation = %config.generation_id, "config loaded");
        Ok(config)
    }

    /// Load from `CACHE_PROXY_CONFIG` when set, otherwise defaults with
    /// environment overrides.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim()),
            _ => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = read("CACHE_PROXY_GENERATION") {
            self.generation_id = id.trim().to_string();
        }
        if let Some(secs) = read("CACHE_PROXY_HTTP_TIMEOUT_SECS").and_then(|s| s.trim().parse::<u64>().ok()) {
            self.http.timeout_secs = Some(secs);
        }
        if let Some(proxy) = read("CACHE_PROXY_PROXY_URL") {
            self.http.proxy_url = Some(proxy.trim().to_string());
        }
    }

    pub fn generation(&self) -> Generation {
        Generation::new(&self.generation_id, &self.static_store, &self.dynamic_store)
    }

    /// Manifest entries as absolute URLs, resolving relative ones against
    /// `origin`.
    pub fn resolved_manifest(&self) -> Result<Vec<Url>> {
        let origin = match &self.origin {
            Some(raw) => Some(Url::parse(raw).map_err(|e| {
                invalid("origin", format!("'{}': {}", raw, e))
            })?),
            None => None,
        };

        self.precache
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let field = format!("precache[{}]", i);
                let url = match Url::parse(entry) {
                    Ok(url) => url,
                    Err(url::ParseError::RelativeUrlWithoutBase) => match &origin {
                        Some(base) => base
                            .join(entry)
                            .map_err(|e| invalid(&field, format!("'{}': {}", entry, e)))?,
                        None => {
                            return Err(invalid(
                                &field,
                                format!("'{}' is relative and no origin is configured", entry),
                            ))
                        }
                    },
                    Err(e) => return Err(invalid(&field, format!("'{}': {}", entry, e))),
                };
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(invalid(&field, format!("'{}' is not http(s)", entry)));
                }
                Ok(url)
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.generation_id.trim().is_empty() {
            return Err(invalid("generation_id", "must not be empty".to_string()));
        }
        if self.static_store.trim().is_empty() {
            return Err(invalid("static_store", "must not be empty".to_string()));
        }
        if self.dynamic_store.trim().is_empty() {
            return Err(invalid("dynamic_store", "must not be empty".to_string()));
        }
        if self.static_store == self.dynamic_store {
            return Err(invalid(
                "dynamic_store",
                format!("'{}' is also the static store", self.dynamic_store),
            ));
        }
        if self.limits.max_entries_per_store == Some(0) {
            return Err(invalid(
                "limits.max_entries_per_store",
                "must be at least 1".to_string(),
            ));
        }
        StrategyClassifier::from_config(&self.routes)?;
        self.resolved_manifest()?;
        Ok(())
    }
}

fn invalid(field: &str, details: String) -> Error {
    Error::configuration_with_context(
        "invalid proxy configuration",
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("config"),
    )
}
