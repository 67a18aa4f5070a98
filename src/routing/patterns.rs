//! Ordered URL pattern groups.

use crate::{Error, ErrorContext, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Serialized matcher: `{regex: "..."}` or `{prefix: "/assets/"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherSpec {
    /// Tested against the full URL string.
    Regex(String),
    /// Tested against the URL path.
    Prefix(String),
}

#[derive(Debug, Clone)]
pub enum UrlMatcher {
    Regex(Regex),
    PathPrefix(String),
}

impl UrlMatcher {
    pub fn compile(spec: &MatcherSpec) -> std::result::Result<Self, regex::Error> {
        Ok(match spec {
            MatcherSpec::Regex(pattern) => UrlMatcher::Regex(Regex::new(pattern)?),
            MatcherSpec::Prefix(prefix) => UrlMatcher::PathPrefix(prefix.clone()),
        })
    }

    pub fn matches(&self, url: &Url) -> bool {
        match self {
            UrlMatcher::Regex(re) => re.is_match(url.as_str()),
            UrlMatcher::PathPrefix(prefix) => url.path().starts_with(prefix.as_str()),
        }
    }
}

impl std::fmt::Display for UrlMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlMatcher::Regex(re) => write!(f, "regex:{}", re.as_str()),
            UrlMatcher::PathPrefix(p) => write!(f, "prefix:{}", p),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternGroup {
    name: &'static str,
    matchers: Vec<UrlMatcher>,
}

impl PatternGroup {
    pub fn compile(name: &'static str, specs: &[MatcherSpec]) -> Result<Self> {
        let mut group = Self {
            name,
            matchers: Vec::with_capacity(specs.len()),
        };
        for (i, spec) in specs.iter().enumerate() {
            let matcher = UrlMatcher::compile(spec).map_err(|e| {
                Error::configuration_with_context(
                    "invalid URL pattern",
                    ErrorContext::new()
                        .with_field_path(format!("routes.{}[{}]", name, i))
                        .with_details(e.to_string())
                        .with_source("classifier"),
                )
            })?;
            group.matchers.push(matcher);
        }
        Ok(group)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn first_match(&self, url: &Url) -> Option<&UrlMatcher> {
        self.matchers.iter().find(|m| m.matches(url))
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.first_match(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

/// The three ordered groups, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub static_assets: Vec<MatcherSpec>,
    pub api: Vec<MatcherSpec>,
    pub pages: Vec<MatcherSpec>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            static_assets: vec![
                MatcherSpec::Regex(
                    r"\.(?:js|mjs|css|woff2?|ttf|otf|eot|png|jpe?g|gif|svg|webp|avif|ico)(?:\?.*)?$"
                        .into(),
                ),
                MatcherSpec::Prefix("/assets/".into()),
                MatcherSpec::Prefix("/static/".into()),
            ],
            api: vec![
                MatcherSpec::Prefix("/api/".into()),
                MatcherSpec::Regex(r"^https?://api\.[^/]+/".into()),
            ],
            pages: vec![MatcherSpec::Regex(
                r"^https?://[^/]+/(?:dashboard|messages|settings|map|billing)?(?:[/?].*)?$".into(),
            )],
        }
    }
}
