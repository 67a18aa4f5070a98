//! 策略分类模块：按 URL 模式组为每个请求选择缓存策略。
//!
//! # Strategy Classifier Module
//!
//! Maps an outbound request URL to exactly one caching [`Strategy`] by testing
//! three ordered pattern groups. This module is pure logic: no I/O, no state
//! beyond the compiled patterns.
//!
//! ## Precedence
//!
//! 1. static-asset patterns → [`Strategy::CacheFirst`]
//! 2. API/backend patterns → [`Strategy::NetworkFirst`]
//! 3. page-route patterns → [`Strategy::StaleWhileRevalidate`]
//! 4. otherwise → [`Strategy::NetworkWithCacheFallback`]
//!
//! Groups may overlap; the first matching group wins. Regex matchers run
//! against the full URL string without normalization, so unanchored patterns
//! can over-match. Prefix matchers test the URL path only.
//!
//! ## Example
//!
//! ```rust
//! use offline_cache_proxy::routing::{RoutesConfig, Strategy, StrategyClassifier};
//!
//! let classifier = StrategyClassifier::from_config(&RoutesConfig::default()).unwrap();
//! let s = classifier.classify_str("https://app.example.com/assets/logo.png").unwrap();
//! assert_eq!(s, Strategy::CacheFirst);
//! ```

mod patterns;

pub use patterns::{MatcherSpec, PatternGroup, RoutesConfig, UrlMatcher};

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    /// Default for URLs no group claims.
    NetworkWithCacheFallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkWithCacheFallback => "network-with-cache-fallback",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which group (and which matcher in it) decided a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub strategy: Strategy,
    /// `None` when the default strategy applied.
    pub group: Option<&'static str>,
    pub matcher: Option<String>,
}

pub struct StrategyClassifier {
    static_assets: PatternGroup,
    api: PatternGroup,
    pages: PatternGroup,
}

impl StrategyClassifier {
    pub fn new(static_assets: PatternGroup, api: PatternGroup, pages: PatternGroup) -> Self {
        Self {
            static_assets,
            api,
            pages,
        }
    }

    pub fn from_config(config: &RoutesConfig) -> Result<Self> {
        Ok(Self::new(
            PatternGroup::compile("static_assets", &config.static_assets)?,
            PatternGroup::compile("api", &config.api)?,
            PatternGroup::compile("pages", &config.pages)?,
        ))
    }

    pub fn classify(&self, url: &Url) -> Strategy {
        self.explain(url).strategy
    }

    pub fn classify_str(&self, url: &str) -> Result<Strategy> {
        let url = Url::parse(url).map_err(|e| {
            Error::validation_with_context(
                format!("cannot classify '{}'", url),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("classifier"),
            )
        })?;
        Ok(self.classify(&url))
    }

    pub fn explain(&self, url: &Url) -> Classification {
        let ordered = [
            (&self.static_assets, Strategy::CacheFirst),
            (&self.api, Strategy::NetworkFirst),
            (&self.pages, Strategy::StaleWhileRevalidate),
        ];
        for (group, strategy) in ordered {
            if let Some(m) = group.first_match(url) {
                return Classification {
                    strategy,
                    group: Some(group.name()),
                    matcher: Some(m.to_string()),
                };
            }
        }
        Classification {
            strategy: Strategy::NetworkWithCacheFallback,
            group: None,
            matcher: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> StrategyClassifier {
        StrategyClassifier::from_config(&RoutesConfig::default()).unwrap()
    }

    #[test]
    fn test_default_groups() {
        let c = classifier();
        let cases = [
            ("https://app.example.com/assets/logo.png", Strategy::CacheFirst),
            ("https://app.example.com/static/chunk", Strategy::CacheFirst),
            ("https://cdn.example.com/lib/app.js?v=3", Strategy::CacheFirst),
            ("https://app.example.com/fonts/inter.woff2", Strategy::CacheFirst),
            ("https://app.example.com/api/messages", Strategy::NetworkFirst),
            ("https://api.example.com/v1/producers", Strategy::NetworkFirst),
            ("https://app.example.com/", Strategy::StaleWhileRevalidate),
            ("https://app.example.com/dashboard", Strategy::StaleWhileRevalidate),
            ("https://app.example.com/messages/42", Strategy::StaleWhileRevalidate),
            ("https://app.example.com/about", Strategy::NetworkWithCacheFallback),
            ("https://app.example.com/dashboardx", Strategy::NetworkWithCacheFallback),
        ];
        for (url, expected) in cases {
            assert_eq!(c.classify_str(url).unwrap(), expected, "{}", url);
        }
    }

    #[test]
    fn test_static_group_wins_over_api_group() {
        // matches both `/api/` prefix and the image extension pattern
        let c = classifier();
        let explained = c.explain(&Url::parse("https://app.example.com/api/avatar.png").unwrap());
        assert_eq!(explained.strategy, Strategy::CacheFirst);
        assert_eq!(explained.group, Some("static_assets"));
    }

    #[test]
    fn test_api_group_wins_over_page_group() {
        let routes = RoutesConfig {
            static_assets: vec![],
            api: vec![MatcherSpec::Prefix("/messages/feed".into())],
            pages: vec![MatcherSpec::Prefix("/messages".into())],
        };
        let c = StrategyClassifier::from_config(&routes).unwrap();
        assert_eq!(
            c.classify_str("https://app.example.com/messages/feed").unwrap(),
            Strategy::NetworkFirst
        );
        assert_eq!(
            c.classify_str("https://app.example.com/messages/7").unwrap(),
            Strategy::StaleWhileRevalidate
        );
    }

    #[test]
    fn test_unanchored_regex_over_matches() {
        let routes = RoutesConfig {
            static_assets: vec![],
            api: vec![MatcherSpec::Regex("api".into())],
            pages: vec![],
        };
        let c = StrategyClassifier::from_config(&routes).unwrap();
        assert_eq!(
            c.classify_str("https://app.example.com/capital-letters").unwrap(),
            Strategy::NetworkFirst
        );
    }

    #[test]
    fn test_empty_groups_fall_through_to_default() {
        let routes = RoutesConfig {
            static_assets: vec![],
            api: vec![],
            pages: vec![],
        };
        let c = StrategyClassifier::from_config(&routes).unwrap();
        let explained = c.explain(&Url::parse("https://app.example.com/app.js").unwrap());
        assert_eq!(explained.strategy, Strategy::NetworkWithCacheFallback);
        assert!(explained.group.is_none());
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let routes = RoutesConfig {
            static_assets: vec![MatcherSpec::Regex("(unclosed".into())],
            api: vec![],
            pages: vec![],
        };
        let err = StrategyClassifier::from_config(&routes).err().unwrap();
        let ctx = err.context().unwrap();
        assert_eq!(ctx.field_path.as_deref(), Some("routes.static_assets[0]"));
    }
}
