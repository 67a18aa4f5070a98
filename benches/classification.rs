//! Benchmarks for the request path
//!
//! This benchmark measures:
//! - URL classification against the default pattern groups
//! - Config parsing (YAML vs JSON)
//! - Cache-first hit latency through the full proxy

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use offline_cache_proxy::routing::{RoutesConfig, StrategyClassifier};
use offline_cache_proxy::{CacheProxyBuilder, InMemoryTransport, ProxyConfig, ProxyRequest, ProxyResponse};
use std::sync::Arc;
use url::Url;

const SAMPLE_URLS: &[(&str, &str)] = &[
    ("static", "https://app.example.com/assets/vendor.3f2a1c.js"),
    ("api", "https://app.example.com/api/messages?since=1700000000"),
    ("api_host", "https://api.example.com/v2/producers/42"),
    ("page", "https://app.example.com/dashboard/overview"),
    ("default", "https://cdn.other.example/embed/widget"),
];

const SAMPLE_CONFIG_YAML: &str = r#"
generation_id: v7
static_store: static-v7
dynamic_store: dynamic-v7
origin: https://app.example.com
precache:
  - /
  - /assets/app.js
  - /assets/app.css
routes:
  static_assets:
    - regex: '\.(?:js|css|png|svg|woff2)$'
    - prefix: /assets/
  api:
    - prefix: /api/
  pages:
    - regex: '^https://app\.example\.com/(?:dashboard|messages)?$'
limits:
  max_entries_per_store: 500
"#;

const SAMPLE_CONFIG_JSON: &str = r#"{
  "generation_id": "v7",
  "static_store": "static-v7",
  "dynamic_store": "dynamic-v7",
  "origin": "https://app.example.com",
  "precache": ["/", "/assets/app.js", "/assets/app.css"],
  "routes": {
    "static_assets": [{"regex": "\\.(?:js|css|png|svg|woff2)$"}, {"prefix": "/assets/"}],
    "api": [{"prefix": "/api/"}],
    "pages": [{"regex": "^https://app\\.example\\.com/(?:dashboard|messages)?$"}]
  },
  "limits": {"max_entries_per_store": 500}
}"#;

fn bench_classification(c: &mut Criterion) {
    let classifier = StrategyClassifier::from_config(&RoutesConfig::default()).unwrap();
    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(1));

    for (name, raw) in SAMPLE_URLS {
        let url = Url::parse(raw).unwrap();
        group.bench_with_input(BenchmarkId::new("default_routes", name), &url, |b, url| {
            b.iter(|| black_box(classifier.classify(black_box(url))))
        });
    }
    group.finish();
}

fn bench_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    group.throughput(Throughput::Bytes(SAMPLE_CONFIG_YAML.len() as u64));
    group.bench_function("yaml_parse", |b| {
        b.iter(|| black_box(ProxyConfig::from_yaml_str(black_box(SAMPLE_CONFIG_YAML)).unwrap()))
    });

    group.throughput(Throughput::Bytes(SAMPLE_CONFIG_JSON.len() as u64));
    group.bench_function("json_parse", |b| {
        b.iter(|| black_box(ProxyConfig::from_json_str(black_box(SAMPLE_CONFIG_JSON)).unwrap()))
    });

    group.bench_function("yaml_parse_and_validate", |b| {
        b.iter(|| {
            let config = ProxyConfig::from_yaml_str(black_box(SAMPLE_CONFIG_YAML)).unwrap();
            config.validate().unwrap();
            black_box(config)
        })
    });
    group.finish();
}

fn bench_cache_first_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let url = "https://app.example.com/assets/logo.png";
    let transport = Arc::new(InMemoryTransport::new().with_route(url, ProxyResponse::new(200, vec![0u8; 4096])));
    let proxy = CacheProxyBuilder::new().transport(transport).build().unwrap();
    rt.block_on(async {
        proxy.on_install().await.unwrap();
        proxy.fetch(ProxyRequest::get(url).unwrap()).await.unwrap();
    });

    c.bench_function("intercept/cache_first_hit", |b| {
        b.to_async(&rt).iter(|| async {
            let resp = proxy.fetch(ProxyRequest::get(url).unwrap()).await.unwrap();
            black_box(resp)
        })
    });
}

criterion_group!(
    benches,
    bench_classification,
    bench_config_parsing,
    bench_cache_first_hit
);
criterion_main!(benches);
