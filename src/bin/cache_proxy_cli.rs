//! cache-proxy-cli: 缓存代理的命令行工具：策略分类、配置检查、单次请求
//!
//! Usage:
//!   cache-proxy-cli classify <url> [--config <path>]              Show the strategy chosen for a URL
//!   cache-proxy-cli check-config <path>                           Validate a proxy config file
//!   cache-proxy-cli fetch <url> [--config <path>] [--navigate]    Send one request through the proxy

use anyhow::{anyhow, bail, Context};
use offline_cache_proxy::{
    CacheProxyBuilder, InstallOutcome, ProxyConfig, ProxyRequest, StrategyClassifier,
};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "classify" => cmd_classify(&args[2..]),
        "check-config" => cmd_check_config(&args[2..]),
        "fetch" => cmd_fetch(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"cache-proxy-cli: 离线缓存代理命令行工具

USAGE:
    cache-proxy-cli <COMMAND> [OPTIONS]

COMMANDS:
    classify <url> [--config <path>]              Show which strategy handles a URL
    check-config <path>                           Validate a YAML/JSON proxy config
    fetch <url> [--config <path>] [--navigate]    Install, then send one GET through the proxy
    version                                       Show version information
    help                                          Show this help message

ENVIRONMENT:
    CACHE_PROXY_CONFIG                Config file used when --config is absent
    CACHE_PROXY_GENERATION            Override generation_id
    CACHE_PROXY_HTTP_TIMEOUT_SECS     Override http.timeout_secs
    CACHE_PROXY_PROXY_URL             Override http.proxy_url
    RUST_LOG                          Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("cache-proxy-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--config" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        return Some(arg);
    }
    None
}

fn load_config(args: &[String]) -> anyhow::Result<ProxyConfig> {
    let config = match flag_value(args, "--config") {
        Some(path) => ProxyConfig::from_path(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => ProxyConfig::from_env().context("loading config from environment")?,
    };
    config.validate()?;
    Ok(config)
}

fn cmd_classify(args: &[String]) -> anyhow::Result<()> {
    let raw = positional(args).ok_or_else(|| anyhow!("classify needs a URL"))?;
    let url = Url::parse(raw).with_context(|| format!("parsing URL '{raw}'"))?;
    let config = load_config(args)?;
    let classifier = StrategyClassifier::from_config(&config.routes)?;

    let c = classifier.explain(&url);
    println!("url:      {url}");
    println!("strategy: {}", c.strategy);
    println!("group:    {}", c.group.unwrap_or("(default)"));
    if let Some(matcher) = c.matcher {
        println!("matcher:  {matcher}");
    }
    Ok(())
}

fn cmd_check_config(args: &[String]) -> anyhow::Result<()> {
    let path = positional(args).ok_or_else(|| anyhow!("check-config needs a file path"))?;
    let config = ProxyConfig::from_path(path).with_context(|| format!("loading {path}"))?;
    config.validate()?;
    let manifest = config.resolved_manifest()?;

    println!("✅ {path}");
    println!("  generation:     {}", config.generation_id);
    println!("  static store:   {}", config.static_store);
    println!("  dynamic store:  {}", config.dynamic_store);
    println!("  precache:       {} asset(s)", manifest.len());
    println!(
        "  routes:         static_assets={} api={} pages={}",
        config.routes.static_assets.len(),
        config.routes.api.len(),
        config.routes.pages.len()
    );
    if let Some(n) = config.limits.max_entries_per_store {
        println!("  max entries:    {n} per store");
    }
    if let Some(n) = config.limits.max_total_bytes {
        println!("  max bytes:      {n}");
    }
    Ok(())
}

async fn cmd_fetch(args: &[String]) -> anyhow::Result<()> {
    let raw = positional(args).ok_or_else(|| anyhow!("fetch needs a URL"))?;
    let config = load_config(args)?;
    let proxy = CacheProxyBuilder::new().config(config).build()?;

    match proxy.on_install().await.context("installing cache generation")? {
        InstallOutcome::Activated(report) if !report.deleted.is_empty() => {
            println!("cleaned up: {}", report.deleted.join(", "));
        }
        InstallOutcome::Waiting => bail!("generation installed but is waiting for takeover"),
        InstallOutcome::Activated(_) => {}
    }

    let request = if args.iter().any(|a| a == "--navigate") {
        ProxyRequest::navigate(raw)?
    } else {
        ProxyRequest::get(raw)?
    };
    let strategy = proxy.classifier().classify(&request.url);
    let response = proxy.fetch(request).await?;
    proxy.settle_background().await;

    println!("strategy: {strategy}");
    println!("status:   {}", response.status);
    println!("source:   {:?}", response.source);
    for (name, value) in &response.headers {
        println!("  {name}: {value}");
    }
    println!("body:     {} bytes", response.body.len());
    Ok(())
}
