//! Command handlers.

use anyhow::{Context, Result};
use console::style;
use portico_cache::FilesystemStore;
use portico_core::cache::CacheName;
use portico_core::classify::{PathClassification, RequestClassification};
use portico_core::ports::CacheStore;
use portico_core::request::FetchRequest;
use portico_core::session::SessionToken;
use portico_gateway::{AuthGate, GateDecision, GatewayConfig};
use tracing::info;

use crate::config::cache_dir;

/// Run the gateway with an on-disk cache.
pub async fn serve(mut config: GatewayConfig) -> Result<()> {
    let dir = cache_dir(&config);
    info!(cache_dir = %dir.display(), "Using on-disk offline cache");
    config.cache.dir = Some(dir);
    portico_gateway::serve(config).await.context("Gateway failed")
}

/// List cache partitions.
pub async fn list_cache(config: &GatewayConfig, partition: Option<String>) -> Result<()> {
    let store = FilesystemStore::new(cache_dir(config));
    let current = config.partitions();

    let summaries: Vec<_> = store
        .summarize()
        .await
        .context("Failed to read cache")?
        .into_iter()
        .filter(|s| partition.as_deref().is_none_or(|p| s.name.as_str() == p))
        .collect();

    if summaries.is_empty() {
        println!(
            "{} No cache partitions in {}",
            style("i").blue(),
            store.root_dir().display()
        );
        return Ok(());
    }

    println!("Cache partitions in {}:", store.root_dir().display());
    for summary in summaries {
        let marker = if current.is_current(&summary.name) {
            style("current").green()
        } else {
            style("stale").yellow()
        };
        println!(
            "  {:<24} {:>6} entries {:>10} bytes  {}",
            summary.name.as_str(),
            summary.entries,
            summary.body_bytes,
            marker
        );
    }
    Ok(())
}

/// Delete one partition, or all of them. Returns how many were deleted.
pub async fn clear_cache(config: &GatewayConfig, partition: Option<String>) -> Result<usize> {
    let store = FilesystemStore::new(cache_dir(config));
    let targets = match partition {
        Some(name) => vec![CacheName::new(name)],
        None => store.partitions().await.context("Failed to list partitions")?,
    };

    let mut deleted = 0;
    for name in &targets {
        if store.delete(name).await? {
            println!("{} Deleted {}", style("✓").green(), name);
            deleted += 1;
        } else {
            println!("{} No partition named {}", style("!").yellow(), name);
        }
    }
    if targets.is_empty() {
        println!("{} Cache is already empty", style("i").blue());
    }
    Ok(deleted)
}

/// Show configuration.
pub fn show_config(config: &GatewayConfig) -> Result<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}

/// What the gateway would do with a page request.
#[derive(Debug)]
pub struct PathReport {
    pub path: String,
    pub excluded: bool,
    pub classification: PathClassification,
    pub decision: GateDecision,
    pub offline: RequestClassification,
}

pub fn describe_path(
    config: &GatewayConfig,
    path: &str,
    token: Option<&str>,
) -> Result<PathReport> {
    let gate = AuthGate::new(config.gate.clone())?;
    let policy = config.intercept_policy()?;
    let url = policy
        .resolve(path)
        .with_context(|| format!("Invalid path {}", path))?;
    let path = url.path().to_string();
    let session = token.and_then(SessionToken::from_cookie_value);

    Ok(PathReport {
        excluded: gate.is_excluded(&path),
        classification: gate.classify(&path),
        decision: gate.decide(&path, session.as_ref()),
        offline: policy.classify(&FetchRequest::navigate(url)),
        path,
    })
}

pub fn check(config: &GatewayConfig, path: &str, token: Option<&str>) -> Result<()> {
    let report = describe_path(config, path, token)?;

    println!("{}", style(&report.path).bold());
    if report.excluded {
        println!("  gate:     {}", style("not run").dim());
    } else {
        println!("  class:    {}", report.classification);
        match &report.decision {
            GateDecision::Forward => println!("  gate:     {}", style("forward").green()),
            GateDecision::Redirect(location) => {
                println!("  gate:     {} {}", style("redirect").yellow(), location)
            }
        }
    }
    let offline = match report.offline {
        RequestClassification::Bypass(reason) => format!("bypass ({:?})", reason),
        RequestClassification::Navigable => "network first, offline landing".to_string(),
        RequestClassification::CacheableAsset => "network first, runtime cached".to_string(),
    };
    println!("  offline:  {}", offline);
    Ok(())
}
