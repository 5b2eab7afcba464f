use crate::handlers::{clear_cache, describe_path};
use portico_cache::FilesystemStore;
use portico_core::cache::{CacheKey, CacheName, ResponseSnapshot};
use portico_core::classify::{BypassReason, PathClassification, RequestClassification};
use portico_core::ports::CacheStore;
use portico_gateway::{GateDecision, GatewayConfig};
use pretty_assertions::assert_eq;
use url::Url;

fn config_with_cache(dir: &std::path::Path) -> GatewayConfig {
    let mut config = GatewayConfig {
        origin: Some("https://portal.example".to_string()),
        ..Default::default()
    };
    config.cache.dir = Some(dir.to_path_buf());
    config
}

async fn seed(store: &FilesystemStore, partition: &str) {
    let name = CacheName::new(partition);
    store.open(&name).await.unwrap();
    let key = CacheKey::get(&Url::parse("https://portal.example/").unwrap());
    store
        .put(&name, &key, &ResponseSnapshot::new(200, "<h1>Portal</h1>"))
        .await
        .unwrap();
}

#[test]
fn test_check_protected_path() {
    let config = GatewayConfig::default();

    let report = describe_path(&config, "/dashboard/citizen", None).unwrap();
    assert_eq!(report.classification, PathClassification::Protected);
    assert_eq!(
        report.decision,
        GateDecision::Redirect("/login?redirect=/dashboard/citizen".to_string())
    );
    assert_eq!(report.offline, RequestClassification::Navigable);

    let report = describe_path(&config, "/dashboard/citizen", Some("abc")).unwrap();
    assert_eq!(report.decision, GateDecision::Forward);
}

#[test]
fn test_check_login_and_assets() {
    let config = GatewayConfig::default();

    let login = describe_path(&config, "/login?next=1", Some("abc")).unwrap();
    assert_eq!(login.path, "/login");
    assert_eq!(
        login.decision,
        GateDecision::Redirect("/dashboard/citizen".to_string())
    );
    assert_eq!(
        login.offline,
        RequestClassification::Bypass(BypassReason::AuthFlow)
    );

    let image = describe_path(&config, "/_next/static/logo.png", None).unwrap();
    assert!(image.excluded);
}

#[tokio::test]
async fn test_clear_single_partition() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path().to_path_buf());
    seed(&store, "portal-v1").await;
    seed(&store, "portal-v0").await;

    let config = config_with_cache(dir.path());
    let deleted = clear_cache(&config, Some("portal-v0".to_string()))
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(
        store.partitions().await.unwrap(),
        vec![CacheName::new("portal-v1")]
    );
}

#[tokio::test]
async fn test_clear_all_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path().to_path_buf());
    seed(&store, "portal-v1").await;
    seed(&store, "portal-runtime").await;

    let config = config_with_cache(dir.path());
    assert_eq!(clear_cache(&config, None).await.unwrap(), 2);
    assert!(store.partitions().await.unwrap().is_empty());

    assert_eq!(
        clear_cache(&config, Some("missing".to_string())).await.unwrap(),
        0
    );
}
