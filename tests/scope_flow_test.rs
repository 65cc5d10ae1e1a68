//! End-to-end flow: config → manager → heartbeats → admit → decorate → release.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, USER_AGENT};
use http::Request;
use querygate::config::schema::{
    ClusterConfig, ClusterUserConfig, ProxyConfig, UserConfig,
};
use querygate::proxy::rewrite::ConnInfo;
use querygate::proxy::scope::ScopeError;
use querygate::{HttpProbe, Scope, Shutdown, UpstreamManager};

use common::{start_capture_backend, wait_for};

fn sample_config(node: &str) -> ProxyConfig {
    ProxyConfig {
        users: vec![UserConfig {
            name: "analyst".into(),
            password: "secret".into(),
            to_cluster: Some("reports".into()),
            to_user: Some("web".into()),
            deny_http: false,
            deny_https: false,
            allowed_networks: vec!["127.0.0.1".into()],
            max_execution_time_secs: 120,
            max_concurrent_queries: 2,
        }],
        clusters: vec![ClusterConfig {
            name: "reports".into(),
            scheme: "http".into(),
            nodes: vec![node.into()],
            users: vec![ClusterUserConfig {
                name: "web".into(),
                password: "web-secret".into(),
                max_execution_time_secs: 0,
                max_concurrent_queries: 0,
            }],
            heartbeat_interval_secs: 1,
            kill_query_user: None,
        }],
        observability: Default::default(),
    }
}

/// The listener's job, condensed: resolve identities the way the auth
/// layer would, then build a scope.
fn resolve_scope(manager: &UpstreamManager) -> Result<Scope, ScopeError> {
    let user = manager.user("analyst").unwrap();
    let cluster = manager.cluster(user.to_cluster.as_deref().unwrap()).unwrap();
    let cluster_user = cluster.user(user.to_user.as_deref().unwrap()).unwrap();
    Scope::new(user, cluster_user, cluster)
}

#[tokio::test]
async fn full_request_lifecycle() {
    let (addr, _capture, _server) = start_capture_backend(200, "Ok.").await;
    let manager = UpstreamManager::from_config(&sample_config(&addr.to_string())).unwrap();

    let shutdown = Shutdown::new();
    let handles = manager.spawn_heartbeats(
        Arc::new(HttpProbe::new(Duration::from_millis(500))),
        &shutdown,
    );
    assert_eq!(handles.len(), 1);

    let cluster = manager.cluster("reports").unwrap();
    wait_for("host to become active", || {
        cluster.hosts()[0].is_active()
    })
    .await;

    let scope = resolve_scope(&manager).unwrap();
    scope.admit().unwrap();

    let remote: SocketAddr = "192.0.2.1:50000".parse().unwrap();
    let mut req = Request::builder()
        .uri("http://proxy.local/?query=SELECT+count()+FROM+t&database=x")
        .header(USER_AGENT, "client/1.0")
        .body(())
        .unwrap();
    req.extensions_mut().insert(ConnInfo {
        remote,
        local: Some(addr),
    });
    scope.decorate(&mut req).unwrap();

    // the rewritten request points at the backend, as the cluster user
    assert_eq!(req.uri().host(), Some("127.0.0.1"));
    assert_eq!(req.uri().port_u16(), Some(addr.port()));
    let query = req.uri().query().unwrap();
    assert!(query.contains(&format!("query_id={}", scope.id())));
    assert!(query.contains("query=SELECT+count%28%29+FROM+t"));
    assert!(!query.contains("database"));
    assert!(req.headers()[AUTHORIZATION]
        .to_str()
        .unwrap()
        .starts_with("Basic "));
    let ua = req.headers()[USER_AGENT].to_str().unwrap();
    assert!(ua.starts_with(&format!("RemoteAddr: {remote}; LocalAddr: {addr}; ")));
    assert!(ua.ends_with("client/1.0"));

    assert_eq!(
        scope.to_string(),
        format!(
            "[ Id: {}; User \"analyst\"(1) proxying as \"web\"(1) to \"127.0.0.1:{}\"(1) ]",
            scope.id(),
            addr.port()
        )
    );

    scope.release();
    assert_eq!(manager.user("analyst").unwrap().running_queries(), 0);
    assert_eq!(cluster.hosts()[0].running_queries(), 0);

    shutdown.signal();
    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
    }
}

#[tokio::test]
async fn concurrency_ceiling_holds_across_scopes() {
    let (addr, _capture, _server) = start_capture_backend(200, "Ok.").await;
    let manager = UpstreamManager::from_config(&sample_config(&addr.to_string())).unwrap();

    let shutdown = Shutdown::new();
    let handles = manager.spawn_heartbeats(
        Arc::new(HttpProbe::new(Duration::from_millis(500))),
        &shutdown,
    );
    let cluster = manager.cluster("reports").unwrap();
    wait_for("host to become active", || {
        cluster.hosts()[0].is_active()
    })
    .await;

    let s1 = resolve_scope(&manager).unwrap();
    let s2 = resolve_scope(&manager).unwrap();
    let s3 = resolve_scope(&manager).unwrap();
    s1.admit().unwrap();
    s2.admit().unwrap();
    let err = s3.admit().unwrap_err();
    assert!(err
        .to_string()
        .contains("limits for user \"analyst\" are exceeded"));

    // the rejected admission left no residue
    assert_eq!(manager.user("analyst").unwrap().running_queries(), 2);

    s1.release();
    s2.release();
    assert_eq!(manager.user("analyst").unwrap().running_queries(), 0);

    shutdown.signal();
    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
    }
}
