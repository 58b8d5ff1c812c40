#[path = "common.rs"]
mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use stem::config::Config;
use stem::core::Hub;
use stem::hosts::{HostStatus, Launcher};

fn local_config() -> Config {
    let mut config = Config::default();
    config.web.bind_addr = "127.0.0.1:0".into();
    config.api.bind_addr = "127.0.0.1:0".into();
    config.websocket.bind_addr = "127.0.0.1:0".into();
    config
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, location, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn toggles_redirect_home_and_flip_status() {
    common::init_logging();
    let hub = Hub::shared();
    let launcher = Launcher::new(hub.clone(), &local_config());
    let router = launcher.router();

    let (status, location, _) = get(&router, "/websocket/start").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));
    assert!(launcher.status().await.websocket);
    assert_eq!(hub.len().await, 1);

    get(&router, "/api/start").await;
    get(&router, "/console/start").await;
    assert_eq!(
        launcher.status().await,
        HostStatus {
            api: true,
            console: true,
            websocket: true
        }
    );
    // The API host publishes; only the two sinks subscribe.
    assert_eq!(hub.len().await, 2);

    let (status, _, json) = get(&router, "/status").await;
    assert_eq!(status, StatusCode::OK);
    let reported: HostStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(reported, launcher.status().await);

    get(&router, "/console/stop").await;
    get(&router, "/websocket/stop").await;
    assert!(hub.is_empty().await);
    assert_eq!(
        launcher.status().await,
        HostStatus {
            api: true,
            console: false,
            websocket: false
        }
    );

    launcher.shutdown().await;
    assert_eq!(launcher.status().await, HostStatus::default());
}

#[tokio::test]
async fn homepage_lists_hosts() {
    let launcher = Launcher::new(Hub::shared(), &local_config());
    launcher
        .sync(HostStatus {
            api: true,
            ..HostStatus::default()
        })
        .await;

    let (status, _, html) = get(&launcher.router(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("href=\"/api/stop\""));
    assert!(html.contains("href=\"/console/start\""));
    assert!(html.contains("href=\"/websocket/start\""));
    assert!(html.contains("Running"));

    launcher.shutdown().await;
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let launcher = Launcher::new(Hub::shared(), &local_config());
    let router = launcher.router();

    for uri in ["/nope", "/database/start", "/api/explode", "/a/b/c"] {
        let (status, _, _) = get(&router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
    assert_eq!(launcher.status().await, HostStatus::default());
}

#[tokio::test]
async fn sync_only_touches_changed_hosts_and_survives_bind_failure() {
    let hub = Hub::shared();
    let mut config = local_config();
    config.api.bind_addr = "not an address".into();
    let launcher = Launcher::new(hub.clone(), &config);

    let running = launcher
        .sync(HostStatus {
            api: true,
            console: false,
            websocket: true,
        })
        .await;

    assert!(!running.api);
    assert!(running.websocket);
    assert_eq!(hub.len().await, 1);

    // Same wanted state again is a no-op.
    let again = launcher
        .sync(HostStatus {
            api: false,
            console: false,
            websocket: true,
        })
        .await;
    assert_eq!(again, running);
    assert_eq!(hub.len().await, 1);

    launcher.shutdown().await;
    assert!(hub.is_empty().await);
}

#[tokio::test]
async fn serve_binds_control_panel() {
    let launcher = Launcher::new(Hub::shared(), &local_config());

    let server = launcher.serve("127.0.0.1:0").await.unwrap();
    assert_ne!(server.local_addr().port(), 0);

    server.shutdown().await;
}
