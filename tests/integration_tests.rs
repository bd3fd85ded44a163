use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use herpstat_exporter::{
    device::{HttpStatusSource, ManualClock, StatusSource},
    web::{create_app, AppState},
    DeviceCollector, DeviceConfig, ExporterError, PollCoordinator, PollOutcome, WebConfig,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use tracing::Span;

const STATUS: &str = r#"{
    "system": {"nickname": "Tank1", "numberofoutputs": 1, "safetyrelay": "OFF (NORMAL OPERATION)"},
    "output1": {"outputnickname": "Heater", "outputmode": "Dimming", "probereadingTEMP": 85.5}
}"#;

/// A stand-in for the SpyderWeb's `/RAWSTATUS` page.
#[derive(Clone)]
struct FakeDevice {
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    hits: Arc<AtomicUsize>,
    delay: Duration,
}

impl FakeDevice {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn rawstatus(State(device): State<FakeDevice>) -> (StatusCode, String) {
    device.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(device.delay).await;

    let next = device.responses.lock().unwrap().pop_front();
    next.unwrap_or((StatusCode::SERVICE_UNAVAILABLE, String::new()))
}

async fn spawn_device(responses: Vec<(StatusCode, &str)>, delay: Duration) -> (String, FakeDevice) {
    let device = FakeDevice {
        responses: Arc::new(Mutex::new(
            responses
                .into_iter()
                .map(|(status, body)| (status, body.to_string()))
                .collect(),
        )),
        hits: Arc::new(AtomicUsize::new(0)),
        delay,
    };

    let app = Router::new()
        .route("/RAWSTATUS", get(rawstatus))
        .with_state(device.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind fake device");
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, device)
}

fn fast_config(addr: &str) -> DeviceConfig {
    DeviceConfig::new(addr)
        .with_retry_wait(Duration::from_millis(10))
        .with_request_timeout(Duration::from_millis(500))
}

async fn scrape(app: Router, path: &str) -> String {
    let response = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_http_source_reads_body() {
    let (addr, device) = spawn_device(vec![(StatusCode::OK, STATUS)], Duration::ZERO).await;
    let source = HttpStatusSource::new(&fast_config(&addr)).unwrap();

    let body = source.fetch_status().await.expect("Should fetch status");

    assert_eq!(body, STATUS.as_bytes());
    assert_eq!(device.hits(), 1);
}

#[tokio::test]
async fn test_http_source_rejects_error_status() {
    let (addr, _device) =
        spawn_device(vec![(StatusCode::INTERNAL_SERVER_ERROR, "")], Duration::ZERO).await;
    let source = HttpStatusSource::new(&fast_config(&addr)).unwrap();

    assert!(matches!(
        source.fetch_status().await,
        Err(ExporterError::Status(500))
    ));
}

#[tokio::test]
async fn test_http_source_times_out() {
    let (addr, _device) =
        spawn_device(vec![(StatusCode::OK, STATUS)], Duration::from_secs(2)).await;
    let config = fast_config(&addr).with_request_timeout(Duration::from_millis(100));
    let source = HttpStatusSource::new(&config).unwrap();

    let err = source.fetch_status().await.unwrap_err();
    assert!(matches!(err, ExporterError::Request(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_poll_recovers_from_flaky_device() {
    let (addr, device) = spawn_device(
        vec![
            (StatusCode::BAD_GATEWAY, ""),
            (StatusCode::OK, "{\"system\": {\"nickname\": \"Tan"),
            (StatusCode::OK, STATUS),
        ],
        Duration::ZERO,
    )
    .await;

    let config = fast_config(&addr);
    let clock = Arc::new(ManualClock::new());
    let mut coordinator = PollCoordinator::new(
        HttpStatusSource::new(&config).unwrap(),
        clock.clone(),
        &config,
        Span::none(),
    );

    assert_eq!(
        coordinator.poll_outcome().await,
        PollOutcome::Fresh { attempts: 3 }
    );
    assert_eq!(device.hits(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(10); 2]);
    assert_eq!(coordinator.cache().current().outputs[0].name, "Heater");
}

#[tokio::test]
async fn test_metrics_endpoint_polls_once_per_cooldown() {
    let (addr, device) = spawn_device(
        vec![(StatusCode::OK, STATUS), (StatusCode::OK, STATUS)],
        Duration::ZERO,
    )
    .await;
    let collector = DeviceCollector::for_device(&fast_config(&addr)).unwrap();
    let app = create_app(AppState::new(WebConfig::default(), collector));

    let first = scrape(app.clone(), "/metrics").await;
    assert!(first.contains("herpstat_up 1\n"));
    assert!(first.contains("herpstat_output_probe_temperature{system=\"Tank1\",id=\"1\"} 85.5\n"));
    assert!(first.contains("herpstat_output_info{system=\"Tank1\",id=\"1\",name=\"Heater\",mode=\"Dimming\"} 1\n"));

    let second = scrape(app.clone(), "/metrics").await;
    assert!(second.contains("herpstat_up 1\n"));
    assert!(second.contains("herpstat_system_safetyrelay{name=\"Tank1\",relay=\"OFF (NORMAL OPERATION)\"} 0\n"));
    assert_eq!(device.hits(), 1);

    let snapshot: serde_json::Value =
        serde_json::from_str(&scrape(app, "/api/snapshot").await).unwrap();
    assert_eq!(snapshot["system"]["name"], "Tank1");
    assert!(snapshot["fetched_at"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint_with_unreachable_device() {
    // Grab a free port, then close it so connections are refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let collector = DeviceCollector::for_device(&fast_config(&addr)).unwrap();
    let app = create_app(AppState::new(
        WebConfig::default().with_telemetry_path("/probe"),
        collector,
    ));

    let body = scrape(app, "/probe").await;
    assert!(body.contains("herpstat_up 0\n"));
    assert!(!body.contains("herpstat_system_info"));
}

#[tokio::test]
async fn test_concurrent_scrapes_share_one_poll() {
    let (addr, device) = spawn_device(
        vec![(StatusCode::OK, STATUS), (StatusCode::OK, STATUS)],
        Duration::from_millis(100),
    )
    .await;
    let collector = DeviceCollector::for_device(&fast_config(&addr)).unwrap();
    let app = create_app(AppState::new(WebConfig::default(), collector));

    let (a, b) = tokio::join!(
        scrape(app.clone(), "/metrics"),
        scrape(app.clone(), "/metrics")
    );

    assert!(a.contains("herpstat_up 1\n"));
    assert!(b.contains("herpstat_up 1\n"));
    assert_eq!(device.hits(), 1);
}
