//! Drives the real Store Leads client against a one-shot local HTTP server
//! that replies with canned bytes.

use chrono::Utc;
use std::io::{Read as _, Write as _};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use storefront_opportunity::config::StoreLeadsConfig;
use storefront_opportunity::models::{FunnelSample, MetricSource, TestResult};
use storefront_opportunity::services::snapshot::fetch_store_snapshot;
use storefront_opportunity::services::store_leads::StoreLeadsClient;

struct OneShotServer {
    addr: SocketAddr,
    join: JoinHandle<()>,
}

impl OneShotServer {
    fn start(handler: impl FnOnce(TcpStream, Vec<u8>) + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind server");
        let addr = listener.local_addr().expect("server addr");
        let join = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
            let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
            let request = read_request_head(&mut stream);
            handler(stream, request);
        });
        Self { addr, join }
    }

    fn respond(status_line: &'static str, body: &'static str) -> Self {
        Self::start(move |mut stream, _| {
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        })
    }

    fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/v1/domain", self.addr.port())
    }

    fn join(self) {
        self.join.join().expect("server thread");
    }
}

fn read_request_head(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut scratch = [0u8; 4096];
    loop {
        match stream.read(&mut scratch) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&scratch[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    buf
}

fn client_for(server: &OneShotServer, timeout: Duration) -> StoreLeadsClient {
    let config = StoreLeadsConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.base_url(),
        timeout,
    };
    StoreLeadsClient::new(&config).expect("client")
}

fn test_result() -> TestResult {
    TestResult {
        store_url: "https://WWW.Example.com/".to_string(),
        store_name: None,
        industry: Some("Women's Apparel & Accessories".to_string()),
        completed_at: Utc::now(),
        funnel: FunnelSample::new(400, 48, 20, 6).expect("valid funnel"),
        issues: Vec::new(),
    }
}

#[tokio::test]
async fn sends_cleaned_domain_with_bearer_key() {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let captured_server = Arc::clone(&captured);
    let server = OneShotServer::start(move |mut stream, request| {
        *captured_server.lock().expect("capture lock") = request;
        let body = r#"{"domain":{"estimated_sales_monthly":250000,"estimated_traffic_monthly":80000,"rank":1200,"technologies":[{"name":"Shopify"}]}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).expect("write response");
    });

    let client = client_for(&server, Duration::from_secs(5));
    let metrics = client
        .fetch_and_normalize("https://WWW.Example.com/")
        .await
        .expect("metrics");
    server.join();

    assert_eq!(metrics.monthly_revenue_estimate, Some(250_000.0));
    assert_eq!(metrics.monthly_traffic_estimate, Some(80_000));
    assert_eq!(metrics.global_rank, Some(1_200));
    assert!(metrics.is_shopify());

    let request = String::from_utf8_lossy(&captured.lock().expect("capture lock")).to_string();
    assert!(request.starts_with("GET /v1/domain/example.com "), "{}", request);
    assert!(request.to_ascii_lowercase().contains("authorization: bearer test-key"));
}

#[tokio::test]
async fn not_found_degrades_to_funnel_snapshot() {
    let server = OneShotServer::respond("404 Not Found", r#"{"error":"not found"}"#);
    let client = client_for(&server, Duration::from_secs(5));

    assert_eq!(client.fetch_and_normalize("example.com").await, None);
    server.join();

    let server = OneShotServer::respond("404 Not Found", r#"{"error":"not found"}"#);
    let client = client_for(&server, Duration::from_secs(5));
    let snapshot = fetch_store_snapshot(&client, &test_result(), None)
        .await
        .expect("snapshot despite missing external data");
    server.join();

    assert_eq!(snapshot.metrics.monthly_visitors.source, MetricSource::Default);
    assert_eq!(snapshot.metrics.conversion_rate.source, MetricSource::Funnel);
    assert_eq!(snapshot.benchmark.category, "fashion");
    assert!(snapshot.opportunity.monthly_opportunity.max > 0.0);
}

#[tokio::test]
async fn rate_limit_returns_none() {
    let server = OneShotServer::respond("429 Too Many Requests", "{}");
    let client = client_for(&server, Duration::from_secs(5));
    assert_eq!(client.fetch_and_normalize("example.com").await, None);
    server.join();
}

#[tokio::test]
async fn server_error_returns_none() {
    let server = OneShotServer::respond("503 Service Unavailable", "upstream down");
    let client = client_for(&server, Duration::from_secs(5));
    assert_eq!(client.fetch_and_normalize("example.com").await, None);
    server.join();
}

#[tokio::test]
async fn unparseable_body_returns_none() {
    let server = OneShotServer::respond("200 OK", "<html>definitely not json</html>");
    let client = client_for(&server, Duration::from_secs(5));
    assert_eq!(client.fetch_and_normalize("example.com").await, None);
    server.join();
}

#[tokio::test]
async fn stalled_source_times_out_to_none() {
    let server = OneShotServer::start(|stream, _| {
        thread::sleep(Duration::from_millis(800));
        drop(stream);
    });
    let client = client_for(&server, Duration::from_millis(150));
    assert_eq!(client.fetch_and_normalize("example.com").await, None);
    server.join();
}

#[tokio::test]
async fn external_metrics_feed_the_snapshot() {
    let server = OneShotServer::respond(
        "200 OK",
        r#"{"estimated_sales_monthly":"95000","estimated_traffic_monthly":60000,"technologies":["Shopify"]}"#,
    );
    let client = client_for(&server, Duration::from_secs(5));
    let snapshot = fetch_store_snapshot(&client, &test_result(), None)
        .await
        .expect("snapshot");
    server.join();

    assert_eq!(snapshot.store_url, "https://WWW.Example.com/");
    assert_eq!(snapshot.metrics.monthly_visitors.value, 60_000);
    assert_eq!(snapshot.metrics.monthly_visitors.source, MetricSource::External);
    assert_eq!(snapshot.metrics.monthly_revenue.value, 95_000.0);
    assert_eq!(snapshot.funnel.landed(), 60_000);
    assert!(snapshot.opportunity.methodology.contains("third-party traffic estimates"));
}

#[tokio::test]
async fn array_body_returns_none() {
    let server = OneShotServer::respond("200 OK", "[91000, 4000, 12, []]");
    let client = client_for(&server, Duration::from_secs(5));
    assert_eq!(client.fetch_and_normalize("example.com").await, None);
    server.join();
}

#[tokio::test]
async fn error_object_body_returns_none() {
    let server = OneShotServer::respond("200 OK", r#"{"error":"invalid api key"}"#);
    let client = client_for(&server, Duration::from_secs(5));
    assert_eq!(client.fetch_and_normalize("example.com").await, None);
    server.join();
}
