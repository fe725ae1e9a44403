/// Integration tests for the REST gauge store against a local stub server
///
/// Tests verify:
/// 1. Select parses the table rows (numeric ids, null status)
/// 2. Insert posts a one-element array and asks for the row back
/// 3. Error bodies surface as HttpError with the store's message
/// 4. Zone-less timestamps and null names load; an undecodable row is dropped
///    without losing the others
///
/// The stub answers exactly one request per test and hands the raw request
/// text back to the test for inspection.

use agos_monitor::model::{GaugeId, GaugeStatus, NewGauge, StoreError};
use agos_monitor::store::{GaugeStore, RestGaugeStore};
use reqwest::blocking::Client;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

/// Serves one canned response; the handle yields the request it received.
fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
            request.push_str(&line);
            if line == "\r\n" {
                break;
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        request.push_str(&String::from_utf8_lossy(&body));

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });

    (base, handle)
}

fn store_at(base: &str) -> RestGaugeStore {
    let client = Client::builder().no_proxy().build().unwrap();
    RestGaugeStore::with_client(client, base, "anon-key", "water_gauges")
}

fn new_gauge() -> NewGauge {
    NewGauge {
        name: "Test Gauge".to_string(),
        location: "Test City".to_string(),
        latitude: 14.6,
        longitude: 120.98,
        water_level: 0.0,
        max_capacity: 10.0,
        status: GaugeStatus::Normal,
    }
}

// ---------------------------------------------------------------------------
// Select
// ---------------------------------------------------------------------------

#[test]
fn test_select_parses_rows_and_sends_auth_headers() {
    let rows = r#"[
        {"id": 1, "name": "Pakil River", "location": "Pakil, Laguna",
         "latitude": 14.38, "longitude": 121.48, "water_level": 3.2,
         "max_capacity": 10, "status": "warning",
         "created_at": "2025-01-10T08:00:00+00:00"},
        {"id": 2, "name": "Paete Creek", "location": "Paete, Laguna",
         "latitude": 14.36, "longitude": 121.48, "water_level": null,
         "max_capacity": 8, "status": null,
         "created_at": "2025-01-11T08:00:00+00:00"}
    ]"#;
    let (base, server) = serve_once("200 OK", rows);

    let gauges = store_at(&base).select_all().expect("select should succeed");
    let request = server.join().unwrap();

    assert_eq!(gauges.len(), 2);
    assert_eq!(gauges[0].id, GaugeId("1".to_string()));
    assert_eq!(gauges[0].status, GaugeStatus::Warning);
    assert_eq!(gauges[1].status, GaugeStatus::Unknown);
    assert_eq!(gauges[1].water_level, 0.0);

    assert!(request.starts_with("GET /rest/v1/water_gauges?select=*&order=created_at.asc"));
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("apikey: anon-key"));
    assert!(lower.contains("authorization: bearer anon-key"));
}

#[test]
fn test_malformed_body_is_a_parse_error() {
    let (base, server) = serve_once("200 OK", "<html>maintenance</html>");
    let result = store_at(&base).select_all();
    server.join().unwrap();
    assert!(matches!(result, Err(StoreError::ParseError(_))));
}

#[test]
fn test_zone_less_timestamps_and_null_names_still_load() {
    let rows = r#"[
        {"id": 1, "name": "Pakil River", "location": "Pakil, Laguna",
         "latitude": 14.38, "longitude": 121.48, "water_level": 3.2,
         "max_capacity": 10, "status": "normal",
         "created_at": "2025-01-10T08:00:00.123456"},
        {"id": 2, "name": null, "location": "Paete, Laguna",
         "latitude": 14.36, "longitude": 121.48, "water_level": 1,
         "max_capacity": 8, "status": "warning",
         "created_at": "2025-01-11T08:00:00"}
    ]"#;
    let (base, server) = serve_once("200 OK", rows);

    let gauges = store_at(&base).select_all().expect("select should succeed");
    server.join().unwrap();

    assert_eq!(gauges.len(), 2);
    assert_eq!(gauges[0].name, "Pakil River");
    assert_eq!(gauges[1].name, "");
    assert_eq!(gauges[1].status, GaugeStatus::Warning);
    assert!(gauges[0].created_at < gauges[1].created_at);
}

#[test]
fn test_one_bad_row_does_not_hide_the_others() {
    let rows = r#"[
        {"id": 1, "name": "Pakil River", "location": "Pakil, Laguna",
         "latitude": 14.38, "longitude": 121.48,
         "created_at": "2025-01-10T08:00:00Z"},
        {"id": 2, "name": "No Timestamp", "location": "Paete, Laguna",
         "latitude": 14.36, "longitude": 121.48, "created_at": null}
    ]"#;
    let (base, server) = serve_once("200 OK", rows);

    let gauges = store_at(&base).select_all().expect("select should succeed");
    server.join().unwrap();

    assert_eq!(gauges.len(), 1);
    assert_eq!(gauges[0].id, GaugeId("1".to_string()));
}

#[test]
fn test_server_error_carries_store_message() {
    let (base, server) = serve_once(
        "500 Internal Server Error",
        r#"{"code":"XX000","message":"database is starting up"}"#,
    );
    let result = store_at(&base).select_all();
    server.join().unwrap();
    assert_eq!(
        result,
        Err(StoreError::HttpError(500, "database is starting up".to_string()))
    );
}

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

#[test]
fn test_insert_posts_defaults_and_returns_representation() {
    let created = r#"[{"id": 7, "name": "Test Gauge", "location": "Test City",
        "latitude": 14.6, "longitude": 120.98, "water_level": 0,
        "max_capacity": 10, "status": "normal",
        "created_at": "2025-01-12T08:00:00+00:00"}]"#;
    let (base, server) = serve_once("201 Created", created);

    let record = store_at(&base).insert(&new_gauge()).expect("insert should succeed");
    let request = server.join().unwrap();

    assert_eq!(record.id, GaugeId("7".to_string()));
    assert_eq!(record.status, GaugeStatus::Normal);

    assert!(request.starts_with("POST /rest/v1/water_gauges "));
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("prefer: return=representation"));

    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let sent: serde_json::Value = serde_json::from_str(body).unwrap();
    let row = &sent[0];
    assert_eq!(row["name"], "Test Gauge");
    assert_eq!(row["water_level"], 0.0);
    assert_eq!(row["max_capacity"], 10.0);
    assert_eq!(row["status"], "normal");
    assert!(row.get("id").is_none(), "id is assigned by the store");
}

#[test]
fn test_insert_with_empty_representation_is_rejected() {
    let (base, server) = serve_once("201 Created", "[]");
    let result = store_at(&base).insert(&new_gauge());
    server.join().unwrap();
    assert!(matches!(result, Err(StoreError::Rejected(_))));
}
