//! Mock backend fixtures

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Payload of a fake spreadsheet part
pub fn xlsx_payload(index: u32) -> Vec<u8> {
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend_from_slice(format!("sheet-{index}").as_bytes());
    bytes
}

/// Mount the info endpoint answering `{"num_parts": total}`
pub async fn mount_info(server: &MockServer, format: &str, kind: &str, total: u32) {
    mount_info_body(server, format, kind, json!({ "num_parts": total })).await;
}

/// Mount the info endpoint answering `body`
pub async fn mount_info_body(
    server: &MockServer,
    format: &str,
    kind: &str,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{format}/{kind}/info")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount part `index`, suggesting `filename` when given
pub async fn mount_part(
    server: &MockServer,
    format: &str,
    kind: &str,
    index: u32,
    filename: Option<&str>,
) {
    mount_part_with(server, format, kind, index, part_response(index, filename)).await;
}

/// Mount part `index` with a custom response
pub async fn mount_part_with(
    server: &MockServer,
    format: &str,
    kind: &str,
    index: u32,
    response: ResponseTemplate,
) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{format}/{kind}/batch/{index}")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount part `index` expecting it never to be requested
pub async fn mount_unreachable_part(server: &MockServer, format: &str, kind: &str, index: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{format}/{kind}/batch/{index}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

/// Successful part response
pub fn part_response(index: u32, filename: Option<&str>) -> ResponseTemplate {
    let response = ResponseTemplate::new(200).set_body_bytes(xlsx_payload(index));
    match filename {
        Some(name) => response.insert_header(
            "Content-Disposition",
            format!("attachment; filename=\"{name}\"").as_str(),
        ),
        None => response,
    }
}

/// Successful part response delivered after `delay`
pub fn slow_part_response(index: u32, delay: Duration) -> ResponseTemplate {
    part_response(index, None).set_delay(delay)
}
