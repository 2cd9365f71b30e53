//! 审计记录提取
//!
//! 在处理器完成之后、响应回放之前，从捕获到的请求/响应、
//! 进入时刻和选中的标记组装出一条 [`AuditRecord`]。
//! 每个被审计的请求恰好执行一次。
//!
//! 提取过程中的编码问题（非 UTF-8 的请求头或请求体）就地降级处理，
//! 绝不把错误抛回客户端正在等待的交互。

use crate::capture::{CapturedRequest, CapturedResponse};
use crate::config::RestAuditConfig;
use crate::marker::AuditMarker;
use crate::truncate::truncate;
use crate::types::AuditRecord;
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Instant;

/// 组装一条审计记录
///
/// `started` 必须是请求进入中间件时最早记录的时刻，这样耗时
/// 才包含框架本身的开销。
pub fn build_record(
    config: &RestAuditConfig,
    request: &CapturedRequest,
    response: &CapturedResponse,
    marker: &AuditMarker,
    started: Instant,
) -> AuditRecord {
    let max_length = config.response.max_length;

    AuditRecord {
        service_id: config.service_id.clone(),
        method: request.method().to_string(),
        url: request.path().to_string(),
        status_code: response.status().as_u16(),
        headers: collect_headers(request),
        request_body: request_body_text(request, max_length),
        response_body: response_body_text(response, max_length),
        message: marker.message.clone(),
        duration_millis: started.elapsed().as_millis() as u64,
        timestamp: Utc::now(),
    }
}

/// 收集全部请求头。同名请求头按出现顺序覆盖，只留最后一个值；
/// 非 UTF-8 的值做有损转换而不是丢弃整条记录。不做任何脱敏。
fn collect_headers(request: &CapturedRequest) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for (name, value) in request.headers() {
        headers.insert(
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    headers
}

/// 请求体文本。仅在 Content-Type 包含 application/json 且请求体非空时存在。
fn request_body_text(request: &CapturedRequest, max_length: usize) -> Option<String> {
    if !is_json_request(request) {
        return None;
    }
    body_text(request.capture_as_bytes(), max_length)
}

/// 响应体文本。仅在 Content-Type 包含 application/json、text/json
/// 或 text/html 且响应体非空时存在。
fn response_body_text(response: &CapturedResponse, max_length: usize) -> Option<String> {
    if !is_auditable_response(response) {
        return None;
    }
    body_text(response.capture_as_bytes(), max_length)
}

fn body_text(bytes: &[u8], max_length: usize) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    Some(truncate(&String::from_utf8_lossy(bytes), max_length))
}

fn is_json_request(request: &CapturedRequest) -> bool {
    request
        .content_type()
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false)
}

fn is_auditable_response(response: &CapturedResponse) -> bool {
    response
        .content_type()
        .map(|ct| {
            ct.contains("application/json") || ct.contains("text/json") || ct.contains("text/html")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truncate::TRUNCATION_MARKER;
    use hyper::{Body, Request, Response};

    async fn capture_request(req: Request<Body>) -> CapturedRequest {
        let (_, captured) = CapturedRequest::wrap(req).await.unwrap();
        captured
    }

    fn config_with_max(max_length: usize) -> RestAuditConfig {
        let mut config = RestAuditConfig::default();
        config.response.max_length = max_length;
        config
    }

    #[tokio::test]
    async fn test_builds_full_record() {
        let request = capture_request(
            Request::builder()
                .method("POST")
                .uri("http://localhost/api/login")
                .header("content-type", "application/json")
                .header("authorization", "Bearer secret")
                .body(Body::from(r#"{"user":"a"}"#))
                .unwrap(),
        )
        .await;
        let response = CapturedResponse::wrap(
            Response::builder()
                .status(200)
                .header("content-type", "application/json")
                .body(Body::from(r#"{"ok":true}"#))
                .unwrap(),
        )
        .await
        .unwrap();

        let record = build_record(
            &config_with_max(1024),
            &request,
            &response,
            &AuditMarker::new("login-audit"),
            Instant::now(),
        );

        assert_eq!(record.service_id, "default-service-id");
        assert_eq!(record.method, "POST");
        assert_eq!(record.url, "/api/login");
        assert_eq!(record.status_code, 200);
        assert_eq!(record.message, "login-audit");
        assert_eq!(record.request_body.as_deref(), Some(r#"{"user":"a"}"#));
        assert_eq!(record.response_body.as_deref(), Some(r#"{"ok":true}"#));
        // 请求头全部保留，包括敏感头
        assert_eq!(
            record.headers.get("authorization").map(String::as_str),
            Some("Bearer secret")
        );
    }

    #[tokio::test]
    async fn test_non_json_request_body_absent() {
        let request = capture_request(
            Request::builder()
                .uri("http://localhost/api/raw")
                .header("content-type", "text/plain")
                .body(Body::from("raw text"))
                .unwrap(),
        )
        .await;
        let response = CapturedResponse::wrap(Response::new(Body::empty()))
            .await
            .unwrap();

        let record = build_record(
            &config_with_max(1024),
            &request,
            &response,
            &AuditMarker::unlabeled(),
            Instant::now(),
        );
        assert!(record.request_body.is_none());
        // 响应没有 Content-Type 且为空，也应缺失
        assert!(record.response_body.is_none());
    }

    #[tokio::test]
    async fn test_empty_json_body_absent() {
        let request = capture_request(
            Request::builder()
                .uri("http://localhost/api/empty")
                .header("content-type", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let response = CapturedResponse::wrap(
            Response::builder()
                .header("content-type", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        let record = build_record(
            &config_with_max(1024),
            &request,
            &response,
            &AuditMarker::unlabeled(),
            Instant::now(),
        );
        // 空请求体/响应体不应出现为空字符串
        assert!(record.request_body.is_none());
        assert!(record.response_body.is_none());
    }

    #[tokio::test]
    async fn test_html_response_body_present_and_truncated() {
        let request = capture_request(
            Request::builder()
                .uri("http://localhost/page")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let response = CapturedResponse::wrap(
            Response::builder()
                .header("content-type", "text/html; charset=utf-8")
                .body(Body::from("abcdefghijklmno"))
                .unwrap(),
        )
        .await
        .unwrap();

        let record = build_record(
            &config_with_max(10),
            &request,
            &response,
            &AuditMarker::unlabeled(),
            Instant::now(),
        );
        assert_eq!(
            record.response_body.as_deref(),
            Some(format!("abcdefghij{}", TRUNCATION_MARKER).as_str())
        );
    }

    #[tokio::test]
    async fn test_duplicate_headers_collapse_to_last() {
        let request = capture_request(
            Request::builder()
                .uri("http://localhost/dup")
                .header("x-trace", "first")
                .header("x-trace", "second")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let response = CapturedResponse::wrap(Response::new(Body::empty()))
            .await
            .unwrap();

        let record = build_record(
            &config_with_max(1024),
            &request,
            &response,
            &AuditMarker::unlabeled(),
            Instant::now(),
        );
        assert_eq!(
            record.headers.get("x-trace").map(String::as_str),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_non_utf8_body_degrades_lossily() {
        let request = capture_request(
            Request::builder()
                .uri("http://localhost/api/bin")
                .header("content-type", "application/json")
                .body(Body::from(vec![0x7b, 0xff, 0xfe, 0x7d]))
                .unwrap(),
        )
        .await;
        let response = CapturedResponse::wrap(Response::new(Body::empty()))
            .await
            .unwrap();

        let record = build_record(
            &config_with_max(1024),
            &request,
            &response,
            &AuditMarker::unlabeled(),
            Instant::now(),
        );
        // 有损转换而不是失败，记录仍然产出
        let body = record.request_body.unwrap();
        assert!(body.starts_with('{'));
        assert!(body.ends_with('}'));
    }
}
