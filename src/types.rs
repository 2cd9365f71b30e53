//! 公共类型定义

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// 审计记录
///
/// 每个被审计的 HTTP 交互产生一条记录。记录在处理器完成之后、
/// 响应回放之前构造一次，此后不再修改。核心不为记录分配任何 ID，
/// 需要 ID 的 Sink 可以自行分配。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// 发出记录的服务标识，来自配置
    pub service_id: String,
    /// HTTP 方法
    pub method: String,
    /// 请求路径（不含主机名）
    pub url: String,
    /// 响应状态码
    pub status_code: u16,
    /// 请求头。同名请求头只保留最后一个值。
    /// 注意：所有请求头都会被捕获，包括 authorization/cookie 等敏感头，
    /// 核心不做任何脱敏。
    pub headers: BTreeMap<String, String>,
    /// 请求体。仅当请求 Content-Type 包含 application/json 且请求体非空时存在，
    /// 超长部分按配置截断。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    /// 响应体。仅当响应 Content-Type 包含 application/json、text/json 或
    /// text/html 且响应体非空时存在，超长部分按配置截断。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    /// 标记上携带的静态说明文字，可能为空
    pub message: String,
    /// 从请求进入到处理完成的耗时（毫秒）
    pub duration_millis: u64,
    /// 处理完成时刻（UTC）
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuditRecord {
        AuditRecord {
            service_id: "svc-1".to_string(),
            method: "GET".to_string(),
            url: "/api/users".to_string(),
            status_code: 200,
            headers: BTreeMap::new(),
            request_body: None,
            response_body: Some("{}".to_string()),
            message: String::new(),
            duration_millis: 12,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["serviceId"], "svc-1");
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["durationMillis"], 12);
        assert_eq!(json["responseBody"], "{}");
    }

    #[test]
    fn test_absent_bodies_are_omitted() {
        let mut record = sample();
        record.response_body = None;
        let json = serde_json::to_value(record).unwrap();
        // 缺失的请求体/响应体不应序列化为 null，而是整个字段缺失
        assert!(json.get("requestBody").is_none());
        assert!(json.get("responseBody").is_none());
    }
}
