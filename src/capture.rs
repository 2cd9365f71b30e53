//! 请求/响应捕获
//!
//! hyper 的 `Body` 是只能读一次的字节流。为了让应用和审计逻辑各读一次，
//! 这里把请求体和响应体分别聚合成交互内独占的缓冲区：
//!
//! - 请求体先完整聚合，交给处理器的是一个携带缓冲区廉价克隆的重建请求；
//! - 响应体在处理器完成后完整聚合，审计读取完毕后通过 [`CapturedResponse::replay`]
//!   把缓冲的字节原样发回真正的传输层，且只发一次。
//!
//! 捕获对每个请求无条件安装：某个请求是否被审计要等处理器执行完、
//! 处理器元数据可用之后才知道。这意味着不被审计的请求同样要付出
//! 与请求体大小成正比的内存成本，这是有意保留的行为。
//!
//! 聚合过程中传输层的错误（`hyper::Error`）原样向上传播，
//! 捕获逻辑绝不吞掉传输错误。

use crate::marker::HandlerRef;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use hyper::{Body, Request, Response};

/// 已捕获的请求
///
/// 保留请求头和完整的请求体缓冲，处理器拿到的是等价的重建请求。
pub struct CapturedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    buffer: Bytes,
}

impl CapturedRequest {
    /// 包装一个入站请求：聚合请求体，返回交给处理器的重建请求和捕获结果
    pub async fn wrap(req: Request<Body>) -> Result<(Request<Body>, Self), hyper::Error> {
        let (parts, body) = req.into_parts();
        let buffer = hyper::body::to_bytes(body).await?;

        let captured = Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            buffer: buffer.clone(),
        };

        let replayed = Request::from_parts(parts, Body::from(buffer));
        Ok((replayed, captured))
    }

    /// 到目前为止缓冲的完整请求体字节
    pub fn capture_as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 请求路径（不含主机名）
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 请求的 Content-Type 头。值不是合法 ASCII 时视为缺失。
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// 已捕获的响应
///
/// 持有响应头部和完整的响应体缓冲。在审计读取完成后必须调用
/// [`replay`](Self::replay) 把缓冲的字节真正发给客户端，否则客户端
/// 收不到响应体。`replay` 消耗 `self`，保证回放恰好发生一次。
pub struct CapturedResponse {
    parts: http::response::Parts,
    buffer: Bytes,
}

impl CapturedResponse {
    /// 包装处理器返回的响应：聚合响应体并持有头部
    pub async fn wrap(response: Response<Body>) -> Result<Self, hyper::Error> {
        let (parts, body) = response.into_parts();
        let buffer = hyper::body::to_bytes(body).await?;
        Ok(Self { parts, buffer })
    }

    /// 到目前为止缓冲的完整响应体字节
    pub fn capture_as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    /// 响应的 Content-Type 头。值不是合法 ASCII 时视为缺失。
    pub fn content_type(&self) -> Option<&str> {
        self.parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// 框架在分发后附加到响应 extensions 上的处理器元数据
    pub fn handler_ref(&self) -> Option<&HandlerRef> {
        self.parts.extensions.get::<HandlerRef>()
    }

    /// 把缓冲的响应字节回放给真正的传输层
    ///
    /// 返回的响应与处理器写出的响应逐字节一致。消耗 `self`，
    /// 每个交互只能回放一次。
    pub fn replay(self) -> Response<Body> {
        Response::from_parts(self.parts, Body::from(self.buffer))
    }
}
