//! Rest Audit - HTTP 审计捕获中间件
//!
//! 这个库为请求服务型应用提供嵌入式的审计捕获管线：对选定的端点
//! 记录请求/响应的元数据和报文体，限制捕获数据的大小，并把结构化的
//! 审计记录异步转发到可插拔的 Sink，全程不阻塞、不破坏原始的 HTTP 交互。
//!
//! # 核心特性
//!
//! - **非破坏性捕获**：请求体/响应体在只能读一次的流模型上各自缓冲一份，
//!   应用和审计各读一次，客户端收到的字节与关闭审计时完全一致
//! - **声明式选择**：处理器（方法级）或其分组（控制器级）带有审计标记
//!   才产生记录，方法级标记优先；未标记的请求不触碰 Sink
//! - **大小限制**：捕获的报文体按配置的最大字符数截断，带固定截断标记
//! - **异步投递**：记录通过 channel 交给后台任务投递，请求路径上
//!   不等待任何确认；投递失败记日志丢弃，永远不影响交互本身
//! - **可插拔 Sink**：默认在启用 `kafka` feature 且配置了 broker 时发布到
//!   Kafka 主题，否则落回本地日志 Sink；也可以显式注入自定义 Sink
//!
//! 注意：请求头不做脱敏，authorization/cookie 等敏感头会原样进入记录；
//! 捕获对每个请求无条件安装（是否审计要到分发后才知道），内存开销
//! 与报文体大小成正比。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use rest_audit::*;
//! use hyper::{Body, Request, Response};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. 配置，启动时校验
//!     let config = Arc::new(RestAuditConfig::default());
//!     config.validate().expect("invalid rest-audit configuration");
//!
//!     // 2. 选定 Sink 并启动后台处理器
//!     let sink = build_sink(&config, None);
//!     let processor = AuditProcessor::new(sink);
//!
//!     // 3. 登记审计标记
//!     let resolver = Arc::new(
//!         StaticMarkerResolver::new()
//!             .mark_method("UserController::login", AuditMarker::new("login-audit")),
//!     );
//!
//!     // 4. 用中间件包住处理器
//!     let req = Request::new(Body::empty());
//!     let _response = with_audit(
//!         req,
//!         my_handler,
//!         config.clone(),
//!         resolver.clone(),
//!         processor.sender(),
//!     )
//!     .await;
//! }
//!
//! async fn my_handler(
//!     _req: Request<Body>,
//! ) -> Result<Response<Body>, Box<dyn std::error::Error + Send + Sync>> {
//!     let mut response = Response::new(Body::from("Hello"));
//!     // 宿主框架在分发后附加处理器元数据
//!     response
//!         .extensions_mut()
//!         .insert(HandlerRef::new("UserController", "UserController::login"));
//!     Ok(response)
//! }
//! ```

pub mod capture;
pub mod config;
pub mod extract;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod marker;
pub mod middleware;
pub mod sink;
pub mod truncate;
pub mod types;

// 重新导出主要类型
pub use capture::{CapturedRequest, CapturedResponse};
pub use config::{ConfigError, KafkaSinkConfig, ResponseConfig, RestAuditConfig, SinkConfig};
pub use extract::build_record;
#[cfg(feature = "kafka")]
pub use kafka::KafkaAuditSink;
pub use marker::{select_marker, AuditMarker, HandlerRef, MarkerResolver, StaticMarkerResolver};
pub use middleware::with_audit;
pub use sink::{build_sink, AuditProcessor, AuditSink, LogSink};
pub use truncate::{truncate, TRUNCATION_MARKER};
pub use types::AuditRecord;
