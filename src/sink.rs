//! 审计记录接收器
//!
//! Sink 是审计记录的可插拔投递目标。对调用方来说投递是 fire-and-forget：
//! 中间件把记录交给 [`AuditProcessor`] 的 channel 之后立即返回，
//! 真正的投递在后台任务里进行，绝不实质性阻塞请求路径。
//!
//! 投递失败由 Sink 自己记日志并丢弃，永远不会作为错误传回 HTTP 交互。
//! 同一时间只有一个 Sink 生效，在启动时通过 [`build_sink`] 选定，
//! 之后不再更换。

use crate::config::RestAuditConfig;
use crate::types::AuditRecord;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 审计记录接收器 trait
///
/// 实现必须允许多个交互并发调用：配置在启动后不可变，
/// 内部发送路径需要自己保证并发安全。
pub trait AuditSink: Send + Sync {
    /// 投递一条审计记录（fire-and-forget，由后台任务调用）
    fn send_audit_data(&self, record: AuditRecord);
}

/// 本地日志 Sink
///
/// 把记录序列化成 JSON 并通过 `tracing` 输出。这是未配置任何
/// 外部 broker 时的零依赖默认实现，也可用于本地调试。
pub struct LogSink;

impl AuditSink for LogSink {
    fn send_audit_data(&self, record: AuditRecord) {
        match serde_json::to_string(&record) {
            Ok(json) => tracing::info!(target: "rest_audit", "{}", json),
            Err(e) => tracing::error!("Failed to serialize audit record: {}", e),
        }
    }
}

/// 审计记录处理器（后台任务）
///
/// 持有一个无界 channel 的发送端；后台任务不断取出记录交给选定的 Sink。
/// 这是中间件与投递之间唯一的异步交接点。
///
/// # 示例
///
/// ```rust
/// use rest_audit::{AuditProcessor, LogSink};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let processor = AuditProcessor::new(Arc::new(LogSink));
/// let sender = processor.sender();
/// # });
/// ```
pub struct AuditProcessor {
    sender: mpsc::UnboundedSender<AuditRecord>,
}

impl AuditProcessor {
    /// 创建新的处理器并启动后台投递任务
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditRecord>();

        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                sink.send_audit_data(record);
            }
            tracing::debug!("Audit processor task terminated");
        });

        Self { sender: tx }
    }

    /// 投递一条记录（非阻塞）。处理器已关闭时记日志并丢弃。
    pub fn send(&self, record: AuditRecord) {
        if self.sender.send(record).is_err() {
            tracing::error!("Failed to hand audit record to processor: channel closed");
        }
    }

    /// 获取发送端的克隆，供中间件使用
    pub fn sender(&self) -> mpsc::UnboundedSender<AuditRecord> {
        self.sender.clone()
    }
}

/// 启动时选定生效的 Sink
///
/// 显式注入的自定义 Sink 优先；否则在启用 `kafka` feature 且配置了
/// broker 时使用 Kafka Sink；两者都没有时落回 [`LogSink`]。
/// Kafka Sink 构建失败（例如 broker 地址非法）只降级到 [`LogSink`]
/// 并记日志，不会阻止应用启动。
pub fn build_sink(
    config: &RestAuditConfig,
    custom: Option<Arc<dyn AuditSink>>,
) -> Arc<dyn AuditSink> {
    if let Some(sink) = custom {
        return sink;
    }

    #[cfg(feature = "kafka")]
    if let Some(kafka) = &config.sink.kafka {
        match crate::kafka::KafkaAuditSink::new(kafka) {
            Ok(sink) => return Arc::new(sink),
            Err(e) => {
                tracing::error!("Failed to build Kafka audit sink, falling back to log: {}", e);
            }
        }
    }

    #[cfg(not(feature = "kafka"))]
    if config.sink.kafka.is_some() {
        tracing::warn!(
            "sink.kafka is configured but the crate was built without the `kafka` feature; \
             using the local log sink"
        );
    }

    Arc::new(LogSink)
}
