//! 配置定义
//!
//! 这个模块提供了审计管线的不可变配置结构。配置在启动时构造并校验，
//! 之后以 `Arc` 共享给各个组件，运行期间不再修改，因此不存在全局可变状态。
//!
//! 配置加载（文件解析、环境变量等）由宿主应用负责，这里只提供
//! `serde::Deserialize` 支持和带默认值的 `Default` 实现。

use serde::Deserialize;
use thiserror::Error;

/// 配置错误。任何一项校验失败都视为致命的启动错误，
/// 不允许带着非法配置开始处理流量。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("response.max_length must be greater than 0")]
    NonPositiveMaxLength,
    #[error("sink.kafka.partition_count must be greater than 0, got {0}")]
    NonPositivePartitionCount(i32),
    #[error("sink.kafka.replication_factor must be greater than 0, got {0}")]
    NonPositiveReplicationFactor(i32),
}

/// 审计管线配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestAuditConfig {
    /// 服务标识，写入每条审计记录
    pub service_id: String,
    /// 响应捕获相关配置
    pub response: ResponseConfig,
    /// Sink 相关配置
    pub sink: SinkConfig,
}

impl Default for RestAuditConfig {
    fn default() -> Self {
        Self {
            service_id: "default-service-id".to_string(),
            response: ResponseConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

impl RestAuditConfig {
    /// 校验配置。必须在启动时、处理任何请求之前调用。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response.max_length == 0 {
            return Err(ConfigError::NonPositiveMaxLength);
        }
        if let Some(kafka) = &self.sink.kafka {
            if kafka.partition_count <= 0 {
                return Err(ConfigError::NonPositivePartitionCount(
                    kafka.partition_count,
                ));
            }
            if kafka.replication_factor <= 0 {
                return Err(ConfigError::NonPositiveReplicationFactor(
                    kafka.replication_factor,
                ));
            }
        }
        Ok(())
    }
}

/// 响应捕获配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// 捕获的请求体/响应体的最大字符数，超出部分截断。
    /// 必须大于 0，为 0 时 `validate` 会报错。
    pub max_length: usize,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_length: 1024 * 10,
        }
    }
}

/// Sink 配置。`kafka` 为 `None` 时使用本地日志 Sink。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kafka: Option<KafkaSinkConfig>,
}

/// Kafka Sink 配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KafkaSinkConfig {
    /// broker 地址列表
    pub bootstrap_servers: String,
    /// 生产者客户端标识
    pub client_id: String,
    /// 确认级别，默认 "all" 以获得较强的持久性保证
    pub acks: String,
    /// 审计记录发布到的主题
    pub topic: String,
    /// 发布在放弃之前允许阻塞的最长时间（毫秒）
    pub max_block_ms: u64,
    /// 启动时创建主题使用的分区数
    pub partition_count: i32,
    /// 启动时创建主题使用的副本因子
    pub replication_factor: i32,
    /// 空闲连接保留的最长时间（毫秒）
    pub max_idle_ms: u64,
}

impl Default for KafkaSinkConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "rest-audit-client".to_string(),
            acks: "all".to_string(),
            topic: "rest-audit-api-sink".to_string(),
            max_block_ms: 2000,
            partition_count: 1,
            replication_factor: 1,
            max_idle_ms: 60000,
        }
    }
}
