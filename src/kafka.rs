//! Kafka Sink
//!
//! 默认的 broker 投递实现：把审计记录序列化成 JSON，以无 key 消息
//! 发布到配置的主题（记录之间不保证顺序）。生产者参数
//! （确认级别、客户端标识、空闲/阻塞超时）全部来自配置。
//!
//! 主题的创建（分区数、副本因子）是启动时做一次的基础设施副作用，
//! 不在每条记录的发送路径上；创建失败只记日志，不影响应用启动。
//!
//! 整个模块在 `kafka` feature 之后，默认构建不携带 librdkafka。

use crate::config::KafkaSinkConfig;
use crate::sink::AuditSink;
use crate::types::AuditRecord;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{BaseRecord, DefaultProducerContext, ThreadedProducer};

/// Kafka 审计 Sink
///
/// 内部的 `ThreadedProducer` 自带发送队列和轮询线程：`send_audit_data`
/// 只是把消息放进队列，立即返回。队列满（broker 不可达、背压）时
/// 记日志并丢弃该条记录——尽力而为投递，绝不阻塞请求路径。
pub struct KafkaAuditSink {
    producer: ThreadedProducer<DefaultProducerContext>,
    topic: String,
}

impl KafkaAuditSink {
    /// 用给定配置创建 Sink，并在后台发起一次主题创建
    pub fn new(config: &KafkaSinkConfig) -> Result<Self, KafkaError> {
        let client_config = Self::client_config(config);
        let producer: ThreadedProducer<DefaultProducerContext> = client_config.create()?;

        Self::provision_topic(config);

        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }

    fn client_config(config: &KafkaSinkConfig) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("acks", &config.acks)
            .set("connections.max.idle.ms", config.max_idle_ms.to_string())
            .set("message.timeout.ms", config.max_block_ms.to_string());
        client_config
    }

    /// 启动时创建审计主题（幂等：主题已存在时 broker 返回错误，这里只记日志）
    fn provision_topic(config: &KafkaSinkConfig) {
        let client_config = Self::client_config(config);
        let topic = config.topic.clone();
        let partitions = config.partition_count;
        let replication = config.replication_factor;

        tokio::spawn(async move {
            let admin: AdminClient<DefaultClientContext> = match client_config.create() {
                Ok(admin) => admin,
                Err(e) => {
                    tracing::error!("Failed to create Kafka admin client for topic provisioning: {}", e);
                    return;
                }
            };

            let new_topic = NewTopic::new(&topic, partitions, TopicReplication::Fixed(replication));
            match admin.create_topics(&[new_topic], &AdminOptions::new()).await {
                Ok(results) => {
                    for result in results {
                        match result {
                            Ok(name) => tracing::debug!("Created audit topic '{}'", name),
                            Err((name, code)) => tracing::debug!(
                                "Audit topic '{}' not created ({}), assuming it already exists",
                                name,
                                code
                            ),
                        }
                    }
                }
                Err(e) => tracing::error!("Audit topic provisioning failed: {}", e),
            }
        });
    }
}

impl AuditSink for KafkaAuditSink {
    fn send_audit_data(&self, record: AuditRecord) {
        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize audit record for Kafka: {}", e);
                return;
            }
        };

        // 无 key 消息：不指定分区键，记录之间不保证顺序
        let message = BaseRecord::<(), str>::to(&self.topic).payload(payload.as_str());
        if let Err((e, _)) = self.producer.send(message) {
            tracing::error!("Failed to enqueue audit record to Kafka, dropping it: {}", e);
        }
    }
}
