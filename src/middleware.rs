//! 审计中间件实现
//!
//! [`with_audit`] 把捕获、选择、提取、投递串成一条管线，
//! 运行在宿主框架用来完成该交互的任务上，自身不另起任何任务。

use crate::capture::{CapturedRequest, CapturedResponse};
use crate::config::RestAuditConfig;
use crate::extract::build_record;
use crate::marker::{select_marker, MarkerResolver};
use crate::types::AuditRecord;
use hyper::{Body, Request, Response};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// 审计中间件
///
/// # 参数
/// - `req`: HTTP 请求
/// - `handler`: 业务处理函数（返回 Future）
/// - `config`: 启动时校验过的不可变配置
/// - `resolver`: 标记解析器，决定该请求是否被审计
/// - `record_sender`: 审计记录发送端，来自 `AuditProcessor::sender`
///
/// # 行为
/// 1. 进入时立即记录起始时刻，耗时因此包含框架开销；
/// 2. 无条件捕获请求体并重建请求——是否审计要等处理器执行完才知道；
/// 3. 执行处理器；处理器返回错误时原样向上传播，不产生记录；
/// 4. 无条件捕获响应体；
/// 5. 从响应 extensions 读取处理器元数据并解析标记，方法级优先于分组级；
///    没有标记时不构造记录、不触碰 Sink；
/// 6. 有标记时组装记录并以非阻塞方式交给处理器 channel；
/// 7. 把缓冲的响应字节回放给客户端。
///
/// 客户端收到的响应与关闭审计时逐字节一致，审计失败对 API
/// 消费者不可见；唯一的代价是缓冲带来的少量额外延迟。
pub async fn with_audit<F, Fut>(
    req: Request<Body>,
    handler: F,
    config: Arc<RestAuditConfig>,
    resolver: Arc<dyn MarkerResolver>,
    record_sender: mpsc::UnboundedSender<AuditRecord>,
) -> Result<Response<Body>, Box<dyn std::error::Error + Send + Sync>>
where
    F: FnOnce(Request<Body>) -> Fut,
    Fut: Future<Output = Result<Response<Body>, Box<dyn std::error::Error + Send + Sync>>>,
{
    // 起始时刻必须在一切工作之前记录
    let started = Instant::now();

    // 无条件安装请求捕获；传输错误原样传播
    let (replayed_req, captured_req) = CapturedRequest::wrap(req).await?;

    // 执行业务逻辑
    let response = handler(replayed_req).await?;

    // 无条件安装响应捕获
    let captured_resp = CapturedResponse::wrap(response).await?;

    // 处理器元数据在分发后才可用；缺失时等同于未标记
    if let Some(handler_ref) = captured_resp.handler_ref().cloned() {
        if let Some(marker) = select_marker(resolver.as_ref(), &handler_ref) {
            let record = build_record(&config, &captured_req, &captured_resp, &marker, started);
            if record_sender.send(record).is_err() {
                tracing::error!(
                    "Failed to hand audit record to processor for {} {}: channel closed",
                    captured_req.method(),
                    captured_req.path()
                );
            }
        }
    }

    // 把缓冲的响应字节回放给真正的传输层，恰好一次
    Ok(captured_resp.replay())
}
