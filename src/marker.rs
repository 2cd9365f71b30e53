//! 审计标记与选择逻辑
//!
//! 哪些请求需要审计由声明式的标记决定：先查处理器本身（方法级），
//! 没有时退回到处理器所属分组（控制器级）。两级都没有标记时，
//! 该请求不审计，不构造记录也不调用 Sink——这是主要的省开销路径。
//!
//! 标记查找通过 [`MarkerResolver`] 这个小接口完成，核心不依赖任何
//! 反射或注解运行时；宿主框架只需要在分发后把 [`HandlerRef`] 附到
//! 响应的 extensions 上。

use std::collections::HashMap;

/// 审计标记。出现即表示该处理器选择了审计，
/// `message` 是随标记声明的静态说明文字，默认为空。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditMarker {
    pub message: String,
}

impl AuditMarker {
    /// 创建带说明文字的标记
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// 创建不带说明文字的标记
    pub fn unlabeled() -> Self {
        Self {
            message: String::new(),
        }
    }
}

/// 处理器引用：宿主框架在分发后附加的处理器元数据。
///
/// `id` 标识处理器本身（方法级作用域），`group` 标识其所属分组
/// （类型/控制器级作用域）。由框架或处理器插入响应 extensions，
/// 中间件在处理器完成后读取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    pub id: String,
    pub group: String,
}

impl HandlerRef {
    pub fn new(group: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
        }
    }
}

/// 标记解析器 trait
///
/// 对应宿主框架的声明式标记查询能力，分别暴露方法级和分组级两个作用域。
pub trait MarkerResolver: Send + Sync {
    /// 查询处理器本身（方法级）的标记
    fn method_marker(&self, handler: &HandlerRef) -> Option<AuditMarker>;

    /// 查询处理器所属分组（控制器级）的标记
    fn group_marker(&self, handler: &HandlerRef) -> Option<AuditMarker>;
}

/// 按优先级选择生效的标记：方法级优先，其次分组级，两者都没有则不审计
pub fn select_marker(
    resolver: &dyn MarkerResolver,
    handler: &HandlerRef,
) -> Option<AuditMarker> {
    resolver
        .method_marker(handler)
        .or_else(|| resolver.group_marker(handler))
}

/// 基于静态注册表的标记解析器
///
/// 宿主在启动时按处理器 id / 分组名登记标记，运行期间只读。
pub struct StaticMarkerResolver {
    methods: HashMap<String, AuditMarker>,
    groups: HashMap<String, AuditMarker>,
}

impl StaticMarkerResolver {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// 为某个处理器（方法级）登记标记
    pub fn mark_method(mut self, id: impl Into<String>, marker: AuditMarker) -> Self {
        self.methods.insert(id.into(), marker);
        self
    }

    /// 为某个分组（控制器级）登记标记
    pub fn mark_group(mut self, group: impl Into<String>, marker: AuditMarker) -> Self {
        self.groups.insert(group.into(), marker);
        self
    }
}

impl Default for StaticMarkerResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerResolver for StaticMarkerResolver {
    fn method_marker(&self, handler: &HandlerRef) -> Option<AuditMarker> {
        self.methods.get(&handler.id).cloned()
    }

    fn group_marker(&self, handler: &HandlerRef) -> Option<AuditMarker> {
        self.groups.get(&handler.group).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_marker_takes_precedence() {
        let resolver = StaticMarkerResolver::new()
            .mark_method("UserController::login", AuditMarker::new("login-audit"))
            .mark_group("UserController", AuditMarker::new("default"));

        let handler = HandlerRef::new("UserController", "UserController::login");
        let marker = select_marker(&resolver, &handler).unwrap();
        assert_eq!(marker.message, "login-audit");
    }

    #[test]
    fn test_falls_back_to_group_marker() {
        let resolver = StaticMarkerResolver::new()
            .mark_group("UserController", AuditMarker::new("default"));

        let handler = HandlerRef::new("UserController", "UserController::profile");
        let marker = select_marker(&resolver, &handler).unwrap();
        assert_eq!(marker.message, "default");
    }

    #[test]
    fn test_unmarked_handler_not_selected() {
        let resolver = StaticMarkerResolver::new()
            .mark_method("OtherController::save", AuditMarker::unlabeled());

        let handler = HandlerRef::new("UserController", "UserController::profile");
        assert!(select_marker(&resolver, &handler).is_none());
    }

    #[test]
    fn test_unlabeled_marker_has_empty_message() {
        let resolver = StaticMarkerResolver::new()
            .mark_method("UserController::login", AuditMarker::unlabeled());

        let handler = HandlerRef::new("UserController", "UserController::login");
        let marker = select_marker(&resolver, &handler).unwrap();
        assert_eq!(marker.message, "");
    }
}
