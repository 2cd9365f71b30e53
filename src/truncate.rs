//! 截断策略
//!
//! 捕获到的请求体/响应体按配置的最大长度截断，超出部分丢弃，
//! 只保留一个固定的截断标记。这里的长度按字符计，不按字节计，
//! 避免在多字节字符中间切开。

/// 固定的截断标记，追加在被截断文本的末尾
pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// 截断文本到最多 `max_length` 个字符
///
/// 长度不超过 `max_length` 时原样返回；否则返回前 `max_length` 个字符
/// 加上 [`TRUNCATION_MARKER`]。除标记本身外不保留任何被裁剪量的信息。
///
/// `max_length` 为 0 属于配置错误，由 `RestAuditConfig::validate`
/// 在启动时拒绝，这里不做检查。此函数是纯函数，且满足幂等性：
/// 截断结果再次截断不会发生变化。
pub fn truncate(input: &str, max_length: usize) -> String {
    match input.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}{}", &input[..cut], TRUNCATION_MARKER),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_unchanged() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("", 10), "");
        // 恰好等于上限也不截断
        assert_eq!(truncate("abcde", 5), "abcde");
    }

    #[test]
    fn test_truncates_with_marker() {
        let result = truncate("abcdefghijklmno", 10);
        assert_eq!(result, format!("abcdefghij{}", TRUNCATION_MARKER));
    }

    #[test]
    fn test_idempotent() {
        let once = truncate("abcdefghijklmno", 10);
        let twice = truncate(&once, 10);
        assert_eq!(once, twice);

        let short = truncate("abc", 10);
        assert_eq!(truncate(&short, 10), short);
    }

    #[test]
    fn test_char_semantics() {
        // 按字符截断，不会切在多字节字符中间
        let result = truncate("审计日志审计日志", 3);
        assert_eq!(result, format!("审计日{}", TRUNCATION_MARKER));
    }
}
