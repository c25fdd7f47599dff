//! 时间与 ID 工具

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an opaque order id.
///
/// Order ids are plain UUID v4 strings; they carry no embedded
/// information and are safe to hand to external collaborators.
pub fn order_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_unique() {
        let a = order_id();
        let b = order_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_now_millis_monotone_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
    }
}
