/// 服务器配置 - 托管订单服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | SWEEP_INTERVAL_MS | 60000 | 到期扫描周期(毫秒) |
/// | SWEEP_ORDER_TIMEOUT_MS | 5000 | 单订单处理超时(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录，未设置时仅输出到控制台 |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=8080 SWEEP_INTERVAL_MS=1000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 到期扫描周期 (毫秒)
    pub sweep_interval_ms: u64,
    /// 单订单扫描处理超时 (毫秒)，防止单个卡住的订单拖慢整轮扫描
    pub sweep_order_timeout_ms: u64,
    /// 日志级别
    pub log_level: String,
    /// 日志文件目录 (可选)
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            sweep_interval_ms: std::env::var("SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60_000),
            sweep_order_timeout_ms: std::env::var("SWEEP_ORDER_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5_000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
