//! Givelane Escrow Server - 慈善捐赠市场的资金托管服务
//!
//! # 架构概述
//!
//! 本模块是托管订单服务的主入口，提供以下核心功能：
//!
//! - **状态机** (`escrow::machine`): 订单生命周期的纯状态转换
//! - **扫描器** (`escrow::sweeper`): 到期定时器的周期性处理
//! - **捐赠计算** (`escrow::donation`): 成交额中慈善份额的计算
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! escrow-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── escrow/        # 订单状态机、仓库、服务、扫描器
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志等工具
//! ```

pub mod api;
pub mod core;
pub mod escrow;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use escrow::{
    CreateOrderInput, DeadlineIndex, DeadlineSweeper, EscrowOrderService, MemoryOrderRepository,
    OrderRepository,
};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 设置运行环境 (dotenv + 日志)
///
/// 必须在读取 [`Config`] 之前调用，否则 .env 中的覆盖项不生效
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在不是错误
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______ _            __
  / ____/(_)_   _____ / /___ _____  ___
 / / __ / /| | / / _ \/ / __ `/ __ \/ _ \
/ /_/ // / | |/ /  __/ / /_/ / / / /  __/
\____//_/  |___/\___/_/\__,_/_/ /_/\___/
    "#
    );
}
