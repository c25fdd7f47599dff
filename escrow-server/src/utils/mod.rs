//! 工具模块 - 通用工具函数
//!
//! # 内容
//!
//! - [`logger`] - 日志初始化

pub mod logger;

pub use logger::init_logger_with_file;
