use std::sync::Arc;

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::Config;
use crate::escrow::{DeadlineIndex, DeadlineSweeper, EscrowOrderService, MemoryOrderRepository};

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是托管订单服务的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | service | Arc<EscrowOrderService> | 订单生命周期服务 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 订单生命周期服务
    pub service: Arc<EscrowOrderService>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`ServerState::initialize()`] 代替
    pub fn new(config: Config, service: Arc<EscrowOrderService>) -> Self {
        Self { config, service }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 订单仓库 (内存实现)
    /// 2. 截止时间索引
    /// 3. 订单生命周期服务
    pub fn initialize(config: &Config) -> Self {
        let repo = Arc::new(MemoryOrderRepository::new());
        let index = Arc::new(DeadlineIndex::new());
        let service = Arc::new(EscrowOrderService::new(repo, index));

        Self::new(config.clone(), service)
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 截止时间扫描器 (DeadlineSweeper)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let sweeper = DeadlineSweeper::new(
            self.service.clone(),
            tasks.shutdown_token(),
            self.config.sweep_interval_ms,
            self.config.sweep_order_timeout_ms,
        );
        tasks.spawn("deadline_sweeper", TaskKind::Periodic, sweeper.run());

        tasks
    }

    /// 获取订单服务
    pub fn order_service(&self) -> &Arc<EscrowOrderService> {
        &self.service
    }

    /// 获取截止时间索引
    pub fn deadline_index(&self) -> Arc<DeadlineIndex> {
        self.service.deadline_index()
    }
}
