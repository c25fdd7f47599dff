//! 截止时间扫描器
//!
//! 周期性扫描 [`DeadlineIndex`]，将到期的定时器转换为状态机事件。
//! 单个订单的失败不会中断整轮扫描；与人工操作竞争时由 CAS 版本
//! 仲裁，扫描器输掉的竞争留给下一轮重新评估。

use std::sync::Arc;
use std::time::Duration;

use shared::util::now_millis;
use tokio_util::sync::CancellationToken;

use super::service::EscrowOrderService;

/// 单轮扫描的统计结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// 到期条目数
    pub due: usize,
    /// 实际完成状态转换的订单数
    pub applied: usize,
    /// 过期索引条目（定时器已被清除）
    pub stale: usize,
    /// 处理失败（错误或超时）的订单数
    pub failed: usize,
}

/// 截止时间扫描器
///
/// 注册为 `TaskKind::Periodic`，在 `start_background_tasks()` 中启动。
pub struct DeadlineSweeper {
    service: Arc<EscrowOrderService>,
    shutdown: CancellationToken,
    interval: Duration,
    per_order_timeout: Duration,
}

impl DeadlineSweeper {
    pub fn new(
        service: Arc<EscrowOrderService>,
        shutdown: CancellationToken,
        interval_ms: u64,
        per_order_timeout_ms: u64,
    ) -> Self {
        Self {
            service,
            shutdown,
            interval: Duration::from_millis(interval_ms),
            per_order_timeout: Duration::from_millis(per_order_timeout_ms),
        }
    }

    /// 主循环：固定间隔触发，响应 shutdown 信号
    pub async fn run(self) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Deadline sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        // 错过的 tick 合并为一次，不追赶
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // 第一个 tick 立即完成，跳过它，避免启动时空扫
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.sweep_once(now_millis()).await;
                    if stats.due > 0 {
                        tracing::info!(
                            due = stats.due,
                            applied = stats.applied,
                            stale = stats.stale,
                            failed = stats.failed,
                            "Sweep completed"
                        );
                    }
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Deadline sweeper received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Deadline sweeper stopped");
    }

    /// 扫描一轮：评估所有到期条目
    ///
    /// 对每个订单单独限时，避免单个慢订单拖垮整轮扫描。
    pub async fn sweep_once(&self, now: i64) -> SweepStats {
        let due = self.service.deadline_index().due(now);
        let mut stats = SweepStats {
            due: due.len(),
            ..Default::default()
        };

        for (order_id, kind) in due {
            let fire = self.service.fire_deadline(&order_id, kind, now);
            match tokio::time::timeout(self.per_order_timeout, fire).await {
                Ok(Ok(true)) => stats.applied += 1,
                Ok(Ok(false)) => stats.stale += 1,
                Ok(Err(e)) => {
                    stats.failed += 1;
                    tracing::error!(order_id = %order_id, kind = %kind, "Deadline firing failed: {}", e);
                }
                Err(_) => {
                    stats.failed += 1;
                    tracing::error!(order_id = %order_id, kind = %kind, "Deadline firing timed out");
                }
            }
        }

        stats
    }
}
