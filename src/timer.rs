//! 按序号管理的数据包定时器表
//!
//! 针对每个在途数据包维护一个命名定时器，由周期性的定时器中断
//! 协作轮询：每次调用 `fire_expired` 扫描全部活动定时器，按序号
//! 升序返回已到期者，保证重传级联的顺序可复现。

use crate::sim::SimTime;
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// 默认的定时器容量上限。
pub const MAX_TIMERS: usize = 1024;

#[derive(Debug, Clone)]
struct TimerSlot {
    interval: SimTime,
    next_fire: SimTime,
    active: bool,
}

/// 数据包定时器表。键为数据包序号。
///
/// 对不存在的键执行 start/stop/destroy 均为无操作；重复 start 活动
/// 定时器同样幂等。超出容量的 new_timer 记录日志后丢弃，不视为错误。
#[derive(Debug)]
pub struct TimerTable {
    slots: BTreeMap<u32, TimerSlot>,
    capacity: usize,
}

impl Default for TimerTable {
    fn default() -> Self {
        TimerTable::with_capacity(MAX_TIMERS)
    }
}

impl TimerTable {
    pub fn with_capacity(capacity: usize) -> Self {
        TimerTable {
            slots: BTreeMap::new(),
            capacity,
        }
    }

    /// 创建定时器（未启动）。已存在同键定时器或超出容量时为无操作。
    pub fn new_timer(&mut self, key: u32, interval: SimTime) {
        if self.slots.len() >= self.capacity {
            warn!(key, capacity = self.capacity, "定时器数量超出上限，忽略");
            return;
        }
        if self.slots.contains_key(&key) {
            trace!(key, "定时器已存在，忽略");
            return;
        }
        self.slots.insert(
            key,
            TimerSlot {
                interval,
                next_fire: SimTime::ZERO,
                active: false,
            },
        );
    }

    /// 启动（或重新启动）定时器：下次到期时刻为 `now + interval`。
    pub fn start(&mut self, key: u32, now: SimTime) {
        if let Some(slot) = self.slots.get_mut(&key) {
            trace!(key, ?now, "启动定时器");
            slot.active = true;
            slot.next_fire = now.after(slot.interval);
        }
    }

    /// 停止定时器，保留槽位。
    pub fn stop(&mut self, key: u32) {
        if let Some(slot) = self.slots.get_mut(&key) {
            trace!(key, "停止定时器");
            slot.active = false;
        }
    }

    /// 销毁定时器，释放槽位。
    pub fn destroy(&mut self, key: u32) {
        if self.slots.remove(&key).is_some() {
            trace!(key, "销毁定时器");
        }
    }

    pub fn exists(&self, key: u32) -> bool {
        self.slots.contains_key(&key)
    }

    /// 当前活动定时器数。
    pub fn active_count(&self) -> usize {
        self.slots.values().filter(|s| s.active).count()
    }

    /// 返回所有已到期（`next_fire <= now` 且活动）的键，按升序排列，
    /// 并将其标记为不活动。调用方逐个处理后可自行重新启动。
    pub fn fire_expired(&mut self, now: SimTime) -> Vec<u32> {
        let mut fired = Vec::new();
        for (&key, slot) in self.slots.iter_mut() {
            if slot.active && slot.next_fire <= now {
                slot.active = false;
                fired.push(key);
            }
        }
        fired
    }
}
