use std::time::{Duration, Instant};

/// 睡眠截止原语，以单调时钟上的绝对时间点描述一次等待的最迟结束时刻。
///
/// # 设计背景（Why）
/// - 可中断睡眠的核心纪律是“进入等待前一次性折算出绝对截止点”：伪唤醒之后
///   继续朝同一个时间点等待，而不是基于剩余时长反复换算，从而天然免疫漂移。
/// - 选用 [`Instant`] 而非壁钟：挂钟回拨或闰秒调整不得改变等待时长。
///
/// # 契约说明（What）
/// - 截止点可以为空（未设置），此时等待不受时间约束，只能由取消信号终止；
/// - `with_timeout` 以当前时间点加持续时间生成截止点，时长溢出单调时钟可表示
///   范围时退化为“未设置”，语义上等同于无限等待；
/// - `is_expired` 基于调用方提供的当前时间判断是否到期，本类型不自带计时源。
///
/// # 风险提示（Trade-offs）
/// - 截止点到期不会自动唤醒任何等待者，到期判定由等待循环的超时原语完成；
/// - 调用方需保证 `now` 与构造时使用同一单调时钟，跨时钟源比较没有意义。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepDeadline {
    instant: Option<Instant>,
}

impl SleepDeadline {
    /// 创建未设置截止点的实例，等待只能被取消终止。
    pub const fn none() -> Self {
        Self { instant: None }
    }

    /// 根据绝对时间点构造截止点。
    pub fn at(instant: Instant) -> Self {
        Self {
            instant: Some(instant),
        }
    }

    /// 基于当前时间点加持续时间生成截止点；溢出时退化为未设置。
    pub fn with_timeout(now: Instant, timeout: Duration) -> Self {
        match now.checked_add(timeout) {
            Some(instant) => Self::at(instant),
            None => Self::none(),
        }
    }

    /// 返回内部时间点，供等待循环与诊断输出使用。
    pub fn instant(&self) -> Option<Instant> {
        self.instant
    }

    /// 判断截止点在给定时刻是否已经到期；未设置截止点时恒为 `false`。
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.instant {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

impl Default for SleepDeadline {
    fn default() -> Self {
        SleepDeadline::none()
    }
}
