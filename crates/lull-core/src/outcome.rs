use std::fmt;

/// 一次睡眠会话的终态，二选一：睡满或被打断。
///
/// # 设计背景（Why）
/// - 睡眠操作没有失败分支：锁与条件变量的使用方式决定了它要么等到截止点，
///   要么被取消信号唤醒，因此终态以双变体枚举表达，而不是 `Result`。
/// - 调用方据此分流语义：`TimedOut` 走“时间到了该干活”的路径，`Cancelled`
///   走“外部要求提前退出”的路径。
///
/// # 契约说明（What）
/// - 截止点与取消同时到达时，以等待原语报告的超时裁决为准，判定为
///   [`SleepOutcome::TimedOut`]（超时赢得竞争）；
/// - [`SleepOutcome::as_str`] 的小写标记是稳定对外格式，日志与 SLO 报告
///   均依赖它，不得随意改动。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepOutcome {
    /// 截止点先到，请求的时长被完整睡满。
    TimedOut,
    /// 取消信号先到，会话被提前打断。
    Cancelled,
}

impl SleepOutcome {
    /// 是否因截止点到期而结束。
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, SleepOutcome::TimedOut)
    }

    /// 是否因取消信号而结束。
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, SleepOutcome::Cancelled)
    }

    /// 返回稳定的小写标记，供日志与报告使用。
    pub const fn as_str(&self) -> &'static str {
        match self {
            SleepOutcome::TimedOut => "timed_out",
            SleepOutcome::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SleepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
