use std::sync::Arc;
//
// 教案级说明：启用 `--cfg loom`（或本仓库专用的 `--cfg lull_loom`）时，原子
// 类型切换为 loom 提供的版本，使模型检查能够穷举取消信号上的全部调度交错；
// `Arc` 维持标准实现，克隆语义与派生能力不受影响。
#[cfg(any(loom, lull_loom))]
use loom::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(any(loom, lull_loom)))]
use std::sync::atomic::{AtomicBool, Ordering};

/// 取消信号，表达“某一等待会话应当提前结束”的单比特事实。
///
/// # 设计背景（Why）
/// - 可中断睡眠要求取消方在不持锁的前提下标记取消，再由等待方在醒来后自行核对；
///   一个共享的原子位是该协议里最小且无阻塞的载体。
/// - 与一次性取消令牌不同，睡眠原语的会话是可重复的：每次进入等待都开启新会话，
///   因此信号必须支持显式复位（[`CancelSignal::rearm`]）。
///
/// # 逻辑解析（How）
/// - 内部使用 [`AtomicBool`] 表达触发状态，并通过 [`Arc`] 支持多方共享；
/// - `raise` 在首次成功置位时返回 `true`，重复调用返回 `false`，调用方可据此
///   只在首次触发时记录日志或执行兜底；
/// - `rearm` 将原子位写回“未触发”，供新会话起点使用；
/// - `child` 派生共享同一原子位的实例，便于把同一信号交给多个协作线程。
///
/// # 契约说明（What）
/// - **前置条件**：构造后默认处于“未触发”状态；
/// - **后置条件**：`raise` 成功后 `is_raised` 对所有线程可见（Acquire/Release 配对），
///   直到下一次 `rearm` 之前保持触发态（电平语义，而非脉冲语义）；
/// - `rearm` 会不加区分地清除触发态：严格早于新会话的触发会被丢弃。
///
/// # 设计取舍与风险（Trade-offs）
/// - 信号本身不携带唤醒能力；要打断一个已挂起的等待者，置位之后还需要配套的
///   条件变量广播（见 [`CancellableTimer::cancel`](crate::CancellableTimer::cancel)）。
/// - 未提供回调注册接口，等待方必须在每次醒来后主动核对，框架不会强制终止等待。
#[derive(Clone, Debug)]
pub struct CancelSignal {
    inner: Arc<SignalState>,
}

#[derive(Debug, Default)]
struct SignalState {
    raised: AtomicBool,
}

impl CancelSignal {
    /// 创建处于“未触发”状态的取消信号。
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalState {
                raised: AtomicBool::new(false),
            }),
        }
    }

    /// 查询信号当前是否已被触发。
    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::Acquire)
    }

    /// 触发取消信号。
    ///
    /// 返回 `true` 表示本次调用完成了从“未触发”到“已触发”的跃迁；
    /// 返回 `false` 表示信号此前已处于触发态（幂等调用）。
    pub fn raise(&self) -> bool {
        self.inner
            .raised
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 将信号复位为“未触发”，作为新一轮等待会话的起点。
    ///
    /// 复位不判别既有状态：严格早于本次复位的触发会被丢弃；只有复位之后
    /// 到来的 `raise` 才会作用于新会话。
    pub fn rearm(&self) {
        self.inner.raised.store(false, Ordering::Release);
    }

    /// 派生共享同一原子位的信号实例，用于跨线程传播同一份取消语义。
    pub fn child(&self) -> Self {
        self.clone()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
