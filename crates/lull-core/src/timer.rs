use crate::{CancelSignal, SleepDeadline, SleepOutcome};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
// 相位快照仅用于诊断与测试同步，不参与 Loom 模型，保持标准原子实现。
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

const PHASE_IDLE: u8 = 0;
const PHASE_WAITING: u8 = 1;

/// 睡眠会话状态机的可观测快照：空闲或正在等待。
///
/// 每次 [`CancellableTimer::sleep`] 走过 `Idle → Waiting → 终态` 的生命周期，
/// 终态（[`SleepOutcome`]）作为返回值交还调用方，因此外部可观测的状态只有
/// 两个。快照由睡眠线程单方写入，读取方只能用它做诊断或测试同步，不得据此
/// 做等待正确性决策。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    /// 没有进行中的睡眠会话。
    Idle,
    /// 有一个睡眠会话正在等待截止点或取消信号。
    Waiting,
}

impl TimerState {
    fn as_u8(self) -> u8 {
        match self {
            TimerState::Idle => PHASE_IDLE,
            TimerState::Waiting => PHASE_WAITING,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            PHASE_WAITING => TimerState::Waiting,
            _ => TimerState::Idle,
        }
    }
}

#[derive(Debug)]
struct TimerInner {
    signal: CancelSignal,
    phase: AtomicU8,
    wait_lock: Mutex<()>,
    wakeups: Condvar,
}

impl TimerInner {
    fn store_phase(&self, state: TimerState) {
        self.phase.store(state.as_u8(), Ordering::Release);
    }
}

/// 可取消的阻塞睡眠原语：按单调截止点等待，可被其他线程提前唤醒。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 为“等待一段时间，但允许外部随时叫停”的场景提供线程级原语：优雅停机、
///   轮询退避、演练定时器等都需要一个能被打断且不会早醒的睡眠；
/// - 朴素的 `thread::sleep` 无法被打断，忙轮询又浪费 CPU；条件变量加取消位
///   是两者之间的标准解法。
///
/// ## 逻辑 (How)
/// - 进入 `sleep` 时一次性折算绝对截止点（[`SleepDeadline`]），之后所有等待
///   都朝同一个点推进，伪唤醒不会缩短也不会累加时长；
/// - 随后复位取消信号（[`CancelSignal::rearm`]）开启独立会话：严格早于本次
///   调用的取消被丢弃；
/// - 等待循环在 `wait_lock` 内核对取消位，再挂起到 [`Condvar`] 上；醒来后回
///   到循环头部重新核对，“醒来不等于条件成立”；
/// - `cancel` 先无锁置位取消信号，再持锁广播：等待方的“核对-挂起”在同一把
///   锁内完成，锁内广播保证取消方要么被核对看见、要么广播必达已挂起者，不
///   存在丢失唤醒的窗口。
///
/// ## 契约 (What)
/// - `sleep(duration)`：阻塞当前线程直至截止点到期（返回
///   [`SleepOutcome::TimedOut`]）或取消信号到来（返回
///   [`SleepOutcome::Cancelled`]）；`Duration::ZERO` 立即返回 `TimedOut`；
/// - `cancel()`：幂等、O(1)、不长时间阻塞；对“当前或此后本会话内”的等待生
///   效，信号保持电平触发直到下一次会话复位；
/// - 句柄可克隆（内部 [`Arc`] 共享），睡眠线程与取消线程各持一份即可协作；
/// - 同一时刻至多一个在途 `sleep`：并发重叠调用内存安全，但等待语义不在契
///   约内。
///
/// ## 注意事项 (Trade-offs)
/// - 精度受操作系统调度影响，毫秒级抖动属于预期，不提供亚毫秒保证；
/// - 取消裁决与超时裁决竞争时以等待原语报告的超时为准（超时赢得竞争）；
/// - 严格早于 `sleep` 的取消会被会话复位丢弃；需要“预先取消”语义的调用方
///   应在睡前自查 [`CancellableTimer::is_cancelled`]。
#[derive(Clone, Debug)]
pub struct CancellableTimer {
    inner: Arc<TimerInner>,
}

impl CancellableTimer {
    /// 创建处于空闲状态的睡眠原语。
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TimerInner {
                signal: CancelSignal::new(),
                phase: AtomicU8::new(PHASE_IDLE),
                wait_lock: Mutex::new(()),
                wakeups: Condvar::new(),
            }),
        }
    }

    /// 阻塞当前线程最多 `duration`，期间可被 [`CancellableTimer::cancel`] 提前唤醒。
    ///
    /// ## 逻辑 (How)
    /// 1. 以进入时刻一次性折算绝对截止点，后续等待不再重新换算；
    /// 2. 复位取消信号，开启独立会话（严格早于本次调用的取消在此被丢弃）；
    /// 3. 发布 `Waiting` 相位（在复位之后，保证外部观察到 `Waiting` 再发出的
    ///    取消必然落在本会话内）；
    /// 4. 执行“锁内核对、挂起、醒后再核对”的等待循环；
    /// 5. 发布 `Idle` 相位并返回终态。
    ///
    /// ## 契约 (What)
    /// - **后置条件**：返回 [`SleepOutcome::TimedOut`] 时已等满截止点；返回
    ///   [`SleepOutcome::Cancelled`] 时取消信号在本会话内被触发过；
    /// - `Duration::ZERO` 经由统一循环立即以 `TimedOut` 返回；
    /// - 时长溢出单调时钟可表示范围时退化为无界等待，只能由取消终止。
    pub fn sleep(&self, duration: Duration) -> SleepOutcome {
        let started = Instant::now();
        let deadline = SleepDeadline::with_timeout(started, duration);
        self.inner.signal.rearm();
        self.inner.store_phase(TimerState::Waiting);
        let (outcome, spurious_wakes) = self.wait(deadline);
        self.inner.store_phase(TimerState::Idle);
        tracing::debug!(
            outcome = outcome.as_str(),
            requested_ms = duration.as_millis() as u64,
            elapsed_ms = started.elapsed().as_millis() as u64,
            spurious_wakes,
            "睡眠会话结束"
        );
        outcome
    }

    /// 请求打断当前（或本会话内随后发生的）等待；幂等，不返回结果。
    ///
    /// ## 逻辑 (How)
    /// - 先无锁置位取消信号：置位路径 O(1) 且永不阻塞在等待者的睡眠时长上；
    /// - 再持 `wait_lock` 广播：等待方在同一把锁内完成“核对-挂起”，锁内广播
    ///   把取消方钉在该序列的确定一侧，取消要么被核对看见，要么广播送达已
    ///   挂起者，不存在“置位与广播落进核对与挂起之间”的丢失唤醒窗口；
    /// - 使用广播而非单点唤醒，为将来多个等待者共享一个信号留出余地。
    ///
    /// ## 契约 (What)
    /// - 无在途会话时仅置位信号；该置位会被下一次 `sleep` 的会话复位丢弃；
    /// - 重复调用无副作用（仍会补发一次广播，属无害冗余）。
    pub fn cancel(&self) {
        let first_trigger = self.inner.signal.raise();
        let guard = self.inner.wait_lock.lock();
        let woken = self.inner.wakeups.notify_all();
        drop(guard);
        if first_trigger {
            tracing::debug!(woken, "取消信号已触发并广播");
        } else {
            tracing::trace!(woken, "重复取消：信号已处于触发态，仅补发广播");
        }
    }

    /// 读取会话相位快照，仅供诊断与测试同步使用。
    pub fn state(&self) -> TimerState {
        TimerState::from_u8(self.inner.phase.load(Ordering::Acquire))
    }

    /// 查询取消信号当前是否处于触发态（会话复位前保持可见）。
    pub fn is_cancelled(&self) -> bool {
        self.inner.signal.is_raised()
    }

    // 经典“醒来不等于条件成立”循环：每次醒来都回到头部核对取消位，并且
    // 始终朝同一个绝对截止点继续等待。返回终态与观测到的伪唤醒次数。
    fn wait(&self, deadline: SleepDeadline) -> (SleepOutcome, u32) {
        let mut spurious_wakes = 0u32;
        let mut guard = self.inner.wait_lock.lock();
        loop {
            if self.inner.signal.is_raised() {
                return (SleepOutcome::Cancelled, spurious_wakes);
            }
            match deadline.instant() {
                Some(at) => {
                    if self.inner.wakeups.wait_until(&mut guard, at).timed_out() {
                        // 超时裁决以等待原语的返回为准，此处不再回看取消位。
                        return (SleepOutcome::TimedOut, spurious_wakes);
                    }
                }
                // 截止点溢出退化出的无界等待：只能由取消终止。
                None => self.inner.wakeups.wait(&mut guard),
            }
            if !self.inner.signal.is_raised() {
                // 醒来却既未超时也无取消位：真正的伪唤醒，记录后继续等待。
                spurious_wakes = spurious_wakes.saturating_add(1);
                tracing::trace!(total = spurious_wakes, "伪唤醒，继续等待同一截止点");
            }
        }
    }
}

impl Default for CancellableTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(any(loom, lull_loom))))]
impl CancellableTimer {
    // 测试钩子：发出一次不携带取消位的裸广播。对等待循环而言，它与操作系统
    // 层面的伪唤醒不可区分，用于验证“伪唤醒不得缩短睡眠”。
    fn notify_without_raise(&self) {
        let guard = self.inner.wait_lock.lock();
        self.inner.wakeups.notify_all();
        drop(guard);
    }
}
