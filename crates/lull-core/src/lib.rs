#![deny(unsafe_code)]
#![doc = r#"
# lull-core

## 设计动机（Why）
- **定位**：提供线程级的可取消阻塞睡眠原语，让“等待一段时间、但允许外部
  随时叫停”成为一次普通的函数调用，而不是忙轮询或不可打断的 `thread::sleep`。
- **架构角色**：作为停机排空、轮询退避、演练定时等场景的基础积木；原语本身
  不依附任何运行时，只要求操作系统提供抢占式线程与条件变量。
- **设计理念**：三件套协议；原子取消位承载“要不要停”，互斥锁加条件变量承载
  “怎么醒来”，单调绝对截止点承载“最迟醒来”。三者的组合保证唤醒不丢失、
  伪唤醒不早退、挂钟调整不影响时长。

## 核心契约（What）
- [`CancellableTimer::sleep`] 阻塞调用线程至多给定时长，返回
  [`SleepOutcome::TimedOut`]（睡满）或 [`SleepOutcome::Cancelled`]（被打断）
  二者之一，没有失败分支；
- [`CancellableTimer::cancel`] 幂等、O(1)、可从任意线程调用；
- 每次 `sleep` 都是独立会话：进入时复位取消位，严格早于会话的取消被丢弃；
- 截止点与取消同时到达时，超时赢得竞争。

## 实现策略（How）
- 进入等待前一次性折算 [`SleepDeadline`]，伪唤醒后朝同一截止点继续等待；
- 等待循环在锁内核对 [`CancelSignal`]，再挂起到条件变量；取消方先无锁置位、
  后持锁广播，从结构上消除“置位与广播落进核对与挂起之间”的丢失唤醒窗口；
- 相位快照（[`TimerState`]）由睡眠线程单方发布，供诊断与测试同步使用。

## 风险与考量（Trade-offs）
- 同一实例并发重叠的 `sleep` 调用内存安全，但等待语义不在契约内；
- 精度受操作系统调度影响，毫秒级抖动属于预期；
- 取消信号为电平语义而非脉冲语义：无人等待时置位会保留到下一次会话复位。
"#]

mod deadline;
mod outcome;
mod signal;
mod timer;

pub use deadline::SleepDeadline;
pub use outcome::SleepOutcome;
pub use signal::CancelSignal;
pub use timer::{CancellableTimer, TimerState};
