//! 可中断睡眠时序 SLO 驱动的二进制入口。
//!
//! # 说明
//! - 主体逻辑位于 `tools/bench/sleep_interrupt_slo.rs`，此处仅做入口与错误处理；
//! - 之所以放在 `lull-core` 二进制中，是为了直接复用 crate 的定时器类型。

#[path = "../../../../tools/bench/sleep_interrupt_slo.rs"]
mod sleep_interrupt_slo;

fn main() {
    if let Err(error) = sleep_interrupt_slo::run() {
        eprintln!("可中断睡眠 SLO 驱动失败: {error}");
        std::process::exit(1);
    }
}
