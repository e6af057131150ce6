//! 时间相关集成测试入口，验证可取消睡眠在真实单调时钟下的端到端行为。
//!
//! # 模块目的（Why）
//! - 汇集所有依赖真实流逝时间的集成测试，便于统一运行与过滤；
//! - 对齐验收命令 `cargo test -p lull-core -- tests::time::*` 的过滤路径，确保 CI 能准确定位测试。
//!
//! # 结构概览（What）
//! - [`tests::time::interrupted_sleep`]：验证完整睡眠、提前取消、陈旧取消与共享实例
//!   多会话复用的墙钟表现。
//!
//! # 维护提示（How）
//! - 本套件依赖真实睡眠，断言只使用“下界严格、上界宽松”的区间，避免 CI 抖动误报；
//! - 毫秒级精度验收由 `sleep_interrupt_slo` 驱动负责，请勿在此处收紧容差。

pub mod tests {
    //! 集成测试命名空间：将所有时间相关测试归档在 `tests::time` 之下，便于过滤。
    pub mod time {
        //! 真实时钟下的可取消睡眠测试集合。
        include!("interrupted_sleep.rs");
    }
}
