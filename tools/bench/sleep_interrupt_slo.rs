//! 可中断睡眠时序 SLO 驱动程序。
//!
//! # 设计目标（Why）
//! - 以真实线程与真实时钟验证睡眠原语的两条时序承诺：未被取消时睡满请求
//!   时长；被取消时在取消偏移附近及时返回；
//! - 覆盖“同一实例连续多会话”的复位语义：上一会话的取消不得渗入下一会话；
//! - 生成结构化 JSON 报告并在超差时以非零退出码失败，便于纳入 CI 观察。
//!
//! # 工作机制（How）
//! - 场景表分两类：
//!   1. `single`：每个场景使用全新 [`CancellableTimer`]，睡眠线程请求
//!      `sleep_ms`，驱动线程按需在 `cancel_at_ms` 偏移处取消；
//!   2. `multi`：同一实例顺序执行 N 个会话，取消偏移按 `sleep_ms / N` 逐段
//!      递增，最后一个会话的偏移与时长重合，因此不发取消、自然睡满；
//! - 每个会话记录两份耗时：睡眠线程内部实测与驱动侧墙钟（含线程创建与
//!   汇合开销），裁决以墙钟对比期望值，偏差不超过容差即为通过；取消偏移
//!   与截止点相距不超过容差的贴边会话，两种终态都视为达标；
//! - 所有会话跑完后汇总报告：标准输出打印 JSON，可选写入 `--output` 路径。
//!
//! # 契约说明（What）
//! - **输入参数**（通过 CLI 提供）：
//!   - `--quick`：快速模式，场景时长整体缩减为原表的十分之一，供冒烟使用；
//!   - `--tolerance-ms <u64>`：耗时容差，默认 50ms（调度抖动预算）；
//!   - `--output <path>`：JSON 报告写入路径，未指定时仅打印到标准输出。
//! - **输出**：含每会话期望/实测/判定的结构化报告；
//! - **后置条件**：任一会话超差时返回 [`SloError::SloViolated`]，入口进程以
//!   退出码 1 结束。
//!
//! # 风险与权衡（Trade-offs & Gotchas）
//! - 期望值基于墙钟，负载较高的共享环境可能产生偶发超差；容差可通过
//!   CLI 放大，但不建议在结论性报告中超过 100ms；
//! - 驱动线程以“睡够偏移再取消”的方式发信号，不与睡眠线程握手确认其已
//!   挂起；偏移均为数百毫秒级，线程启动延迟远小于该量级；
//! - 完整场景表累计运行约一分钟，属于有意为之的浸泡式验证，冒烟请用
//!   `--quick`。

use lull_core::{CancellableTimer, SleepOutcome};
use serde::Serialize;
use std::{
    env,
    fs::File,
    io::Write,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// 默认耗时容差（毫秒）：为操作系统调度抖动预留的预算。
const DEFAULT_TOLERANCE_MS: u64 = 50;

/// 快速模式的时长缩减系数。
const QUICK_SCALE: u64 = 10;

/// 驱动错误类型，覆盖 CLI、IO 与 SLO 判定三类失败。
#[derive(Debug, Error)]
pub enum SloError {
    /// CLI 参数缺失或无法解析。
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// 报告写入失败。
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    /// 报告序列化失败。
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 有会话超出时序容差或终态不符。
    #[error("{failed} of {total} sessions violated the ±{tolerance_ms} ms sleep SLO")]
    SloViolated {
        failed: usize,
        total: usize,
        tolerance_ms: u64,
    },
}

/// CLI 解析结果。
///
/// # 契约（What）
/// - `tolerance_ms` 必须大于 0；
/// - `quick_mode` 只缩减场景时长，不改变场景结构与判定逻辑；
/// - `output` 未设置时不写文件，避免意外覆盖历史报告。
#[derive(Debug, Clone)]
struct Config {
    quick_mode: bool,
    tolerance_ms: u64,
    output: Option<PathBuf>,
}

impl Config {
    fn parse() -> Result<Self, SloError> {
        let mut args = env::args().skip(1);
        let mut quick_mode = false;
        let mut tolerance_ms = DEFAULT_TOLERANCE_MS;
        let mut output: Option<PathBuf> = None;

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--quick" => {
                    quick_mode = true;
                }
                "--tolerance-ms" => {
                    let value = args.next().ok_or_else(|| {
                        SloError::InvalidArgument("--tolerance-ms 之后需要提供毫秒数".into())
                    })?;
                    tolerance_ms = value.parse::<u64>().map_err(|error| {
                        SloError::InvalidArgument(format!("无法解析容差 `{value}`：{error}"))
                    })?;
                    if tolerance_ms == 0 {
                        return Err(SloError::InvalidArgument("容差必须大于 0".into()));
                    }
                }
                "--output" => {
                    let value = args.next().ok_or_else(|| {
                        SloError::InvalidArgument("--output 之后需要提供路径".into())
                    })?;
                    output = Some(PathBuf::from(value));
                }
                other => {
                    return Err(SloError::InvalidArgument(format!("未知参数 `{other}`")));
                }
            }
        }

        Ok(Self {
            quick_mode,
            tolerance_ms,
            output,
        })
    }
}

/// 场景计划：单会话或同一实例上的顺序多会话。
#[derive(Clone, Copy, Debug)]
enum ScenarioPlan {
    /// 全新实例上的一次睡眠，可选在偏移处取消。
    Single {
        sleep_ms: u64,
        cancel_at_ms: Option<u64>,
    },
    /// 同一实例上的 N 个顺序会话，取消偏移按 `sleep_ms / sessions` 递增；
    /// 偏移与时长重合的最后一个会话不发取消。
    Multi { sleep_ms: u64, sessions: u64 },
}

/// 单个会话的观测与判定。
#[derive(Debug, Serialize)]
struct SessionReport {
    label: String,
    sleep_ms: u64,
    cancel_at_ms: Option<u64>,
    expected_outcome: &'static str,
    expected_elapsed_ms: u64,
    observed_outcome: &'static str,
    wall_elapsed_ms: u64,
    sleeper_elapsed_ms: u64,
    passed: bool,
}

/// 顶层报告结构。
#[derive(Debug, Serialize)]
struct SloReport {
    driver: &'static str,
    quick_mode: bool,
    tolerance_ms: u64,
    total_sessions: usize,
    failed_sessions: usize,
    sessions: Vec<SessionReport>,
}

/// 完整场景表，镜像历史驱动的经典网格：整千偏移、贴边偏移、自然超时，
/// 以及 10/20 等分的多会话复位覆盖。
fn scenario_table(quick_mode: bool) -> Vec<ScenarioPlan> {
    let scale = if quick_mode { QUICK_SCALE } else { 1 };
    let ms = |value: u64| value / scale;
    vec![
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(1000)),
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(2000)),
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(3000)),
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(4000)),
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: None,
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(1001)),
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(2010)),
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(3100)),
        },
        ScenarioPlan::Single {
            sleep_ms: ms(5000),
            cancel_at_ms: Some(ms(4999)),
        },
        ScenarioPlan::Multi {
            sleep_ms: ms(5000),
            sessions: 10,
        },
        ScenarioPlan::Multi {
            sleep_ms: ms(5000),
            sessions: 20,
        },
    ]
}

/// 推导会话期望：偏移小于时长即应被取消并在偏移附近返回，否则自然睡满。
fn expectation(sleep_ms: u64, cancel_at_ms: Option<u64>) -> (SleepOutcome, u64) {
    match cancel_at_ms {
        Some(offset) if offset < sleep_ms => (SleepOutcome::Cancelled, offset),
        _ => (SleepOutcome::TimedOut, sleep_ms),
    }
}

/// 执行一个会话：驱动侧墙钟从线程创建前起算（与会话期望同一视角），
/// 睡眠线程另记内部耗时用于报告对照。
fn run_session(
    timer: &CancellableTimer,
    label: String,
    sleep_ms: u64,
    cancel_at_ms: Option<u64>,
    tolerance_ms: u64,
) -> SessionReport {
    let (expected_outcome, expected_elapsed_ms) = expectation(sleep_ms, cancel_at_ms);
    let sleeper = timer.clone();
    let wall_started = Instant::now();
    let handle = thread::spawn(move || {
        let started = Instant::now();
        let outcome = sleeper.sleep(Duration::from_millis(sleep_ms));
        (outcome, started.elapsed())
    });
    if let Some(offset) = cancel_at_ms {
        thread::sleep(Duration::from_millis(offset));
        timer.cancel();
    }
    let (observed_outcome, sleeper_elapsed) = handle.join().expect("睡眠线程不应 panic");
    let wall_elapsed_ms = wall_started.elapsed().as_millis() as u64;
    let sleeper_elapsed_ms = sleeper_elapsed.as_millis() as u64;

    // 取消偏移落在截止点的容差窗口内时（如 4999ms vs 5000ms），取消与超时的
    // 竞争由调度决定，两种终态都算达标；窗口之外仍严格比对终态。
    let outcome_matches = observed_outcome == expected_outcome
        || cancel_at_ms.is_some_and(|offset| offset.abs_diff(sleep_ms) <= tolerance_ms);
    let passed = outcome_matches && wall_elapsed_ms.abs_diff(expected_elapsed_ms) <= tolerance_ms;
    tracing::info!(
        label = label.as_str(),
        expected = expected_outcome.as_str(),
        observed = observed_outcome.as_str(),
        expected_elapsed_ms,
        wall_elapsed_ms,
        passed,
        "会话完成"
    );

    SessionReport {
        label,
        sleep_ms,
        cancel_at_ms,
        expected_outcome: expected_outcome.as_str(),
        expected_elapsed_ms,
        observed_outcome: observed_outcome.as_str(),
        wall_elapsed_ms,
        sleeper_elapsed_ms,
        passed,
    }
}

/// 展开一个场景计划为若干会话并逐个执行。
fn run_plan(plan: ScenarioPlan, tolerance_ms: u64, sessions: &mut Vec<SessionReport>) {
    match plan {
        ScenarioPlan::Single {
            sleep_ms,
            cancel_at_ms,
        } => {
            let timer = CancellableTimer::new();
            let label = match cancel_at_ms {
                Some(offset) => format!("single_{sleep_ms}ms_cancel_at_{offset}ms"),
                None => format!("single_{sleep_ms}ms_natural_timeout"),
            };
            sessions.push(run_session(
                &timer,
                label,
                sleep_ms,
                cancel_at_ms,
                tolerance_ms,
            ));
        }
        ScenarioPlan::Multi {
            sleep_ms,
            sessions: count,
        } => {
            // 共享同一实例是本场景的全部意义：验证会话间的取消位复位。
            let timer = CancellableTimer::new();
            let delta = sleep_ms / count;
            let mut offset = delta;
            for index in 1..=count {
                let cancel_at_ms = if offset != sleep_ms { Some(offset) } else { None };
                let label = format!("multi_{sleep_ms}ms_x{count}_session_{index}");
                sessions.push(run_session(
                    &timer,
                    label,
                    sleep_ms,
                    cancel_at_ms,
                    tolerance_ms,
                ));
                offset += delta;
            }
        }
    }
}

/// 程序主入口：装配日志、执行场景表、输出报告并做 SLO 裁决。
pub fn run() -> Result<(), SloError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse()?;
    let mut session_reports = Vec::new();
    for plan in scenario_table(config.quick_mode) {
        run_plan(plan, config.tolerance_ms, &mut session_reports);
    }

    let failed_sessions = session_reports
        .iter()
        .filter(|session| !session.passed)
        .count();
    let report = SloReport {
        driver: "sleep_interrupt_slo",
        quick_mode: config.quick_mode,
        tolerance_ms: config.tolerance_ms,
        total_sessions: session_reports.len(),
        failed_sessions,
        sessions: session_reports,
    };

    let payload = serde_json::to_string_pretty(&report)?;
    if let Some(path) = &config.output {
        let mut file = File::create(path)?;
        file.write_all(payload.as_bytes())?;
        file.write_all(b"\n")?;
    }
    println!("{payload}");

    if failed_sessions > 0 {
        return Err(SloError::SloViolated {
            failed: failed_sessions,
            total: report.total_sessions,
            tolerance_ms: config.tolerance_ms,
        });
    }
    Ok(())
}
