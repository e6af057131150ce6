pub mod interrupted_sleep {
    //! 墙钟契约测试：验证 `CancellableTimer` 在真实单调时钟下的收尾时机。
    //!
    //! # 测试目标（Why）
    //! - 确保完整睡眠不早退、提前取消立即生效、迟到取消不改写超时结果；
    //! - 验证陈旧取消被入场复位丢弃，以及同一实例跨会话复用的干净性。
    //!
    //! # 测试结构（What）
    //! - 单会话路径：自然超时、提前取消、截止点之后的迟到取消；
    //! - 跨会话路径：陈旧取消丢弃、共享实例连续多会话各自独立收尾。
    //!
    //! # 执行步骤（How）
    //! 1. 睡眠方始终在测试线程本体执行，取消方由辅助线程在指定偏移后触发；
    //! 2. 所有断言遵循“下界严格、上界宽松”：下界由单调时钟契约保证，恒不抖动；
    //!    上界预留数百毫秒调度余量，只用于证明取消确实缩短了会话；
    //! 3. 每个会话结束后先回收辅助线程，再开启下一会话，杜绝跨会话的取消串扰。

    use std::thread;
    use std::time::{Duration, Instant};

    use lull_core::{CancellableTimer, SleepOutcome};

    /// 在指定偏移后从辅助线程触发取消。
    fn spawn_cancel_after(timer: &CancellableTimer, offset: Duration) -> thread::JoinHandle<()> {
        let timer = timer.clone();
        thread::spawn(move || {
            thread::sleep(offset);
            timer.cancel();
        })
    }

    /// 无取消介入时，会话必须等满请求时长后以超时收尾。
    #[test]
    pub fn full_duration_elapses_without_cancel() {
        let timer = CancellableTimer::new();
        let requested = Duration::from_millis(120);

        let started = Instant::now();
        let outcome = timer.sleep(requested);
        let elapsed = started.elapsed();

        assert_eq!(outcome, SleepOutcome::TimedOut, "无取消的会话只能超时收尾");
        assert!(
            elapsed >= requested,
            "会话不得早于请求时长返回：elapsed={elapsed:?}"
        );
    }

    /// 提前取消应立即唤醒睡眠方，实际耗时远小于请求时长。
    ///
    /// # 步骤拆解
    /// 1. 请求 1500ms 的睡眠，辅助线程在 100ms 偏移处触发取消；
    /// 2. 断言结果为取消收尾，耗时不早于取消偏移；
    /// 3. 上界取 750ms——即便调度严重抖动也不应越过，一旦越过即说明
    ///    唤醒丢失、会话实际等到了截止点。
    #[test]
    pub fn early_cancel_shortens_the_session() {
        let timer = CancellableTimer::new();
        let requested = Duration::from_millis(1500);
        let offset = Duration::from_millis(100);

        let canceler = spawn_cancel_after(&timer, offset);
        let started = Instant::now();
        let outcome = timer.sleep(requested);
        let elapsed = started.elapsed();
        canceler.join().expect("取消线程不应 panic");

        assert_eq!(outcome, SleepOutcome::Cancelled, "偏移处的取消应改写会话结果");
        assert!(
            elapsed >= offset,
            "会话不可能早于取消触发点返回：elapsed={elapsed:?}"
        );
        assert!(
            elapsed < Duration::from_millis(750),
            "取消后的唤醒应远早于截止点：elapsed={elapsed:?}"
        );
    }

    /// 截止点之后才到达的取消不改写超时结果，且不污染下一会话。
    #[test]
    pub fn post_deadline_cancel_does_not_rewrite_timeout() {
        let timer = CancellableTimer::new();
        let requested = Duration::from_millis(150);

        // 取消偏移刻意晚于截止点，只能命中已收尾的会话。
        let canceler = spawn_cancel_after(&timer, Duration::from_millis(400));
        let started = Instant::now();
        let outcome = timer.sleep(requested);
        let elapsed = started.elapsed();

        assert_eq!(outcome, SleepOutcome::TimedOut, "截止点先到，结果必须是超时");
        assert!(elapsed >= requested, "超时收尾仍需等满请求时长");

        canceler.join().expect("取消线程不应 panic");

        // 迟到的取消此刻已置位，但属于下一会话的“陈旧取消”，必须被入场复位丢弃。
        let follow_up = Duration::from_millis(100);
        let started = Instant::now();
        let outcome = timer.sleep(follow_up);
        assert_eq!(outcome, SleepOutcome::TimedOut, "陈旧取消不得缩短后续会话");
        assert!(started.elapsed() >= follow_up, "后续会话仍需等满请求时长");
    }

    /// 空闲期触发的取消在下一次入场即被丢弃，会话等满全程。
    #[test]
    pub fn stale_cancel_never_leaks_into_next_session() {
        let timer = CancellableTimer::new();
        timer.cancel();

        let requested = Duration::from_millis(120);
        let started = Instant::now();
        let outcome = timer.sleep(requested);

        assert_eq!(outcome, SleepOutcome::TimedOut, "严格早于会话的取消应被丢弃");
        assert!(started.elapsed() >= requested, "被丢弃的取消不得缩短会话");
        assert!(!timer.is_cancelled(), "入场复位后取消位应保持未触发");
    }

    /// 共享实例连续服务多个会话，每个会话的取消各自独立生效。
    ///
    /// # 步骤拆解
    /// 1. 同一实例连续开启五个 800ms 会话，取消偏移按 60ms 递增（60..=300ms）；
    /// 2. 每个会话先回收上一辅助线程再启动下一个，保证取消只命中本会话；
    /// 3. 逐会话断言：取消收尾、耗时不早于偏移、且远早于截止点。
    #[test]
    pub fn shared_instance_serves_sequential_sessions() {
        let timer = CancellableTimer::new();
        let requested = Duration::from_millis(800);

        for round in 1u64..=5 {
            let offset = Duration::from_millis(60 * round);
            let canceler = spawn_cancel_after(&timer, offset);

            let started = Instant::now();
            let outcome = timer.sleep(requested);
            let elapsed = started.elapsed();
            canceler.join().expect("取消线程不应 panic");

            assert_eq!(
                outcome,
                SleepOutcome::Cancelled,
                "第 {round} 个会话应被各自的取消收尾"
            );
            assert!(
                elapsed >= offset,
                "第 {round} 个会话不可能早于取消偏移返回：elapsed={elapsed:?}"
            );
            assert!(
                elapsed < Duration::from_millis(550),
                "第 {round} 个会话的唤醒应远早于截止点：elapsed={elapsed:?}"
            );
        }
    }
}
