//! Runner tests: threaded execution of whole flowcharts, observed the way a
//! supervisor does it, by polling.

use std::thread;
use std::time::{Duration, Instant};

use flowrun_lang::{
    BlockId, BlockKind, ErrorKind, Flowchart, RunOptions, RunState, Runner, StopReason, Value,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

const TIMEOUT: Duration = Duration::from_secs(5);

fn runner(delay_ms: u64) -> Runner {
    Runner::new(RunOptions { step_delay: Duration::from_millis(delay_ms) })
}

fn start(runner: &mut Runner, chart: &Flowchart) {
    runner.start(chart).unwrap_or_else(|errs| panic!("build failed: {errs:#?}"));
}

/// Poll until `pred` holds; panics after `TIMEOUT`.
fn wait_for(runner: &mut Runner, what: &str, mut pred: impl FnMut(&mut Runner) -> bool) {
    let deadline = Instant::now() + TIMEOUT;
    while !pred(runner) {
        if Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        thread::sleep(Duration::from_millis(5));
    }
}

fn wait_finished(runner: &mut Runner) {
    wait_for(runner, "run to finish", |r| !r.is_running());
}

/// Drain stdout until the channel is empty.
fn all_stdout(runner: &mut Runner) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        let batch = runner.drain_stdout();
        if batch.is_empty() {
            return out;
        }
        out.extend(batch);
    }
}

fn drain_vars(runner: &mut Runner) -> usize {
    let mut n = 0;
    loop {
        let batch = runner.drain_variable_updates();
        if batch.is_empty() {
            return n;
        }
        n += batch.len();
    }
}

/// START → blocks in order → END.
fn chain(blocks: &[(BlockKind, &str)]) -> (Flowchart, Vec<BlockId>, BlockId) {
    let mut chart = Flowchart::new();
    let ids: Vec<BlockId> = blocks.iter().map(|(k, src)| chart.add(k.clone(), *src)).collect();
    let end = chart.add(BlockKind::End, "");
    let mut prev = chart.start_id();
    for &id in ids.iter().chain(std::iter::once(&end)) {
        chart.connect(prev, id).unwrap();
        prev = id;
    }
    (chart, ids, end)
}

/// `i` counts up forever (well, to a million) through a decision loop.
fn counting_loop() -> (Flowchart, BlockId, BlockId) {
    let mut chart = Flowchart::new();
    let init = chart.add(BlockKind::init(), "i = 0");
    let cond = chart.add(BlockKind::cond(), "i < 1000000");
    let calc = chart.add(BlockKind::calc(), "i = i + 1");
    let end = chart.add(BlockKind::End, "");
    chart.connect(chart.start_id(), init).unwrap();
    chart.connect(init, cond).unwrap();
    chart.connect_branch(cond, calc, end).unwrap();
    chart.connect(calc, cond).unwrap();
    (chart, cond, calc)
}

fn branch_chart(n: f64) -> (Flowchart, BlockId, BlockId) {
    let mut chart = Flowchart::new();
    let init = chart.add(BlockKind::init(), format!("n = {n}"));
    let cond = chart.add(BlockKind::cond(), "n > 3");
    let big = chart.add(BlockKind::output(), "\"big\"");
    let small = chart.add(BlockKind::output(), "\"small\"");
    let end = chart.add(BlockKind::End, "");
    chart.connect(chart.start_id(), init).unwrap();
    chart.connect(init, cond).unwrap();
    chart.connect_branch(cond, big, small).unwrap();
    chart.connect(big, end).unwrap();
    chart.connect(small, end).unwrap();
    (chart, big, small)
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn linear_run_prints_and_finishes() {
    let (chart, _, end) = chain(&[
        (BlockKind::init(), "x = 4, y = 5"),
        (BlockKind::output(), "x + y"),
    ]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_finished(&mut r);

    assert_eq!(all_stdout(&mut r), vec!["9"]);
    drain_vars(&mut r);
    assert_eq!(r.variables().get("x"), Some(&Value::Number(4.0)));
    assert_eq!(r.variables().get("y"), Some(&Value::Number(5.0)));
    assert_eq!(r.current_block_id(), Some(end));
    assert_eq!(r.state(), RunState::Stopped(StopReason::Finished));
    assert!(!r.error_occurred());
}

#[test]
fn calc_assigns_declared_variable() {
    let (chart, _, _) = chain(&[
        (BlockKind::init(), "x = 3, y = 0"),
        (BlockKind::calc(), "y = x * x"),
        (BlockKind::output(), "y"),
    ]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_finished(&mut r);
    assert_eq!(all_stdout(&mut r), vec!["9"]);
    assert!(!r.error_occurred());

    // Calc only assigns; an undeclared target halts the run.
    let (chart, ids, _) = chain(&[
        (BlockKind::init(), "x = 3"),
        (BlockKind::calc(), "y = x * x"),
        (BlockKind::output(), "y"),
    ]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_finished(&mut r);
    assert!(r.error_occurred());
    assert_eq!(r.drain_stderr()[0].msg, "error.msg.var_not_defined");
    assert_eq!(r.current_block_id(), Some(ids[1]));
}

#[test]
fn decision_takes_matching_branch() {
    for (n, expected) in [(5.0, "big"), (1.0, "small")] {
        let (chart, _, _) = branch_chart(n);
        let mut r = runner(0);
        start(&mut r, &chart);
        wait_finished(&mut r);
        assert_eq!(all_stdout(&mut r), vec![expected], "n = {n}");
    }
}

#[test]
fn incomplete_decision_fails_build_without_thread() {
    let mut chart = Flowchart::new();
    let cond = chart.add(BlockKind::cond(), "true");
    chart.connect(chart.start_id(), cond).unwrap();

    let mut r = runner(0);
    let errors = r.start(&chart).unwrap_err();
    assert_eq!(errors[0].block, Some(cond));
    assert_eq!(errors[0].error.name, ErrorKind::CompError);
    assert_eq!(errors[0].error.msg, "error.msg.incomplete_tree");
    assert!(!r.is_running());
    assert_eq!(r.current_block_id(), None);
    assert_eq!(r.state(), RunState::Stopped(StopReason::BuildFailed));
}

#[test]
fn type_error_halts_run() {
    let (chart, ids, _) = chain(&[
        (BlockKind::init(), "x = 0"),
        (BlockKind::calc(), "x = 1 + true"),
        (BlockKind::output(), "\"unreachable\""),
    ]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_finished(&mut r);

    assert!(r.error_occurred());
    let errors = r.drain_stderr();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].name, ErrorKind::TypeError);
    assert_eq!(errors[0].arg("operand"), Some("+"));
    assert_eq!(r.current_block_id(), Some(ids[1]));
    assert!(all_stdout(&mut r).is_empty());
    assert_eq!(r.state(), RunState::Stopped(StopReason::Error));

    r.stop();
    assert_eq!(r.state(), RunState::Stopped(StopReason::Error));
}

#[test]
fn error_flag_is_up_before_error_is_queued() {
    let (chart, _, _) = chain(&[(BlockKind::output(), "1 / 0")]);
    let mut r = runner(0);
    start(&mut r, &chart);

    let mut errors = Vec::new();
    wait_for(&mut r, "error message", |r| {
        errors.extend(r.drain_stderr());
        !errors.is_empty()
    });
    assert!(r.error_occurred());
    assert_eq!(errors[0].msg, "error.msg.division_by_zero");
}

#[test]
fn pause_freezes_and_resume_continues() {
    let d = Duration::from_millis(50);
    let (chart, _, _) = counting_loop();
    let mut r = runner(50);
    start(&mut r, &chart);
    wait_for(&mut r, "first variable snapshot", |r| drain_vars(r) > 0);

    r.pause();
    assert!(r.is_paused());
    // Let an in-flight step finish.
    thread::sleep(d * 3);
    drain_vars(&mut r);
    let frozen_at = r.current_block_id();

    thread::sleep(d * 4);
    assert_eq!(r.current_block_id(), frozen_at);
    assert_eq!(drain_vars(&mut r), 0);
    assert!(r.is_running());

    let resumed = Instant::now();
    r.resume();
    assert!(!r.is_paused());
    wait_for(&mut r, "progress after resume", |r| r.current_block_id() != frozen_at);
    assert!(resumed.elapsed() < d * 2, "resume took {:?}", resumed.elapsed());
    r.stop();
    assert_eq!(r.state(), RunState::Stopped(StopReason::Aborted));
}

#[test]
fn step_left_over_from_resume_does_not_defeat_pause() {
    let d = Duration::from_millis(100);
    let (chart, _, _) = counting_loop();
    let mut r = runner(100);
    start(&mut r, &chart);
    wait_for(&mut r, "first variable snapshot", |r| drain_vars(r) > 0);

    // Step requested and abandoned before the worker reaches its hold.
    r.pause();
    r.advance();
    r.resume();
    thread::sleep(d * 3);

    r.pause();
    let frozen_at = r.current_block_id();
    thread::sleep(d * 4);
    assert_eq!(r.current_block_id(), frozen_at);
    assert!(r.is_paused());
    r.stop();
}

#[test]
fn advance_moves_one_block() {
    let d = Duration::from_millis(30);
    let (chart, cond, calc) = counting_loop();
    let mut r = runner(30);
    start(&mut r, &chart);
    wait_for(&mut r, "loop to start", |r| r.current_block_id() == Some(cond));

    r.pause();
    thread::sleep(d * 4);
    let before = r.current_block_id();

    r.advance();
    wait_for(&mut r, "single step", |r| r.current_block_id() != before);
    let after = r.current_block_id();
    assert!(after == Some(cond) || after == Some(calc));

    thread::sleep(d * 4);
    assert_eq!(r.current_block_id(), after);
    assert!(r.is_paused());
    r.stop();
}

#[test]
fn stop_interrupts_pending_read() {
    let (chart, _, _) = chain(&[
        (BlockKind::input(), "read a as Number"),
        (BlockKind::output(), "a"),
    ]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_for(&mut r, "stdin prompt", |r| r.pending_stdin_prompt().is_some());
    assert_eq!(r.pending_stdin_prompt().as_deref(), Some("a (Number)"));

    let begun = Instant::now();
    r.stop();
    assert!(begun.elapsed() < Duration::from_secs(1));
    assert!(!r.is_running());
    assert!(!r.error_occurred());
    assert_eq!(r.pending_stdin_prompt(), None);
    assert_eq!(r.state(), RunState::Stopped(StopReason::Aborted));
    assert!(!r.submit_input("1"));
}

#[test]
fn stdin_feeds_read() {
    let (chart, _, _) = chain(&[
        (BlockKind::input(), "read side as Number"),
        (BlockKind::init(), "vol = side ^ 3"),
        (BlockKind::output(), "\"The volume is $vol\""),
    ]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_for(&mut r, "stdin prompt", |r| r.pending_stdin_prompt().is_some());
    assert!(r.submit_input("2"));
    wait_finished(&mut r);

    assert_eq!(all_stdout(&mut r).last().map(String::as_str), Some("The volume is 8"));
    drain_vars(&mut r);
    assert_eq!(r.variables().get("vol"), Some(&Value::Number(8.0)));
}

#[test]
fn bad_input_is_reported() {
    let (chart, ids, _) = chain(&[(BlockKind::input(), "read ok as Boolean")]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_for(&mut r, "stdin prompt", |r| r.pending_stdin_prompt().is_some());
    r.submit_input("maybe");
    wait_finished(&mut r);

    assert!(r.error_occurred());
    assert_eq!(r.drain_stderr()[0].msg, "error.msg.bad_bool_lit");
    assert_eq!(r.current_block_id(), Some(ids[0]));
}

#[test]
fn runner_is_single_use() {
    let (chart, _, _) = chain(&[(BlockKind::output(), "1")]);
    let mut r = runner(0);
    start(&mut r, &chart);
    wait_finished(&mut r);
    assert_eq!(all_stdout(&mut r), vec!["1"]);

    assert!(r.start(&chart).is_ok());
    assert!(!r.is_running());
    assert!(all_stdout(&mut r).is_empty());
}

#[test]
fn step_delay_is_live() {
    let (chart, _, _) = counting_loop();
    let mut r = runner(10_000);
    start(&mut r, &chart);
    wait_for(&mut r, "first snapshot", |r| drain_vars(r) > 0);

    r.set_step_delay(Duration::from_millis(1));
    assert_eq!(r.step_delay(), Duration::from_millis(1));
    // The step already sleeping keeps its deadline; stop cuts it short.
    let begun = Instant::now();
    r.stop();
    assert!(begun.elapsed() < Duration::from_secs(1));
}
