//! Terminal front-end: the same polling supervisor as the window, with
//! stdout lines printed and stdin lines forwarded to pending reads.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use flowrun_lang::{BuildError, Catalog, Flowchart, RunOptions, RunState, Runner, StopReason};

const POLL: Duration = Duration::from_millis(10);

pub fn run(chart: &Flowchart, options: RunOptions, catalog: &Catalog) -> ExitCode {
    let mut runner = Runner::new(options);
    if let Err(errors) = runner.start(chart) {
        for e in &errors {
            eprintln!("{}", describe_build_error(e, catalog));
        }
        return ExitCode::FAILURE;
    }

    let lines = spawn_stdin_reader();
    let mut prompted = false;
    let mut stdin_open = true;

    loop {
        let finished = !runner.is_running();
        flush(&mut runner, catalog);
        if finished {
            break;
        }

        match runner.pending_stdin_prompt() {
            Some(prompt) => {
                if !prompted {
                    print!("{prompt}> ");
                    let _ = io::stdout().flush();
                    prompted = true;
                }
                match lines.try_recv() {
                    Ok(line) => {
                        runner.submit_input(line);
                        prompted = false;
                    }
                    Err(TryRecvError::Disconnected) if stdin_open => {
                        stdin_open = false;
                        warn!("stdin closed while a read was pending");
                        runner.stop();
                    }
                    Err(_) => {}
                }
            }
            None => prompted = false,
        }

        thread::sleep(POLL);
    }

    flush(&mut runner, catalog);
    debug!(state = ?runner.state(), "headless run ended");
    match runner.state() {
        RunState::Stopped(StopReason::Finished) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Print everything queued so far. Variable snapshots are folded into the
/// runner's table so their channel does not grow.
fn flush(runner: &mut Runner, catalog: &Catalog) {
    loop {
        let out = runner.drain_stdout();
        let err = runner.drain_stderr();
        let vars = runner.drain_variable_updates();
        if out.is_empty() && err.is_empty() && vars.is_empty() {
            return;
        }
        for line in out {
            println!("{line}");
        }
        for e in err {
            let at = runner.current_block_id().map(|id| format!(" at {id}")).unwrap_or_default();
            eprintln!("error{at}: {}", e.format(catalog));
        }
    }
}

/// Lines from the process stdin. The reader blocks on its own thread so the
/// poll loop never waits on the terminal.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn describe_build_error(e: &BuildError, catalog: &Catalog) -> String {
    match e.block {
        Some(id) => format!("build error at {id}: {}", e.error.format(catalog)),
        None => format!("build error: {}", e.error.format(catalog)),
    }
}
