mod app;
mod headless;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use flowrun_lang::{BlockKind, Catalog, Flowchart, FlowchartError, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "flowrun", about = "Run flowchart programs one block at a time")]
struct Cli {
    /// Flowchart JSON file. A small demo chart is loaded when omitted.
    flowchart: Option<PathBuf>,

    /// Pause between two blocks, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Run in the terminal instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Message catalog used to render errors
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let chart = match load_chart(cli.flowchart.as_deref()) {
        Ok(chart) => chart,
        Err(msg) => {
            error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let catalog = match &cli.catalog {
        Some(path) => match Catalog::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!(path = %path.display(), %e, "could not load message catalog");
                return ExitCode::FAILURE;
            }
        },
        None => Catalog::english(),
    };

    let options = RunOptions { step_delay: Duration::from_millis(cli.delay_ms) };

    if cli.headless {
        return headless::run(&chart, options, &catalog);
    }

    match app::run(chart, options, catalog) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "window failed");
            ExitCode::FAILURE
        }
    }
}

// ─── Flowchart loading ────────────────────────────────────────────────────────

fn load_chart(path: Option<&Path>) -> Result<Flowchart, String> {
    let Some(path) = path else {
        return demo_chart().map_err(|e| format!("demo flowchart: {e}"));
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    Flowchart::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))
}

/// Reads a cube side, prints its volume and comments on the size.
fn demo_chart() -> Result<Flowchart, FlowchartError> {
    let mut chart = Flowchart::new();
    let read = chart.add(BlockKind::input(), "read side as Number");
    let volume = chart.add(BlockKind::init(), "vol = side ^ 3");
    let print = chart.add(BlockKind::output(), "\"The volume is $vol\"");
    let big = chart.add(BlockKind::cond(), "vol > 100");
    let yes = chart.add(BlockKind::output(), "\"That is a big cube\"");
    let no = chart.add(BlockKind::output(), "\"A small one, sqrt of the volume is \" + round(sqrt(vol), 2)");
    let end = chart.add(BlockKind::End, "");

    chart.connect(chart.start_id(), read)?;
    chart.connect(read, volume)?;
    chart.connect(volume, print)?;
    chart.connect(print, big)?;
    chart.connect_branch(big, yes, no)?;
    chart.connect(yes, end)?;
    chart.connect(no, end)?;
    Ok(chart)
}
