use std::collections::HashMap;
use std::time::Duration;

use eframe::egui::{self, Color32, RichText};

use flowrun_lang::{
    BlockId, BlockKind, Catalog, Flowchart, RunOptions, RunState, Runner, StopReason, Value, compile,
};

const CURRENT: Color32 = Color32::from_rgb(230, 200, 80);
const FAILED: Color32 = Color32::from_rgb(220, 80, 80);
const OK: Color32 = Color32::from_rgb(80, 200, 80);
const MUTED: Color32 = Color32::from_rgb(140, 140, 140);

pub fn run(chart: Flowchart, options: RunOptions, catalog: Catalog) -> eframe::Result {
    let native = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flowrun",
        native,
        Box::new(move |_cc| Ok(Box::new(App::new(chart, options, catalog)))),
    )
}

fn mono_row(ui: &mut egui::Ui, label: &str, value: &str, color: Color32) {
    ui.label(RichText::new(label).monospace().color(MUTED));
    ui.label(RichText::new(value).monospace().color(color));
}

// ─── App state ────────────────────────────────────────────────────────────────

#[derive(PartialEq)]
enum Tab { Console, Variables }

enum Line {
    Out(String),
    In(String),
    Err(String),
}

struct App {
    chart: Flowchart,
    catalog: Catalog,
    /// Compile error text per block, refreshed on every edit.
    diagnostics: HashMap<BlockId, String>,
    runner: Runner,
    delay_ms: u64,
    console: Vec<Line>,
    input: String,
    error_block: Option<BlockId>,
    tab: Tab,
    was_running: bool,
}

impl App {
    fn new(chart: Flowchart, options: RunOptions, catalog: Catalog) -> Self {
        let mut app = Self {
            chart,
            catalog,
            diagnostics: HashMap::new(),
            runner: Runner::new(options),
            delay_ms: options.step_delay.as_millis() as u64,
            console: Vec::new(),
            input: String::new(),
            error_block: None,
            tab: Tab::Console,
            was_running: false,
        };
        app.validate_all();
        app
    }

    fn options(&self) -> RunOptions {
        RunOptions { step_delay: Duration::from_millis(self.delay_ms) }
    }

    // ─── Validation ───────────────────────────────────────────────────────────

    fn validate_all(&mut self) {
        let ids: Vec<BlockId> = self.chart.blocks().iter().map(|b| b.id).collect();
        for id in ids {
            self.validate(id);
        }
    }

    /// Compile one block on its own and remember the error, if any.
    fn validate(&mut self, id: BlockId) {
        let Some(block) = self.chart.get(id) else { return };
        if block.kind.is_terminal() {
            self.diagnostics.remove(&id);
            return;
        }
        match compile(block) {
            Ok(_) => {
                self.diagnostics.remove(&id);
            }
            Err(e) => {
                self.diagnostics.insert(id, e.format(&self.catalog));
            }
        }
    }

    // ─── Run control ──────────────────────────────────────────────────────────

    /// Runners are single-use, so every run gets a fresh one.
    fn start_run(&mut self) {
        self.runner.stop();
        self.runner = Runner::new(self.options());
        self.console.clear();
        self.input.clear();
        self.error_block = None;

        if let Err(errors) = self.runner.start(&self.chart) {
            for e in errors {
                if self.error_block.is_none() {
                    self.error_block = e.block;
                }
                let at = e.block.map(|id| format!("{id} ")).unwrap_or_default();
                self.console.push(Line::Err(format!("{at}{}", e.error.format(&self.catalog))));
            }
        }
    }

    fn submit_input(&mut self) {
        let line = std::mem::take(&mut self.input);
        if self.runner.submit_input(line.clone()) {
            self.console.push(Line::In(line));
        }
    }

    /// Drain the runner's channels into the console and variable table.
    /// Returns whether anything arrived.
    fn poll(&mut self) -> bool {
        let out = self.runner.drain_stdout();
        let err = self.runner.drain_stderr();
        let vars = self.runner.drain_variable_updates();
        let any = !(out.is_empty() && err.is_empty() && vars.is_empty());

        for line in out {
            self.console.push(Line::Out(line));
        }
        for e in err {
            self.error_block = self.runner.current_block_id();
            self.console.push(Line::Err(e.format(&self.catalog)));
        }
        any
    }

    /// Keep frames coming while the run is live, for one frame after it
    /// ends, and while drains still return data.
    fn needs_repaint(&mut self) -> bool {
        let running = self.runner.is_running();
        let drained = self.poll();
        let ended_now = self.was_running && !running;
        self.was_running = running;
        running || ended_now || drained
    }
}

// ─── UI ───────────────────────────────────────────────────────────────────────

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.needs_repaint() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_controls(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                // ── Left: blocks ──────────────────────────────────────────────
                cols[0].vertical(|ui| {
                    ui.label("Blocks");
                    egui::ScrollArea::vertical().id_salt("blocks").show(ui, |ui| {
                        self.show_blocks(ui);
                    });
                });

                // ── Right: console and variables ──────────────────────────────
                cols[1].vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.selectable_value(&mut self.tab, Tab::Console, "Console");
                        let vars = format!("Variables ({})", self.runner.variables().len());
                        ui.selectable_value(&mut self.tab, Tab::Variables, vars);
                    });
                    ui.separator();
                    match self.tab {
                        Tab::Console   => self.show_console(ui),
                        Tab::Variables => self.show_variables(ui),
                    }
                });
            });
        });
    }
}

impl App {
    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let state = self.runner.state();
        let active = matches!(state, RunState::Running | RunState::Paused);

        ui.horizontal(|ui| {
            if ui.add_enabled(!active, egui::Button::new("▶ Run")).clicked() {
                self.start_run();
            }
            match state {
                RunState::Paused => {
                    if ui.button("Resume").clicked() {
                        self.runner.resume();
                    }
                }
                _ => {
                    if ui.add_enabled(state == RunState::Running, egui::Button::new("Pause")).clicked() {
                        self.runner.pause();
                    }
                }
            }
            if ui.add_enabled(state == RunState::Paused, egui::Button::new("Step")).clicked() {
                self.runner.advance();
            }
            if ui.add_enabled(active, egui::Button::new("■ Stop")).clicked() {
                self.runner.stop();
            }

            ui.separator();
            let slider = egui::Slider::new(&mut self.delay_ms, 0..=2000).text("delay (ms)");
            if ui.add(slider).changed() {
                self.runner.set_step_delay(Duration::from_millis(self.delay_ms));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (text, color) = match state {
                    RunState::Idle                            => ("idle".to_string(), MUTED),
                    RunState::Building                        => ("building".to_string(), MUTED),
                    RunState::Running                         => ("running".to_string(), OK),
                    RunState::Paused                          => ("paused".to_string(), CURRENT),
                    RunState::Stopped(StopReason::Finished)   => ("✓  finished".to_string(), OK),
                    RunState::Stopped(StopReason::Aborted)    => ("stopped".to_string(), MUTED),
                    RunState::Stopped(reason)                 => (format!("✗  {reason:?}"), FAILED),
                };
                ui.label(RichText::new(text).color(color));
                if !self.diagnostics.is_empty() {
                    let n = self.diagnostics.len();
                    ui.label(RichText::new(format!("{n} block(s) do not compile")).color(FAILED));
                }
            });
        });
    }

    fn show_blocks(&mut self, ui: &mut egui::Ui) {
        let editable = !self.runner.is_running();
        let current = self.runner.current_block_id();
        let mut edited = Vec::new();

        for block in self.chart.blocks_mut() {
            let stroke = if Some(block.id) == self.error_block {
                egui::Stroke::new(2.0, FAILED)
            } else if Some(block.id) == current {
                egui::Stroke::new(2.0, CURRENT)
            } else {
                ui.visuals().widgets.noninteractive.bg_stroke
            };

            egui::Frame::group(ui.style()).stroke(stroke).show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(block.id.to_string()).monospace().color(MUTED));
                    ui.label(RichText::new(block.kind.label()).strong());
                    ui.label(RichText::new(links(&block.kind)).monospace().color(MUTED));
                });
                if block.kind.is_terminal() {
                    return;
                }
                let response = ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut block.content)
                        .font(egui::TextStyle::Monospace)
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    edited.push(block.id);
                }
                if let Some(msg) = self.diagnostics.get(&block.id) {
                    ui.label(RichText::new(msg).monospace().color(FAILED));
                }
            });
        }

        for id in edited {
            self.validate(id);
        }
    }

    fn show_console(&mut self, ui: &mut egui::Ui) {
        let prompt = self.runner.pending_stdin_prompt();
        ui.horizontal(|ui| {
            let waiting = prompt.is_some();
            let hint = prompt.as_deref().unwrap_or("no input requested");
            let response = ui.add_enabled(
                waiting,
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text(hint)
                    .font(egui::TextStyle::Monospace)
                    .desired_width(ui.available_width() - 60.0),
            );
            let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.add_enabled(waiting, egui::Button::new("Send")).clicked() || (waiting && entered) {
                self.submit_input();
            }
        });
        ui.separator();

        egui::ScrollArea::vertical().id_salt("console").stick_to_bottom(true).show(ui, |ui| {
            if self.console.is_empty() {
                ui.label(RichText::new("No output.").color(Color32::GRAY));
            }
            for line in &self.console {
                let (text, color) = match line {
                    Line::Out(s) => (s.clone(), Color32::from_rgb(210, 210, 170)),
                    Line::In(s)  => (format!("> {s}"), Color32::from_rgb(120, 180, 255)),
                    Line::Err(s) => (s.clone(), FAILED),
                };
                ui.label(RichText::new(text).monospace().color(color));
            }
        });
    }

    fn show_variables(&self, ui: &mut egui::Ui) {
        let vars = self.runner.variables();
        if vars.is_empty() {
            ui.label(RichText::new("No variables.").color(Color32::GRAY));
            return;
        }

        egui::Grid::new("variables_grid")
            .striped(true)
            .min_col_width(80.0)
            .show(ui, |ui| {
                ui.label(RichText::new("name").strong());
                ui.label(RichText::new("value").strong());
                ui.end_row();

                for (name, value) in vars {
                    let color = match value {
                        Value::Number(_)  => Color32::from_rgb(180, 255, 180),
                        Value::String(_)  => Color32::from_rgb(210, 210, 170),
                        Value::Boolean(_) => Color32::from_rgb(100, 180, 255),
                        _                 => Color32::GRAY,
                    };
                    mono_row(ui, name, &format!("{} : {}", display(value), value.value_type()), color);
                    ui.end_row();
                }
            });
    }
}

/// Outgoing links of a block, e.g. `→ #3` or `T → #4  F → #5`.
fn links(kind: &BlockKind) -> String {
    let show = |id: &Option<BlockId>| id.map_or_else(|| "?".to_string(), |id| id.to_string());
    match kind {
        BlockKind::End => String::new(),
        BlockKind::Cond { on_true, on_false } => {
            format!("T → {}  F → {}", show(on_true), show(on_false))
        }
        BlockKind::Start { next }
        | BlockKind::Io { next, .. }
        | BlockKind::Init { next }
        | BlockKind::Calc { next } => format!("→ {}", show(next)),
    }
}

/// Strings are quoted so an empty string is visible in the table.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
