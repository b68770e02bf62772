//! Colorful console output for engine events.
//!
//! Provides a custom `tracing` layer that formats the constraint lifecycle events
//! of `rotaforge_engine` with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (rebuild, commit, replay, solve, diagnosis)
//! - **WARN**: Commit mismatches and exhausted validations
//! - **DEBUG**: Solver internals, not rendered by this layer

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static SOLVE_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "rotaforge_engine=info";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. An already
/// installed global subscriber is left in place.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(EngineConsoleLayer)
            .try_init();
    });
}

fn mark_solve_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    SOLVE_START_NANOS.store(nanos, Ordering::Relaxed);
}

fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = SOLVE_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
 ____       _        _____
|  _ \ ___ | |_ __ _|  ___|__  _ __ __ _  ___
| |_) / _ \| __/ _` | |_ / _ \| '__/ _` |/ _ \
|  _ < (_) | || (_| |  _| (_) | | | (_| |  __/
|_| \_\___/ \__\__,_|_|  \___/|_|  \__, |\___|
                                   |___/
"#;

    let version_line = format!("          v{} - Constraint Lifecycle Engine\n", VERSION);

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats engine events with colors.
pub struct EngineConsoleLayer;

impl<S: Subscriber> Layer<S> for EngineConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("rotaforge_engine") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    text: Option<String>,
    status: Option<String>,
    state: Option<String>,
    error: Option<String>,
    reason: Option<String>,
    generation: Option<u64>,
    attempt: Option<u64>,
    attempts: Option<u64>,
    max_attempts: Option<u64>,
    identifiers: Option<u64>,
    variables: Option<u64>,
    containers: Option<u64>,
    committed: Option<u64>,
    failed: Option<u64>,
    inactive: Option<u64>,
    active_constraints: Option<u64>,
    constraints: Option<u64>,
    phrases: Option<u64>,
    assigned: Option<u64>,
    duration_ms: Option<u64>,
    time_limit_secs: Option<u64>,
    total_slack: Option<f64>,
}

impl EventVisitor {
    fn set_str(&mut self, name: &str, value: String) {
        let slot = match name {
            "event" => &mut self.event,
            "text" => &mut self.text,
            "status" => &mut self.status,
            "state" => &mut self.state,
            "error" => &mut self.error,
            "reason" => &mut self.reason,
            _ => return,
        };
        *slot = Some(value);
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_str(field.name(), s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_str(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let slot = match field.name() {
            "generation" => &mut self.generation,
            "attempt" => &mut self.attempt,
            "attempts" => &mut self.attempts,
            "max_attempts" => &mut self.max_attempts,
            "identifiers" => &mut self.identifiers,
            "variables" => &mut self.variables,
            "containers" => &mut self.containers,
            "committed" => &mut self.committed,
            "failed" => &mut self.failed,
            "inactive" => &mut self.inactive,
            "active_constraints" => &mut self.active_constraints,
            "constraints" => &mut self.constraints,
            "phrases" => &mut self.phrases,
            "assigned" => &mut self.assigned,
            "duration_ms" => &mut self.duration_ms,
            "time_limit_secs" => &mut self.time_limit_secs,
            _ => return,
        };
        *slot = Some(value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if field.name() == "total_slack" {
            self.total_slack = Some(value);
        }
    }
}

fn format_event(v: &EventVisitor) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "model_rebuild" => format_rebuild(v),
        "validation_attempt" => format_attempt(v),
        "validation_retry" => format_retry(v),
        "validation_exhausted" => format_exhausted(v),
        "commit" => format_commit(v),
        "commit_mismatch" => format_mismatch(v),
        "replay_end" => format_replay_end(v),
        "solve_start" => format_solve_start(v),
        "solve_end" => format_solve_end(v),
        "iis_computed" => format_iis(v),
        "relaxation_end" => format_relaxation_end(v),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs()).bright_black().to_string()
}

fn count(n: Option<u64>) -> String {
    n.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn quoted(text: Option<&str>) -> String {
    format!("\"{}\"", text.unwrap_or(""))
}

fn format_rebuild(v: &EventVisitor) -> String {
    format!(
        "{} {} Model rebuilt │ generation {} │ {} variables │ {} containers",
        format_elapsed(),
        "↻".bright_blue(),
        count(v.generation).white().bold(),
        count(v.variables).bright_yellow(),
        count(v.containers).bright_yellow(),
    )
}

fn format_attempt(v: &EventVisitor) -> String {
    format!(
        "{} {} Translating {} │ attempt {}/{}",
        format_elapsed(),
        "…".bright_black(),
        quoted(v.text.as_deref()).white(),
        count(v.attempt),
        count(v.max_attempts),
    )
}

fn format_retry(v: &EventVisitor) -> String {
    format!(
        "{} {} Retrying {} │ {}",
        format_elapsed(),
        "⟳".yellow(),
        quoted(v.text.as_deref()).white(),
        v.error.as_deref().unwrap_or("").yellow(),
    )
}

fn format_exhausted(v: &EventVisitor) -> String {
    let detail = v.reason.as_deref().or(v.error.as_deref()).unwrap_or("");
    format!(
        "{} {} Rejected {} after {} attempt(s) │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        quoted(v.text.as_deref()).white(),
        count(v.attempts),
        detail.bright_red(),
    )
}

fn format_commit(v: &EventVisitor) -> String {
    format!(
        "{} {} Committed {} │ {} constraint(s)",
        format_elapsed(),
        "✓".bright_green(),
        quoted(v.text.as_deref()).white(),
        count(v.identifiers).bright_yellow(),
    )
}

fn format_mismatch(v: &EventVisitor) -> String {
    format!(
        "{} {} Commit mismatch {} │ {}",
        format_elapsed(),
        "⚠".bright_red().bold(),
        quoted(v.text.as_deref()).white(),
        v.error.as_deref().unwrap_or("").bright_red(),
    )
}

fn format_replay_end(v: &EventVisitor) -> String {
    let failed = v.failed.unwrap_or(0);
    let failed_text = count(v.failed);
    let failed_colored = if failed > 0 {
        failed_text.bright_red().bold().to_string()
    } else {
        failed_text.white().to_string()
    };
    format!(
        "{} {} Replay done │ {} committed │ {} failed │ {} inactive",
        format_elapsed(),
        "◀".bright_blue(),
        count(v.committed).bright_green(),
        failed_colored,
        count(v.inactive).bright_black(),
    )
}

fn format_solve_start(v: &EventVisitor) -> String {
    mark_solve_start();
    let mut output = format!(
        "{} {} Solving │ generation {} │ {} active constraint(s)",
        format_elapsed(),
        "▶".bright_green().bold(),
        count(v.generation).white().bold(),
        count(v.active_constraints).bright_yellow(),
    );

    let time_limit = v.time_limit_secs.unwrap_or(0);
    if time_limit > 0 {
        output.push_str(&format!(
            " │ {}s limit",
            time_limit.to_formatted_string(&Locale::en).bright_yellow()
        ));
    }

    output
}

fn format_solve_end(v: &EventVisitor) -> String {
    let state = v.state.as_deref().unwrap_or("UNKNOWN");
    let colored_state = match state {
        "OPTIMAL" => state.bright_green().bold().to_string(),
        "SUBOPTIMAL" => state.yellow().bold().to_string(),
        "INFEASIBLE" => state.bright_red().bold().to_string(),
        _ => state.red().bold().to_string(),
    };

    format!(
        "{} {} Solving complete │ {} │ {} assigned │ {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        colored_state,
        count(v.assigned).bright_yellow(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
    )
}

fn format_iis(v: &EventVisitor) -> String {
    format!(
        "{} {} Conflict │ {} constraint(s) │ {} phrase(s)",
        format_elapsed(),
        "⊘".bright_red(),
        count(v.constraints).bright_red(),
        count(v.phrases).bright_red(),
    )
}

fn format_relaxation_end(v: &EventVisitor) -> String {
    let status = v.status.as_deref().unwrap_or("UNKNOWN");
    format!(
        "{} {} Relaxed │ {} │ total slack {} │ {} phrase(s) violated",
        format_elapsed(),
        "≈".bright_magenta(),
        status.white().bold(),
        format!("{:.3}", v.total_slack.unwrap_or(0.0)).bright_magenta(),
        count(v.phrases).bright_yellow(),
    )
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests;
