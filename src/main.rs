use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;

use downcount::config::{Config, Mode};
use downcount::store::{ConfigPatch, ConfigStore};
use downcount::timer::clock::{MonotonicClock, SystemMonotonicClock, SystemWallClock};
use downcount::timer::engine::{self, RunState};
use downcount::{duration, query};

const DOUBLE_INTERRUPT_WINDOW_MS: u64 = 1_500;
const FINAL_BELL_WINDOW_S: u64 = 5;
const UNTIL_DEFAULT_LEAD_MINUTES: i64 = 10;
const BAR_WIDTH: usize = 30;

#[derive(Parser, Debug)]
#[command(
    name = "downcount",
    version,
    about = "Countdown timer driven by a shareable query-string configuration"
)]
struct Cli {
    /// Raw query string to hydrate the config from, as produced by --print-query
    #[arg(long)]
    query: Option<String>,

    /// Duration text, e.g. "1h30m", "90m" or "01:30:00"
    #[arg(long, short = 'd')]
    duration: Option<String>,

    /// Absolute target as YYYY-MM-DDTHH:MM[:SS]
    #[arg(long)]
    until: Option<String>,

    /// IANA time zone for the --until target, e.g. Europe/Berlin
    #[arg(long)]
    tz: Option<String>,

    #[arg(long)]
    title: Option<String>,

    /// Start counting immediately instead of waiting for the first toggle
    #[arg(long)]
    autostart: bool,

    #[arg(long = "FPS", visible_alias = "fps", default_value_t = 30)]
    refresh_fps: u16,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the canonical shareable query string and exit
    #[arg(long)]
    print_query: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.refresh_fps == 0 {
        bail!("--FPS must be greater than zero");
    }

    let (mut store, autostart) = build_store(&cli)?;

    if cli.dump_config {
        let snapshot =
            serde_json::to_string_pretty(store.config()).context("failed to encode config")?;
        println!("{snapshot}");
        return Ok(());
    }
    if cli.print_query {
        println!("{}", query::encode(store.config()));
        return Ok(());
    }

    hydrate_until_defaults(&mut store);
    run_loop(store.config(), autostart, cli.refresh_fps)
}

fn build_store(cli: &Cli) -> Result<(ConfigStore, bool)> {
    if cli.duration.is_some() && cli.until.is_some() {
        bail!("--duration and --until are mutually exclusive");
    }

    let mut store = ConfigStore::new();
    let mut autostart = cli.autostart;

    if let Some(raw) = &cli.query {
        let q = query::decode(raw);
        if q.get("autostart").map(String::as_str) == Some("1") {
            autostart = true;
        }
        store.hydrate_from_query(&q);
    }

    let mut patch = ConfigPatch::default();
    if let Some(d) = &cli.duration {
        patch.mode = Some(Mode::Duration);
        patch.d = Some(d.clone());
    }
    if let Some(until) = &cli.until {
        let (date, time) = query::parse_combined_target(until)
            .with_context(|| format!("invalid --until '{until}', expected YYYY-MM-DDTHH:MM[:SS]"))?;
        patch.mode = Some(Mode::Until);
        patch.date = Some(date);
        patch.time = Some(time);
    }
    if let Some(tz) = &cli.tz {
        patch.tz = Some(tz.clone());
    }
    if let Some(title) = &cli.title {
        patch.title = Some(title.clone());
    }
    store.patch(patch);

    Ok((store, autostart))
}

/// Arriving in until mode without a concrete target defaults to ten minutes
/// from now in the local zone. This is presentation policy, kept out of the
/// projection engine.
fn hydrate_until_defaults(store: &mut ConfigStore) {
    let config = store.config();
    if config.mode != Mode::Until || (config.date.is_some() && config.time.is_some()) {
        return;
    }
    let target = Local::now() + chrono::Duration::minutes(UNTIL_DEFAULT_LEAD_MINUTES);
    store.patch(ConfigPatch {
        date: Some(target.format("%Y-%m-%d").to_string()),
        time: Some(target.format("%H:%M:%S").to_string()),
        ..ConfigPatch::default()
    });
}

fn run_loop(config: &Config, autostart: bool, refresh_fps: u16) -> Result<()> {
    let monotonic = SystemMonotonicClock::new();
    let wall = SystemWallClock;
    let mut state = RunState::new();

    let interrupts = Arc::new(AtomicU64::new(0));
    {
        let interrupts = Arc::clone(&interrupts);
        ctrlc::set_handler(move || {
            interrupts.fetch_add(1, Ordering::SeqCst);
        })
        .context("failed to install Ctrl-C handler")?;
    }

    // Duration-mode targets are fixed for the session; until-mode targets
    // track the moving wall clock and are recomputed every frame.
    let fixed_target = match config.mode {
        Mode::Duration => Some(engine::target_total_ms(config, &wall)),
        Mode::Until => None,
    };

    if autostart {
        state.resume(monotonic.sample_ms());
    } else {
        let preview = fixed_target.unwrap_or_else(|| engine::target_total_ms(config, &wall));
        println!(
            "paused with {} on the clock - Ctrl-C toggles start/pause, a quick \
             second press resets, and again from reset quits",
            duration::format_duration_ms(preview)
        );
    }

    let frame = Duration::from_millis((1_000 / u64::from(refresh_fps)).max(1));
    let mut stdout = io::stdout();
    let mut seen_interrupts = 0_u64;
    let mut last_toggle_ms: Option<u64> = None;
    let mut last_bell_second: Option<u64> = None;

    loop {
        let sample = monotonic.sample_ms();

        let pending = interrupts.load(Ordering::SeqCst);
        while seen_interrupts < pending {
            seen_interrupts += 1;
            let quick = last_toggle_ms
                .is_some_and(|last| sample.saturating_sub(last) < DOUBLE_INTERRUPT_WINDOW_MS);
            last_toggle_ms = Some(sample);
            if quick {
                // quick double press resets; another from a fresh state quits
                if state == RunState::new() {
                    writeln!(stdout)?;
                    return Ok(());
                }
                state.reset();
            } else {
                state.toggle(sample);
            }
        }

        let target = match fixed_target {
            Some(target) => target,
            None => engine::target_total_ms(config, &wall),
        };
        let remaining = engine::remaining_ms(target, &state, sample);

        render_status(&mut stdout, config, remaining, target, state.running)?;

        if state.running {
            ring_final_seconds(&mut stdout, remaining, &mut last_bell_second)?;
            if remaining == 0 {
                writeln!(stdout)?;
                writeln!(stdout, "Time's up!\x07")?;
                return Ok(());
            }
        }

        thread::sleep(frame);
    }
}

fn render_status(
    out: &mut impl Write,
    config: &Config,
    remaining_ms: u64,
    target_ms: u64,
    running: bool,
) -> Result<()> {
    let parts = engine::breakdown(remaining_ms);
    let mut line = String::new();
    if let Some(title) = &config.title {
        line.push_str(title);
        line.push_str("  ");
    }
    if parts.days > 0 {
        let unit = if parts.days == 1 { "day" } else { "days" };
        line.push_str(&format!("{} {unit} ", parts.days));
    }
    line.push_str(&engine::format_clock(remaining_ms, false));
    if config.bar.is_some_and(|bar| bar.is_on()) {
        line.push_str("  ");
        line.push_str(&ascii_bar(engine::progress_percent(remaining_ms, target_ms)));
    }
    if !running {
        line.push_str("  [paused]");
    }
    write!(out, "\r\x1b[K{line}")?;
    out.flush()?;
    Ok(())
}

fn ascii_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "[{}{}] {:3.0}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Rings the terminal bell once per second over the final stretch of a
/// running timer.
fn ring_final_seconds(
    out: &mut impl Write,
    remaining_ms: u64,
    last_bell_second: &mut Option<u64>,
) -> Result<()> {
    let seconds_total = remaining_ms / 1_000;
    if seconds_total == 0 || seconds_total > FINAL_BELL_WINDOW_S {
        return Ok(());
    }
    if *last_bell_second != Some(seconds_total) {
        *last_bell_second = Some(seconds_total);
        write!(out, "\x07")?;
        out.flush()?;
    }
    Ok(())
}
