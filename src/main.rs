use anyhow::Context;
use clap::{Parser, Subcommand};
use dwellkey::config::{Config, DEFAULT_CONFIG_PATH};
use dwellkey::overlay::LogDisplay;
use dwellkey::pointer::PointerSource;
use dwellkey::replay::ReplaySource;
use dwellkey::session::{self, Session};
use dwellkey::tui::TerminalDisplay;
use dwellkey::typing::OsTyper;
use dwellkey::vision::AnnotatedDetector;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dwellkey", about = "Type by holding a fingertip over an on-screen keyboard")]
struct Cli {
    /// Config file (defaults to ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the dwell time in milliseconds
    #[arg(long, global = true)]
    hold_ms: Option<u64>,

    /// Log more (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal keyboard; hold the left mouse button to "point" (default)
    Pointer,
    /// Feed a recorded landmark session (JSON lines) through the keyboard
    Replay {
        file: PathBuf,
        /// Pace frames by their recorded timestamps
        #[arg(long)]
        realtime: bool,
        /// Draw the keyboard in the terminal while replaying
        #[arg(long)]
        show: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

#[hotpath::main]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .as_deref()
        .unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    let mut config = Config::load(config_path)?;
    if let Some(ms) = cli.hold_ms {
        config.hold_time_ms = ms;
    }

    let mut session = Session::new(&config);
    if config.typing.forward {
        match OsTyper::new() {
            Ok(typer) => {
                log::info!("Forwarding keystrokes to the focused application");
                session = session.with_keystroke_sink(Box::new(typer));
            }
            Err(e) => log::warn!("Keystroke forwarding disabled: {}", e),
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    match cli.command.unwrap_or(Command::Pointer) {
        Command::Pointer => run_pointer(&config, &mut session, &running)?,
        Command::Replay {
            file,
            realtime,
            show,
        } => run_replay(&config, &mut session, &running, &file, realtime, show)?,
    }

    eprint!("{}", session.stats().summary());
    println!("{}", session.text());
    Ok(())
}

fn run_pointer(config: &Config, session: &mut Session, running: &AtomicBool) -> anyhow::Result<()> {
    let (width, height) = (config.display.frame_width, config.display.frame_height);
    let (min_w, min_h) = session.layout().min_frame_size();
    if width < min_w || height < min_h {
        log::warn!(
            "Frame {}x{} is smaller than the keyboard ({}x{}); keys will be clipped",
            width,
            height,
            min_w,
            min_h
        );
    }

    let (mut display, pointer_rx) =
        TerminalDisplay::new(Duration::from_millis(config.display.poll_ms))
            .context("Failed to set up the terminal")?;
    let mut source = PointerSource::new(pointer_rx, width, height)?;
    session::run(session, &mut source, &mut AnnotatedDetector, &mut display, running)
}

fn run_replay(
    config: &Config,
    session: &mut Session,
    running: &AtomicBool,
    file: &Path,
    realtime: bool,
    show: bool,
) -> anyhow::Result<()> {
    let mut source = ReplaySource::open(file)?.realtime(realtime);
    if show {
        let (mut display, _pointer_rx) =
            TerminalDisplay::new(Duration::from_millis(config.display.poll_ms))
                .context("Failed to set up the terminal")?;
        session::run(session, &mut source, &mut AnnotatedDetector, &mut display, running)
    } else {
        session::run(session, &mut source, &mut AnnotatedDetector, &mut LogDisplay::new(), running)
    }
}
