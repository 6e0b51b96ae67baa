//! doorkit-demo - a test door for doorkit
//!
//! Exercises every piece of the library against a real caller: drop file,
//! terminal size probe, art playback, colors, SyncTERM fonts, a modal
//! dialog and the idle timeout.
//!
//! # Quick Start
//!
//! ```text
//! doorkit-demo --path /bbs/temp/1/            # door32.sys in that directory
//! doorkit-demo --path /bbs/temp --node 2      # /bbs/temp/node2/door32.sys
//! doorkit-demo --path /bbs/temp --dialect doorsys
//! ```
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Caller quit, was refused, or went idle |
//! | 1 | Fatal error (drop file, art, terminal I/O) |
//! | 2 | Usage error |

use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crossterm::terminal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use doorkit::core::geometry::{
    raw_stdin, CrosstermRawMode, Passthrough, RawMode, TerminalGeometryProbe,
};
use doorkit::ui::ansi::{glyph, Color, Font, MoveCursor, Style};
use doorkit::ui::input::{stdout_notice, InputError};
use doorkit::ui::{ArtDocument, Modal, NamedKey};
use doorkit::{AnsiRenderer, Config, CrosstermKeys, Dialect, DoorError, Session, SessionInput};

const EXIT_FATAL: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// How long the idle notice stays up before the door exits
const IDLE_NOTICE_LINGER: Duration = Duration::from_secs(2);

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line arguments
#[derive(Debug, Default)]
struct Args {
    /// Directory holding the drop file
    path: Option<PathBuf>,
    /// Node subdirectory (`<path>/node<N>`)
    node: Option<u32>,
    /// Overrides the configured dialect
    dialect: Option<Dialect>,
    /// Explicit config file
    config: Option<PathBuf>,
}

fn print_version() {
    eprintln!("doorkit-demo {}", VERSION);
}

fn print_help() {
    eprintln!("doorkit-demo {} - test door for doorkit", VERSION);
    eprintln!();
    eprintln!("Usage: doorkit-demo --path <DIR> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --path <DIR>        Directory containing the drop file (required)");
    eprintln!("  -n, --node <N>          Read the drop file from <DIR>/node<N>");
    eprintln!("  -d, --dialect <NAME>    Drop file format: door32 (default) or doorsys");
    eprintln!("  -c, --config <FILE>     Config file (default: ~/.doorkit/config.toml)");
    eprintln!("  -v, --version           Show version");
    eprintln!("  -h, --help              Show this help");
    eprintln!();
    eprintln!("Logging: ~/.doorkit/doorkit.log, filter with DOORKIT_LOG=debug");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-p" | "--path" | "-n" | "--node" | "-d" | "--dialect" | "-c" | "--config" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| format!("Missing value for {}", flag))?;
                match flag {
                    "-p" | "--path" => parsed.path = Some(PathBuf::from(value)),
                    "-n" | "--node" => {
                        parsed.node = Some(
                            value
                                .parse()
                                .map_err(|_| format!("Invalid node number: {}", value))?,
                        )
                    }
                    "-d" | "--dialect" => parsed.dialect = Some(value.parse()?),
                    _ => parsed.config = Some(PathBuf::from(value)),
                }
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Log to a file; stdout belongs to the caller. Returns false if no log is open.
fn init_logging(config: &Config) -> bool {
    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match log_file {
        Ok(file) => {
            let filter = EnvFilter::try_from_env("DOORKIT_LOG")
                .or_else(|_| EnvFilter::try_new(&config.log.level))
                .unwrap_or_else(|_| EnvFilter::new("info"));
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber).is_ok()
        }
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            false
        }
    }
}

/// Keeps the terminal raw for single-key input, restored on drop
struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        let enabled = io::stdin().is_terminal();
        if enabled {
            terminal::enable_raw_mode()?;
        }
        Ok(Self { enabled })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            let _ = terminal::disable_raw_mode();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(EXIT_USAGE);
        }
    };

    let Some(path) = args.path.clone() else {
        eprintln!("missing path to drop file directory: --path");
        std::process::exit(EXIT_USAGE);
    };

    // An explicit --config must be valid; the default one may fall back
    let (config, config_error) = match &args.config {
        Some(file) => (Config::load_from(file)?, None),
        None => match Config::load() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };
    let logging = init_logging(&config);
    info!("doorkit-demo {} starting", VERSION);
    if let Some(e) = config_error {
        warn!("{}, using defaults", e);
        if !logging {
            eprintln!("Warning: {}, using defaults", e);
        }
    }

    if let Err(e) = run(&args, path, &config) {
        error!("Door failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_FATAL);
    }

    info!("doorkit-demo exiting");
    Ok(())
}

fn run(args: &Args, path: PathBuf, config: &Config) -> doorkit::Result<()> {
    let dialect = args.dialect.unwrap_or(config.dialect);

    let mode: Box<dyn RawMode> = if io::stdin().is_terminal() {
        Box::new(CrosstermRawMode)
    } else {
        Box::new(Passthrough)
    };
    let mut probe = TerminalGeometryProbe::new(raw_stdin()?, io::stdout(), mode);
    let session = Session::bootstrap(&path, args.node, dialect, &mut probe)?;
    drop(probe);

    let mut renderer = AnsiRenderer::new(io::stdout()).with_line_delay(config.line_delay());
    renderer.clear_screen()?;

    if !session.supports_ansi() {
        info!("Refusing non-ANSI caller {}", session.alias());
        renderer.println("Sorry, ANSI is required to use this...")?;
        thread::sleep(Duration::from_secs(2));
        return Ok(());
    }

    let _raw = RawModeGuard::enable().map_err(InputError::from)?;
    let mut input = SessionInput::new(
        CrosstermKeys,
        config.idle_timeout(),
        stdout_notice(IDLE_NOTICE_LINGER),
    );

    match menu_loop(&session, config, &mut renderer, &mut input) {
        Err(e) if e.is_idle_timeout() => {
            info!("Caller {} went idle", session.alias());
            Ok(())
        }
        other => other,
    }
}

fn menu_loop<W: io::Write>(
    session: &Session,
    config: &Config,
    renderer: &mut AnsiRenderer<W>,
    input: &mut SessionInput<CrosstermKeys>,
) -> doorkit::Result<()> {
    let token = input.token();

    loop {
        if token.is_cancelled() {
            return Err(DoorError::Input(InputError::IdleTimeout));
        }

        draw_menu(session, renderer)?;
        let key = input.read_key()?;

        if key.is('q') || key.is_key(NamedKey::Escape) {
            info!("Caller {} quit", session.alias());
            break;
        }

        let Some(ch) = key.ch.map(|c| c.to_ascii_lowercase()) else {
            renderer.clear_screen()?;
            continue;
        };

        match ch {
            'a' => {
                renderer.clear_screen()?;
                renderer.println("\r\nART TEST:")?;
                let art = ArtDocument::load(config.art_path("mx-sm.ans"))?;
                renderer.stream(art.raw())?;
                input.pause(renderer.get_mut())?;
            }
            'c' => {
                renderer.clear_screen()?;
                renderer.println("\r\nCOLOR TEST:")?;
                renderer.styled(" White Text on Blue ", Style::fg(Color::White).on(Color::Blue))?;
                renderer.println("")?;
                renderer.styled(" Red Text on Bright Red ", Style::bright(Color::Red).on(Color::Red))?;
                renderer.println("")?;
                input.pause(renderer.get_mut())?;
            }
            'd' => {
                let descriptor = session.descriptor();
                renderer.clear_screen()?;
                renderer.println("\r\nDROP FILE:")?;
                renderer.print("Alias: ")?;
                renderer.write_bytes(&descriptor.raw_alias)?;
                renderer.println("")?;
                match descriptor.node {
                    Some(node) => renderer.println(&format!("Node: {}", node))?,
                    None => renderer.println("Node: -")?,
                }
                renderer.println(&format!("Emulation: {}", descriptor.emulation.name()))?;
                renderer.println(&format!("Time Left: {}", descriptor.time_left))?;
                input.pause(renderer.get_mut())?;
            }
            'f' => {
                renderer.clear_screen()?;
                renderer.println("\r\nFONT TEST (SyncTERM):")?;
                for font in Font::ALL {
                    renderer.command(font)?;
                    renderer.println(font.name())?;
                }
                renderer.command(Font::Ibm)?;
                input.pause(renderer.get_mut())?;
            }
            'm' => {
                let background = ArtDocument::load(config.art_path(&config.modal.background))?;
                let modal = Modal::new(background, config.modal.width)
                    .with_ack_delay(config.modal_ack_delay());
                modal.ask("Continue? Y/n", session, renderer, input)?;
            }
            't' => {
                let geometry = session.geometry();
                renderer.clear_screen()?;
                // The corners should sit exactly on the screen edges
                for (row, col) in [
                    (1, 1),
                    (1, geometry.width),
                    (geometry.height, 1),
                    (geometry.height, geometry.width),
                ] {
                    renderer.print_at("+", row, col)?;
                }
                renderer.command(MoveCursor::new(2, 3))?;
                renderer.println("TERMINAL SIZE DETECT:")?;
                renderer.print_at(&format!("Height: {}", geometry.height), 3, 3)?;
                renderer.print_at(&format!("Width: {}", geometry.width), 4, 3)?;
                input.pause(renderer.get_mut())?;
            }
            _ => {}
        }
        renderer.clear_screen()?;
    }

    Ok(())
}

fn draw_menu<W: io::Write>(session: &Session, renderer: &mut AnsiRenderer<W>) -> doorkit::Result<()> {
    let descriptor = session.descriptor();
    let status = format!(
        " {} | {} min left",
        session.alias(),
        descriptor.time_left_duration().as_secs() / 60
    );
    renderer.status_line(&status, session.geometry().height)?;
    renderer.command(MoveCursor::new(1, 1))?;

    renderer.print("\r\n")?;
    renderer.styled_bytes(glyph::ARROW_RIGHT, Style::bright(Color::Cyan))?;
    renderer.styled(" DOORKIT TEST MENU", Style::fg(Color::Cyan))?;
    renderer.println("\r\n")?;

    let items = [
        ('A', "Art Test"),
        ('C', "Color Test"),
        ('D', "Drop File Test"),
        ('F', "Font Test"),
        ('M', "Modal Test"),
        ('T', "Term Size Test"),
        ('Q', "Quit"),
    ];
    for (key, label) in items {
        renderer.styled("[", Style::fg(Color::Cyan))?;
        renderer.styled(&key.to_string(), Style::bright(Color::Yellow))?;
        renderer.styled("] ", Style::fg(Color::Cyan))?;
        renderer.styled(label, Style::fg(Color::Magenta))?;
        renderer.println("")?;
    }
    renderer.print("\r\nCommand? ")?;
    Ok(())
}
