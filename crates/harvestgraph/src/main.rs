//! Harvestgraph binary: argument handling and the main polling loop.

use clap::Parser;
use harvestgraph::colormap::{ColorRamp, Colormap};
use harvestgraph::exit_codes::ExitCode;
use harvestgraph::render::Grapher;
use harvestgraph::tail::{LogTailer, LIVE_LOG_NAME};
use harvestgraph::window::Window;
use harvestgraph::{logging, Error, Result};
use std::path::PathBuf;
use tracing::{error, info};

/// Live heat map of Chia harvester activity, straight from debug.log
#[derive(Parser)]
#[command(name = "harvestgraph")]
#[command(author, version, about)]
struct Cli {
    /// Harvester log directory [default: ~/.chia/mainnet/log]
    log_dir: Option<PathBuf>,

    /// Colour ramp for the heat map
    #[arg(long, value_enum)]
    colormap: Option<Colormap>,

    /// Diagnostic log filter for stderr (tracing env-filter syntax)
    #[arg(long, env = logging::LOG_ENV)]
    log_level: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());
    match run(cli) {
        Ok(code) => std::process::exit(code.code()),
        Err(err) => {
            error!(%err, "fatal");
            std::process::exit(err.exit_code().code());
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let dir = resolve_log_dir(cli.log_dir)?;
    info!(dir = %dir.display(), "monitoring harvester log directory");

    let ramp = ColorRamp::build(cli.colormap.unwrap_or_else(Colormap::from_env));

    let mut window = Window::new(chrono::Utc::now().timestamp());
    let mut tailer = LogTailer::new(dir)?;
    let lines = tailer.replay(&mut window)?;
    info!(
        lines,
        events = window.recorded(),
        "startup replay complete"
    );

    // Renderer comes up only after replay so a misconfigured log directory
    // fails before the terminal is touched.
    let mut grapher = Grapher::new()?;
    grapher.draw(&window, &ramp)?;

    loop {
        tailer.poll(&mut window)?;
        grapher.draw(&window, &ramp)?;
        if grapher.poll_quit()? {
            break;
        }
    }
    Ok(ExitCode::Clean)
}

/// Use the given directory, or fall back to the default Chia log location.
/// The fallback only counts when a live log actually exists there.
fn resolve_log_dir(arg: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = arg {
        return Ok(dir);
    }
    let Some(home) = dirs::home_dir() else {
        return Err(Error::NoLogDir(PathBuf::from("~/.chia/mainnet/log")));
    };
    let dir = home.join(".chia").join("mainnet").join("log");
    if dir.join(LIVE_LOG_NAME).exists() {
        Ok(dir)
    } else {
        Err(Error::NoLogDir(dir))
    }
}
