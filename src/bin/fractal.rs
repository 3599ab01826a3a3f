use std::io::{BufRead as _, IsTerminal as _, Write as _};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fractal_generator::{FractalConfig, JobController, JobOutcome, VideoParams};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "fractal", version, about = "Render Mandelbrot and Julia sets")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single still as a PNG.
    Photo(PhotoArgs),
    /// Render a zooming video (`.avi` natively, other containers via `ffmpeg` on PATH).
    Video(VideoArgs),
}

#[derive(Parser, Debug)]
struct PhotoArgs {
    /// Fractal config JSON. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Print row progress while rendering.
    #[arg(long)]
    progress: bool,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    /// Fractal config JSON. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Zoom of the first frame, as scale per pixel of height. Note this is twice the unit of
    /// the config `zoom`: `--zoom-start 1` matches a still rendered with `zoom: 2`.
    #[arg(long, default_value_t = 0.8)]
    zoom_start: f64,

    /// Per-frame zoom multiplier.
    #[arg(long, default_value_t = 1.02)]
    zoom_step: f64,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    framerate: u32,

    /// Stop after this many frames. Without it the video runs until Enter is pressed.
    #[arg(long)]
    frames: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let controller = JobController::new();
    let outcome = match cli.cmd {
        Command::Photo(args) => cmd_photo(&controller, args)?,
        Command::Video(args) => cmd_video(&controller, args)?,
    };
    match outcome {
        JobOutcome::Saved(path) => {
            eprintln!("wrote {}", path.display());
            Ok(())
        }
        JobOutcome::Failed(msg) => anyhow::bail!("render failed: {msg}"),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<FractalConfig> {
    Ok(match path {
        Some(p) => FractalConfig::from_path(p)?,
        None => FractalConfig::default(),
    })
}

fn cmd_photo(controller: &JobController, args: PhotoArgs) -> anyhow::Result<JobOutcome> {
    let cfg = load_config(args.config.as_ref())?;
    let handle = controller.begin_photo(&cfg, &args.out, args.progress)?;
    let outcome = handle.wait(|p| {
        eprint!("\rrendering {:5.1}%", p * 100.0);
        let _ = std::io::stderr().flush();
    });
    if args.progress {
        eprintln!("\rrendering 100.0%");
    }
    Ok(outcome)
}

fn cmd_video(controller: &JobController, args: VideoArgs) -> anyhow::Result<JobOutcome> {
    let cfg = load_config(args.config.as_ref())?;
    let mut params = VideoParams::new(args.zoom_start, args.zoom_step, args.framerate);
    if let Some(n) = args.frames {
        params = params.with_frame_limit(n);
    }
    let handle = controller.begin_video(&cfg, params, &args.out)?;

    if args.frames.is_none() {
        if std::io::stdin().is_terminal() {
            eprintln!("recording; press Enter to stop");
        }
        let stopper = controller.clone();
        std::thread::spawn(move || {
            let mut line = String::new();
            // EOF on stdin counts as a stop request too.
            let _ = std::io::stdin().lock().read_line(&mut line);
            stopper.request_stop_video();
        });
    }

    let outcome = handle.wait(|secs| {
        eprint!("\rencoded {secs:7.2}s");
        let _ = std::io::stderr().flush();
    });
    eprintln!();
    Ok(outcome)
}
