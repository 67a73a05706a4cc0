use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use beatglow::{DescriptorSource, Fps, PngSequenceSink, RenderConfig, VisualizationModel};

#[derive(Parser, Debug)]
#[command(name = "beatglow", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized visualization model as JSON.
    Inspect(InspectArgs),
    /// Render the frame shown at a playback time as a PNG.
    Frame(FrameArgs),
    /// Render the whole track as a numbered PNG sequence.
    Render(RenderArgs),
}

/// Descriptor input plus rendering overrides shared by all subcommands.
#[derive(Args, Debug)]
struct StyleArgs {
    /// Analysis descriptor: a JSON file path or an http(s) URL.
    #[arg(long = "in")]
    input: String,

    /// Rendering configuration JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fallback palette theme (pastel, neon, sunset).
    #[arg(long)]
    theme: Option<String>,

    /// Surface width in CSS pixels.
    #[arg(long)]
    width: Option<f64>,

    /// Surface height in CSS pixels.
    #[arg(long)]
    height: Option<f64>,

    /// Device pixel ratio.
    #[arg(long)]
    dpr: Option<f64>,

    #[arg(long)]
    sensitivity: Option<f64>,

    #[arg(long)]
    glow: Option<f64>,

    #[arg(long)]
    particle_gain: Option<f64>,

    /// Seed for effect spawning.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[command(flatten)]
    style: StyleArgs,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    style: StyleArgs,

    /// Playback time in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Simulation frame rate used to reach `--at`.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    style: StyleArgs,

    /// Output directory for `frame_00000.png`, `frame_00001.png`, ...
    #[arg(long)]
    out: PathBuf,

    /// Output frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Fail instead of replacing frame files that already exist.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("BEATGLOW_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(style: &StyleArgs) -> anyhow::Result<RenderConfig> {
    let mut cfg = match &style.config {
        Some(path) => RenderConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(theme) = &style.theme {
        cfg.theme = theme.clone();
    }
    if let Some(w) = style.width {
        cfg.surface.css_width = w;
    }
    if let Some(h) = style.height {
        cfg.surface.css_height = h;
    }
    if let Some(dpr) = style.dpr {
        cfg.surface.device_pixel_ratio = dpr;
    }
    if let Some(v) = style.sensitivity {
        cfg.sensitivity = v;
    }
    if let Some(v) = style.glow {
        cfg.glow = v;
    }
    if let Some(v) = style.particle_gain {
        cfg.particle_gain = v;
    }
    if let Some(seed) = style.seed {
        cfg.seed = seed;
    }
    cfg.validate().context("invalid rendering configuration")?;
    Ok(cfg)
}

fn load(style: &StyleArgs) -> anyhow::Result<(RenderConfig, Arc<VisualizationModel>)> {
    let cfg = load_config(style)?;
    let src = DescriptorSource::parse(&style.input);
    let model = beatglow::load_model(&src, &cfg.model_options())
        .with_context(|| format!("load descriptor '{src}'"))?;
    Ok((cfg, Arc::new(model)))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let (_, model) = load(&args.style)?;
    let json = if args.compact {
        serde_json::to_string(model.as_ref())
    } else {
        serde_json::to_string_pretty(model.as_ref())
    }
    .context("serialize model")?;
    println!("{json}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (cfg, model) = load(&args.style)?;
    let fps = Fps::new(args.fps, 1)?;
    let frame = beatglow::render_frame_at(model, &cfg, fps, args.at)?;
    beatglow::write_png(&args.out, &frame)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (cfg, model) = load(&args.style)?;
    let fps = Fps::new(args.fps, 1)?;
    let mut sink = PngSequenceSink::new(&args.out).with_overwrite(!args.no_overwrite);

    let stats = beatglow::render_timeline(model, &cfg, fps, &mut sink)
        .with_context(|| format!("render '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {} beats)",
        args.out.display(),
        stats.frames,
        stats.beats_fired
    );
    Ok(())
}
