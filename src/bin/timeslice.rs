use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use timeslice::{
    FfmpegSink, FfmpegSinkOpts, FrameSink, PlaneAnimation, PlaneCorners, PngSequenceSink,
    ResolutionPct, SliceJob, SliceOpts, Threading,
};

#[derive(Parser, Debug)]
#[command(name = "timeslice", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Generate and sort sample coordinates on a worker pool.
    #[arg(long, global = true, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample one cross-section and write it as a PNG.
    Image(ImageArgs),
    /// Sample a plane moving between two positions and encode it as a video.
    Animate(AnimateArgs),
    /// Run a JSON job file.
    Run(RunArgs),
    /// Encode a directory of numbered PNG frames into a video.
    Encode(EncodeArgs),
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Input video.
    #[arg(long)]
    video: PathBuf,

    /// Plane corners in 0-100 space, e.g. "[[0,0,0],[100,0,0],[0,100,100]]".
    #[arg(long, value_parser = parse_corners)]
    points: PlaneCorners,

    /// Output resolution in percent of the frame size, e.g. "[100,100]".
    #[arg(long, value_parser = parse_resolution, default_value = "[100,100]")]
    resolution: ResolutionPct,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Skip the Description text chunk.
    #[arg(long, default_value_t = false)]
    no_tag: bool,
}

#[derive(Args, Debug)]
struct AnimateArgs {
    /// Input video.
    #[arg(long)]
    video: PathBuf,

    /// Plane corners at the first step.
    #[arg(long, value_parser = parse_corners)]
    points: PlaneCorners,

    /// Plane corners at the last step.
    #[arg(long, value_parser = parse_corners)]
    end_points: PlaneCorners,

    /// Number of output frames.
    #[arg(long, default_value_t = 30)]
    steps: u32,

    /// Output resolution in percent of the frame size.
    #[arg(long, value_parser = parse_resolution, default_value = "[50,50]")]
    resolution: ResolutionPct,

    /// Frame rate of the output video.
    #[arg(long, default_value_t = 15)]
    fps: u32,

    /// Output video path (requires `ffmpeg` on PATH).
    #[arg(long)]
    out: PathBuf,

    /// Also write every step as a numbered PNG into this directory.
    #[arg(long)]
    frames_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Job JSON file.
    #[arg(long)]
    job: PathBuf,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Directory holding `<name>_<n>.png` frames.
    #[arg(long)]
    frames: PathBuf,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Frame rate of the output video.
    #[arg(long, default_value_t = 24)]
    fps: u32,
}

fn parse_corners(s: &str) -> Result<PlaneCorners, String> {
    serde_json::from_str(s).map_err(|e| format!("expected [[x,y,z],[x,y,z],[x,y,z]]: {e}"))
}

fn parse_resolution(s: &str) -> Result<ResolutionPct, String> {
    serde_json::from_str(s).map_err(|e| format!("expected [width,height]: {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let opts = SliceOpts {
        threading: Threading {
            parallel: cli.parallel,
            threads: cli.threads,
        },
        cancel: None,
    };
    match cli.cmd {
        Command::Image(args) => cmd_image(args, &opts),
        Command::Animate(args) => cmd_animate(args, &opts),
        Command::Run(args) => cmd_run(args, &opts),
        Command::Encode(args) => cmd_encode(args),
    }
}

fn cmd_image(args: ImageArgs, opts: &SliceOpts) -> anyhow::Result<()> {
    timeslice::cross_section_to_png(
        &args.video,
        &args.points,
        args.resolution,
        &args.out,
        !args.no_tag,
        opts,
    )?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_animate(args: AnimateArgs, opts: &SliceOpts) -> anyhow::Result<()> {
    let anim = PlaneAnimation::new(args.points, args.end_points, args.steps)?;
    let mut video = FfmpegSink::new(FfmpegSinkOpts::new(&args.out));
    let mut frames = args
        .frames_dir
        .as_ref()
        .map(|dir| PngSequenceSink::new(dir, "timeslice"));

    let mut sinks: Vec<&mut dyn FrameSink> = Vec::new();
    sinks.push(&mut video);
    if let Some(sink) = frames.as_mut() {
        sinks.push(sink);
    }
    timeslice::animation_to_sinks(
        &args.video,
        &anim,
        args.resolution,
        args.fps,
        &mut sinks,
        opts,
    )?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_run(args: RunArgs, opts: &SliceOpts) -> anyhow::Result<()> {
    let job = SliceJob::from_path(&args.job)?;
    let stats = job.run(opts)?;
    eprintln!(
        "sampled {} step(s) from {} frame(s)",
        stats.steps, stats.frames_read
    );
    Ok(())
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let n = timeslice::frames_to_video(&args.frames, &args.out, args.fps, true)?;
    eprintln!("wrote {} ({n} frames)", args.out.display());
    Ok(())
}
