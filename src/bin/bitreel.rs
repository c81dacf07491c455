use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bitreel", version)]
struct Cli {
    /// Optional JSON config; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a file as a compressed stream of banded frames (requires `ffmpeg` on PATH).
    Encode(EncodeArgs),
    /// Decode a video and write every frame as a PGM image (requires `ffmpeg` and `ffprobe`).
    Extract(ExtractArgs),
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// File to encode.
    input: PathBuf,

    /// Output stream path.
    #[arg(short, long)]
    out: PathBuf,

    /// Frame width in pixels (bytes per frame).
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels; must be divisible by 8.
    #[arg(long)]
    height: Option<u32>,

    /// Reject sources smaller than this many bytes.
    #[arg(long)]
    min_size: Option<u64>,

    /// Report progress every N frames.
    #[arg(long)]
    progress_every: Option<u64>,

    /// Fail instead of truncating a header that does not fit in one frame.
    #[arg(long)]
    strict_header: bool,

    /// ffmpeg video encoder name.
    #[arg(long)]
    codec: Option<String>,

    /// Encoder preset passed to ffmpeg.
    #[arg(long)]
    preset: Option<String>,

    /// Target bit rate in bits per second.
    #[arg(long)]
    bit_rate: Option<u64>,

    /// Frame rate (whole frames per second).
    #[arg(long)]
    fps: Option<u32>,

    /// Distance between intra frames.
    #[arg(long)]
    gop_size: Option<u32>,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Video to decode.
    input: PathBuf,

    /// Directory for the extracted PGM files.
    #[arg(short, long)]
    out: PathBuf,

    /// File name prefix (`<prefix>-<n>.pgm`).
    #[arg(long)]
    prefix: Option<String>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// What to do when a frame file cannot be written.
    #[arg(long, value_enum)]
    on_error: Option<OnError>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnError {
    Continue,
    Abort,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match cli.config.as_deref() {
        Some(path) => bitreel::BitreelConfig::load(path)?,
        None => bitreel::BitreelConfig::default(),
    };

    match cli.cmd {
        Command::Encode(args) => cmd_encode(cfg, args),
        Command::Extract(args) => cmd_extract(cfg, args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_encode(mut cfg: bitreel::BitreelConfig, args: EncodeArgs) -> anyhow::Result<()> {
    if let Some(width) = args.width {
        cfg.width = width;
    }
    if let Some(height) = args.height {
        cfg.height = height;
    }
    if let Some(min_size) = args.min_size {
        cfg.min_source_size = min_size;
    }
    if let Some(every) = args.progress_every {
        cfg.progress_every = every;
    }
    if args.strict_header {
        cfg.header_policy = bitreel::HeaderPolicy::Strict;
    }
    if let Some(codec) = args.codec {
        cfg.ffmpeg.codec = codec;
    }
    if let Some(preset) = args.preset {
        cfg.ffmpeg.preset = Some(preset);
    }
    if let Some(bit_rate) = args.bit_rate {
        cfg.ffmpeg.bit_rate = bit_rate;
    }
    if let Some(fps) = args.fps {
        cfg.ffmpeg.fps = bitreel::Fps::new(fps, 1)?;
    }
    if let Some(gop_size) = args.gop_size {
        cfg.ffmpeg.gop_size = gop_size;
    }
    cfg.validate()?;

    let opts = cfg.encode_options()?;
    let report = bitreel::encode_file(
        &args.input,
        &args.out,
        &opts,
        |geometry| bitreel::FfmpegEncoder::spawn(geometry, &cfg.ffmpeg),
        &mut |p| eprintln!("progress: {:.1}%", p.percent()),
    )
    .with_context(|| format!("encode '{}'", args.input.display()))?;

    eprintln!(
        "wrote {} ({} frames, {} bytes)",
        args.out.display(),
        report.frames_submitted,
        report.bytes_written
    );
    Ok(())
}

fn cmd_extract(mut cfg: bitreel::BitreelConfig, args: ExtractArgs) -> anyhow::Result<()> {
    if let Some(prefix) = args.prefix {
        cfg.extract.prefix = prefix;
    }
    if let Some(max) = args.max_frames {
        cfg.extract.max_frames = Some(max);
    }
    if let Some(on_error) = args.on_error {
        cfg.extract.policy = match on_error {
            OnError::Continue => bitreel::ExtractPolicy::Continue,
            OnError::Abort => bitreel::ExtractPolicy::Abort,
        };
    }
    cfg.validate()?;

    let mut decoder = bitreel::FfmpegDecoder::open(&args.input, cfg.extract.max_frames)
        .with_context(|| format!("open video '{}'", args.input.display()))?;
    let report = bitreel::extract_frames(&mut decoder, &args.out, &cfg)?;

    for (n, err) in &report.failed {
        eprintln!("frame {n}: {err}");
    }
    eprintln!(
        "wrote {} frames to {}",
        report.written.len(),
        args.out.display()
    );
    if !report.failed.is_empty() {
        anyhow::bail!("{} frames could not be written", report.failed.len());
    }
    Ok(())
}
