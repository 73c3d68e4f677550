use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::RgbaImage;
use vodchat::assets::providers;
use vodchat::assets::store::write_table;
use vodchat::{
    ChannelRef, ChatAssets, ChatConfig, ChatReplay, FixedAdvanceRasterizer, InMemorySurface,
    OfflineFetcher, Provider, RandomPalette, RenderWorker, SvgTextRasterizer, TextRasterizer,
    Transcript, WorkerOpts, format_time, spawn_prefetch,
};

#[derive(Parser, Debug)]
#[command(name = "vodchat", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a transcript.
    Info(InfoArgs),
    /// Render the chat as it looks at one timestamp into a PNG.
    Frame(FrameArgs),
    /// Simulate playback through the render worker and save the last frame.
    Play(PlayArgs),
    /// Convert a provider API response into an emote metadata table.
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Transcript file (one JSON event per line).
    #[arg(long)]
    transcript: PathBuf,
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Transcript file (one JSON event per line).
    #[arg(long)]
    transcript: PathBuf,

    /// Asset root holding the provider folders.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Channel user id (keys badge, BTTV and FFZ channel tables).
    #[arg(long, default_value = "")]
    channel_id: String,

    /// Channel login (keys the 7TV channel table).
    #[arg(long, default_value = "")]
    channel_login: String,

    /// Extra font directory; may be repeated.
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Draw text as fixed-width boxes instead of system fonts.
    #[arg(long, default_value_t = false)]
    box_glyphs: bool,

    /// Chat width in pixels.
    #[arg(long, default_value_t = 340)]
    width: u32,

    /// Height of the saved window in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Playback time in seconds.
    #[arg(long)]
    at: f64,

    /// Wall-clock milliseconds used to pick animation frames.
    #[arg(long, default_value_t = 0)]
    wall_ms: u64,
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Playback start in seconds.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Playback end in seconds.
    #[arg(long)]
    to: f64,

    /// Playback speed multiplier.
    #[arg(long, default_value_t = 60.0)]
    speed: f64,

    /// Warm the asset caches on a separate thread while playing.
    #[arg(long, default_value_t = false)]
    prefetch: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImportProvider {
    Badges,
    Bttv,
    Ffz,
    #[value(name = "7tv")]
    SevenTv,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Provider the response came from.
    #[arg(long, value_enum)]
    provider: ImportProvider,

    /// Saved API response (JSON).
    #[arg(long)]
    response: PathBuf,

    /// Asset root holding the provider folders.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Table name: `global`, a channel user id, or (7TV) a channel login.
    #[arg(long, default_value = "global")]
    table: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
        Command::Import(args) => cmd_import(args),
    }
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let transcript = Transcript::load(&args.transcript)?;
    let mut speakers: Vec<&str> = transcript.events().iter().map(|e| e.name.as_str()).collect();
    speakers.sort_unstable();
    speakers.dedup();

    println!("events:   {}", transcript.len());
    println!("speakers: {}", speakers.len());
    println!("span:     {}", format_time(transcript.span_secs()));
    Ok(())
}

struct Session {
    transcript: Transcript,
    assets: Arc<ChatAssets>,
    replay: ChatReplay,
}

fn open_session(args: &SessionArgs) -> anyhow::Result<Session> {
    let cfg = ChatConfig {
        width: args.width,
        ..ChatConfig::default()
    };
    let transcript = Transcript::load(&args.transcript)?;
    let channel = ChannelRef {
        user_id: args.channel_id.clone(),
        login: args.channel_login.clone(),
    };
    let assets = Arc::new(ChatAssets::open(
        &args.assets,
        &channel,
        Arc::new(OfflineFetcher),
        &cfg,
    )?);
    let replay = ChatReplay::new(
        cfg,
        &transcript,
        Arc::clone(&assets),
        rasterizer(args),
        Box::new(RandomPalette::new()),
    );
    Ok(Session {
        transcript,
        assets,
        replay,
    })
}

fn rasterizer(args: &SessionArgs) -> Arc<dyn TextRasterizer> {
    if args.box_glyphs {
        return Arc::new(FixedAdvanceRasterizer::default());
    }
    match SvgTextRasterizer::new(&args.font_dirs) {
        Ok(r) => Arc::new(r),
        Err(err) => {
            tracing::warn!(%err, "falling back to box glyphs");
            Arc::new(FixedAdvanceRasterizer::default())
        }
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let Session { mut replay, .. } = open_session(&args.session)?;
    replay.seek(args.at);
    replay.draw_at(args.at, args.wall_ms);
    save_png(&replay.window(args.session.height), &args.session.out)
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.speed > 0.0, "--speed must be positive");
    anyhow::ensure!(args.to >= args.from, "--to must not precede --from");

    let Session {
        transcript,
        assets,
        replay,
    } = open_session(&args.session)?;

    let prefetch = if args.prefetch {
        Some(spawn_prefetch(assets, Arc::clone(transcript.events()))?)
    } else {
        None
    };

    let opts = WorkerOpts::default();
    let tick = opts.tick;
    let surface = InMemorySurface::new();
    let handle = RenderWorker::spawn(replay, surface.clone(), opts)?;

    handle.seek(args.from);
    let started = Instant::now();
    loop {
        let t = args.from + started.elapsed().as_secs_f64() * args.speed;
        handle.post_timestamp(t.min(args.to));
        if t >= args.to {
            break;
        }
        std::thread::sleep(tick);
    }
    let before = surface.presented();
    handle.post_timestamp(args.to);
    surface.wait_for(before + 1, Duration::from_secs(5));
    handle.shutdown()?;

    if let Some(worker) = prefetch {
        let stats = worker
            .join()
            .map_err(|_| anyhow::anyhow!("prefetch worker panicked"))?;
        eprintln!("prefetch: {} loaded, {} failed", stats.loaded, stats.failed);
    }

    let frame = surface
        .latest()
        .context("render worker published no frame")?;
    eprintln!(
        "played {} → {} ({} frames)",
        format_time(args.from),
        format_time(args.to),
        surface.presented()
    );
    save_png(&bottom(&frame, args.session.height), &args.session.out)
}

fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.response)
        .with_context(|| format!("read response '{}'", args.response.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parse response '{}'", args.response.display()))?;

    let (provider, entries) = match args.provider {
        ImportProvider::Badges => (Provider::Badges, providers::parse_badge_sets(&json)?),
        ImportProvider::Bttv => (Provider::Bttv, providers::parse_bttv(&json)?),
        ImportProvider::Ffz => (Provider::Ffz, providers::parse_ffz(&json)?),
        ImportProvider::SevenTv => (Provider::SevenTv, providers::parse_seventv(&json)),
    };

    let path = args
        .assets
        .join(provider.folder())
        .join(format!("{}.txt", args.table));
    write_table(&path, &entries)?;
    eprintln!("wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

fn bottom(frame: &RgbaImage, height: u32) -> RgbaImage {
    let h = height.min(frame.height());
    image::imageops::crop_imm(frame, 0, frame.height() - h, frame.width(), h).to_image()
}

fn save_png(img: &RgbaImage, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    img.save_with_format(out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}
