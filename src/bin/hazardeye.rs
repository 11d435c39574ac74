//! hazardeye - analyze images or run a monitoring session
//!
//! Subcommands:
//! 1. `analyze`: one cycle per image (uploaded-file path), optional report per image
//! 2. `monitor`: a start/stop bounded session over a frame directory or a stub script
//! 3. `catalog`: print the effective catalog and thresholds

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use hazard_eye::{
    BackendRegistry, CommandVoice, ConsoleNotifier, ConsoleVoice, CycleOutcome, DetectorBackend,
    Frame, HazardConfig, MonitoringSession, MqttNotifier, Notifier, SafetyReport,
    SidecarBackend, StubBackend, VoiceAnnouncer,
};

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Parser, Debug)]
#[command(author, version, about = "HazardEye industrial hazard monitor")]
struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension).
    #[arg(long, global = true, env = "HAZARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one or more image files.
    Analyze(AnalyzeArgs),
    /// Run a monitoring session over a sequence of frames.
    Monitor(MonitorArgs),
    /// Print the effective hazard catalog and thresholds.
    Catalog,
}

#[derive(Args, Debug)]
struct DetectorArgs {
    /// Detector backend by name (`sidecar` reads `<image>.detections.json` or `<stem>.json`,
    /// `stub` replays `--script`). Overrides `[detector] backend` / `HAZARD_DETECTOR`.
    #[arg(long)]
    detector: Option<String>,

    /// Stub script: frames separated by ';', labels by ',' (stub detector only).
    #[arg(long, default_value = "")]
    script: String,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Image files to analyze.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    detector: DetectorArgs,

    /// Write one report per image into this directory.
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report_format: ReportFormat,

    /// Print cycle outcomes as JSON lines instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Args, Debug)]
struct MonitorArgs {
    /// Directory of frames (jpg/jpeg/png), processed in file name order.
    #[arg(long)]
    frames: Option<PathBuf>,

    #[command(flatten)]
    detector: DetectorArgs,

    /// Delay between cycles in milliseconds.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Stop after this many cycles (default: one pass over the frames, or the script length).
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Print cycle outcomes as JSON lines instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // Configuration errors are fatal before any cycle runs.
    let config = HazardConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze(args) => run_analyze(&config, args),
        Command::Monitor(args) => run_monitor(&config, args),
        Command::Catalog => {
            print_catalog(&config);
            Ok(())
        }
    }
}

fn run_analyze(config: &HazardConfig, args: AnalyzeArgs) -> Result<()> {
    let mut detector = build_detector(config, &args.detector)?;
    let mut session = build_session(config)?;
    if let Some(dir) = &args.report_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating report directory {}", dir.display()))?;
    }

    let mut failures = 0usize;
    for image in &args.images {
        stage(&format!("analyze {}", image.display()));
        let frame = match Frame::open(image) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("{:#}", err);
                failures += 1;
                continue;
            }
        };
        let outcome = match session.process_frame(&mut detector, &frame) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("detection failed for {}: {:#}", image.display(), err);
                failures += 1;
                continue;
            }
        };
        print_outcome(image, &outcome, args.json)?;

        if let Some(dir) = &args.report_dir {
            let report = SafetyReport::new(
                &frame,
                &outcome.analysis.hazards,
                outcome.analysis.assessment.score,
                &outcome.analysis.plan,
            );
            let path = report_path(dir, image, args.report_format);
            match report.write_to(&path) {
                Ok(()) => log::info!("report written to {}", path.display()),
                Err(err) => log::warn!("report failed: {:#}", err),
            }
        }
    }

    if failures == args.images.len() {
        return Err(anyhow!("no image could be analyzed"));
    }
    Ok(())
}

fn run_monitor(config: &HazardConfig, args: MonitorArgs) -> Result<()> {
    let mut detector = build_detector(config, &args.detector)?;
    let mut session = build_session(config)?;

    let frames: Vec<FrameSource> = match &args.frames {
        Some(dir) => list_frames(dir)?
            .into_iter()
            .map(FrameSource::File)
            .collect(),
        None => {
            if detector.selected() != Some("stub") {
                return Err(anyhow!("monitor without --frames requires --detector stub"));
            }
            let count = args.detector.script.split(';').count().max(1);
            (0..count).map(FrameSource::Synthetic).collect()
        }
    };
    if frames.is_empty() {
        return Err(anyhow!("no frames to monitor"));
    }
    let max_cycles = args.max_cycles.unwrap_or(frames.len() as u64);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("error setting Ctrl-C handler")?;

    session.start();
    let interval = Duration::from_millis(args.interval_ms);
    for (cycle, source) in frames.iter().cycle().enumerate() {
        if cycle as u64 >= max_cycles {
            break;
        }
        let frame = match source.load() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("{:#}", err);
                continue;
            }
        };
        match session.process_frame(&mut detector, &frame) {
            Ok(outcome) => print_outcome(&source.label(), &outcome, args.json)?,
            Err(err) => log::warn!("detection failed: {:#}", err),
        }

        if rx.recv_timeout(interval).is_ok() {
            log::info!("shutdown signal received");
            break;
        }
    }
    session.stop();
    Ok(())
}

enum FrameSource {
    File(PathBuf),
    Synthetic(usize),
}

impl FrameSource {
    fn load(&self) -> Result<Frame> {
        match self {
            FrameSource::File(path) => Frame::open(path),
            FrameSource::Synthetic(index) => {
                Ok(Frame::from_bytes(format!("stub-frame-{}", index).into_bytes()))
            }
        }
    }

    fn label(&self) -> PathBuf {
        match self {
            FrameSource::File(path) => path.clone(),
            FrameSource::Synthetic(index) => PathBuf::from(format!("stub://frame/{}", index)),
        }
    }
}

fn build_detector(config: &HazardConfig, args: &DetectorArgs) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new()
        .with(SidecarBackend::new())
        .with(StubBackend::from_script(&args.script));
    let name = args.detector.as_deref().unwrap_or(config.detector_backend.as_str());
    registry.select(name)?;
    registry.warm_up()?;
    log::info!(
        "detector backend: {} (available: {})",
        registry.name(),
        registry.names().join(", ")
    );
    Ok(registry)
}

fn build_session(config: &HazardConfig) -> Result<MonitoringSession> {
    let notifier: Box<dyn Notifier> = match &config.mqtt {
        Some(settings) => Box::new(MqttNotifier::connect(settings)?),
        None => Box::new(ConsoleNotifier),
    };
    let voice: Box<dyn VoiceAnnouncer> = match &config.voice_command {
        Some(command) => Box::new(CommandVoice::from_command_line(command)?),
        None => Box::new(ConsoleVoice),
    };
    Ok(MonitoringSession::new(config, notifier, voice))
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("reading frames from {}", dir.display()))?
    {
        let path = entry?.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                FRAME_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if is_frame {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

fn report_path(dir: &Path, image: &Path, format: ReportFormat) -> PathBuf {
    let stem = image
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    dir.join(format!("{}.report.{}", stem, format.extension()))
}

fn print_outcome(source: &Path, outcome: &CycleOutcome, json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({
            "source": source.display().to_string(),
            "outcome": outcome,
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    let analysis = &outcome.analysis;
    println!("{}:", source.display());
    if analysis.hazards.is_empty() {
        println!("  detected hazards: no hazards detected");
    } else {
        println!("  detected hazards: {}", analysis.hazards.joined());
    }
    println!(
        "  risk score: {} | risk level: {}",
        analysis.assessment.score, analysis.assessment.level
    );
    if !analysis.plan.is_empty() {
        println!("  suggested action plan:");
        for step in &analysis.plan {
            println!("    - {}", step);
        }
    }
    println!("  alert: {:?}", outcome.alert);
    Ok(())
}

fn print_catalog(config: &HazardConfig) {
    println!("{:<16} {:>6}  action", "label", "weight");
    for entry in config.catalog.entries() {
        println!(
            "{:<16} {:>6}  {}",
            entry.label.as_str(),
            entry.weight,
            entry.action.as_deref().unwrap_or("-")
        );
    }
    println!(
        "thresholds: medium >= {}, high >= {}",
        config.thresholds.medium, config.thresholds.high
    );
    println!("detector backend: {}", config.detector_backend);
    println!("min detector confidence: {}", config.min_confidence);
}

fn stage(msg: &str) {
    eprintln!("hazardeye: {}", msg);
}
