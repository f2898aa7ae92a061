mod decode;

use std::path::{Path, PathBuf};

use beat_timeline_core::{
    format_clock, generate_synthetic, generate_synthetic_seeded, AppConfig, Mapper,
    OnsetDetector, Template,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beat_timeline_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect {
            input,
            output,
            name,
            detector,
        } => run_detect(config, &input, output.as_deref(), name, detector),
        Commands::Synth {
            duration,
            bpm,
            seed,
            output,
            name,
        } => run_synth(config, duration, bpm, seed, output.as_deref(), name),
        Commands::Locate {
            template,
            at,
            tolerance,
        } => run_locate(config, &template, at, tolerance),
    }
}

fn load_config(path: Option<&Path>) -> beat_timeline_core::Result<AppConfig> {
    match path {
        Some(path) => {
            let config = AppConfig::load(path)?;
            tracing::info!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(AppConfig::default()),
    }
}

fn run_detect(
    mut config: AppConfig,
    input: &Path,
    output: Option<&Path>,
    name: Option<String>,
    overrides: DetectorArgs,
) -> beat_timeline_core::Result<()> {
    overrides.apply(&mut config);
    config.validate()?;
    tracing::info!(?input, detector = ?config.detector, "detecting beats");

    let signal = decode::decode_file(input)?;
    let beats = OnsetDetector::new(config.detector).detect(&signal);
    tracing::info!(
        beats = beats.len(),
        tempo = ?beats.tempo_bpm(),
        duration = beats.duration(),
        "detection complete"
    );

    let name = name.unwrap_or_else(|| file_stem(input));
    finish(Template::new(name, beats), output)
}

fn run_synth(
    mut config: AppConfig,
    duration: f64,
    bpm: Option<f64>,
    seed: Option<u64>,
    output: Option<&Path>,
    name: Option<String>,
) -> beat_timeline_core::Result<()> {
    if let Some(bpm) = bpm {
        config.synthetic.bpm = bpm;
    }
    if seed.is_some() {
        config.synthetic.seed = seed;
    }
    config.validate()?;

    let beats = match config.synthetic.seed {
        Some(seed) => generate_synthetic_seeded(duration, config.synthetic.bpm, seed),
        None => generate_synthetic(duration, config.synthetic.bpm),
    };
    tracing::info!(
        beats = beats.len(),
        bpm = config.synthetic.bpm,
        seed = ?config.synthetic.seed,
        "generated synthetic beats"
    );

    let name = name.unwrap_or_else(|| "Synthetic".to_string());
    finish(Template::new(name, beats), output)
}

fn run_locate(
    mut config: AppConfig,
    path: &Path,
    at: f64,
    tolerance: Option<f64>,
) -> beat_timeline_core::Result<()> {
    if let Some(tolerance) = tolerance {
        config.mapper.tolerance_seconds = tolerance;
    }
    config.validate()?;

    let template = Template::load(path)?;
    let mapper = Mapper::new(&config.mapper);
    let beats = &template.beats;

    println!("{} at {}", template.name, format_clock(at));
    match mapper.active_segment(beats, at) {
        Some(index) => {
            let segments = template.segments();
            println!("  active:  {}", segments[index]);
        }
        None => println!("  active:  none"),
    }
    match mapper.nearest_beat(beats, at) {
        Some(index) => {
            let beat = beats.at(index)?;
            println!(
                "  nearest: beat {} at {:.3}s (intensity {:.2})",
                index + 1,
                beat.time,
                beat.intensity
            );
        }
        None => println!("  nearest: none within {:.2}s", mapper.tolerance_seconds()),
    }
    Ok(())
}

fn finish(template: Template, output: Option<&Path>) -> beat_timeline_core::Result<()> {
    print_summary(&template);
    if let Some(output) = output {
        template.save(output)?;
        tracing::info!(?output, "saved template");
    }
    Ok(())
}

fn print_summary(template: &Template) {
    let beats = &template.beats;
    println!(
        "{}: {} beats over {} ({} clips needed)",
        template.name,
        beats.len(),
        format_clock(beats.duration()),
        template.required_clips()
    );
    for segment in template.segments() {
        println!("  {:>8.3}s - {:>8.3}s  {}", segment.start, segment.end, segment);
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Untitled")
        .to_string()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Beat detection and timeline tools for beat-synced videos",
    long_about = None
)]
struct Cli {
    /// JSON configuration file. Command line flags take precedence.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect beats in an audio file and print the resulting clip segments.
    Detect {
        /// Audio file to analyse (WAV, MP3, FLAC, OGG, AAC).
        input: PathBuf,
        /// Where to save the resulting template as JSON.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Template name. Defaults to the input file name.
        #[arg(short, long)]
        name: Option<String>,
        #[command(flatten)]
        detector: DetectorArgs,
    },
    /// Generate a jittered beat grid for a track without decodable audio.
    Synth {
        /// Track length in seconds.
        #[arg(short, long)]
        duration: f64,
        #[arg(short, long)]
        bpm: Option<f64>,
        /// Seed for reproducible output.
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Resolve the active segment and nearest beat of a saved template.
    Locate {
        /// Template JSON written by `detect` or `synth`.
        template: PathBuf,
        /// Playback position in seconds.
        #[arg(long, allow_negative_numbers = true)]
        at: f64,
        /// Hover snapping tolerance in seconds.
        #[arg(short, long)]
        tolerance: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct DetectorArgs {
    /// Analysis window length in milliseconds.
    #[arg(long)]
    window_ms: Option<f64>,
    /// Normalised energy threshold in [0, 1].
    #[arg(long)]
    threshold: Option<f32>,
    /// Required energy ratio over the previous window.
    #[arg(long)]
    sensitivity_ratio: Option<f32>,
    /// Minimum number of windows between beats.
    #[arg(long)]
    min_interval: Option<usize>,
}

impl DetectorArgs {
    fn apply(self, config: &mut AppConfig) {
        let detector = &mut config.detector;
        if let Some(window_ms) = self.window_ms {
            detector.window_ms = window_ms;
        }
        if let Some(threshold) = self.threshold {
            detector.threshold = threshold;
        }
        if let Some(ratio) = self.sensitivity_ratio {
            detector.sensitivity_ratio = ratio;
        }
        if let Some(interval) = self.min_interval {
            detector.min_beat_interval_segments = interval;
        }
    }
}
