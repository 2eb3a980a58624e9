//! livecheck CLI - Command-line interface for the liveness engine
//!
//! Commands:
//! - run: Process streaming detector frames from stdin (one session)
//! - transform: Process a batch of frames into reports
//! - validate: Validate frame inputs against the detector contract
//! - schema: Print contract information

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use livecheck::detector::FrameAdapter;
use livecheck::pipeline::{
    run_session, CancelHandle, FrameSource, JsonLineSink, LivenessProcessor,
};
use livecheck::types::{FrameInput, FrameReport};
use livecheck::{LivenessError, ENGINE_VERSION, PRODUCER_NAME};

/// livecheck - On-device liveness-detection engine
#[derive(Parser)]
#[command(name = "livecheck")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Decide whether a camera subject is a live, present human", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process streaming detector frames from stdin (one session)
    Run {
        /// Frame cadence in milliseconds (0 = process as fast as input arrives)
        #[arg(long, default_value = "0")]
        interval_ms: u64,

        /// Flush output after each report
        #[arg(long, default_value = "true")]
        flush: bool,

        /// Print the session summary to stderr when the stream ends
        #[arg(long)]
        summary: bool,
    },

    /// Process a batch of frames into reports
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Validate frame inputs against the detector contract
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print contract information
    Schema {
        /// Contract to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input contract (detector frame)
    Input,
    /// Output contract (frame report)
    Output,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] LivenessError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No frames in input")]
    NoFrames,

    #[error("{0} frame(s) failed validation")]
    ValidationFailed(usize),
}

#[derive(Serialize)]
struct CliErrorReport {
    error: String,
}

fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let report = CliErrorReport {
                error: e.to_string(),
            };
            eprintln!(
                "{}",
                serde_json::to_string(&report).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run {
            interval_ms,
            flush,
            summary,
        } => cmd_run(interval_ms, flush, summary),

        Commands::Transform {
            input,
            output,
            input_format,
            output_format,
        } => cmd_transform(&input, &output, input_format, output_format),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

/// Frame source that reads NDJSON detector frames from stdin
struct StdinFrameSource {
    lines: io::Lines<io::StdinLock<'static>>,
}

impl StdinFrameSource {
    fn new() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }
}

impl FrameSource for StdinFrameSource {
    fn next_frame(&mut self) -> Result<Option<FrameInput>, LivenessError> {
        for line in self.lines.by_ref() {
            let line =
                line.map_err(|e| LivenessError::DetectorUnavailable(e.to_string()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let frame: FrameInput = serde_json::from_str(trimmed).map_err(|e| {
                LivenessError::ParseError(format!("Failed to parse frame: {}", e))
            })?;
            return Ok(Some(frame));
        }
        Ok(None)
    }
}

fn cmd_run(interval_ms: u64, flush: bool, summary: bool) -> Result<(), CliError> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("Reading NDJSON detector frames from stdin (one per line)...");
    }

    let mut source = StdinFrameSource::new();
    let mut sink = JsonLineSink::new(io::stdout(), flush);
    let handle = CancelHandle::new();

    let result = run_session(
        &mut source,
        &mut sink,
        Duration::from_millis(interval_ms),
        &handle,
    )?;

    if summary {
        eprintln!(
            "frames={} blinks={} verified={} cancelled={}",
            result.frames_processed, result.blink_count, result.verified, result.cancelled
        );
    }

    Ok(())
}

fn cmd_transform(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), CliError> {
    let input_data = read_input(input)?;

    let frames = match input_format {
        InputFormat::Ndjson => FrameAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FrameAdapter::parse_array(&input_data)?,
    };

    if frames.is_empty() {
        return Err(CliError::NoFrames);
    }

    let mut processor = LivenessProcessor::new();
    let reports: Vec<FrameReport> = frames.iter().map(|f| processor.process(f)).collect();

    let output_data = format_output(&reports, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &PathBuf, input_format: InputFormat, json: bool) -> Result<(), CliError> {
    let input_data = read_input(input)?;

    let frames = match input_format {
        InputFormat::Ndjson => FrameAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FrameAdapter::parse_array(&input_data)?,
    };

    let failures = FrameAdapter::validate_frames(&frames);

    #[derive(Serialize)]
    struct ValidationReport<'a> {
        total_frames: usize,
        valid_frames: usize,
        invalid_frames: usize,
        errors: &'a [livecheck::detector::ValidationFailure],
    }

    let report = ValidationReport {
        total_frames: frames.len(),
        valid_frames: frames.len() - failures.len(),
        invalid_frames: failures.len(),
        errors: &failures,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total frames:   {}", report.total_frames);
        println!("Valid frames:   {}", report.valid_frames);
        println!("Invalid frames: {}", report.invalid_frames);

        if !failures.is_empty() {
            println!("\nErrors:");
            for failure in &failures {
                println!("  - Frame {}: {}", failure.index, failure.error);
            }
        }
    }

    if !failures.is_empty() {
        Err(CliError::ValidationFailed(failures.len()))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), CliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input contract: detector frame (NDJSON, one per line)");
            println!();
            println!("  {{\"face\": null}}");
            println!("    Detector ran but found no face.");
            println!();
            println!("  {{\"face\": {{");
            println!("      \"left_eye\":  [6 x {{\"x\": px, \"y\": px}}],");
            println!("      \"right_eye\": [6 x {{\"x\": px, \"y\": px}}],");
            println!("      \"nose\": {{\"x\": px, \"y\": px}},");
            println!("      \"expressions\": {{\"happy\": p, \"surprised\": p, \"neutral\": p}}");
            println!("  }}, \"observed_at\": \"rfc3339\" (optional)}}");
            println!();
            println!("Eye indices: 0,3 horizontal corners; 1,2 upper lid; 4,5 lower lid.");
            println!("Expression probabilities are in [0, 1].");
        }
        SchemaType::Output => {
            println!("Output contract: frame report ({} v{})", PRODUCER_NAME, ENGINE_VERSION);
            println!();
            println!("  report_version, producer{{name, version, instance_id}},");
            println!("  provenance{{session_id, frame_seq, observed_at_utc, computed_at_utc}},");
            println!("  face_detected, state (searching | awaiting_blinks |");
            println!("  awaiting_movement | verified),");
            println!("  assessment{{score, message, eye_state, blink_count, movement}},");
            println!("  debug{{current_ear, baseline_ear, blink_threshold, display_threshold}}");
        }
    }
    Ok(())
}

fn read_input(path: &PathBuf) -> Result<String, CliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn format_output(reports: &[FrameReport], format: &OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for report in reports {
                out.push_str(&serde_json::to_string(report)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(reports)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(reports)?),
    }
}
