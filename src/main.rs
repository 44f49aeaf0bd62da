//! Record modifier CLI entry point.
//!
//! Reads newline-delimited JSON records from stdin, applies the configured
//! modifications and writes the results to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use record_modifier::{Record, RecordModifier, RuleSet};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "record-modifier")]
#[command(
    author,
    version,
    about = "Per-record field modification stage for log pipelines"
)]
struct Args {
    /// Configuration file path (YAML, JSON, or `name value` directives)
    #[arg(short, long, env = "RECORD_MODIFIER_CONFIG")]
    config: Option<PathBuf>,

    /// Tag for input lines that are bare records
    #[arg(long, default_value = "record")]
    tag: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Validate configuration and exit.
    #[arg(long)]
    validate: bool,
}

fn print_example_config() {
    let example = r#"# Record Modifier Configuration Example
# Re-emit records under this tag (optional, defaults to the incoming tag)
tag: "foo.filtered"

# Static fields. ${hostname}, ${now}, ${pid} and ${env.NAME} are resolved
# once at startup.
gen_host: "${hostname}"
foo: bar

# Inject the incoming tag
include_tag_key: true
tag_key: included_tag

# Delete top-level keys (or use whitelist_keys, not both)
remove_keys: "hoge, fuga"

# Delete nested paths
remove_path: "b.b1.b1b1"

# Relabel (utf-8) or convert (from:to) every string value. Records are
# written back as UTF-8 JSON, so converted strings read the same on stdout;
# the conversion matters to stages that consume the record's bytes.
# char_encoding: "utf-8:cp932"
"#;
    println!("{}", example);
}

/// Split an input line into its tag and record.
///
/// Accepts `{"tag": "...", "record": {...}}` or a bare record object.
fn parse_line(line: &[u8], default_tag: &str) -> Result<(String, Record)> {
    let value: JsonValue = serde_json::from_slice(line).context("Invalid JSON")?;

    if let JsonValue::Object(obj) = &value {
        if let (Some(JsonValue::String(tag)), Some(JsonValue::Object(record)), 2) =
            (obj.get("tag"), obj.get("record"), obj.len())
        {
            return Ok((tag.clone(), Record::from(record.clone())));
        }
    }

    let record = Record::from_json(value).context("Record is not a JSON object")?;
    Ok((default_tag.to_string(), record))
}

/// Transform every record in `input` and write it to `output`.
///
/// Lines that fail to parse, including lines that are not valid UTF-8, are
/// logged and skipped. `output` is flushed whether or not the loop fails.
async fn run<R, W>(modifier: &RecordModifier, input: R, output: W, default_tag: &str) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut out = BufWriter::new(output);
    let result = process_lines(modifier, input, &mut out, default_tag).await;
    let flushed = out.flush().await.context("Failed to flush stdout");
    result.and(flushed)
}

async fn process_lines<R, W>(
    modifier: &RecordModifier,
    mut input: R,
    out: &mut W,
    default_tag: &str,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut line_no: u64 = 0;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await.context("Failed to read stdin")? == 0 {
            return Ok(());
        }
        line_no += 1;
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let (tag, record) = match parse_line(&buf, default_tag) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(line = line_no, error = %format!("{:#}", e), "Skipping malformed input line");
                continue;
            }
        };

        let emitted = modifier.process(&tag, record);
        let mut encoded = serde_json::to_vec(&emitted).context("Failed to encode record")?;
        encoded.push(b'\n');
        out.write_all(&encoded).await.context("Failed to write stdout")?;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout carries records.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if args.example_config {
        print_example_config();
        return Ok(());
    }

    let rules = match &args.config {
        Some(path) => RuleSet::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => RuleSet::default(),
    };

    let modifier = RecordModifier::new(&rules).context("Invalid record modifier configuration")?;

    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    info!(config = ?args.config, default_tag = %args.tag, "Reading records from stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    run(&modifier, stdin, tokio::io::stdout(), &args.tag).await?;

    info!(records = modifier.records_total(), "Input exhausted");

    Ok(())
}
