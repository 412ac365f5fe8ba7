//! split command - Shard a record stream
//!
//! Reads newline-delimited records from the inputs and writes them to a
//! sequence of shards named by a pattern. Shards may be files or `pipe:`
//! commands, e.g.
//!
//! ```text
//! tarp split all.jsonl --count 25 -o 'pipe:gsutil cp - gs://bucket/shard-%06d.jsonl'
//! ```

use clap::Args;
use serde::Serialize;
use tarp_core::{
    Close as _, Config, Opener, Reader, Result, ShardInfo, ShardOptions, ShardPattern,
    ShardWriter,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Split newline-delimited records into shards
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Input descriptors (-, text:..., pipe:..., file:... or a path)
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Maximum records per shard
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Maximum bytes per shard; float notation such as 1e9 is accepted
    #[arg(short, long, value_parser = parse_size)]
    pub size: Option<u64>,

    /// Output pattern, e.g. split-%06d.tar or 'pipe:gzip > out-%04d.gz'
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of the first shard
    #[arg(long)]
    pub start_index: Option<usize>,

    /// Command run after each shard is closed; %s is replaced by the shard name
    #[arg(short, long)]
    pub post: Option<String>,
}

#[derive(Debug, Serialize)]
struct SplitOutput {
    status: &'static str,
    records: usize,
    shards: Vec<ShardInfo>,
}

/// Execute the split command
pub async fn execute(
    args: SplitArgs,
    opener: &Opener,
    config: &Config,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let options = match build_options(&args, config) {
        Ok(options) => options,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    let mut sink = match ShardWriter::new(opener.clone(), options) {
        Ok(sink) => sink,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let progress = ProgressBar::spinner(&output_config, "Splitting");
    let mut records = 0;
    let mut fed = Ok(());
    for input in &args.inputs {
        match feed_input(opener, input, &mut sink, &progress, records).await {
            Ok(total) => records = total,
            Err(e) => {
                fed = Err(e);
                break;
            }
        }
    }
    // The open shard is closed even when an input failed.
    let finished = sink.finish().await;
    progress.finish_and_clear();

    let shards = match fed.and(finished) {
        Ok(shards) => shards,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&SplitOutput {
            status: "success",
            records,
            shards,
        });
        return ExitCode::Success;
    }

    if shards.is_empty() {
        formatter.warning("No records read; no shards written");
        return ExitCode::Success;
    }
    for shard in &shards {
        formatter.shard(shard);
    }
    formatter.success(&format!(
        "Wrote {records} records into {} shards",
        shards.len()
    ));
    ExitCode::Success
}

/// Merge command-line flags over configured defaults
fn build_options(args: &SplitArgs, config: &Config) -> Result<ShardOptions> {
    let defaults = &config.split;
    let pattern = args.output.as_deref().unwrap_or(&defaults.pattern);
    Ok(ShardOptions {
        pattern: ShardPattern::parse(pattern)?,
        max_count: args.count.unwrap_or(defaults.count),
        max_size: args.size.unwrap_or(defaults.size),
        start_index: args.start_index.unwrap_or(defaults.start_index),
        post: args.post.clone(),
    })
}

/// Parse a byte count given as an integer or in float notation (`1e9`, `2.5e6`)
fn parse_size(value: &str) -> std::result::Result<u64, String> {
    if let Ok(size) = value.parse::<u64>() {
        return Ok(size);
    }
    let size: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !size.is_finite() || size < 0.0 || size.fract() != 0.0 || size > u64::MAX as f64 {
        return Err(format!("'{value}' is not a whole, non-negative byte count"));
    }
    Ok(size as u64)
}

/// Feed every record of one input to the sink, returning the running total
async fn feed_input(
    opener: &Opener,
    input: &str,
    sink: &mut ShardWriter,
    progress: &ProgressBar,
    mut records: usize,
) -> Result<usize> {
    let mut reader = opener.open_read(input).await?;
    let fed = feed_records(&mut reader, sink, progress, &mut records).await;
    let closed = reader.close().await;
    fed?;
    closed?;
    Ok(records)
}

async fn feed_records(
    reader: &mut Reader,
    sink: &mut ShardWriter,
    progress: &ProgressBar,
    records: &mut usize,
) -> Result<()> {
    let mut lines = BufReader::new(reader);
    let mut record = Vec::new();
    loop {
        record.clear();
        if lines.read_until(b'\n', &mut record).await? == 0 {
            return Ok(());
        }
        sink.write_record(&record).await?;
        *records += 1;
        if records.is_multiple_of(1000) {
            progress.set_message(&format!("Splitting: {records} records"));
        }
    }
}
