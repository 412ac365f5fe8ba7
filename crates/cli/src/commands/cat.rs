//! cat command - Concatenate inputs
//!
//! Copies every input descriptor, in order, into a single output descriptor.

use clap::Args;
use serde::Serialize;
use tarp_core::{Close as _, Opener, Result, Writer};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Concatenate inputs into one output
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Input descriptors (-, text:..., pipe:..., file:... or a path)
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Output descriptor
    #[arg(short, long, default_value = "-")]
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CatOutput {
    status: &'static str,
    output: String,
    inputs: usize,
    size_bytes: u64,
    size_human: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, opener: &Opener, output_config: OutputConfig) -> ExitCode {
    // Stdout carries the data itself when writing to `-`.
    let formatter =
        Formatter::new(output_config.clone()).with_stdout_reserved(args.output == "-");

    let mut writer = match opener.open_write(&args.output).await {
        Ok(w) => w,
        Err(e) => {
            formatter.error(&format!("Failed to open output: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let progress = ProgressBar::spinner(&output_config, "Copying");
    let copied = copy_inputs(opener, &args.inputs, &mut writer, &progress).await;
    let closed = writer.close().await;
    progress.finish_and_clear();

    let total = match copied.and_then(|total| closed.map(|()| total)) {
        Ok(total) => total,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let size_human = humansize::format_size(total, humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&CatOutput {
            status: "success",
            output: args.output,
            inputs: args.inputs.len(),
            size_bytes: total,
            size_human,
        });
    } else {
        formatter.success(&format!("Wrote {} ({size_human})", args.output));
    }
    ExitCode::Success
}

/// Copy each input into `writer`, closing every input after its copy
async fn copy_inputs(
    opener: &Opener,
    inputs: &[String],
    writer: &mut Writer,
    progress: &ProgressBar,
) -> Result<u64> {
    let mut total = 0;
    for input in inputs {
        progress.set_message(&format!("Copying {input}"));
        let mut reader = opener.open_read(input).await?;
        let copied = tokio::io::copy(&mut reader, writer).await;
        let closed = reader.close().await;
        total += copied?;
        closed?;
    }
    Ok(total)
}
