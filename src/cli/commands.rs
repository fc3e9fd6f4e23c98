//! CLI Command Implementations
//!
//! Turns parsed arguments into a configured pipeline run.

use log::info;

use super::{Cli, Mode};
use crate::config::Config;
use crate::error::Result;
use crate::neural::SeparatorRegistry;
use crate::pipeline::{Pipeline, PipelineOutput};

/// Build a pipeline from `cli` and its config
///
/// The model name is checked in every mode so a typo fails before any audio
/// is read.
pub fn build_pipeline(cli: &Cli) -> Result<Pipeline> {
    let config = Config::load(cli.config.as_deref())?;
    let registry = SeparatorRegistry::with_defaults(&config)?;
    let separator = registry.get(&cli.model)?;

    Ok(Pipeline::new(
        separator,
        config.decomposer()?,
        config.export_format(),
    ))
}

/// Run the mode selected on the command line
pub fn run(cli: &Cli) -> Result<PipelineOutput> {
    let pipeline = build_pipeline(cli)?;
    info!(
        "Mode: {}, input: {}, model: {}",
        cli.mode,
        cli.input_file.display(),
        pipeline.separator_name()
    );

    let output = match cli.mode {
        Mode::Stems => pipeline.run_stems(&cli.input_file, &cli.output_stems)?,
        Mode::Drums => pipeline.run_drums(&cli.input_file, &cli.output_drums)?,
        Mode::Both => {
            pipeline.run_both(&cli.input_file, &cli.output_stems, &cli.output_drums)?
        }
    };

    for path in output.files() {
        println!("Saved: {}", path.display());
    }
    println!("All operations completed successfully");

    Ok(output)
}
