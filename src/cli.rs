// Copyright 2023 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

use crate::job::{Job, Output};
use anyhow::Result;
use clap::{Parser, Subcommand};
use pretty_env_logger::env_logger::DEFAULT_FILTER_ENV;
use std::{io::Write, path::PathBuf};

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the task of a job file
    #[clap(arg_required_else_help = true)]
    Run {
        /// Job file in YAML format
        #[clap(long, short = 'i')]
        input: PathBuf,
    },
    /// Check a job file without running it
    #[clap(arg_required_else_help = true)]
    Check {
        /// Job file in YAML format
        #[clap(long, short = 'i')]
        input: PathBuf,
    },
}

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    pub command: Commands,

    /// Verbose output. See more with e.g. RUST_LOG=Trace
    #[clap(long, short = 'v', action)]
    pub verbose: bool,
    /// Output file in YAML format
    #[clap(long, short = 'o', default_value = "output.yaml")]
    pub output: PathBuf,
}

pub fn do_main() -> Result<()> {
    let args = Args::parse();
    if std::env::var(DEFAULT_FILTER_ENV).is_err() {
        std::env::set_var(
            DEFAULT_FILTER_ENV,
            if args.verbose { "Debug" } else { "Info" },
        );
    }
    pretty_env_logger::init();

    match args.command {
        Commands::Run { input } => {
            let mut yaml_output = std::fs::File::create(&args.output)?;
            run(input, &mut yaml_output)?;
            log::info!("Report written to {}", args.output.display());
        }
        Commands::Check { input } => {
            let job = Job::from_file(&input)?;
            log::info!("{} is valid", input.display());
            log::debug!("{:?}", job.config);
        }
    }
    Ok(())
}

/// Helper function to serialize data to an existing YAML file
fn write_yaml<T: serde::Serialize>(data: &T, output: &mut std::fs::File) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    output.write_all(yaml.as_bytes())?;
    Ok(())
}

fn run(input: PathBuf, yaml_output: &mut std::fs::File) -> Result<()> {
    let job = Job::from_file(&input)?;
    let report = job.run()?;
    let output = Output {
        config: &job.config,
        report: &report,
    };
    write_yaml(&output, yaml_output)?;
    Ok(())
}
