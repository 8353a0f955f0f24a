// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{read_state_file, run_epochs, simulate, summarize, write_state, EpochInputs};
use anyhow::Result;
use clap::*;
use std::path::PathBuf;
use validator_system::config::Config;
use validator_system::genesis::GenesisConfig;
use validator_system::store::SystemStateStore;

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Parser)]
#[clap(
    name = "validator-system-tool",
    about = "Build, advance and inspect validator system state",
    rename_all = "kebab-case",
    author,
    version
)]
pub enum ToolCommand {
    /// Write a genesis config with freshly generated validators
    #[clap(name = "genesis")]
    Genesis {
        #[clap(long, default_value_t = 4)]
        validators: usize,

        #[clap(long, default_value_t = 0, help = "Seed for the validator keys")]
        seed: u64,

        #[clap(long)]
        output: PathBuf,
    },

    /// Build the genesis state and run epoch changes against it.
    /// Prints one report per epoch.
    #[clap(name = "simulate")]
    Simulate {
        /// Genesis config to start from. Without one, a state stored with
        /// `--state` is resumed.
        #[clap(long)]
        config: Option<PathBuf>,

        #[clap(long, help = "Read and write the persisted state here")]
        state: Option<PathBuf>,

        #[clap(long, default_value_t = 1)]
        epochs: u64,

        #[clap(long, help = "YAML file with the gas inputs of each epoch")]
        inputs: Option<PathBuf>,

        /// Overrides the committee size from the genesis config or the
        /// stored state.
        #[clap(long)]
        max_committee_size: Option<u64>,
    },

    /// Print the summary of a persisted state
    #[clap(name = "inspect")]
    Inspect {
        #[clap(long)]
        state: PathBuf,

        #[clap(value_enum, long, default_value = "json", ignore_case = true)]
        format: OutputFormat,
    },
}

impl ToolCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ToolCommand::Genesis {
                validators,
                seed,
                output,
            } => {
                GenesisConfig::generate(validators, seed).save(&output)?;
                println!("Genesis config written to {}", output.display());
            }
            ToolCommand::Simulate {
                config,
                state,
                epochs,
                inputs,
                max_committee_size,
            } => {
                let inputs = match inputs {
                    Some(path) => serde_yaml::from_slice(&std::fs::read(path)?)?,
                    None => EpochInputs::default(),
                };
                let (store, reports, committee_size) = match (config, &state) {
                    (Some(config), _) => {
                        let mut config = GenesisConfig::load(config)?;
                        if let Some(size) = max_committee_size {
                            config.max_committee_size = size;
                        }
                        let simulation = simulate(&config, epochs, &inputs)?;
                        (
                            simulation.store,
                            simulation.reports,
                            simulation.max_committee_size,
                        )
                    }
                    (None, Some(path)) => {
                        let (system_state, stored_size) = read_state_file(path)?;
                        let committee_size = max_committee_size.unwrap_or(stored_size);
                        let store = SystemStateStore::new(system_state);
                        let reports = run_epochs(&store, epochs, &inputs, committee_size)?;
                        (store, reports, committee_size)
                    }
                    (None, None) => anyhow::bail!("Either --config or --state is required"),
                };
                for report in &reports {
                    println!("{}", serde_json::to_string(report)?);
                }
                if let Some(path) = state {
                    write_state(&store, committee_size, &path)?;
                }
            }
            ToolCommand::Inspect { state, format } => {
                let summary = summarize(&state)?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                    OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&summary)?),
                }
            }
        }
        Ok(())
    }
}
