// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use validator_system_tool::commands::ToolCommand;

fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    // RUST_LOG_JSON=1 switches to machine readable logs.
    if std::env::var("RUST_LOG_JSON").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cmd: ToolCommand = ToolCommand::parse();
    cmd.execute()
}
