// DragonSim: BGP Network Simulator with DRAGON route aggregation written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.


use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use log::*;

use dragonsim::prelude::*;

/// Consistency property preserved by DRAGON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Route consistency
    Route,
    /// Forwarding consistency
    Forwarding,
}

impl From<Mode> for ConsistencyMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Route => ConsistencyMode::Route,
            Mode::Forwarding => ConsistencyMode::Forwarding,
        }
    }
}

/// Simulate a BGP network with DRAGON route aggregation, and report the final state.
#[derive(Debug, Parser)]
struct Cli {
    /// Configuration file. Files ending with `.json` are read as JSON, all others in the router
    /// configuration language.
    config: PathBuf,
    /// Consistency property preserved by DRAGON. Overrides the configuration.
    #[clap(long = "mode", short = 'm')]
    mode: Option<Mode>,
    /// Run plain BGP without DRAGON.
    #[clap(long = "no-dragon")]
    no_dragon: bool,
    /// Stop after processing this many events.
    #[clap(long = "msg-limit")]
    msg_limit: Option<usize>,
    /// Randomization key added to the seed of every random number generator.
    #[clap(long = "key", short = 'k')]
    key: Option<String>,
    /// Print the report as JSON to stdout.
    #[clap(long = "json", short = 'j')]
    json: bool,
    /// Write the report as JSON into this file.
    #[clap(long = "output", short = 'o')]
    output: Option<PathBuf>,
}

fn read_config(path: &Path) -> Result<SimConfig, Box<dyn Error>> {
    let content = fs::read_to_string(path)?;
    let config = if path.extension().map(|x| x == "json").unwrap_or(false) {
        SimConfig::from_json(&content)?
    } else {
        content.parse::<SimConfig>()?
    };
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();

    let mut config = read_config(&args.config)?;
    if let Some(mode) = args.mode {
        config.params.dragon.mode = mode.into();
    }
    if args.no_dragon {
        config.params.dragon.enabled = false;
    }
    if let Some(key) = args.key {
        config.params.randomize_key = key;
    }
    info!(
        "Loaded {} routers and {} events from {}",
        config.routers.len(),
        config.events.len(),
        args.config.display()
    );

    let mut net = Network::from_config(&config)?;
    net.set_msg_limit(args.msg_limit);
    let processed = net.run();
    info!(
        "Processed {} events until {:.3}s, {} updates sent",
        processed,
        net.time().into_inner(),
        net.total_updates()
    );

    let report = net.report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if let Some(output) = args.output {
        fs::write(&output, serde_json::to_string_pretty(&report)?)?;
        info!("Report written to {}", output.display());
    }
    for record in report.convergence.iter() {
        info!("{}: converged after {:.3}s", record.label, record.duration);
    }

    Ok(())
}
