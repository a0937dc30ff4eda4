// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use blockspec::Config;

use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

mod inspect;
mod prepare;
mod resolve;
mod show;

pub trait Command {
    fn execute(self) -> anyhow::Result<()>;
}

/// Host settings shared by the commands that build or resolve
#[derive(StructOpt, Debug)]
pub struct Settings {
    /// A JSON config file (keys: baseLayer, defaultDomain)
    #[structopt(long, env = "BLOCKSPEC_CONFIG")]
    config: Option<PathBuf>,

    /// The base virtual disk placed first in every descriptor
    #[structopt(long)]
    base_layer: Option<PathBuf>,

    /// The registry used when a snapshot records no image reference
    #[structopt(long)]
    default_domain: Option<String>,
}

impl Settings {
    pub fn load(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(base_layer) = &self.base_layer {
            config.base_layer = base_layer.clone();
        }

        if let Some(domain) = &self.default_domain {
            config.default_domain = domain.clone();
        }

        Ok(config)
    }
}

#[derive(StructOpt, Debug)]
#[structopt(about = "block device descriptors for layered snapshots")]
pub enum Main {
    Prepare(prepare::Prepare),
    Resolve(resolve::Resolve),
    Show(show::Show),
    Inspect(inspect::Inspect),
}

impl Command for Main {
    fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Prepare(cmd) => cmd.execute(),
            Self::Resolve(cmd) => cmd.execute(),
            Self::Show(cmd) => cmd.execute(),
            Self::Inspect(cmd) => cmd.execute(),
        }
    }
}
