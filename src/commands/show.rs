// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use blockspec::{descriptor_path, OverlaySpec};

use super::Command;

use std::path::PathBuf;

use anyhow::Context;
use structopt::StructOpt;

/// Print the current descriptor of a snapshot
#[derive(StructOpt, Debug)]
pub struct Show {
    /// The snapshot directory
    dir: PathBuf,
}

impl Command for Show {
    fn execute(self) -> anyhow::Result<()> {
        let path = descriptor_path(&self.dir);
        let bytes = std::fs::read(&path).with_context(|| format!("reading {:?}", path))?;
        let spec = OverlaySpec::from_slice(&bytes)?;

        println!("{}", serde_json::to_string_pretty(&spec)?);
        Ok(())
    }
}
