// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use blockspec::{Context, Eligibility, LayerRecord};

use super::Command;

use std::path::PathBuf;

use structopt::StructOpt;

/// Print the marker files recorded for one layer
#[derive(StructOpt, Debug)]
pub struct Inspect {
    /// The layer (snapshot) directory
    dir: PathBuf,
}

impl Command for Inspect {
    fn execute(self) -> anyhow::Result<()> {
        let id = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        println!("eligibility: {:?}", Eligibility::probe(&self.dir));

        let record = LayerRecord::read(&Context::background(), &id, &id, &self.dir)?;
        println!("digest: {}", record.digest);
        println!("block: {}", record.block_dir.display());

        if let Some(url) = &record.blob_url {
            println!("blob url: {}", url);
        }

        if let Some(size) = record.size {
            println!("size: {}", size);
        }

        if let Some(kind) = &record.blob_type {
            println!("type: {}", kind);
        }

        Ok(())
    }
}
