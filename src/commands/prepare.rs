// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use blockspec::{Builder, Context, SnapshotInfo};

use super::{Command, Settings};

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use structopt::StructOpt;

fn parse_label(label: &str) -> anyhow::Result<(String, String)> {
    match label.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.into(), v.into())),
        _ => Err(anyhow!("expected KEY=VALUE, got {:?}", label)),
    }
}

/// Write the block device descriptor of a snapshot
#[derive(StructOpt, Debug)]
pub struct Prepare {
    /// The directory holding one subdirectory per snapshot id
    #[structopt(long)]
    root: PathBuf,

    /// The snapshot key (only used in logs)
    #[structopt(long, default_value = "")]
    key: String,

    /// An ancestor snapshot id; repeat nearest first
    #[structopt(long = "parent")]
    parents: Vec<String>,

    /// A snapshot label (format: KEY=VALUE)
    #[structopt(long = "label", parse(try_from_str = parse_label))]
    labels: Vec<(String, String)>,

    /// Abort the build after this many seconds
    #[structopt(long)]
    timeout: Option<u64>,

    #[structopt(flatten)]
    settings: Settings,

    /// The snapshot id
    id: String,
}

impl Command for Prepare {
    fn execute(self) -> anyhow::Result<()> {
        let builder = Builder::new(self.settings.load()?);

        let ctx = match self.timeout {
            Some(secs) => Context::with_timeout(Duration::from_secs(secs)),
            None => Context::background(),
        };

        let info = SnapshotInfo {
            parent_ids: self.parents,
            labels: self.labels.into_iter().collect(),
        };

        let root = self.root;
        let dir = root.join(&self.id);
        let paths = |id: &str| root.join(id);

        if builder.build(&ctx, &self.key, &self.id, &dir, &info, &paths)? {
            println!("prepared");
        } else {
            println!("not eligible");
        }

        Ok(())
    }
}
