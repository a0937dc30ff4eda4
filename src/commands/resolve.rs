// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use blockspec::Resolver;

use super::{Command, Settings};

use structopt::StructOpt;

/// Print the blob URL an image reference resolves to
#[derive(StructOpt, Debug)]
pub struct Resolve {
    /// A registry domain that replaces the parsed one
    #[structopt(long)]
    domain: Option<String>,

    /// The recorded repository path, used when the reference is empty
    #[structopt(long)]
    repository: Option<String>,

    #[structopt(flatten)]
    settings: Settings,

    /// The image reference (format: [domain/]name[:tag|@digest])
    #[structopt(default_value = "")]
    reference: String,
}

impl Command for Resolve {
    fn execute(self) -> anyhow::Result<()> {
        let config = self.settings.load()?;
        let resolver = Resolver::new(config.default_domain);

        let url = resolver.resolve(
            &self.reference,
            self.domain.as_deref().unwrap_or_default(),
            self.repository.as_deref(),
        )?;

        println!("{}", url);
        Ok(())
    }
}
