// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

mod commands;

use commands::Command;
use structopt::StructOpt;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    commands::Main::from_args().execute()
}
