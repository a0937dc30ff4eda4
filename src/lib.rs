// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

//! Descriptors for block devices assembled from container image layers.
//!
//! For a snapshot whose layers were pulled in the remote block format, the
//! [`Builder`] walks the snapshot's layer chain, reads the marker files each
//! layer carries and writes `block/config.v1.json`: the base virtual disk,
//! every layer's digest and block directory, and the registry URL the driver
//! fetches missing blobs from.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use blockspec::{build_spec, Context, SnapshotInfo};
//!
//! let root = Path::new("/var/lib/snapshots");
//! let info = SnapshotInfo {
//!     parent_ids: vec!["41".into(), "40".into()],
//!     ..Default::default()
//! };
//!
//! let _prepared = build_spec(
//!     &Context::background(),
//!     "default/42/app",
//!     "42",
//!     &root.join("42"),
//!     &info,
//!     &|id: &str| root.join(id),
//! )?;
//! # Ok::<(), blockspec::Error>(())
//! ```

pub mod api;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod formats;
pub mod iotools;

pub use api::{ImageReference, LayerRecord, Resolver, SnapshotInfo, SnapshotPaths};
pub use builder::{build_spec, descriptor_path, result_file, Builder, Eligibility};
pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};
pub use formats::{Digest, Lower, OverlaySpec};
