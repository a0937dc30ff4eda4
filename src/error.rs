// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

//! Errors surfaced while building a block device descriptor.
//!
//! A snapshot that is simply not eligible for block device acceleration is
//! not an error: [`Builder::build`](crate::Builder::build) returns
//! `Ok(false)` for it.

use crate::api::ReferenceError;

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A marker file or block directory of some layer in the chain is
    /// missing, unreadable or corrupt.
    #[error("snapshot {snapshot}: cannot read {} of layer {layer}", path.display())]
    MetadataRead {
        snapshot: String,
        layer: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The recorded image reference or domain override is malformed.
    #[error("snapshot {snapshot}: cannot resolve blob url")]
    InvalidReference {
        snapshot: String,
        #[source]
        source: ReferenceError,
    },

    /// The descriptor could not be encoded or moved into place.
    #[error("snapshot {snapshot}: cannot write {}", path.display())]
    Serialization {
        snapshot: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("snapshot {snapshot}: build cancelled")]
    Cancelled { snapshot: String },
}
