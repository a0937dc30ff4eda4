// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

pub mod layer;
mod reference;
mod snapshot;

pub use self::layer::{LayerRecord, RecordedBlob};
pub use self::reference::{ImageReference, ReferenceError, Resolver, DEFAULT_DOMAIN};
pub use self::snapshot::{SnapshotInfo, SnapshotPaths, IMAGE_REF_LABEL};
