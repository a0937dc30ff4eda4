// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use std::collections::HashMap;
use std::path::PathBuf;

/// Label under which the snapshot manager may record the image reference
pub const IMAGE_REF_LABEL: &str = "containerd.io/snapshot/image-ref";

/// What the snapshot manager knows about the snapshot being prepared
#[derive(Clone, Debug, Default)]
pub struct SnapshotInfo {
    /// Ancestor snapshot ids, nearest first, ending at the root
    pub parent_ids: Vec<String>,

    pub labels: HashMap<String, String>,
}

impl SnapshotInfo {
    pub fn image_ref(&self) -> Option<&str> {
        self.labels.get(IMAGE_REF_LABEL).map(String::as_str)
    }
}

/// Maps a snapshot id to the directory holding its layer
pub trait SnapshotPaths {
    fn snapshot_dir(&self, id: &str) -> PathBuf;
}

impl<F: Fn(&str) -> PathBuf> SnapshotPaths for F {
    fn snapshot_dir(&self, id: &str) -> PathBuf {
        self(id)
    }
}
