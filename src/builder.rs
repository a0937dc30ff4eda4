// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

//! Builds the descriptor that tells the block device driver how to assemble
//! a snapshot from its layers.

use crate::api::layer::{
    read_marker, BLOB_URL_FILE, BLOCK_DIR, CHECKSUM_FILE, DOMAIN_OVERRIDE_FILE, FS_DIR,
    IMAGE_REF_FILE, NEW_FORMAT_FILE,
};
use crate::api::{LayerRecord, Resolver, SnapshotInfo, SnapshotPaths};
use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::formats::OverlaySpec;
use crate::iotools::atomic;

use std::path::{Path, PathBuf};

use log::{debug, info};

const DESCRIPTOR_FILE: &str = "config.v1.json";
const RESULT_FILE: &str = "init-debug.log";

/// Where the driver expects the descriptor of the snapshot in `dir`
pub fn descriptor_path(dir: &Path) -> PathBuf {
    dir.join(BLOCK_DIR).join(DESCRIPTOR_FILE)
}

/// Where the driver writes its own diagnostics for the snapshot in `dir`
pub fn result_file(dir: &Path) -> PathBuf {
    dir.join(RESULT_FILE)
}

/// Whether a snapshot can be served by the block device driver at all
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Eligibility {
    /// Plain filesystem layer, mount it the usual way
    NotAccelerated,

    /// Remote layer with the marker files the driver needs
    Accelerated,
}

impl Eligibility {
    pub fn probe(dir: &Path) -> Self {
        let fs_dir = dir.join(FS_DIR);
        let markers = [NEW_FORMAT_FILE, CHECKSUM_FILE, BLOB_URL_FILE];

        if markers.iter().all(|m| fs_dir.join(m).is_file()) {
            Self::Accelerated
        } else {
            Self::NotAccelerated
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
    resolver: Resolver,
}

impl Builder {
    pub fn new(config: Config) -> Self {
        let resolver = Resolver::new(config.default_domain.clone());
        Self { config, resolver }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn check(ctx: &Context, id: &str) -> Result<()> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled { snapshot: id.into() });
        }

        Ok(())
    }

    /// Walks the layer chain of snapshot `id` without writing anything
    ///
    /// The chain is the snapshot's own layer followed by
    /// `info.parent_ids`, whose directories come from `paths`. Returns
    /// `None` when the snapshot is not eligible.
    pub fn spec(
        &self,
        ctx: &Context,
        id: &str,
        dir: &Path,
        info: &SnapshotInfo,
        paths: &impl SnapshotPaths,
    ) -> Result<Option<OverlaySpec>> {
        Self::check(ctx, id)?;
        if Eligibility::probe(dir) == Eligibility::NotAccelerated {
            debug!("snapshot {} at {:?} is not accelerated", id, dir);
            return Ok(None);
        }

        let own = LayerRecord::read(ctx, id, id, dir)?;
        let mut layers = vec![own];
        for parent in &info.parent_ids {
            let parent_dir = paths.snapshot_dir(parent);
            debug!("snapshot {}: parent {} at {:?}", id, parent, parent_dir);
            layers.push(LayerRecord::read(ctx, id, parent, &parent_dir)?);
        }

        // Only the snapshot under preparation decides where blobs come from
        let reference = match read_marker(ctx, id, id, &dir.join(IMAGE_REF_FILE))? {
            Some(reference) => reference,
            None => info.image_ref().unwrap_or_default().into(),
        };
        let domain = read_marker(ctx, id, id, &dir.join(DOMAIN_OVERRIDE_FILE))?;
        let recorded = layers[0].recorded_blob().map(|blob| blob.repository);

        let repo_blob_url = self
            .resolver
            .resolve(&reference, domain.as_deref().unwrap_or_default(), recorded)
            .map_err(|source| Error::InvalidReference {
                snapshot: id.into(),
                source,
            })?;
        debug!("snapshot {}: blobs from {}", id, repo_blob_url);

        let lowers = layers.into_iter().map(|l| (l.digest, l.block_dir));
        Ok(Some(OverlaySpec::new(
            repo_blob_url,
            &self.config.base_layer,
            lowers,
            result_file(dir),
        )))
    }

    /// Builds and writes the descriptor for snapshot `id` stored in `dir`
    ///
    /// Returns `Ok(false)` when the snapshot is not eligible, in which case
    /// nothing is written. Any existing descriptor is replaced atomically
    /// and left alone on failure.
    pub fn build(
        &self,
        ctx: &Context,
        key: &str,
        id: &str,
        dir: &Path,
        info: &SnapshotInfo,
        paths: &impl SnapshotPaths,
    ) -> Result<bool> {
        let spec = match self.spec(ctx, id, dir, info, paths)? {
            Some(spec) => spec,
            None => return Ok(false),
        };

        let path = descriptor_path(dir);
        let fail = |source: std::io::Error| Error::Serialization {
            snapshot: id.into(),
            path: path.clone(),
            source,
        };

        let bytes = spec.to_vec().map_err(|e| fail(e.into()))?;
        Self::check(ctx, id)?;
        atomic::replace(&path, &bytes).map_err(fail)?;

        info!(
            "prepared {} ({}) with {} lowers at {:?}",
            key,
            id,
            spec.lowers.len(),
            path
        );
        Ok(true)
    }
}

/// Builds the descriptor for one snapshot with the default configuration
pub fn build_spec(
    ctx: &Context,
    key: &str,
    id: &str,
    dir: &Path,
    info: &SnapshotInfo,
    paths: &impl SnapshotPaths,
) -> Result<bool> {
    Builder::default().build(ctx, key, id, dir, info, paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn probe() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Eligibility::probe(dir.path()), Eligibility::NotAccelerated);

        let fs_dir = dir.path().join(FS_DIR);
        fs::create_dir(&fs_dir).unwrap();
        fs::write(fs_dir.join(NEW_FORMAT_FILE), "").unwrap();
        fs::write(fs_dir.join(CHECKSUM_FILE), "").unwrap();
        assert_eq!(Eligibility::probe(dir.path()), Eligibility::NotAccelerated);

        fs::write(fs_dir.join(BLOB_URL_FILE), "").unwrap();
        assert_eq!(Eligibility::probe(dir.path()), Eligibility::Accelerated);
    }

    #[test]
    fn paths() {
        let dir = Path::new("/s/0");
        assert_eq!(descriptor_path(dir), PathBuf::from("/s/0/block/config.v1.json"));
        assert_eq!(result_file(dir), PathBuf::from("/s/0/init-debug.log"));
    }

    #[test]
    fn builder_uses_configured_domain() {
        let builder = Builder::new(Config {
            default_domain: "mirror.example".into(),
            ..Config::default()
        });
        assert_eq!(builder.config().default_domain, "mirror.example");
    }
}
