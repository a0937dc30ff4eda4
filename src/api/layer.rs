// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

//! Per-layer marker files written by the image pull logic.
//!
//! ```text
//! <layer-dir>/
//! +-- fs/
//! |   +-- .aaaaaaaaaaaaaaaa.lsmt   # new format marker
//! |   +-- .checksum_file           # layer digest (may be empty)
//! |   +-- .oss_url                 # https://<domain>/v2/<repo>/blobs/<digest>
//! |   +-- .data_size               # blob size in bytes
//! |   +-- .type                    # blob type
//! +-- block/                       # block artifacts, filled by the driver
//! +-- image_ref                    # optional image reference
//! +-- domain_override              # optional registry domain substitute
//! ```

use crate::context::Context;
use crate::error::{Error, Result};
use crate::formats::Digest;

use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use log::debug;

pub const FS_DIR: &str = "fs";
pub const BLOCK_DIR: &str = "block";

pub const NEW_FORMAT_FILE: &str = ".aaaaaaaaaaaaaaaa.lsmt";
pub const CHECKSUM_FILE: &str = ".checksum_file";
pub const BLOB_URL_FILE: &str = ".oss_url";
pub const DATA_SIZE_FILE: &str = ".data_size";
pub const BLOB_TYPE_FILE: &str = ".type";

pub const IMAGE_REF_FILE: &str = "image_ref";
pub const DOMAIN_OVERRIDE_FILE: &str = "domain_override";

/// A blob URL recorded when the layer was pulled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedBlob<'a> {
    pub domain: &'a str,
    pub repository: &'a str,
    pub digest: Option<&'a str>,
}

impl<'a> RecordedBlob<'a> {
    /// Splits `https://<domain>/v2/<repository>/blobs[/<digest>]`
    pub fn parse(url: &'a str) -> Option<Self> {
        let url = url.trim();
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;

        let (domain, path) = rest.split_once('/')?;
        let path = path.strip_prefix("v2/")?;

        let (repository, digest) = match path.rsplit_once("/blobs/") {
            Some((repository, digest)) => (repository, Some(digest)),
            None => (path.strip_suffix("/blobs")?, None),
        };

        if domain.is_empty() || repository.is_empty() {
            return None;
        }

        Some(Self {
            domain,
            repository,
            digest: digest.filter(|d| !d.is_empty()),
        })
    }
}

/// Everything recorded about one layer of the chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerRecord {
    pub id: String,
    pub digest: Digest,
    pub block_dir: PathBuf,
    pub blob_url: Option<String>,
    pub size: Option<u64>,
    pub blob_type: Option<String>,
}

struct Reader<'a> {
    ctx: &'a Context,
    snapshot: &'a str,
    layer: &'a str,
}

impl Reader<'_> {
    fn fault(&self, path: &Path, source: IoError) -> Error {
        Error::MetadataRead {
            snapshot: self.snapshot.into(),
            layer: self.layer.into(),
            path: path.into(),
            source,
        }
    }

    fn corrupt(&self, path: &Path, reason: String) -> Error {
        self.fault(path, IoError::new(ErrorKind::InvalidData, reason))
    }

    fn check(&self) -> Result<()> {
        if self.ctx.is_cancelled() {
            return Err(Error::Cancelled {
                snapshot: self.snapshot.into(),
            });
        }

        Ok(())
    }

    fn required(&self, path: &Path) -> Result<String> {
        self.check()?;
        fs::read_to_string(path).map_err(|e| self.fault(path, e))
    }

    fn optional(&self, path: &Path) -> Result<Option<String>> {
        self.check()?;
        match fs::read_to_string(path) {
            Ok(s) if s.trim().is_empty() => Ok(None),
            Ok(s) => Ok(Some(s.trim().into())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.fault(path, e)),
        }
    }
}

/// Reads an optional marker of `layer`, trimmed; blank counts as absent
pub(crate) fn read_marker(
    ctx: &Context,
    snapshot: &str,
    layer: &str,
    path: &Path,
) -> Result<Option<String>> {
    let reader = Reader {
        ctx,
        snapshot,
        layer,
    };

    reader.optional(path)
}

impl LayerRecord {
    /// Reads the marker files of layer `layer` stored in `dir`
    ///
    /// `snapshot` names the snapshot being prepared and only shows up in
    /// errors.
    pub fn read(ctx: &Context, snapshot: &str, layer: &str, dir: &Path) -> Result<Self> {
        let reader = Reader {
            ctx,
            snapshot,
            layer,
        };
        let fs_dir = dir.join(FS_DIR);

        let checksum_path = fs_dir.join(CHECKSUM_FILE);
        let checksum = reader.required(&checksum_path)?;
        let blob_url = reader.optional(&fs_dir.join(BLOB_URL_FILE))?;

        // An empty checksum file defers to the digest inside the blob url
        let recorded = blob_url
            .as_deref()
            .and_then(RecordedBlob::parse)
            .and_then(|blob| blob.digest);
        let raw = match checksum.trim() {
            "" => recorded.ok_or_else(|| {
                reader.corrupt(&checksum_path, "no digest recorded".into())
            })?,
            checksum => checksum,
        };
        let digest = raw
            .parse::<Digest>()
            .map_err(|e| reader.corrupt(&checksum_path, format!("{}: {:?}", e, raw)))?;

        let block_dir = dir.join(BLOCK_DIR);
        reader.check()?;
        let meta = fs::metadata(&block_dir).map_err(|e| reader.fault(&block_dir, e))?;
        if !meta.is_dir() {
            return Err(reader.corrupt(&block_dir, "not a directory".into()));
        }

        let size_path = fs_dir.join(DATA_SIZE_FILE);
        let size = match reader.optional(&size_path)? {
            Some(s) => Some(
                s.parse::<u64>()
                    .map_err(|e| reader.corrupt(&size_path, format!("{}: {:?}", e, s)))?,
            ),
            None => None,
        };

        let blob_type = reader.optional(&fs_dir.join(BLOB_TYPE_FILE))?;

        debug!("layer {} of {}: {} at {:?}", layer, snapshot, digest, block_dir);

        Ok(Self {
            id: layer.into(),
            digest,
            block_dir,
            blob_url,
            size,
            blob_type,
        })
    }

    /// The recorded blob url, if it has the expected shape
    pub fn recorded_blob(&self) -> Option<RecordedBlob<'_>> {
        self.blob_url.as_deref().and_then(RecordedBlob::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    const ZERO: &str = "sha256:0000000000000000000000000000000000000000000000000000000000000000";

    fn layer(files: &[(&str, &str)], block: bool) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(FS_DIR)).unwrap();
        if block {
            fs::create_dir(dir.path().join(BLOCK_DIR)).unwrap();
        }

        for (name, contents) in files {
            fs::write(dir.path().join(FS_DIR).join(name), contents).unwrap();
        }

        dir
    }

    fn read(dir: &TempDir) -> Result<LayerRecord> {
        LayerRecord::read(&Context::background(), "snap", "layer", dir.path())
    }

    #[test]
    fn recorded_blob() {
        let url = format!("https://registry-1.docker.io/v2/org/test/blobs/{}", ZERO);
        let blob = RecordedBlob::parse(&url).unwrap();
        assert_eq!(blob.domain, "registry-1.docker.io");
        assert_eq!(blob.repository, "org/test");
        assert_eq!(blob.digest, Some(ZERO));

        let blob = RecordedBlob::parse("https://h.example/v2/test/blobs").unwrap();
        assert_eq!(blob.repository, "test");
        assert_eq!(blob.digest, None);

        assert_eq!(RecordedBlob::parse(""), None);
        assert_eq!(RecordedBlob::parse("ftp://h/v2/test/blobs"), None);
        assert_eq!(RecordedBlob::parse("https://h/test/blobs/x"), None);
        assert_eq!(RecordedBlob::parse("https://h/v2/blobs/x"), None);
    }

    #[test]
    fn checksum_file_wins() {
        let dir = layer(
            &[
                (CHECKSUM_FILE, &format!("{}\n", ZERO)),
                (BLOB_URL_FILE, "https://h.example/v2/test/blobs/sha256:bogus"),
                (DATA_SIZE_FILE, "4096\n"),
                (BLOB_TYPE_FILE, "overlaybd"),
            ],
            true,
        );

        let record = read(&dir).unwrap();
        assert_eq!(record.id, "layer");
        assert_eq!(record.digest.to_string(), ZERO);
        assert_eq!(record.block_dir, dir.path().join(BLOCK_DIR));
        assert_eq!(record.size, Some(4096));
        assert_eq!(record.blob_type.as_deref(), Some("overlaybd"));
        assert_eq!(record.recorded_blob().unwrap().repository, "test");
    }

    #[test]
    fn digest_from_blob_url() {
        let url = format!("https://h.example/v2/test/blobs/{}", ZERO);
        let dir = layer(&[(CHECKSUM_FILE, ""), (BLOB_URL_FILE, &url)], true);

        let record = read(&dir).unwrap();
        assert_eq!(record.digest.to_string(), ZERO);
        assert_eq!(record.size, None);
        assert_eq!(record.blob_type, None);
    }

    #[test]
    fn missing_checksum_file() {
        let url = format!("https://h.example/v2/test/blobs/{}", ZERO);
        let dir = layer(&[(BLOB_URL_FILE, &url)], true);

        match read(&dir) {
            Err(Error::MetadataRead { layer, path, source, .. }) => {
                assert_eq!(layer, "layer");
                assert_eq!(path, dir.path().join(FS_DIR).join(CHECKSUM_FILE));
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn no_digest_anywhere() {
        let dir = layer(&[(CHECKSUM_FILE, "")], true);
        assert!(matches!(read(&dir), Err(Error::MetadataRead { .. })));
    }

    #[test]
    fn corrupt_markers() {
        let dir = layer(&[(CHECKSUM_FILE, "sha256:short")], true);
        assert!(matches!(read(&dir), Err(Error::MetadataRead { .. })));

        let dir = layer(&[(CHECKSUM_FILE, ZERO), (DATA_SIZE_FILE, "lots")], true);
        match read(&dir) {
            Err(Error::MetadataRead { path, source, .. }) => {
                assert_eq!(path, dir.path().join(FS_DIR).join(DATA_SIZE_FILE));
                assert_eq!(source.kind(), ErrorKind::InvalidData);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn missing_block_dir() {
        let dir = layer(&[(CHECKSUM_FILE, ZERO)], false);
        match read(&dir) {
            Err(Error::MetadataRead { path, .. }) => assert_eq!(path, dir.path().join(BLOCK_DIR)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn cancelled() {
        let dir = layer(&[(CHECKSUM_FILE, ZERO)], true);
        let ctx = Context::background();
        ctx.cancel();

        let result = LayerRecord::read(&ctx, "snap", "layer", dir.path());
        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }
}
