// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use super::Digest;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One entry of the lower stack handed to the block device driver
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lower {
    /// The fixed base virtual disk
    File { file: PathBuf },

    /// A layer fetched from `{repoBlobUrl}/{digest}` unless `dir` already holds it
    Layer { digest: Digest, dir: PathBuf },
}

/// The descriptor the block device driver reads on mount
///
/// Field order and names are part of the driver contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySpec {
    pub repo_blob_url: String,
    pub lowers: Vec<Lower>,
    pub result_file: PathBuf,
}

impl OverlaySpec {
    /// Assembles a descriptor: the base artifact first, then `layers` in the
    /// order given.
    pub fn new<I>(repo_blob_url: String, base: &Path, layers: I, result_file: PathBuf) -> Self
    where
        I: IntoIterator<Item = (Digest, PathBuf)>,
    {
        let base = Lower::File { file: base.into() };
        let lowers = std::iter::once(base)
            .chain(layers.into_iter().map(|(digest, dir)| Lower::Layer { digest, dir }))
            .collect();

        Self {
            repo_blob_url,
            lowers,
            result_file,
        }
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    const BASE: &str = "/opt/overlaybd/baselayers/.commit";

    fn digest(n: u8) -> Digest {
        format!("sha256:{}", format!("{:02x}", n).repeat(32))
            .parse()
            .unwrap()
    }

    #[test]
    fn no_layers_is_base_only() {
        let spec = OverlaySpec::new(
            "https://example.com/v2/a/blobs".into(),
            Path::new(BASE),
            Vec::new(),
            "/s/init-debug.log".into(),
        );

        assert_eq!(
            spec.lowers,
            vec![Lower::File {
                file: PathBuf::from(BASE)
            }]
        );
    }

    #[test]
    fn layers_keep_their_order() {
        let layers: Vec<_> = (1..=3)
            .map(|n| (digest(n), PathBuf::from(format!("/s/{}/block", n))))
            .collect();

        let spec = OverlaySpec::new(
            "https://example.com/v2/a/blobs".into(),
            Path::new(BASE),
            layers.clone(),
            "/s/1/init-debug.log".into(),
        );

        assert_eq!(spec.lowers.len(), 4);
        assert!(matches!(&spec.lowers[0], Lower::File { .. }));
        for (lower, (digest, dir)) in spec.lowers[1..].iter().zip(layers) {
            assert_eq!(lower, &Lower::Layer { digest, dir });
        }
    }

    #[test]
    fn wire_shape() {
        let spec = OverlaySpec::new(
            "https://registry-1.docker.io/v2/test/blobs".into(),
            Path::new(BASE),
            vec![(digest(0), PathBuf::from("/s/0/block"))],
            "/s/0/init-debug.log".into(),
        );

        let json = String::from_utf8(spec.to_vec().unwrap()).unwrap();
        let expected = format!(
            concat!(
                r#"{{"repoBlobUrl":"https://registry-1.docker.io/v2/test/blobs","#,
                r#""lowers":[{{"file":"{}"}},{{"digest":"{}","dir":"/s/0/block"}}],"#,
                r#""resultFile":"/s/0/init-debug.log"}}"#
            ),
            BASE,
            digest(0)
        );
        assert_eq!(json, expected);

        assert_eq!(OverlaySpec::from_slice(json.as_bytes()).unwrap(), spec);
    }

    #[test]
    fn reads_driver_json() {
        let json = format!(
            r#"{{
                "repoBlobUrl": "https://h.example/v2/a/blobs",
                "lowers": [
                    {{"file": "{}"}},
                    {{"digest": "{}", "dir": "/s/1/block"}}
                ],
                "resultFile": "/s/1/init-debug.log"
            }}"#,
            BASE,
            digest(1)
        );

        let spec = OverlaySpec::from_slice(json.as_bytes()).unwrap();
        assert_eq!(
            spec.lowers,
            vec![
                Lower::File {
                    file: PathBuf::from(BASE)
                },
                Lower::Layer {
                    digest: digest(1),
                    dir: PathBuf::from("/s/1/block")
                },
            ]
        );

        let bad = r#"{"repoBlobUrl":"u","lowers":[{"dir":"/x"}],"resultFile":"r"}"#;
        assert!(OverlaySpec::from_slice(bad.as_bytes()).is_err());
    }
}
