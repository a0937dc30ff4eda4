// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use crate::formats::Digest;

use std::fmt::Display;
use std::sync::OnceLock;

use regex::Regex;

/// The registry used when a reference names no domain
pub const DEFAULT_DOMAIN: &str = "registry-1.docker.io";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid image reference {reference:?}: {reason}")]
pub struct ReferenceError {
    pub reference: String,
    pub reason: &'static str,
}

impl ReferenceError {
    fn new(reference: &str, reason: &'static str) -> Self {
        Self {
            reference: reference.into(),
            reason,
        }
    }
}

fn domain_re() -> &'static Regex {
    const RE: &str = r"^[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)*(:[0-9]+)?$";
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(RE).unwrap())
}

fn component_re() -> &'static Regex {
    const RE: &str = r"^[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*$";
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(RE).unwrap())
}

fn tag_re() -> &'static Regex {
    const RE: &str = r"^[\w][\w.-]{0,127}$";
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(RE).unwrap())
}

/// A registry domain plus repository path
///
/// Tags and digests are accepted while parsing but not kept: blob URLs only
/// depend on where the repository lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference {
    domain: String,
    repository: String,
}

impl Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.domain, self.repository)
    }
}

impl ImageReference {
    /// Parses `[domain/]repository[:tag][@digest]`
    ///
    /// When the reference has a `/`, everything before the first one is the
    /// domain. A bare repository name lives on `default_domain`.
    pub fn parse(reference: &str, default_domain: &str) -> Result<Self, ReferenceError> {
        let raw = reference;
        let mut repository = reference.trim();

        // Remove any digest, then any tag
        if let Some((lhs, rhs)) = repository.split_once('@') {
            rhs.parse::<Digest>()
                .map_err(|_| ReferenceError::new(raw, "malformed digest"))?;
            repository = lhs;
        }

        let sep = repository.rfind('/').unwrap_or_default();
        if let Some(lbl) = repository.rfind(':').filter(|lbl| *lbl > sep) {
            let (lhs, rhs) = repository.split_at(lbl);
            if !tag_re().is_match(&rhs[1..]) {
                return Err(ReferenceError::new(raw, "malformed tag"));
            }
            repository = lhs;
        }

        // Extract the registry
        let domain = match repository.split_once('/') {
            Some((lhs, rhs)) => {
                repository = rhs;
                lhs
            }
            None => default_domain,
        };

        if repository.is_empty() {
            return Err(ReferenceError::new(raw, "missing repository"));
        }

        if !domain_re().is_match(domain) {
            return Err(ReferenceError::new(raw, "malformed domain"));
        }

        if !repository.split('/').all(|c| component_re().is_match(c)) {
            return Err(ReferenceError::new(raw, "malformed repository path"));
        }

        Ok(Self {
            domain: domain.into(),
            repository: repository.into(),
        })
    }

    /// Moves the repository to another registry domain, keeping its path
    pub fn with_domain(self, domain: &str) -> Result<Self, ReferenceError> {
        if !domain_re().is_match(domain) {
            return Err(ReferenceError::new(domain, "malformed override domain"));
        }

        Ok(Self {
            domain: domain.into(),
            ..self
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The base URL a digest is appended to when fetching a blob
    pub fn blob_url(&self) -> String {
        format!("https://{}/v2/{}/blobs", self.domain, self.repository)
    }
}

/// Turns recorded layer metadata into a repository blob URL
#[derive(Clone, Debug)]
pub struct Resolver {
    default_domain: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN)
    }
}

impl Resolver {
    pub fn new(default_domain: impl Into<String>) -> Self {
        Self {
            default_domain: default_domain.into(),
        }
    }

    /// Resolves the blob URL for a snapshot
    ///
    /// An empty `reference` falls back to the default domain and the
    /// `recorded` repository path. A non-empty `override_domain` replaces
    /// whatever domain was parsed.
    pub fn resolve(
        &self,
        reference: &str,
        override_domain: &str,
        recorded: Option<&str>,
    ) -> Result<String, ReferenceError> {
        let mut image = if reference.trim().is_empty() {
            let repository =
                recorded.ok_or_else(|| ReferenceError::new(reference, "no recorded repository"))?;

            if repository.is_empty() || !repository.split('/').all(|c| component_re().is_match(c)) {
                return Err(ReferenceError::new(repository, "malformed recorded repository"));
            }

            ImageReference {
                domain: self.default_domain.clone(),
                repository: repository.into(),
            }
        } else {
            ImageReference::parse(reference, &self.default_domain)?
        };

        let override_domain = override_domain.trim();
        if !override_domain.is_empty() {
            image = image.with_domain(override_domain)?;
        }

        Ok(image.blob_url())
    }
}
