use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

#[inline(always)]
fn dehex(byte: u8) -> Result<u8, Invalid> {
    Ok(match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => return Err(Invalid::Encoding),
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Algorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    fn name(self) -> &'static str {
        match self {
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    fn len(self) -> usize {
        match self {
            Algorithm::Sha224 => 28,
            Algorithm::Sha256 => 32,
            Algorithm::Sha384 => 48,
            Algorithm::Sha512 => 64,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Invalid {
    Algorithm,
    Encoding,
    Length,
}

impl std::error::Error for Invalid {}
impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invalid::Algorithm => f.write_str("invalid digest algorithm"),
            Invalid::Encoding => f.write_str("invalid digest encoding"),
            Invalid::Length => f.write_str("invalid digest length"),
        }
    }
}

struct Visitor;
impl<'de> serde::de::Visitor<'de> for Visitor {
    type Value = Digest;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a string in the format `ALGO:HASH`")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Digest::from_str(v).map_err(|e| E::custom(format!("{}", e)))
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
        self.visit_str(&v)
    }
}

/// A content digest identifying a layer blob
///
/// This digest is most often represented in the form 'ALGORITHM:HEX_BYTES'.
/// Parsing checks the algorithm and the encoded length; the digest is always
/// displayed in lowercase hex, so the block device driver sees one canonical
/// spelling no matter how the marker file was written.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: Algorithm,
    bytes: Vec<u8>,
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(Visitor)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Digest {
    type Err = Invalid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, h) = if let Some((lhs, rhs)) = s.split_once(':') {
            let algorithm = if lhs.eq_ignore_ascii_case("sha224") {
                Algorithm::Sha224
            } else if lhs.eq_ignore_ascii_case("sha256") {
                Algorithm::Sha256
            } else if lhs.eq_ignore_ascii_case("sha384") {
                Algorithm::Sha384
            } else if lhs.eq_ignore_ascii_case("sha512") {
                Algorithm::Sha512
            } else {
                return Err(Invalid::Algorithm);
            };

            (algorithm, rhs)
        } else if s.len() == 64 {
            (Algorithm::Sha256, s)
        } else {
            return Err(Invalid::Algorithm);
        };

        if h.len() != algorithm.len() * 2 {
            return Err(Invalid::Length);
        }

        let bytes = h
            .as_bytes()
            .chunks_exact(2)
            .map(|pair| Ok(dehex(pair[0])? << 4 | dehex(pair[1])?))
            .collect::<Result<Vec<u8>, Invalid>>()?;

        Ok(Self { algorithm, bytes })
    }
}

impl Digest {
    pub fn algorithm(&self) -> &str {
        self.algorithm.name()
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.algorithm())?;

        for byte in self.bytes.iter().cloned() {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}
