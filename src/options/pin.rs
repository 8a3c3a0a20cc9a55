//! Public key pins for TLS upstreams.

use crate::utils::base64;
use bytes::Bytes;
use serde::Serialize;
use std::{fmt, str};

//------------ PubkeyPin -----------------------------------------------------

/// A SHA-256 pin of an upstream's public key as defined in RFC 7469.
///
/// The textual form is `pin-sha256="<base64 digest>"`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PubkeyPin {
    /// The SHA-256 digest of the subject public key info.
    digest: Bytes,
}

impl PubkeyPin {
    /// The length of a SHA-256 digest.
    pub const DIGEST_LEN: usize = 32;

    pub fn digest(&self) -> &Bytes {
        &self.digest
    }
}

//--- FromStr

impl str::FromStr for PubkeyPin {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alg, value) = s.trim().split_once('=').ok_or(PinError)?;
        if !alg.trim().eq_ignore_ascii_case("pin-sha256") {
            return Err(PinError);
        }
        let value = value
            .trim()
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .ok_or(PinError)?;
        let digest = base64::decode(value).map_err(|_| PinError)?;
        if digest.len() != Self::DIGEST_LEN {
            return Err(PinError);
        }
        Ok(PubkeyPin { digest })
    }
}

//--- Display and Serialize

impl fmt::Display for PubkeyPin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pin-sha256=\"{}\"", base64::encode_string(&self.digest))
    }
}

impl Serialize for PubkeyPin {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

//------------ PinError ------------------------------------------------------

/// A string was not a valid public key pin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PinError;

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid public key pin")
    }
}

impl std::error::Error for PinError {}

//============ Tests =========================================================
