//! Canonical request signing.
//!
//! A signature is the hex SHA-512 of the form-encoded, key-sorted field map
//! followed by the merchant secret. A partial signature covers only a named
//! subset of fields and carries that subset after a `|`.
//!
//! ```
//! use paynet_core::{signature, types::FieldMap};
//!
//! let request = FieldMap::new()
//!     .with("merchantID", "100001")
//!     .with("action", "SALE")
//!     .with("amount", 1001);
//!
//! let signed = signature::sign(&request, "Circle4Take40Idea", None).unwrap();
//! assert!(signature::verify(&request, "Circle4Take40Idea", &signed).is_ok());
//! assert!(signature::verify(&request, "another-secret", &signed).is_err());
//! ```

use std::{
    borrow::Cow,
    convert::Infallible,
    fmt::Display,
    str::FromStr,
    sync::LazyLock,
};

use regex::Regex;
use sha2::{Digest, Sha512};

use crate::{
    encoding::{encode_query, ensure_unique, flatten},
    errors::{EncodingError, Result, SignatureError},
    types::{FieldMap, FieldValue},
};

static LINE_ENDINGS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("(?i)%0D%0A|%0A%0D|%0D").ok());

/// Names of the fields covered by a partial signature.
///
/// Parses from and prints as the comma separated list used on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSubset(Vec<String>);

impl FieldSubset {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().collect()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSubset {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FieldSubset(iter.into_iter().map(Into::into).collect())
    }
}

impl FromStr for FieldSubset {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect())
    }
}

impl Display for FieldSubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// A computed or received signature.
///
/// The wire form is `<hash>` or, for a partial signature, `<hash>|<names>`.
///
/// ```
/// use paynet_core::signature::Signature;
///
/// let signature: Signature = "abc123|amount,orderRef".parse().unwrap();
/// assert_eq!(signature.hash(), "abc123");
/// assert_eq!(signature.signed_fields().unwrap().names(), ["amount", "orderRef"]);
/// assert_eq!(signature.to_string(), "abc123|amount,orderRef");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    hash: String,
    signed_fields: Option<FieldSubset>,
}

impl Signature {
    /// The hex encoded digest.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The fields covered, for a partial signature.
    pub fn signed_fields(&self) -> Option<&FieldSubset> {
        self.signed_fields.as_ref()
    }

    pub fn is_partial(&self) -> bool {
        self.signed_fields.is_some()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.signed_fields {
            Some(fields) if !fields.is_empty() => write!(f, "{}|{}", self.hash, fields),
            _ => write!(f, "{}", self.hash),
        }
    }
}

impl FromStr for Signature {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (hash, signed_fields) = match s.split_once('|') {
            Some((hash, names)) => {
                let subset = FieldSubset::from_str(names)?;
                (hash, Some(subset).filter(|subset| !subset.is_empty()))
            }
            None => (s, None),
        };
        Ok(Signature {
            hash: hash.to_owned(),
            signed_fields,
        })
    }
}

impl From<Signature> for FieldValue {
    fn from(signature: Signature) -> Self {
        FieldValue::Text(signature.to_string())
    }
}

/// Build the canonical, line-ending normalized query string that is hashed.
///
/// Returns the string together with the names actually signed when a subset
/// was requested, in the order they appear in `fields`. Fails if two signed
/// fields flatten to the same name.
pub fn canonical_query(
    fields: &FieldMap,
    subset: Option<&FieldSubset>,
) -> std::result::Result<(String, Option<FieldSubset>), EncodingError> {
    let subset = subset.filter(|subset| !subset.is_empty());

    let mut selected: Vec<(&String, &FieldValue)> = fields
        .iter()
        .filter(|(name, _)| subset.is_none_or(|subset| subset.contains(name)))
        .collect();
    let signed_fields = subset.map(|_| selected.iter().map(|(name, _)| name.as_str()).collect());

    selected.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

    let pairs: Vec<(String, String)> = selected
        .into_iter()
        .flat_map(|(name, value)| flatten(name, value))
        .collect();
    ensure_unique(&pairs)?;

    let query = encode_query(pairs);
    let query = match normalize_line_endings(&query) {
        Cow::Borrowed(_) => query,
        Cow::Owned(normalized) => normalized,
    };

    Ok((query, signed_fields))
}

/// Collapse encoded CRLF, LFCR and lone CR to `%0A`.
fn normalize_line_endings(query: &str) -> Cow<'_, str> {
    match LINE_ENDINGS.as_ref() {
        Some(regex) => regex.replace_all(query, "%0A"),
        None => Cow::Borrowed(query),
    }
}

/// Sign `fields` with `secret`, optionally restricted to `subset`.
pub fn sign(
    fields: &FieldMap,
    secret: &str,
    subset: Option<&FieldSubset>,
) -> std::result::Result<Signature, EncodingError> {
    let (query, signed_fields) = canonical_query(fields, subset)?;

    let mut hasher = Sha512::new();
    hasher.update(query.as_bytes());
    hasher.update(secret.as_bytes());

    Ok(Signature {
        hash: hex::encode(hasher.finalize()),
        signed_fields,
    })
}

/// Check `signature` against `fields`, honouring any partial field list.
pub fn verify(fields: &FieldMap, secret: &str, signature: &Signature) -> Result<()> {
    let expected = sign(fields, secret, signature.signed_fields())?;
    if constant_time_eq(expected.hash.as_bytes(), signature.hash.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch.into())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
