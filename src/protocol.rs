//! Wire protocol for the workshop service
//!
//! All three operations are `POST` requests without a body. Registration and
//! excavation answer with JSON, store answers with the literal text `true`.

use crate::error::{Error, Result};
use crate::types::{BucketId, BucketKind, ExcavationResult, UserId};
use serde::Deserialize;

/// Service endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `/v1/register?userName=...`
    Register,
    /// `/v1/excavate`
    Excavate,
    /// `/v1/store?userId=...&bucketId=...`
    Store,
}

impl Endpoint {
    /// Path relative to the base URL
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Register => "/v1/register",
            Endpoint::Excavate => "/v1/excavate",
            Endpoint::Store => "/v1/store",
        }
    }

    /// Path segments appended to the base URL
    pub(crate) fn segments(self) -> [&'static str; 2] {
        match self {
            Endpoint::Register => ["v1", "register"],
            Endpoint::Excavate => ["v1", "excavate"],
            Endpoint::Store => ["v1", "store"],
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    user: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnitsBody {
    units: u64,
}

#[derive(Debug, Deserialize)]
struct ExcavateBody {
    #[serde(rename = "bucketId")]
    bucket_id: Option<String>,
    gold: Option<UnitsBody>,
    dirt: Option<UnitsBody>,
}

/// Registration response: the issued id and the echoed name, if any
#[derive(Debug, PartialEq, Eq)]
pub struct Registration {
    /// Issued user id
    pub user_id: UserId,
    /// Name echoed back by the server
    pub name: Option<String>,
}

/// Parse a `/v1/register` body
///
/// A missing or empty `user` field is a protocol violation.
pub fn parse_registration(body: &str) -> Result<Registration> {
    let endpoint = Endpoint::Register.path();
    let parsed: RegisterBody = serde_json::from_str(body)
        .map_err(|e| Error::protocol(endpoint, format!("invalid JSON: {e}")))?;

    match parsed.user {
        Some(user) if !user.is_empty() => Ok(Registration {
            user_id: UserId(user),
            name: parsed.name,
        }),
        Some(_) => Err(Error::protocol(endpoint, "field `user` is empty")),
        None => Err(Error::protocol(endpoint, "missing field `user`")),
    }
}

/// Parse and normalize a `/v1/excavate` body
///
/// Exactly one of `gold` and `dirt` must be present.
pub fn parse_excavation(body: &str) -> Result<ExcavationResult> {
    let endpoint = Endpoint::Excavate.path();
    let parsed: ExcavateBody = serde_json::from_str(body)
        .map_err(|e| Error::protocol(endpoint, format!("invalid JSON: {e}")))?;

    let bucket_id = parsed
        .bucket_id
        .ok_or_else(|| Error::protocol(endpoint, "missing field `bucketId`"))?;

    let (kind, units) = match (parsed.gold, parsed.dirt) {
        (Some(gold), None) => (BucketKind::Gold, gold.units),
        (None, Some(dirt)) => (BucketKind::Dirt, dirt.units),
        (Some(_), Some(_)) => {
            return Err(Error::protocol(
                endpoint,
                "both `gold` and `dirt` present",
            ));
        }
        (None, None) => {
            return Err(Error::protocol(
                endpoint,
                "neither `gold` nor `dirt` present",
            ));
        }
    };

    Ok(ExcavationResult {
        bucket_id: BucketId(bucket_id),
        kind,
        units,
    })
}

/// Check a `/v1/store` body
///
/// Only `true` (surrounding whitespace ignored) counts as acceptance; any other
/// body, `false` included, is a protocol violation.
pub fn parse_store(body: &str) -> Result<()> {
    let trimmed = body.trim();
    if trimmed == "true" {
        Ok(())
    } else {
        Err(Error::protocol(
            Endpoint::Store.path(),
            format!("expected body `true`, got {trimmed:?}"),
        ))
    }
}
