use crate::ANY_ORIGIN;
use crate::error::bridge::BridgeError;

use common::ErrorLocation;

use std::panic::Location;

use url::{Origin, Url};

/// Canonical `scheme://host[:port]` form of `target_origin`.
///
/// `"*"` passes through. Paths, queries and default ports are dropped, so
/// `https://host.example.com:443/deck?x=1` becomes `https://host.example.com`.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidOrigin`] if the value does not parse as a URL
/// or has an opaque origin (e.g. `data:` or `file:` URLs).
#[track_caller]
pub fn normalize_origin(target_origin: &str) -> Result<String, BridgeError> {
    if target_origin == ANY_ORIGIN {
        return Ok(ANY_ORIGIN.to_string());
    }

    let url = Url::parse(target_origin)?;
    match url.origin() {
        origin @ Origin::Tuple(..) => Ok(origin.ascii_serialization()),
        Origin::Opaque(_) => Err(BridgeError::InvalidOrigin {
            message: format!("'{target_origin}' has no usable origin"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
