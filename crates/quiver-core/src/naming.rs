//! Name rules for collections and properties.
//!
//! Names end up in request paths and query documents verbatim, so every name
//! is checked here before it leaves the process.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Collection names start with an uppercase letter.
pub const COLLECTION_NAME_PATTERN: &str = "^[A-Z][_0-9A-Za-z]*$";

/// Property names start with a letter or underscore.
pub const PROPERTY_NAME_PATTERN: &str = "^[_A-Za-z][_0-9A-Za-z]*$";

// A pattern that fails to compile leaves `None`, which rejects every name.
fn collection_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COLLECTION_NAME_PATTERN).ok()).as_ref()
}

fn property_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PROPERTY_NAME_PATTERN).ok()).as_ref()
}

/// Check a collection name.
///
/// # Errors
/// Returns [`Error::InvalidName`] when the name does not match
/// [`COLLECTION_NAME_PATTERN`].
pub fn validate_collection_name(name: &str) -> Result<()> {
    if collection_regex().is_some_and(|re| re.is_match(name)) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "collection",
            name: name.to_string(),
            pattern: COLLECTION_NAME_PATTERN,
        })
    }
}

/// Check a property name.
///
/// # Errors
/// Returns [`Error::InvalidName`] when the name does not match
/// [`PROPERTY_NAME_PATTERN`].
pub fn validate_property_name(name: &str) -> Result<()> {
    if property_regex().is_some_and(|re| re.is_match(name)) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "property",
            name: name.to_string(),
            pattern: PROPERTY_NAME_PATTERN,
        })
    }
}
