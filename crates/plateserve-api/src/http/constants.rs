//! Shared HTTP constants.

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json";
