//! `drbdsetup status --json` parsing

use serde::Deserialize;

use crate::error::{Error, Result};

/// One resource as reported by `drbdsetup status --json`
///
/// Only the fields needed here are decoded; everything else in the status
/// document is ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StatusEntry {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Parse the status document into its entries, preserving order.
///
/// Anything other than a JSON array of objects with a string `name` is
/// rejected.
pub fn parse_status(raw: &[u8]) -> Result<Vec<StatusEntry>> {
    serde_json::from_slice(raw).map_err(|e| Error::StatusParse { source: e })
}
