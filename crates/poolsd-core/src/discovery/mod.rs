//! Static service discovery document
//!
//! Prometheus `file_sd_configs` reads a JSON array of target groups:
//!
//! ```json
//! [
//!  {
//!   "targets": [
//!    "10.0.0.1",
//!    "10.0.0.2"
//!   ],
//!   "labels": {}
//!  }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;

use crate::error::Result;

/// Indentation used when rendering the document
const INDENT: &[u8] = b" ";

/// A group of scrape targets sharing the same labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    /// Target addresses
    pub targets: Vec<String>,
    /// Labels attached to every target of the group
    pub labels: BTreeMap<String, String>,
}

impl TargetGroup {
    /// Create an unlabelled target group
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            labels: BTreeMap::new(),
        }
    }
}

/// The full discovery document: a list of target groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticSdConfig(pub Vec<TargetGroup>);

impl StaticSdConfig {
    /// Build the single-group document published for an instance pool
    pub fn from_targets(targets: Vec<String>) -> Self {
        Self(vec![TargetGroup::new(targets)])
    }

    /// Target groups in the document
    pub fn groups(&self) -> &[TargetGroup] {
        &self.0
    }

    /// Total number of targets across all groups
    pub fn target_count(&self) -> usize {
        self.0.iter().map(|g| g.targets.len()).sum()
    }

    /// Render the document as indented JSON (one space per level)
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(INDENT);
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}
