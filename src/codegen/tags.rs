//! Field Tag Ledger
//!
//! Wire tags must never change once a message has shipped. The ledger records
//! every tag handed out, per message path and field name, so regenerating
//! after a schema change only ever appends.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerationError, Result};

/// First tag of the range protobuf reserves for its own use
pub const RESERVED_START: u32 = 19_000;
/// Last tag of the reserved range
pub const RESERVED_END: u32 = 19_999;
/// Largest legal field tag
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Previously assigned tags: message path -> field name -> tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagLedger {
    #[serde(default)]
    messages: BTreeMap<String, BTreeMap<String, u32>>,
}

impl TagLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a ledger; a missing file is an empty ledger
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Tag recorded for a field, if any
    pub fn tag(&self, message_path: &str, field: &str) -> Option<u32> {
        self.messages.get(message_path)?.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Assign tags to `fields` (in emitted order) of the message at
    /// `message_path`, recording new ones.
    ///
    /// Known fields keep their tag. New fields take the next tag above the
    /// highest the message has ever used.
    pub fn assign(
        &mut self,
        message_path: &str,
        fields: &[String],
    ) -> std::result::Result<Vec<u32>, GenerationError> {
        let known = self.messages.entry(message_path.to_string()).or_default();
        let mut highest = known.values().copied().max().unwrap_or(0);
        let mut tags = Vec::with_capacity(fields.len());

        for field in fields {
            if let Some(tag) = known.get(field) {
                tags.push(*tag);
                continue;
            }

            let tag = next_tag(highest).ok_or_else(|| {
                GenerationError::Unimplemented(format!(
                    "message {} has exhausted the field tag space",
                    message_path
                ))
            })?;
            debug!(message = %message_path, field = %field, tag, "assigned new field tag");
            known.insert(field.clone(), tag);
            highest = tag;
            tags.push(tag);
        }

        Ok(tags)
    }
}

fn next_tag(highest: u32) -> Option<u32> {
    let mut tag = highest.checked_add(1)?;
    if (RESERVED_START..=RESERVED_END).contains(&tag) {
        tag = RESERVED_END + 1;
    }
    (tag <= MAX_TAG).then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_ledger_numbers_in_order() {
        let mut ledger = TagLedger::new();
        let tags = ledger.assign("/m/a", &names(&["a", "b", "c"])).unwrap();
        assert_eq!(tags, vec![1, 2, 3]);
        assert_eq!(ledger.tag("/m/a", "b"), Some(2));
    }

    #[test]
    fn test_existing_tags_survive_insertion() {
        let mut ledger = TagLedger::new();
        ledger.assign("/m/a", &names(&["a", "c"])).unwrap();

        // "b" sorts between the existing fields but must not renumber them
        let tags = ledger.assign("/m/a", &names(&["a", "b", "c"])).unwrap();
        assert_eq!(tags, vec![1, 3, 2]);
    }

    #[test]
    fn test_removed_tags_are_not_reused() {
        let mut ledger = TagLedger::new();
        ledger.assign("/m/a", &names(&["a", "b"])).unwrap();
        let tags = ledger.assign("/m/a", &names(&["a", "z"])).unwrap();
        assert_eq!(tags, vec![1, 3]);
    }

    #[test]
    fn test_reserved_range_is_skipped() {
        assert_eq!(next_tag(18_999), Some(20_000));
        assert_eq!(next_tag(MAX_TAG), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("tags.json");

        let mut ledger = TagLedger::new();
        ledger.assign("/m/a", &names(&["x", "y"])).unwrap();
        ledger.save(&path).unwrap();

        let loaded = TagLedger::load(&path).unwrap();
        assert_eq!(loaded, ledger);
        assert!(TagLedger::load(&dir.path().join("missing.json")).unwrap().is_empty());
    }
}
