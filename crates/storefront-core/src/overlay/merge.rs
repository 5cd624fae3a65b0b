//! Overlay merge rule.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::OverlayRecord;

/// One merged child with its visibility flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEntry {
    pub id: String,
    pub hidden: bool,
}

/// Apply an overlay to a base order.
///
/// Overlay ids still present in `base` come first, in overlay order; the rest
/// of `base` follows in base order. Hidden ids are removed unless
/// `include_hidden` is set. The result never contains an id outside `base`.
pub fn merge(base: &[String], overlay: Option<&OverlayRecord>, include_hidden: bool) -> Vec<String> {
    merge_tagged(base, overlay)
        .into_iter()
        .filter(|entry| include_hidden || !entry.hidden)
        .map(|entry| entry.id)
        .collect()
}

/// Unfiltered merge, every entry tagged with its hidden flag.
pub fn merge_tagged(base: &[String], overlay: Option<&OverlayRecord>) -> Vec<MergedEntry> {
    let Some(overlay) = overlay else {
        return base
            .iter()
            .map(|id| MergedEntry {
                id: id.clone(),
                hidden: false,
            })
            .collect();
    };

    let present: HashSet<&str> = base.iter().map(String::as_str).collect();
    let mut placed: HashSet<&str> = HashSet::with_capacity(base.len());
    let mut merged = Vec::with_capacity(base.len());
    let pinned = overlay
        .ordered_ids
        .iter()
        .map(String::as_str)
        .filter(|id| present.contains(id));
    let rest = base.iter().map(String::as_str);
    for id in pinned.chain(rest) {
        if placed.insert(id) {
            merged.push(MergedEntry {
                id: id.to_string(),
                hidden: overlay.is_hidden(id),
            });
        }
    }
    merged
}
