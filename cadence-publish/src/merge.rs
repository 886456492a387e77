//! Version merge engine: pure functions over sets of [`ContentVersion`]s.

use std::collections::BTreeMap;

use cadence_core::types::{ContentId, ContentVersion};

/// Combine `base` with `overrides`, one entry per `content_id`.
///
/// The override wins whenever both sides hold an id, regardless of version
/// numbers. Output is sorted by name, then content id.
pub fn merge(base: &[ContentVersion], overrides: &[ContentVersion]) -> Vec<ContentVersion> {
    let mut by_id: BTreeMap<&ContentId, &ContentVersion> = BTreeMap::new();
    for version in base {
        by_id.insert(&version.content_id, version);
    }
    for version in overrides {
        by_id.insert(&version.content_id, version);
    }
    let mut merged: Vec<ContentVersion> = by_id.into_values().cloned().collect();
    sort_versions(&mut merged);
    merged
}

/// Keep the highest `version` per `content_id`; sorted like [`merge`].
pub fn dedupe_latest(versions: &[ContentVersion]) -> Vec<ContentVersion> {
    let mut by_id: BTreeMap<&ContentId, &ContentVersion> = BTreeMap::new();
    for version in versions {
        match by_id.get(&version.content_id) {
            Some(kept) if kept.version >= version.version => {}
            _ => {
                by_id.insert(&version.content_id, version);
            }
        }
    }
    let mut deduped: Vec<ContentVersion> = by_id.into_values().cloned().collect();
    sort_versions(&mut deduped);
    deduped
}

/// Overrides that replace a base entry with a lower version number,
/// as `(replaced, replacement)` pairs.
pub fn downgrades<'a>(
    base: &'a [ContentVersion],
    overrides: &'a [ContentVersion],
) -> Vec<(&'a ContentVersion, &'a ContentVersion)> {
    overrides
        .iter()
        .filter_map(|o| {
            base.iter()
                .find(|b| b.content_id == o.content_id && b.version > o.version)
                .map(|b| (b, o))
        })
        .collect()
}

/// Sort by name, then content id.
pub fn sort_versions(versions: &mut [ContentVersion]) {
    versions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.content_id.cmp(&b.content_id)));
}
