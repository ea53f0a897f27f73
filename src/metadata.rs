//! Layered metadata resolution.
//!
//! Pages, sections and the site each carry a free-form `metadata` map. The
//! effective metadata for a task is the layered merge of all three, with the
//! most specific layer winning per key:
//!
//! ```text
//! effective = merge(merge(site, section), page)     // page > section > site
//! ```
//!
//! Keys are never deleted by a child layer, only added or overwritten.

use std::collections::BTreeMap;

/// Free-form string metadata as written in the manifest.
///
/// Ordered so templates that iterate it render deterministically.
pub type Metadata = BTreeMap<String, String>;

/// Merge `child` on top of `parent`: last writer per key wins.
pub fn merge(parent: &Metadata, child: &Metadata) -> Metadata {
    let mut merged = parent.clone();
    merged.extend(child.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Merge any number of layers, least authoritative first.
pub fn merge_layers(layers: &[&Metadata]) -> Metadata {
    layers
        .iter()
        .fold(Metadata::new(), |acc, layer| merge(&acc, layer))
}
