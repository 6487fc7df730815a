//! Injected action pin table.
//!
//! The embedder supplies the table of known-good action pins (slug →
//! commit SHA + the tag it was resolved from). The compiler never talks to
//! a registry; an action it cannot pin compatibly renders as a floating
//! reference plus a warning on the compile result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actions::versions::is_compatible;

/// A pinned, immutable reference to a reusable action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPin {
    pub slug: String,
    /// Tag the SHA was resolved from, e.g. `v5`.
    pub version: String,
    pub sha: String,
}

impl ActionPin {
    pub fn new(slug: impl Into<String>, version: impl Into<String>, sha: impl Into<String>) -> Self {
        ActionPin {
            slug: slug.into(),
            version: version.into(),
            sha: sha.into(),
        }
    }

    /// Immutable `uses:` reference with the human-readable tag comment.
    pub fn uses_ref(&self) -> String {
        format!("{}@{} # {}", self.slug, self.sha, self.version)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionPins {
    pins: BTreeMap<String, ActionPin>,
}

impl ActionPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pin: ActionPin) {
        self.pins.insert(pin.slug.clone(), pin);
    }

    pub fn with(mut self, slug: &str, version: &str, sha: &str) -> Self {
        self.insert(ActionPin::new(slug, version, sha));
        self
    }

    pub fn lookup(&self, slug: &str) -> Option<&ActionPin> {
        self.pins.get(slug)
    }

    /// Resolve a `uses:` reference. A pin whose major version matches the
    /// requested one renders immutable (`slug@sha # tag`); anything else
    /// renders floating at the requested version and appends a warning.
    pub fn resolve(&self, slug: &str, requested: &str, warnings: &mut Vec<String>) -> String {
        match self.lookup(slug) {
            Some(pin) if is_compatible(&pin.version, requested) => pin.uses_ref(),
            Some(pin) => {
                warnings.push(format!(
                    "action '{}' requested at '{}' but pinned at '{}'; emitting floating reference",
                    slug, requested, pin.version
                ));
                format!("{}@{}", slug, requested)
            }
            None => {
                warnings.push(format!(
                    "action '{}' has no recorded pin; emitting floating reference",
                    slug
                ));
                format!("{}@{}", slug, requested)
            }
        }
    }

    /// Built-in table for embedders that do not supply their own.
    pub fn defaults() -> Self {
        ActionPins::new()
            .with(
                "actions/checkout",
                "v5",
                "08c6903cd8c0fde910a37f88322edcfb5dd907a8",
            )
            .with(
                "actions/github-script",
                "v7",
                "60a0d83039c74a4aee543508d2ffcb1c3799cdea",
            )
            .with(
                "actions/upload-artifact",
                "v4",
                "ea165f8d65b6e75b540449e92b4886f43607fa02",
            )
    }
}
