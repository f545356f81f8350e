//! Dotted data paths (`user.address.city`, `items.0.label`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Path from the data root to a value. The empty keypath is the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keypath(Arc<str>);

impl Keypath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(path: impl AsRef<str>) -> Self {
        Self(path.as_ref().trim_matches('.').into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    pub fn join(&self, reference: &str) -> Self {
        let reference = reference.trim_matches('.');
        if self.is_root() {
            Self::new(reference)
        } else if reference.is_empty() {
            self.clone()
        } else {
            Self(format!("{}.{}", self.0, reference).into())
        }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rfind('.') {
            Some(pos) => Self(self.0[..pos].into()),
            None => Self::root(),
        })
    }

    /// `true` when `self` equals `other` or lies underneath it.
    pub fn starts_with(&self, other: &Keypath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0
            || (self.0.starts_with(other.as_str())
                && self.0.as_bytes().get(other.0.len()) == Some(&b'.'))
    }

    /// `true` when a write at `changed` can affect the value at `self`:
    /// one path is a prefix of the other.
    pub fn overlaps(&self, changed: &Keypath) -> bool {
        self.starts_with(changed) || changed.starts_with(self)
    }

    /// Re-point the `old` prefix of this keypath at `new`.
    /// Returns `None` when the keypath does not live under `old`.
    pub fn replace_prefix(&self, old: &Keypath, new: &Keypath) -> Option<Self> {
        if !self.starts_with(old) {
            return None;
        }
        let rest = self.0[old.0.len()..].trim_start_matches('.');
        Some(new.join(rest))
    }
}

impl fmt::Display for Keypath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Keypath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
