//! The data context shared by every node of an instance.

use crate::keypath::Keypath;
use crate::value::Value;

/// Root data object. Reads walk keypath segments; writes create
/// intermediate objects as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContext {
    root: Value,
}

impl DataContext {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, keypath: &Keypath) -> Option<&Value> {
        keypath
            .segments()
            .try_fold(&self.root, |value, key| value.child(key))
    }

    pub fn has(&self, keypath: &Keypath) -> bool {
        self.get(keypath).is_some()
    }

    /// Write `value` at `keypath`. Returns `false` when the path runs
    /// through a scalar or an out-of-range list index.
    pub fn set(&mut self, keypath: &Keypath, value: Value) -> bool {
        let mut slot = &mut self.root;
        for key in keypath.segments() {
            match slot.child_mut_or_insert(key) {
                Some(child) => slot = child,
                None => return false,
            }
        }
        *slot = value;
        true
    }
}

impl Default for DataContext {
    fn default() -> Self {
        Self::new(Value::object(std::iter::empty::<(String, Value)>()))
    }
}
