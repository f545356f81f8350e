//! Boon Partial: dynamic includes for the reactive template renderer
//!
//! An include node renders another template at its position. The target is
//! either a fixed template name or the string form of a bound data value;
//! when that value changes the node swaps its content through a pending
//! update that the runloop flushes once per batch.

pub mod binding;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod dom;
pub mod fragment;
pub mod indent;
pub mod instance;
pub mod keypath;
pub mod partial;
pub mod registry;
pub mod root;
pub mod runloop;
pub mod template;
pub mod value;

pub use binding::{Binding, BindingState, ReferenceResolver, ScopeResolver};
pub use config::Config;
pub use context::DataContext;
pub use diagnostics::{Diagnostics, IncludeWarning};
pub use dom::{Dom, DomNodeKind, NodeId};
pub use fragment::{Fragment, FragmentOptions, FragmentOwner, Item};
pub use instance::{Batch, Instance};
pub use keypath::Keypath;
pub use partial::{LiveTarget, PartialNode, Resolution, SwapState, ValueChange};
pub use registry::{TemplateLookup, TemplateRegistry};
pub use root::Root;
pub use runloop::{PartialId, PendingUpdate, Runloop};
pub use template::{IncludeDirective, Template, TemplateItem};
pub use value::Value;
