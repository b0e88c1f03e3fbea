//! Eidos: the value and object runtime of a vector-oriented scripting language.
//!
//! This is the library root that exports all modules.
//!
//! # Layers
//!
//! - **Registry**: process-wide interning of property and method names into
//!   stable numeric IDs ([`global`])
//! - **Values**: NULL, logical, integer, float, string and object values, all
//!   of them sequences, shared through refcounted [`Handle`]s ([`value`])
//! - **Objects**: host-provided elements described by reflective class
//!   tables ([`object`])
//! - **Termination**: every runtime error is reported through
//!   [`error::raise`], which either unwinds or ends the process

// Allow some clippy lints that are stylistic and not critical
#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]
#![allow(clippy::len_without_is_empty)]

pub mod compare;
pub mod config;
pub mod error;
pub mod global;
pub mod handle;
pub mod object;
pub mod span;
pub mod value;

pub use compare::{compare_values, values_equal, CompareFn};
pub use config::RuntimeConfig;
pub use error::{raise, EidosError, RuntimeResult, TerminationMode};
pub use global::{global_string_id_for, string_for_global_id, warm_up, GlobalStringId};
pub use handle::{Handle, RefCounted};
pub use object::{ElementRef, ObjectClass, ObjectElement};
pub use span::Span;
pub use value::{concatenate, Value, ValueHandle, ValueKind, ValueMask};
