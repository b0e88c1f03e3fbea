//! Global string registry: interns property, method and keyword names into
//! small integer IDs so dispatch compares integers instead of strings.
//!
//! Strings are leaked to get a `'static` lifetime; the registry only grows.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use ahash::AHashMap;
use indexmap::IndexMap;
use lazy_static::lazy_static;

use super::ids::{LAST_CONTEXT_ENTRY, LAST_ENTRY, RESERVED};
use crate::error::{raise, EidosError, RuntimeResult};

lazy_static! {
    /// Process-wide registry, pre-populated with every reserved name.
    static ref STRING_REGISTRY: RwLock<StringRegistry> = RwLock::new(StringRegistry::with_reserved());
}

/// A registered name. Comparison and hashing are plain integer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalStringId(pub u32);

impl fmt::Display for GlobalStringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalStringId({})", self.0)
    }
}

#[derive(Debug)]
pub struct StringRegistry {
    ids: IndexMap<&'static str, GlobalStringId, ahash::RandomState>,
    strings: AHashMap<GlobalStringId, &'static str>,
    next_dynamic: u32,
}

impl StringRegistry {
    fn empty() -> Self {
        Self {
            ids: IndexMap::default(),
            strings: AHashMap::new(),
            next_dynamic: LAST_CONTEXT_ENTRY.0,
        }
    }

    fn with_reserved() -> Self {
        let mut registry = Self::empty();
        for &(id, text) in RESERVED {
            registry.insert(text, id);
        }
        registry
    }

    fn insert(&mut self, text: &str, id: GlobalStringId) {
        let leaked: &'static str = Box::leak(text.to_string().into_boxed_str());
        self.ids.insert(leaked, id);
        self.strings.insert(id, leaked);
    }

    /// Returns the ID for `text`, assigning the next on-demand ID if needed.
    pub fn intern(&mut self, text: &str) -> GlobalStringId {
        if let Some(&id) = self.ids.get(text) {
            return id;
        }
        let id = GlobalStringId(self.next_dynamic);
        self.next_dynamic += 1;
        self.insert(text, id);
        tracing::trace!(id = id.0, name = text, "registered global string");
        id
    }

    /// Binds `text` to a host-chosen `id`.
    pub fn register(&mut self, text: &str, id: GlobalStringId) -> RuntimeResult<()> {
        const CONTEXT: &str = "register_string_for_global_id";

        if id < LAST_ENTRY || id >= LAST_CONTEXT_ENTRY {
            return raise(EidosError::contract(
                CONTEXT,
                format!(
                    "ID {} for string '{}' is outside the host range [{}, {})",
                    id.0, text, LAST_ENTRY.0, LAST_CONTEXT_ENTRY.0
                ),
            ));
        }
        match (self.ids.get(text).copied(), self.strings.get(&id).copied()) {
            (Some(existing), _) if existing == id => Ok(()),
            (Some(existing), _) => raise(EidosError::contract(
                CONTEXT,
                format!(
                    "string '{}' is already registered with ID {}, cannot register it with ID {}",
                    text, existing.0, id.0
                ),
            )),
            (None, Some(other)) => raise(EidosError::contract(
                CONTEXT,
                format!(
                    "ID {} is already registered for string '{}', cannot register it for '{}'",
                    id.0, other, text
                ),
            )),
            (None, None) => {
                self.insert(text, id);
                tracing::trace!(id = id.0, name = text, "registered host string");
                Ok(())
            }
        }
    }

    pub fn lookup(&self, text: &str) -> Option<GlobalStringId> {
        self.ids.get(text).copied()
    }

    pub fn get(&self, id: GlobalStringId) -> Option<&'static str> {
        self.strings.get(&id).copied()
    }

    /// Registered strings in registration order.
    pub fn names(&self) -> impl Iterator<Item = (&'static str, GlobalStringId)> + '_ {
        self.ids.iter().map(|(&text, &id)| (text, id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Returns the ID for `text`, interning it on first use.
pub fn global_string_id_for(text: &str) -> GlobalStringId {
    // Read lock covers the common case of an already-registered name
    if let Some(id) = STRING_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .lookup(text)
    {
        return id;
    }
    STRING_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .intern(text)
}

/// Registers `text` under a fixed host ID in `[LAST_ENTRY, LAST_CONTEXT_ENTRY)`.
///
/// Registering the same pair twice is accepted; any conflicting pairing raises.
pub fn register_string_for_global_id(text: &str, id: GlobalStringId) -> RuntimeResult<()> {
    STRING_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(text, id)
}

/// The name registered for `id`.
///
/// # Panics
///
/// Panics if `id` was never registered; IDs come from constants or from
/// [`global_string_id_for`], never from arbitrary integers.
pub fn string_for_global_id(id: GlobalStringId) -> &'static str {
    match try_string_for_global_id(id) {
        Some(text) => text,
        None => panic!("string_for_global_id: no string registered for {}", id),
    }
}

pub fn try_string_for_global_id(id: GlobalStringId) -> Option<&'static str> {
    STRING_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
}

pub fn lookup_global_string_id(text: &str) -> Option<GlobalStringId> {
    STRING_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .lookup(text)
}

pub fn registered_string_count() -> usize {
    STRING_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}
