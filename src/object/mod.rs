//! Object elements and their reflective classes.
//!
//! Host types become script-visible by implementing [`ObjectElement`] and
//! declaring a `static` [`ObjectClass`]. Properties and methods are dispatched
//! by [`GlobalStringId`], never by string comparison.

pub mod class;
pub mod signature;
pub mod test_element;

#[cfg(test)]
mod tests;

use std::any::Any;
use std::cell::Cell;
use std::fmt;

use crate::error::{raise, EidosError, RuntimeResult};
use crate::global::{string_for_global_id, GlobalStringId};
use crate::handle::{Handle, RefCounted};
use crate::value::{Value, ValueHandle};

pub use class::{ClassMethodFn, MethodTable, ObjectClass, PropertyTable, UNDEFINED_CLASS};
pub use signature::{AcceleratedGetter, ArgumentSpec, MethodSignature, PropertySignature};
pub use test_element::{TestElement, TEST_ELEMENT_CLASS};

/// Shared reference to an object element.
pub type ElementRef = Handle<dyn ObjectElement>;

/// A host entity visible to scripts as an element of an object value.
///
/// Two ownership regimes are supported. Externally owned elements keep the
/// default no-op `retain`/`release` and are wrapped with
/// [`Handle::from_static`]; the host frees them. Internally owned elements
/// embed an [`InternalRefCount`], are wrapped with [`new_element`] and are
/// destroyed when the last handle goes away.
///
/// Setters take `&self`: elements are shared, so mutable state lives in `Cell`s.
pub trait ObjectElement {
    fn class(&self) -> &'static ObjectClass;

    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class().element_type())
    }

    fn retain(&self) {}

    /// Returns `true` when the element should be destroyed.
    fn release(&self) -> bool {
        false
    }

    fn retain_count(&self) -> u32 {
        0
    }

    fn get_property(&self, property_id: GlobalStringId) -> RuntimeResult<ValueHandle> {
        raise(EidosError::unknown_property(
            "ObjectElement::get_property",
            self.class().element_type(),
            string_for_global_id(property_id),
        ))
    }

    fn set_property(&self, property_id: GlobalStringId, _value: &Value) -> RuntimeResult<()> {
        let class = self.class();
        match class.signature_for_property(property_id) {
            Some(signature) if signature.read_only => raise(EidosError::read_only_property(
                "ObjectElement::set_property",
                class.element_type(),
                signature.name,
            )),
            _ => raise(EidosError::unknown_property(
                "ObjectElement::set_property",
                class.element_type(),
                string_for_global_id(property_id),
            )),
        }
    }

    fn execute_instance_method(
        &self,
        method_id: GlobalStringId,
        _args: &[ValueHandle],
    ) -> RuntimeResult<ValueHandle> {
        raise(EidosError::unknown_method(
            "ObjectElement::execute_instance_method",
            self.class().element_type(),
            string_for_global_id(method_id),
        ))
    }

    fn as_any(&self) -> &dyn Any;
}

impl RefCounted for dyn ObjectElement {
    fn add_ref(&self) {
        self.retain();
    }

    fn release(&self) -> bool {
        ObjectElement::release(self)
    }

    fn ref_count(&self) -> u32 {
        self.retain_count()
    }
}

impl fmt::Display for dyn ObjectElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}

/// Retain count for internally owned elements.
#[derive(Debug, Default)]
pub struct InternalRefCount(Cell<u32>);

impl InternalRefCount {
    pub fn new() -> Self {
        Self(Cell::new(0))
    }

    pub fn retain(&self) {
        self.0.set(self.0.get() + 1);
    }

    /// Returns `true` when the count drops to zero.
    pub fn release(&self) -> bool {
        let remaining = self.0.get().saturating_sub(1);
        self.0.set(remaining);
        remaining == 0
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

/// Wraps an internally owned element in its first handle.
pub fn new_element<E: ObjectElement + 'static>(element: E) -> ElementRef {
    let boxed: Box<dyn ObjectElement> = Box::new(element);
    Handle::from_box(boxed)
}

/// Builds the tables of the classes the runtime itself defines.
pub(crate) fn warm_up_classes() {
    UNDEFINED_CLASS.properties();
    UNDEFINED_CLASS.methods();
    TEST_ELEMENT_CLASS.properties();
    TEST_ELEMENT_CLASS.methods();
}
