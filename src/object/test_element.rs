//! `_TestElement`: a runtime-owned element class used to exercise the object
//! machinery without a host.

use std::any::Any;
use std::cell::Cell;

use super::{
    new_element, ElementRef, InternalRefCount, MethodSignature, ObjectClass, ObjectElement,
    PropertySignature,
};
use crate::error::{raise, EidosError, RuntimeResult};
use crate::global::{ids, string_for_global_id, GlobalStringId};
use crate::value::{Value, ValueHandle, ValueMask};

pub static TEST_ELEMENT_CLASS: ObjectClass =
    ObjectClass::new("_TestElement", test_element_properties, test_element_methods);

fn test_element_properties() -> Vec<PropertySignature> {
    vec![
        PropertySignature::new("_yolk", false, ValueMask::INT | ValueMask::SINGLETON)
            .with_accelerated_get(yolk_of_elements),
        PropertySignature::new("_increment", true, ValueMask::OBJECT | ValueMask::SINGLETON)
            .with_class(&TEST_ELEMENT_CLASS),
    ]
}

fn test_element_methods() -> Vec<MethodSignature> {
    vec![
        MethodSignature::instance("_cubicYolk", ValueMask::INT | ValueMask::SINGLETON),
        MethodSignature::instance("_squareTest", ValueMask::OBJECT | ValueMask::SINGLETON)
            .with_return_class(&TEST_ELEMENT_CLASS),
    ]
}

/// Internally owned element carrying one integer, the yolk.
#[derive(Debug)]
pub struct TestElement {
    refcount: InternalRefCount,
    yolk: Cell<i64>,
}

impl TestElement {
    pub fn new(yolk: i64) -> Self {
        Self {
            refcount: InternalRefCount::new(),
            yolk: Cell::new(yolk),
        }
    }

    /// A new element wrapped in its first handle.
    pub fn new_ref(yolk: i64) -> ElementRef {
        new_element(Self::new(yolk))
    }

    pub fn yolk(&self) -> i64 {
        self.yolk.get()
    }

    fn overflow<T>(&self, method: &str) -> RuntimeResult<T> {
        raise(EidosError::type_error(
            "TestElement::execute_instance_method",
            format!("integer overflow in {}() for yolk {}", method, self.yolk()),
        ))
    }
}

fn yolk_of_elements(elements: &[ElementRef]) -> RuntimeResult<ValueHandle> {
    let mut yolks = Vec::with_capacity(elements.len());
    for element in elements {
        match element.as_any().downcast_ref::<TestElement>() {
            Some(test_element) => yolks.push(test_element.yolk()),
            None => {
                return raise(EidosError::type_error(
                    "TestElement::yolk_of_elements",
                    format!("expected _TestElement, got {}", element.class().element_type()),
                ))
            }
        }
    }
    Ok(Value::int_vector(yolks))
}

impl ObjectElement for TestElement {
    fn class(&self) -> &'static ObjectClass {
        &TEST_ELEMENT_CLASS
    }

    fn retain(&self) {
        self.refcount.retain();
    }

    fn release(&self) -> bool {
        self.refcount.release()
    }

    fn retain_count(&self) -> u32 {
        self.refcount.get()
    }

    fn get_property(&self, property_id: GlobalStringId) -> RuntimeResult<ValueHandle> {
        match property_id {
            ids::YOLK => Ok(Value::int_singleton(self.yolk())),
            ids::INCREMENT => {
                let next = self.yolk().wrapping_add(1);
                Ok(Value::object_singleton(TestElement::new_ref(next)))
            }
            _ => raise(EidosError::unknown_property(
                "TestElement::get_property",
                TEST_ELEMENT_CLASS.element_type(),
                string_for_global_id(property_id),
            )),
        }
    }

    fn set_property(&self, property_id: GlobalStringId, value: &Value) -> RuntimeResult<()> {
        const CONTEXT: &str = "TestElement::set_property";
        match property_id {
            ids::YOLK => {
                self.yolk.set(value.int_at(0, None)?);
                Ok(())
            }
            ids::INCREMENT => raise(EidosError::read_only_property(
                CONTEXT,
                TEST_ELEMENT_CLASS.element_type(),
                "_increment",
            )),
            _ => raise(EidosError::unknown_property(
                CONTEXT,
                TEST_ELEMENT_CLASS.element_type(),
                string_for_global_id(property_id),
            )),
        }
    }

    fn execute_instance_method(
        &self,
        method_id: GlobalStringId,
        _args: &[ValueHandle],
    ) -> RuntimeResult<ValueHandle> {
        match method_id {
            ids::CUBIC_YOLK => match self.yolk().checked_pow(3) {
                Some(cubed) => Ok(Value::int_singleton(cubed)),
                None => self.overflow("_cubicYolk"),
            },
            ids::SQUARE_TEST => match self.yolk().checked_mul(self.yolk()) {
                Some(squared) => Ok(Value::object_singleton(TestElement::new_ref(squared))),
                None => self.overflow("_squareTest"),
            },
            _ => raise(EidosError::unknown_method(
                "TestElement::execute_instance_method",
                TEST_ELEMENT_CLASS.element_type(),
                string_for_global_id(method_id),
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
