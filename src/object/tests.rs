//! Object model tests: property reads and writes across element vectors,
//! method dispatch, sorting by property and both ownership regimes.

use std::any::Any;
use std::cell::Cell;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::{clear_raise_message, last_error_position, set_current_script, EidosError};
use crate::global::{global_string_id_for, ids};
use crate::span::Span;
use crate::value::{concatenate, Value, ValueKind, ValueMask};

// ============================================================================
// A host-style class with externally owned elements
// ============================================================================

static TAGGED_CLASS: ObjectClass = ObjectClass::new("Tagged", tagged_properties, tagged_methods);

fn tagged_properties() -> Vec<PropertySignature> {
    vec![
        PropertySignature::new("id", true, ValueMask::INT | ValueMask::SINGLETON),
        PropertySignature::new("tag", false, ValueMask::INT | ValueMask::SINGLETON)
            .with_accelerated_get(tags_of_elements),
        PropertySignature::new("label", false, ValueMask::STRING | ValueMask::SINGLETON),
    ]
}

fn tagged_methods() -> Vec<MethodSignature> {
    vec![MethodSignature::instance("doubledId", ValueMask::INT | ValueMask::SINGLETON)]
}

struct Tagged {
    id: i64,
    tag: Cell<i64>,
    label: std::cell::RefCell<String>,
}

fn tags_of_elements(elements: &[ElementRef]) -> RuntimeResult<ValueHandle> {
    let tags = elements
        .iter()
        .map(|e| match e.as_any().downcast_ref::<Tagged>() {
            Some(tagged) => tagged.tag.get(),
            None => i64::MIN,
        })
        .collect();
    Ok(Value::int_vector(tags))
}

impl ObjectElement for Tagged {
    fn class(&self) -> &'static ObjectClass {
        &TAGGED_CLASS
    }

    fn get_property(&self, property_id: GlobalStringId) -> RuntimeResult<ValueHandle> {
        if property_id == global_string_id_for("id") {
            Ok(Value::int_singleton(self.id))
        } else if property_id == global_string_id_for("tag") {
            Ok(Value::int_singleton(self.tag.get()))
        } else if property_id == global_string_id_for("label") {
            Ok(Value::string_singleton(self.label.borrow().clone()))
        } else {
            raise(EidosError::unknown_property(
                "Tagged::get_property",
                "Tagged",
                string_for_global_id(property_id),
            ))
        }
    }

    fn set_property(&self, property_id: GlobalStringId, value: &Value) -> RuntimeResult<()> {
        if property_id == global_string_id_for("tag") {
            self.tag.set(value.int_at(0, None)?);
            Ok(())
        } else if property_id == global_string_id_for("label") {
            *self.label.borrow_mut() = value.string_at(0, None)?;
            Ok(())
        } else {
            raise(EidosError::unknown_property(
                "Tagged::set_property",
                "Tagged",
                string_for_global_id(property_id),
            ))
        }
    }

    fn execute_instance_method(
        &self,
        method_id: GlobalStringId,
        _args: &[ValueHandle],
    ) -> RuntimeResult<ValueHandle> {
        if method_id == global_string_id_for("doubledId") {
            Ok(Value::int_singleton(self.id * 2))
        } else {
            raise(EidosError::unknown_method(
                "Tagged::execute_instance_method",
                "Tagged",
                string_for_global_id(method_id),
            ))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Externally owned: the element is leaked, so the host "owns" it forever.
fn tagged(id: i64) -> ElementRef {
    let leaked: &'static dyn ObjectElement = Box::leak(Box::new(Tagged {
        id,
        tag: Cell::new(0),
        label: std::cell::RefCell::new(String::new()),
    }));
    Handle::from_static(leaked)
}

fn tagged_vector(ids: &[i64]) -> ValueHandle {
    if ids.is_empty() {
        return Value::object_vector_of_class(&TAGGED_CLASS);
    }
    Value::object_vector(ids.iter().map(|&id| tagged(id)).collect()).unwrap()
}

fn id() -> GlobalStringId {
    global_string_id_for("id")
}

fn tag() -> GlobalStringId {
    global_string_id_for("tag")
}

// ============================================================================
// Property reads
// ============================================================================

#[test]
fn test_get_property_sort_descending_and_reread() {
    let mut value = tagged_vector(&[10, 20, 30]);

    let ids = value.get_property_of_elements(id(), None).unwrap();
    assert_eq!(ids.kind(), ValueKind::Int);
    assert_eq!(ids.int_slice().unwrap(), &[10, 20, 30]);

    Handle::get_mut(&mut value)
        .unwrap()
        .sort_by_property(id(), false, None)
        .unwrap();

    let ids = value.get_property_of_elements(id(), None).unwrap();
    assert_eq!(ids.int_slice().unwrap(), &[30, 20, 10]);
    assert_eq!(ids.to_string(), "30 20 10");
}

#[test]
fn test_sort_by_property_is_stable() {
    let mut value = tagged_vector(&[1, 2, 3, 4]);
    value
        .set_property_of_elements(tag(), &Value::int_vector(vec![5, 1, 5, 1]), None)
        .unwrap();

    Handle::get_mut(&mut value)
        .unwrap()
        .sort_by_property(tag(), true, None)
        .unwrap();
    let ids = value.get_property_of_elements(id(), None).unwrap();
    assert_eq!(ids.int_slice().unwrap(), &[2, 4, 1, 3]);
}

#[test]
fn test_sort_singleton_by_property_fails() {
    let mut value = Value::object_singleton(tagged(1));
    let result = Handle::get_mut(&mut value)
        .unwrap()
        .sort_by_property(id(), true, None);
    assert!(matches!(result, Err(EidosError::Immutable { .. })));
}

#[test]
fn test_accelerated_getter_matches_per_element_reads() {
    for n in [0_usize, 1, 5] {
        let value = tagged_vector(&(0..n as i64).collect::<Vec<_>>());
        if n > 0 {
            let tags: Vec<i64> = (0..n as i64).map(|i| i * 7 - 3).collect();
            let tags = if n == 1 {
                Value::int_singleton(tags[0])
            } else {
                Value::int_vector(tags)
            };
            value.set_property_of_elements(tag(), &tags, None).unwrap();
        }

        let elements = value.object_elements().unwrap();
        let getter = TAGGED_CLASS
            .signature_for_property(tag())
            .and_then(|p| p.accelerated_get)
            .unwrap();
        let fast = getter(elements).unwrap();

        let per_element: Vec<ValueHandle> = elements
            .iter()
            .map(|e| e.get_property(tag()).unwrap())
            .collect();
        let slow = if n == 0 {
            Value::int_vector(Vec::new())
        } else {
            concatenate(&per_element, None).unwrap()
        };

        assert_eq!(fast.kind(), slow.kind());
        assert_eq!(fast.int_slice(), slow.int_slice());

        let through_value = value.get_property_of_elements(tag(), None).unwrap();
        assert_eq!(through_value.int_slice(), fast.int_slice());
        assert_eq!(through_value.to_string(), slow.to_string());
    }
}

#[test]
fn test_empty_vector_reads_typed_empty_result() {
    let value = Value::object_vector_of_class(&TAGGED_CLASS);
    let labels = value
        .get_property_of_elements(global_string_id_for("label"), None)
        .unwrap();
    assert_eq!(labels.to_string(), "string(0)");
}

#[test]
fn test_unknown_property() {
    let value = tagged_vector(&[1]);
    let err = value
        .get_property_of_elements(global_string_id_for("fitness"), None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "property fitness is not defined for object element type Tagged"
    );
}

#[test]
fn test_non_object_has_no_properties() {
    let value = Value::int_vector(vec![1, 2]);
    assert!(value.get_property_of_elements(id(), None).is_err());
}

// ============================================================================
// Property writes
// ============================================================================

#[test]
fn test_set_property_broadcast_and_one_to_one() {
    let value = tagged_vector(&[1, 2, 3]);

    value
        .set_property_of_elements(tag(), &Value::int_singleton(9), None)
        .unwrap();
    assert_eq!(
        value.get_property_of_elements(tag(), None).unwrap().to_string(),
        "9 9 9"
    );

    value
        .set_property_of_elements(tag(), &Value::int_vector(vec![4, 5, 6]), None)
        .unwrap();
    assert_eq!(
        value.get_property_of_elements(tag(), None).unwrap().to_string(),
        "4 5 6"
    );
}

#[test]
fn test_set_property_count_mismatch() {
    let value = tagged_vector(&[1, 2, 3, 4, 5]);
    let err = value
        .set_property_of_elements(tag(), &Value::int_vector(vec![1, 2]), None)
        .unwrap_err();

    assert!(matches!(
        err,
        EidosError::CountMismatch {
            expected: 5,
            got: 2,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "assignment to property tag requires a value of size 1 or 5, but got size 2"
    );
}

#[test]
fn test_set_read_only_property_names_it() {
    let value = tagged_vector(&[1, 2]);
    let err = value
        .set_property_of_elements(id(), &Value::int_singleton(3), None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "attempt to set read-only property id of object element type Tagged"
    );
}

#[test]
fn test_set_property_wrong_kind() {
    let value = tagged_vector(&[1, 2]);
    let result = value.set_property_of_elements(tag(), &Value::string_singleton("x"), None);
    assert!(matches!(result, Err(EidosError::Type { .. })));
}

#[test]
fn test_default_setter_reports_read_only() {
    // Relies on the trait's default set_property
    struct Bare;
    fn bare_properties() -> Vec<PropertySignature> {
        vec![PropertySignature::new("fixed", true, ValueMask::INT)]
    }
    static BARE_CLASS: ObjectClass = ObjectClass::new("Bare", bare_properties, Vec::new);
    impl ObjectElement for Bare {
        fn class(&self) -> &'static ObjectClass {
            &BARE_CLASS
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    let fixed = global_string_id_for("fixed");
    assert!(matches!(
        Bare.set_property(fixed, &Value::int_singleton(1)),
        Err(EidosError::ReadOnlyProperty { .. })
    ));
    assert!(matches!(
        Bare.get_property(fixed),
        Err(EidosError::UnknownProperty { .. })
    ));
    assert!(matches!(
        Bare.execute_instance_method(ids::CUBIC_YOLK, &[]),
        Err(EidosError::UnknownMethod { .. })
    ));
}

// ============================================================================
// Methods
// ============================================================================

#[test]
fn test_instance_method_concatenates() {
    let value = Value::object_vector(vec![
        TestElement::new_ref(1),
        TestElement::new_ref(2),
        TestElement::new_ref(3),
    ])
    .unwrap();

    let cubes = value
        .execute_instance_method_of_elements(ids::CUBIC_YOLK, &[], None)
        .unwrap();
    assert_eq!(cubes.to_string(), "1 8 27");

    let squares = value
        .execute_instance_method_of_elements(ids::SQUARE_TEST, &[], None)
        .unwrap();
    assert_eq!(squares.count(), 3);
    assert_eq!(
        squares
            .get_property_of_elements(ids::YOLK, None)
            .unwrap()
            .to_string(),
        "1 4 9"
    );
}

#[test]
fn test_universal_methods() {
    let value = tagged_vector(&[10, 20]);

    let size = value
        .execute_instance_method_of_elements(ids::SIZE, &[], None)
        .unwrap();
    assert_eq!(size.int_at(0, None).unwrap(), 2);

    let summary = value
        .execute_instance_method_of_elements(ids::STR, &[], None)
        .unwrap()
        .string_at(0, None)
        .unwrap();
    assert_eq!(
        summary,
        "Tagged (2):\n\tid => (integer$) 10 20\n\tlabel <-> (string$) \"\" \"\"\n\ttag <-> (integer$) 0 0"
    );

    let methods = value
        .execute_instance_method_of_elements(ids::METHOD, &[Value::string_singleton("doubledId")], None)
        .unwrap();
    assert_eq!(methods.to_string(), "\"- (integer$)doubledId(void)\"");
}

#[test]
fn test_method_argument_count() {
    let value = tagged_vector(&[1]);
    let err = value
        .execute_instance_method_of_elements(
            global_string_id_for("doubledId"),
            &[Value::int_singleton(1)],
            None,
        )
        .unwrap_err();
    assert!(matches!(err, EidosError::ArgumentCount { got: 1, .. }));
}

#[test]
fn test_unknown_method() {
    let value = tagged_vector(&[1]);
    let err = value
        .execute_instance_method_of_elements(ids::CUBIC_YOLK, &[], None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "method _cubicYolk is not defined on object element type Tagged"
    );
}

// ============================================================================
// Classes and ownership
// ============================================================================

#[test]
fn test_object_vector_rejects_mixed_classes() {
    assert!(Value::object_vector(vec![tagged(1), TestElement::new_ref(1)]).is_err());

    let mut value = Value::object_vector(Vec::new()).unwrap();
    assert_eq!(value.element_type(), "undefined");
    let vector = Handle::get_mut(&mut value).unwrap();
    vector.push_object(tagged(1)).unwrap();
    assert_eq!(vector.element_type(), "Tagged");
    assert!(vector.push_object(TestElement::new_ref(2)).is_err());
}

thread_local! {
    static EPHEMERAL_DROPS: Cell<u32> = const { Cell::new(0) };
}

struct Ephemeral {
    refcount: InternalRefCount,
}

impl Drop for Ephemeral {
    fn drop(&mut self) {
        EPHEMERAL_DROPS.with(|d| d.set(d.get() + 1));
    }
}

impl ObjectElement for Ephemeral {
    fn class(&self) -> &'static ObjectClass {
        &UNDEFINED_CLASS
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

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_internally_owned_element_destroyed_once() {
    let before = EPHEMERAL_DROPS.with(Cell::get);
    let element = new_element(Ephemeral {
        refcount: InternalRefCount::new(),
    });

    let value = Value::object_vector(vec![element.clone(), element.clone(), element]).unwrap();
    let copy = value.copy_values();
    assert_eq!(
        Handle::use_count(&value.object_at(0, None).unwrap()),
        7 // three in each value plus the temporary
    );

    drop(value);
    assert_eq!(EPHEMERAL_DROPS.with(Cell::get), before);
    drop(copy);
    assert_eq!(EPHEMERAL_DROPS.with(Cell::get), before + 1);
}

#[test]
fn test_externally_owned_element_is_not_counted() {
    let element = tagged(5);
    let copy = element.clone();
    assert_eq!(Handle::use_count(&copy), 0);
    assert!(Handle::ptr_eq(&element, &copy));
}

// ============================================================================
// Error locations
// ============================================================================

/// Runs `f` against a registered script and returns the recorded `(start, end, line)`.
fn recorded_position(f: impl FnOnce()) -> Option<(usize, usize, usize)> {
    clear_raise_message();
    set_current_script(Some("x.nosuch;\nx.id = 3;\nx._cubicYolk();"));
    f();
    set_current_script(None);
    last_error_position().map(|p| (p.start, p.end, p.line))
}

#[test]
fn test_unknown_property_read_records_span() {
    let value = tagged_vector(&[1, 2]);
    let span = Span::new(2, 8, 1, 3);
    let position = recorded_position(|| {
        let err = value
            .get_property_of_elements(global_string_id_for("nosuch"), Some(span))
            .unwrap_err();
        assert_eq!(err.span(), Some(span));
    });
    assert_eq!(position, Some((2, 8, 1)));
}

#[test]
fn test_read_only_write_records_span() {
    let value = tagged_vector(&[1, 2]);
    let span = Span::new(12, 14, 2, 3);
    let position = recorded_position(|| {
        assert!(value
            .set_property_of_elements(id(), &Value::int_singleton(3), Some(span))
            .is_err());
    });
    assert_eq!(position, Some((12, 14, 2)));
}

#[test]
fn test_wrong_kind_write_records_span() {
    let value = tagged_vector(&[1, 2]);
    let span = Span::new(12, 14, 2, 3);
    let position = recorded_position(|| {
        assert!(value
            .set_property_of_elements(tag(), &Value::string_singleton("x"), Some(span))
            .is_err());
    });
    assert_eq!(position, Some((12, 14, 2)));
}

#[test]
fn test_element_raise_is_blamed_on_call_site() {
    let value = Value::object_vector(vec![TestElement::new_ref(2), TestElement::new_ref(i64::MAX / 2)])
        .unwrap();
    let span = Span::new(22, 34, 3, 3);
    let position = recorded_position(|| {
        let err = value
            .execute_instance_method_of_elements(ids::CUBIC_YOLK, &[], Some(span))
            .unwrap_err();
        assert_eq!(err.span(), Some(span));
    });
    assert_eq!(position, Some((22, 34, 3)));
}

#[test]
fn test_unknown_method_records_span() {
    let value = tagged_vector(&[1]);
    let span = Span::new(2, 8, 1, 3);
    let position = recorded_position(|| {
        assert!(value
            .execute_instance_method_of_elements(global_string_id_for("nosuch"), &[], Some(span))
            .is_err());
    });
    assert_eq!(position, Some((2, 8, 1)));
}
