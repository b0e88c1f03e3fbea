//! Property access, method dispatch and property sorts on object values.

use std::cmp::Ordering;

use super::{concatenate, Cardinal, Repr, Value, ValueHandle, ValueKind, ValueMask};
use crate::compare::compare_function_for_kinds;
use crate::error::{raise, with_blame, EidosError, RuntimeResult};
use crate::global::{ids, GlobalStringId};
use crate::object::{ElementRef, ObjectClass, UNDEFINED_CLASS};
use crate::span::Span;

/// An empty result for a zero-element receiver, typed from the declared mask.
fn empty_value_for(mask: ValueMask, class: Option<&'static ObjectClass>) -> ValueHandle {
    match mask.stripped() {
        ValueMask::LOGICAL => Value::logical_vector(Vec::new()),
        ValueMask::INT => Value::int_vector(Vec::new()),
        ValueMask::FLOAT => Value::float_vector(Vec::new()),
        ValueMask::STRING => Value::string_vector(Vec::new()),
        ValueMask::OBJECT => Value::object_vector_of_class(class.unwrap_or(&UNDEFINED_CLASS)),
        _ => Value::null(),
    }
}

impl Value {
    fn elements_or_raise(
        &self,
        context: &'static str,
        span: Option<Span>,
    ) -> RuntimeResult<(&[ElementRef], &'static ObjectClass)> {
        match &self.repr {
            Repr::Object { elements, class } => Ok((elements.as_slice(), *class)),
            _ => raise(
                EidosError::type_error(
                    context,
                    format!("operand type {} has no properties or methods", self.kind()),
                )
                .with_span(span),
            ),
        }
    }

    /// Reads a property off every element and joins the results.
    ///
    /// Uses the class's accelerated getter when it declares one.
    pub fn get_property_of_elements(
        &self,
        property_id: GlobalStringId,
        span: Option<Span>,
    ) -> RuntimeResult<ValueHandle> {
        const CONTEXT: &str = "Value::get_property_of_elements";
        let (elements, class) = self.elements_or_raise(CONTEXT, span)?;
        let signature = class.signature_for_property_or_raise(property_id, span)?;

        let result = with_blame(span, || match (elements, signature.accelerated_get) {
            ([], _) => Ok(empty_value_for(signature.value_mask, signature.value_class)),
            ([element], None) => element.get_property(property_id),
            (_, Some(getter)) => getter(elements),
            (_, None) => {
                let parts = elements
                    .iter()
                    .map(|element| element.get_property(property_id))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                concatenate(&parts, span)
            }
        })?;

        // The singleton flag is per element; a joined result only keeps the kind
        if elements.len() == 1 {
            signature.check_result(&result, span)?;
        } else {
            signature.check_assigned_value(&result, span)?;
        }
        Ok(result)
    }

    /// Assigns `value` to a property of every element.
    ///
    /// A value of count 1 is broadcast; a value of count N goes one-to-one onto
    /// N elements. Any other count is an error.
    pub fn set_property_of_elements(
        &self,
        property_id: GlobalStringId,
        value: &Value,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        const CONTEXT: &str = "Value::set_property_of_elements";
        let (elements, class) = self.elements_or_raise(CONTEXT, span)?;
        let signature = class.signature_for_property_or_raise(property_id, span)?;

        if signature.read_only {
            return raise(
                EidosError::read_only_property(CONTEXT, class.element_type(), signature.name)
                    .with_span(span),
            );
        }
        signature.check_assigned_value(value, span)?;

        let supplied = value.count();
        if supplied == 1 {
            with_blame(span, || {
                elements
                    .iter()
                    .try_for_each(|element| element.set_property(property_id, value))
            })?;
        } else if supplied == elements.len() {
            for (index, element) in elements.iter().enumerate() {
                let item = value.get_value_at_index(index, span)?;
                with_blame(span, || element.set_property(property_id, &item))?;
            }
        } else {
            return raise(
                EidosError::count_mismatch(CONTEXT, signature.name, elements.len(), supplied)
                    .with_span(span),
            );
        }
        Ok(())
    }

    /// Calls a method on every element and joins the results.
    ///
    /// The universal `size()` and `str()` answer for the whole value; class
    /// methods run once on the class.
    pub fn execute_instance_method_of_elements(
        &self,
        method_id: GlobalStringId,
        args: &[ValueHandle],
        span: Option<Span>,
    ) -> RuntimeResult<ValueHandle> {
        const CONTEXT: &str = "Value::execute_instance_method_of_elements";
        let (elements, class) = self.elements_or_raise(CONTEXT, span)?;
        let signature = class.signature_for_method_or_raise(method_id, span)?;

        if signature.is_class_method {
            return class.execute_class_method(method_id, args, span);
        }
        signature.check_arguments(args, span)?;

        match method_id {
            ids::SIZE => return Ok(Value::int_singleton(elements.len() as i64)),
            ids::STR => return Ok(Value::string_singleton(self.describe(class, span)?)),
            _ => {}
        }

        let result = with_blame(span, || match elements {
            [] => Ok(empty_value_for(signature.return_mask, signature.return_class)),
            [element] => element.execute_instance_method(method_id, args),
            _ => {
                let parts = elements
                    .iter()
                    .map(|element| element.execute_instance_method(method_id, args))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                concatenate(&parts, span)
            }
        })?;
        if elements.len() == 1 {
            signature.check_return(&result, span)?;
        }
        Ok(result)
    }

    /// One line per property with its signature and current value.
    fn describe(&self, class: &'static ObjectClass, span: Option<Span>) -> RuntimeResult<String> {
        let mut lines = vec![format!("{} ({}):", class.element_type(), self.count())];
        for property in class.properties() {
            let value = self.get_property_of_elements(property.id, span)?;
            let mut preview = value.to_string();
            if preview.len() > 60 {
                let cut = (0..=60).rev().find(|&i| preview.is_char_boundary(i)).unwrap_or(0);
                preview.truncate(cut);
                preview.push_str(" ...");
            }
            lines.push(format!("\t{} {}", property, preview));
        }
        Ok(lines.join("\n"))
    }

    /// Reorders the elements by the value of a singleton property.
    ///
    /// The sort is stable; NaN keys go last in either direction.
    pub fn sort_by_property(
        &mut self,
        property_id: GlobalStringId,
        ascending: bool,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        const CONTEXT: &str = "Value::sort_by_property";
        let (elements, class) = self.elements_or_raise(CONTEXT, span)?;
        let signature = class.signature_for_property_or_raise(property_id, span)?;

        let mut keys = Vec::with_capacity(elements.len());
        for element in elements {
            let key = with_blame(span, || element.get_property(property_id))?;
            if key.count() != 1 {
                return raise(
                    EidosError::type_error(
                        CONTEXT,
                        format!(
                            "sorting by property {} requires a singleton value for every element",
                            signature.name
                        ),
                    )
                    .with_span(span),
                );
            }
            keys.push(key);
        }

        let key_kind = match keys.first() {
            Some(key) => key.kind(),
            None => return Ok(()),
        };
        if key_kind == ValueKind::Object || keys.iter().any(|k| k.kind() != key_kind) {
            return raise(
                EidosError::type_error(
                    CONTEXT,
                    format!(
                        "property {} must have one sortable type across all elements",
                        signature.name
                    ),
                )
                .with_span(span),
            );
        }

        let compare = compare_function_for_kinds(key_kind, key_kind);
        let mut order: Vec<usize> = (0..keys.len()).collect();
        let mut failure = None;
        order.sort_by(|&a, &b| {
            let ordering = match compare(&keys[a], 0, &keys[b], 0, span) {
                Ok(ordering) => ordering,
                Err(error) => {
                    failure.get_or_insert(error);
                    return Ordering::Equal;
                }
            };
            let nan_involved = keys[a].float_slice().map_or(false, |x| x[0].is_nan())
                || keys[b].float_slice().map_or(false, |x| x[0].is_nan());
            if ascending || nan_involved {
                ordering
            } else {
                ordering.reverse()
            }
        });
        if let Some(error) = failure {
            return Err(error);
        }

        let sorted: Vec<ElementRef> = order.iter().map(|&i| elements[i].clone()).collect();
        match &mut self.repr {
            Repr::Object {
                elements: Cardinal::Vector(v),
                ..
            } => {
                *v = sorted;
                Ok(())
            }
            _ => self.immutable(CONTEXT, span),
        }
    }
}
