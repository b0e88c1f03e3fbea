//! Property and method signatures declared by object classes.

use std::fmt;

use super::{ElementRef, ObjectClass};
use crate::error::{raise, EidosError, RuntimeResult};
use crate::global::{global_string_id_for, GlobalStringId};
use crate::span::Span;
use crate::value::{Value, ValueHandle, ValueKind, ValueMask};

/// Batch property read over many elements of one class.
///
/// Must produce exactly what concatenating one `get_property` call per element
/// would produce.
pub type AcceleratedGetter = fn(&[ElementRef]) -> RuntimeResult<ValueHandle>;

fn check_value_against_mask(
    context: &'static str,
    what: &dyn fmt::Display,
    mask: ValueMask,
    class: Option<&'static ObjectClass>,
    value: &Value,
    span: Option<Span>,
) -> RuntimeResult<()> {
    let kind = value.kind();
    if !mask.accepts_kind(kind) {
        return raise(EidosError::type_error(
            context,
            format!("{} requires a value of type {}, but got {}", what, mask, kind),
        )
        .with_span(span));
    }
    if mask.is_singleton() && kind != ValueKind::Null && value.count() != 1 {
        return raise(EidosError::type_error(
            context,
            format!(
                "{} requires a singleton value, but got a value of size {}",
                what,
                value.count()
            ),
        )
        .with_span(span));
    }
    if let (Some(expected), Some(actual)) = (class, value.object_class()) {
        if value.count() > 0 && !std::ptr::eq(expected, actual) {
            return raise(EidosError::type_error(
                context,
                format!(
                    "{} requires object elements of type {}, but got {}",
                    what,
                    expected.element_type(),
                    actual.element_type()
                ),
            )
            .with_span(span));
        }
    }
    Ok(())
}

/// One property of an object class.
#[derive(Debug, Clone)]
pub struct PropertySignature {
    pub name: &'static str,
    pub id: GlobalStringId,
    pub read_only: bool,
    pub value_mask: ValueMask,
    pub value_class: Option<&'static ObjectClass>,
    pub accelerated_get: Option<AcceleratedGetter>,
}

impl PropertySignature {
    /// Declares a property; its ID comes from the global string registry.
    pub fn new(name: &'static str, read_only: bool, value_mask: ValueMask) -> Self {
        Self {
            name,
            id: global_string_id_for(name),
            read_only,
            value_mask,
            value_class: None,
            accelerated_get: None,
        }
    }

    pub fn with_class(mut self, class: &'static ObjectClass) -> Self {
        self.value_class = Some(class);
        self
    }

    pub fn with_accelerated_get(mut self, getter: AcceleratedGetter) -> Self {
        self.accelerated_get = Some(getter);
        self
    }

    /// Validates a value produced by a getter against the declared type.
    pub fn check_result(&self, value: &Value, span: Option<Span>) -> RuntimeResult<()> {
        let what = format!("property {}", self.name);
        check_value_against_mask(
            "PropertySignature::check_result",
            &what,
            self.value_mask,
            self.value_class,
            value,
            span,
        )
    }

    /// Validates a value about to be assigned. The singleton flag applies per element,
    /// so only the kind and class are checked here.
    pub fn check_assigned_value(&self, value: &Value, span: Option<Span>) -> RuntimeResult<()> {
        let what = format!("property {}", self.name);
        let mask = ValueMask(self.value_mask.0 & !ValueMask::SINGLETON.0);
        check_value_against_mask(
            "PropertySignature::check_assigned_value",
            &what,
            mask,
            self.value_class,
            value,
            span,
        )
    }
}

impl fmt::Display for PropertySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.read_only { "=>" } else { "<->" };
        write!(f, "{} {} ({}", self.name, arrow, self.value_mask)?;
        if let Some(class) = self.value_class {
            write!(f, "<{}>", class.element_type())?;
        }
        f.write_str(")")
    }
}

/// One argument of a method signature.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub mask: ValueMask,
    pub class: Option<&'static ObjectClass>,
}

impl ArgumentSpec {
    pub fn new(name: &'static str, mask: ValueMask) -> Self {
        Self {
            name,
            mask,
            class: None,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.mask.is_optional()
    }
}

/// One method of an object class.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub name: &'static str,
    pub id: GlobalStringId,
    pub is_class_method: bool,
    pub return_mask: ValueMask,
    pub return_class: Option<&'static ObjectClass>,
    pub arguments: Vec<ArgumentSpec>,
}

impl MethodSignature {
    pub fn instance(name: &'static str, return_mask: ValueMask) -> Self {
        Self {
            name,
            id: global_string_id_for(name),
            is_class_method: false,
            return_mask,
            return_class: None,
            arguments: Vec::new(),
        }
    }

    pub fn class_method(name: &'static str, return_mask: ValueMask) -> Self {
        Self {
            is_class_method: true,
            ..Self::instance(name, return_mask)
        }
    }

    pub fn with_return_class(mut self, class: &'static ObjectClass) -> Self {
        self.return_class = Some(class);
        self
    }

    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    fn required_count(&self) -> usize {
        self.arguments.iter().filter(|a| !a.is_optional()).count()
    }

    /// Validates argument count and argument types.
    pub fn check_arguments(&self, args: &[ValueHandle], span: Option<Span>) -> RuntimeResult<()> {
        let required = self.required_count();
        let total = self.arguments.len();
        if args.len() < required || args.len() > total {
            let expected = if required == total {
                total.to_string()
            } else {
                format!("{} to {}", required, total)
            };
            return raise(EidosError::argument_count(
                "MethodSignature::check_arguments",
                format!("{}()", self.name),
                expected,
                args.len(),
            )
            .with_span(span));
        }
        for (spec, arg) in self.arguments.iter().zip(args) {
            let what = format!("argument {} of method {}()", spec.name, self.name);
            check_value_against_mask(
                "MethodSignature::check_arguments",
                &what,
                spec.mask,
                spec.class,
                arg,
                span,
            )?;
        }
        Ok(())
    }

    pub fn check_return(&self, value: &Value, span: Option<Span>) -> RuntimeResult<()> {
        let what = format!("return value of method {}()", self.name);
        check_value_against_mask(
            "MethodSignature::check_return",
            &what,
            self.return_mask,
            self.return_class,
            value,
            span,
        )
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_class_method { '+' } else { '-' };
        write!(f, "{} ({}", prefix, self.return_mask)?;
        if let Some(class) = self.return_class {
            write!(f, "<{}>", class.element_type())?;
        }
        write!(f, "){}(", self.name)?;
        if self.arguments.is_empty() {
            f.write_str("void")?;
        }
        for (i, argument) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let mask = ValueMask(argument.mask.0 & !ValueMask::OPTIONAL.0);
            if argument.is_optional() {
                write!(f, "[{} {}]", mask, argument.name)?;
            } else {
                write!(f, "{} {}", mask, argument.name)?;
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_property_rendering() {
        let settable = PropertySignature::new("tag", false, ValueMask::INT | ValueMask::SINGLETON);
        let read_only = PropertySignature::new("id", true, ValueMask::INT | ValueMask::SINGLETON);
        assert_eq!(settable.to_string(), "tag <-> (integer$)");
        assert_eq!(read_only.to_string(), "id => (integer$)");
        assert_eq!(settable.id, global_string_id_for("tag"));
    }

    #[test]
    fn test_method_rendering() {
        let method = MethodSignature::instance("scale", ValueMask::FLOAT)
            .with_argument(ArgumentSpec::new("by", ValueMask::NUMERIC | ValueMask::SINGLETON))
            .with_argument(ArgumentSpec::new(
                "offset",
                ValueMask::FLOAT | ValueMask::OPTIONAL,
            ));
        assert_eq!(
            method.to_string(),
            "- (float)scale(numeric$ by, [float offset])"
        );
        assert_eq!(
            MethodSignature::class_method("size", ValueMask::INT | ValueMask::SINGLETON)
                .to_string(),
            "+ (integer$)size(void)"
        );
    }

    #[test]
    fn test_check_arguments() {
        let method = MethodSignature::instance("scale", ValueMask::FLOAT)
            .with_argument(ArgumentSpec::new("by", ValueMask::NUMERIC | ValueMask::SINGLETON))
            .with_argument(ArgumentSpec::new(
                "offset",
                ValueMask::FLOAT | ValueMask::OPTIONAL,
            ));

        assert!(method.check_arguments(&[Value::int_singleton(2)], None).is_ok());
        assert!(method
            .check_arguments(&[Value::float_singleton(2.0), Value::float_vector(vec![1.0, 2.0])], None)
            .is_ok());

        let err = method.check_arguments(&[], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "method scale() requires 1 to 2 argument(s), but 0 were supplied"
        );
        assert!(method.check_arguments(&[Value::string_singleton("x")], None).is_err());
        assert!(method
            .check_arguments(&[Value::int_vector(vec![1, 2])], None)
            .is_err());
    }

    #[test]
    fn test_check_result() {
        let property = PropertySignature::new("tag", false, ValueMask::INT | ValueMask::SINGLETON);
        assert!(property.check_result(&Value::int_singleton(3), None).is_ok());
        assert!(property.check_result(&Value::float_singleton(3.0), None).is_err());
        assert!(property.check_result(&Value::int_vector(vec![1, 2]), None).is_err());
        assert!(property
            .check_assigned_value(&Value::int_vector(vec![1, 2]), None)
            .is_ok());
    }
}
