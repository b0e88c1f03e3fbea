//! Script-visible values.
//!
//! Every value is a sequence: there is no scalar type. A value of length one
//! built with a `*_singleton` constructor uses inline storage and is
//! immutable; `*_vector` constructors give resizable, mutable storage. The
//! two representations share all coercion and formatting code through
//! [`Cardinal`].
//!
//! Values are shared through [`ValueHandle`]. Mutation needs `&mut Value`,
//! reached with [`Handle::get_mut`] while the handle is unique.

pub mod coerce;
pub mod mask;
mod object;
pub mod statics;
mod tracking;


use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;

use crate::compare::compare_floats;
use crate::error::{raise, EidosError, RuntimeResult};
use crate::handle::{Handle, RefCounted};
use crate::object::{ElementRef, ObjectClass, UNDEFINED_CLASS};
use crate::span::Span;

pub use mask::ValueMask;
pub use tracking::live_value_count;

/// Runtime type tag of a value, in promotion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Null,
    Logical,
    Int,
    Float,
    String,
    Object,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "NULL",
            ValueKind::Logical => "logical",
            ValueKind::Int => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type ValueHandle = Handle<Value>;

/// Storage of one kind: a single inline element or a growable vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Cardinal<T> {
    Singleton(T),
    Vector(Vec<T>),
}

impl<T> Cardinal<T> {
    pub fn len(&self) -> usize {
        match self {
            Cardinal::Singleton(_) => 1,
            Cardinal::Vector(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Cardinal::Singleton(item) => std::slice::from_ref(item),
            Cardinal::Vector(items) => items,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Cardinal::Vector(_))
    }
}

impl<T: Clone> Cardinal<T> {
    fn to_vector(&self) -> Self {
        Cardinal::Vector(self.as_slice().to_vec())
    }

    fn empty_like(&self) -> Self {
        Cardinal::Vector(Vec::new())
    }
}

#[derive(Clone)]
pub(crate) enum Repr {
    Null,
    Logical(Cardinal<bool>),
    Int(Cardinal<i64>),
    Float(Cardinal<f64>),
    String(Cardinal<String>),
    Object {
        elements: Cardinal<ElementRef>,
        class: &'static ObjectClass,
    },
}

impl Repr {
    fn to_vector(&self) -> Repr {
        match self {
            Repr::Null => Repr::Null,
            Repr::Logical(v) => Repr::Logical(v.to_vector()),
            Repr::Int(v) => Repr::Int(v.to_vector()),
            Repr::Float(v) => Repr::Float(v.to_vector()),
            Repr::String(v) => Repr::String(v.to_vector()),
            Repr::Object { elements, class } => Repr::Object {
                elements: elements.to_vector(),
                class: *class,
            },
        }
    }

    fn empty_like(&self) -> Repr {
        match self {
            Repr::Null => Repr::Null,
            Repr::Logical(v) => Repr::Logical(v.empty_like()),
            Repr::Int(v) => Repr::Int(v.empty_like()),
            Repr::Float(v) => Repr::Float(v.empty_like()),
            Repr::String(v) => Repr::String(v.empty_like()),
            Repr::Object { elements, class } => Repr::Object {
                elements: elements.empty_like(),
                class: *class,
            },
        }
    }
}

/// A script-visible value.
pub struct Value {
    refcount: Cell<u32>,
    invisible: bool,
    repr: Repr,
}

impl RefCounted for Value {
    fn add_ref(&self) {
        self.refcount.set(self.refcount.get() + 1);
    }

    fn release(&self) -> bool {
        let remaining = self.refcount.get() - 1;
        self.refcount.set(remaining);
        remaining == 0
    }

    fn ref_count(&self) -> u32 {
        self.refcount.get()
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        tracking::value_destroyed();
    }
}

// Construction
impl Value {
    pub(crate) fn allocate(repr: Repr, invisible: bool) -> ValueHandle {
        tracking::value_created();
        Handle::new(Value {
            refcount: Cell::new(0),
            invisible,
            repr,
        })
    }

    pub fn null() -> ValueHandle {
        statics::null()
    }

    pub fn null_invisible() -> ValueHandle {
        statics::null_invisible()
    }

    /// One of the shared `T`/`F` constants.
    pub fn logical_singleton(value: bool) -> ValueHandle {
        statics::logical(value)
    }

    pub fn logical_vector(values: Vec<bool>) -> ValueHandle {
        Self::allocate(Repr::Logical(Cardinal::Vector(values)), false)
    }

    pub fn int_singleton(value: i64) -> ValueHandle {
        Self::allocate(Repr::Int(Cardinal::Singleton(value)), false)
    }

    pub fn int_vector(values: Vec<i64>) -> ValueHandle {
        Self::allocate(Repr::Int(Cardinal::Vector(values)), false)
    }

    pub fn float_singleton(value: f64) -> ValueHandle {
        Self::allocate(Repr::Float(Cardinal::Singleton(value)), false)
    }

    pub fn float_vector(values: Vec<f64>) -> ValueHandle {
        Self::allocate(Repr::Float(Cardinal::Vector(values)), false)
    }

    pub fn string_singleton(value: impl Into<String>) -> ValueHandle {
        Self::allocate(Repr::String(Cardinal::Singleton(value.into())), false)
    }

    pub fn string_vector(values: Vec<String>) -> ValueHandle {
        Self::allocate(Repr::String(Cardinal::Vector(values)), false)
    }

    pub fn object_singleton(element: ElementRef) -> ValueHandle {
        let class = element.class();
        Self::allocate(
            Repr::Object {
                elements: Cardinal::Singleton(element),
                class,
            },
            false,
        )
    }

    /// An object vector; every element must belong to the same class.
    pub fn object_vector(elements: Vec<ElementRef>) -> RuntimeResult<ValueHandle> {
        let class = match elements.first() {
            Some(first) => first.class(),
            None => &UNDEFINED_CLASS,
        };
        if let Some(stranger) = elements.iter().find(|e| !std::ptr::eq(e.class(), class)) {
            return raise(mixed_classes_error(
                "Value::object_vector",
                class,
                stranger.class(),
            ));
        }
        Ok(Self::allocate(
            Repr::Object {
                elements: Cardinal::Vector(elements),
                class,
            },
            false,
        ))
    }

    /// An empty object vector that will only accept elements of `class`.
    pub fn object_vector_of_class(class: &'static ObjectClass) -> ValueHandle {
        Self::allocate(
            Repr::Object {
                elements: Cardinal::Vector(Vec::new()),
                class,
            },
            false,
        )
    }
}

fn mixed_classes_error(
    context: &'static str,
    expected: &'static ObjectClass,
    got: &'static ObjectClass,
) -> EidosError {
    EidosError::type_error(
        context,
        format!(
            "object element type mismatch: cannot mix {} with {}",
            expected.element_type(),
            got.element_type()
        ),
    )
}

// Queries
impl Value {
    pub fn kind(&self) -> ValueKind {
        match &self.repr {
            Repr::Null => ValueKind::Null,
            Repr::Logical(_) => ValueKind::Logical,
            Repr::Int(_) => ValueKind::Int,
            Repr::Float(_) => ValueKind::Float,
            Repr::String(_) => ValueKind::String,
            Repr::Object { .. } => ValueKind::Object,
        }
    }

    pub fn count(&self) -> usize {
        match &self.repr {
            Repr::Null => 0,
            Repr::Logical(v) => v.len(),
            Repr::Int(v) => v.len(),
            Repr::Float(v) => v.len(),
            Repr::String(v) => v.len(),
            Repr::Object { elements, .. } => elements.len(),
        }
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    pub fn set_invisible(&mut self, invisible: bool) {
        self.invisible = invisible;
    }

    /// Script-visible type name; the element type for object values.
    pub fn element_type(&self) -> &'static str {
        match &self.repr {
            Repr::Object { class, .. } => class.element_type(),
            _ => self.kind().name(),
        }
    }

    /// `true` for the mutable vector representation.
    pub fn is_vector_based(&self) -> bool {
        match &self.repr {
            Repr::Null => false,
            Repr::Logical(v) => v.is_vector(),
            Repr::Int(v) => v.is_vector(),
            Repr::Float(v) => v.is_vector(),
            Repr::String(v) => v.is_vector(),
            Repr::Object { elements, .. } => elements.is_vector(),
        }
    }

    pub fn object_class(&self) -> Option<&'static ObjectClass> {
        match &self.repr {
            Repr::Object { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn logical_slice(&self) -> Option<&[bool]> {
        match &self.repr {
            Repr::Logical(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn int_slice(&self) -> Option<&[i64]> {
        match &self.repr {
            Repr::Int(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn float_slice(&self) -> Option<&[f64]> {
        match &self.repr {
            Repr::Float(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn string_slice(&self) -> Option<&[String]> {
        match &self.repr {
            Repr::String(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn object_elements(&self) -> Option<&[ElementRef]> {
        match &self.repr {
            Repr::Object { elements, .. } => Some(elements.as_slice()),
            _ => None,
        }
    }

    pub fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self)
    }
}

// Coercing accessors
impl Value {
    fn check_index(
        &self,
        context: &'static str,
        index: usize,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        let count = self.count();
        if index >= count {
            return raise(EidosError::index_out_of_range(context, index, count).with_span(span));
        }
        Ok(())
    }

    fn not_convertible<T>(
        &self,
        context: &'static str,
        to: ValueKind,
        span: Option<Span>,
    ) -> RuntimeResult<T> {
        raise(
            EidosError::type_error(
                context,
                format!("operand type {} cannot be converted to type {}", self.kind(), to),
            )
            .with_span(span),
        )
    }

    pub fn logical_at(&self, index: usize, span: Option<Span>) -> RuntimeResult<bool> {
        const CONTEXT: &str = "Value::logical_at";
        if matches!(self.repr, Repr::Null | Repr::Object { .. }) {
            return self.not_convertible(CONTEXT, ValueKind::Logical, span);
        }
        self.check_index(CONTEXT, index, span)?;

        match &self.repr {
            Repr::Logical(v) => Ok(v.as_slice()[index]),
            Repr::Int(v) => Ok(v.as_slice()[index] != 0),
            Repr::Float(v) => {
                let x = v.as_slice()[index];
                match coerce::float_to_logical(x) {
                    Some(b) => Ok(b),
                    None => raise(
                        EidosError::conversion(CONTEXT, "float", "logical", coerce::format_float(x))
                            .with_span(span),
                    ),
                }
            }
            Repr::String(v) => {
                let s = &v.as_slice()[index];
                match coerce::string_to_logical(s) {
                    Some(b) => Ok(b),
                    None => raise(
                        EidosError::conversion(CONTEXT, "string", "logical", coerce::quote_string(s))
                            .with_span(span),
                    ),
                }
            }
            Repr::Null | Repr::Object { .. } => {
                self.not_convertible(CONTEXT, ValueKind::Logical, span)
            }
        }
    }

    pub fn int_at(&self, index: usize, span: Option<Span>) -> RuntimeResult<i64> {
        const CONTEXT: &str = "Value::int_at";
        if matches!(self.repr, Repr::Null | Repr::Object { .. }) {
            return self.not_convertible(CONTEXT, ValueKind::Int, span);
        }
        self.check_index(CONTEXT, index, span)?;

        match &self.repr {
            Repr::Logical(v) => Ok(i64::from(v.as_slice()[index])),
            Repr::Int(v) => Ok(v.as_slice()[index]),
            Repr::Float(v) => {
                let x = v.as_slice()[index];
                match coerce::float_to_int(x) {
                    Some(i) => Ok(i),
                    None => raise(
                        EidosError::conversion(CONTEXT, "float", "integer", coerce::format_float(x))
                            .with_span(span),
                    ),
                }
            }
            Repr::String(v) => {
                let s = &v.as_slice()[index];
                match coerce::parse_int(s) {
                    Some(i) => Ok(i),
                    None => raise(
                        EidosError::conversion(CONTEXT, "string", "integer", coerce::quote_string(s))
                            .with_span(span),
                    ),
                }
            }
            Repr::Null | Repr::Object { .. } => self.not_convertible(CONTEXT, ValueKind::Int, span),
        }
    }

    pub fn float_at(&self, index: usize, span: Option<Span>) -> RuntimeResult<f64> {
        const CONTEXT: &str = "Value::float_at";
        if matches!(self.repr, Repr::Null | Repr::Object { .. }) {
            return self.not_convertible(CONTEXT, ValueKind::Float, span);
        }
        self.check_index(CONTEXT, index, span)?;

        match &self.repr {
            Repr::Logical(v) => Ok(if v.as_slice()[index] { 1.0 } else { 0.0 }),
            Repr::Int(v) => Ok(v.as_slice()[index] as f64),
            Repr::Float(v) => Ok(v.as_slice()[index]),
            Repr::String(v) => {
                let s = &v.as_slice()[index];
                match coerce::parse_float(s) {
                    Some(x) => Ok(x),
                    None => raise(
                        EidosError::conversion(CONTEXT, "string", "float", coerce::quote_string(s))
                            .with_span(span),
                    ),
                }
            }
            Repr::Null | Repr::Object { .. } => {
                self.not_convertible(CONTEXT, ValueKind::Float, span)
            }
        }
    }

    pub fn string_at(&self, index: usize, span: Option<Span>) -> RuntimeResult<String> {
        const CONTEXT: &str = "Value::string_at";
        if matches!(self.repr, Repr::Null | Repr::Object { .. }) {
            return self.not_convertible(CONTEXT, ValueKind::String, span);
        }
        self.check_index(CONTEXT, index, span)?;

        match &self.repr {
            Repr::Logical(v) => Ok(coerce::format_logical(v.as_slice()[index]).to_string()),
            Repr::Int(v) => Ok(coerce::format_int(v.as_slice()[index])),
            Repr::Float(v) => Ok(coerce::format_float(v.as_slice()[index])),
            Repr::String(v) => Ok(v.as_slice()[index].clone()),
            Repr::Null | Repr::Object { .. } => {
                self.not_convertible(CONTEXT, ValueKind::String, span)
            }
        }
    }

    pub fn object_at(&self, index: usize, span: Option<Span>) -> RuntimeResult<ElementRef> {
        const CONTEXT: &str = "Value::object_at";
        match &self.repr {
            Repr::Object { elements, .. } => {
                self.check_index(CONTEXT, index, span)?;
                Ok(elements.as_slice()[index].clone())
            }
            _ => self.not_convertible(CONTEXT, ValueKind::Object, span),
        }
    }

    /// The element at `index` as a new singleton value of the same kind.
    pub fn get_value_at_index(&self, index: usize, span: Option<Span>) -> RuntimeResult<ValueHandle> {
        const CONTEXT: &str = "Value::get_value_at_index";
        self.check_index(CONTEXT, index, span)?;

        Ok(match &self.repr {
            Repr::Null => Value::null(),
            Repr::Logical(v) => Value::logical_singleton(v.as_slice()[index]),
            Repr::Int(v) => Value::int_singleton(v.as_slice()[index]),
            Repr::Float(v) => Value::float_singleton(v.as_slice()[index]),
            Repr::String(v) => Value::string_singleton(v.as_slice()[index].clone()),
            Repr::Object { elements, .. } => {
                Value::object_singleton(elements.as_slice()[index].clone())
            }
        })
    }
}

// Mutation
impl Value {
    fn immutable<T>(&self, context: &'static str, span: Option<Span>) -> RuntimeResult<T> {
        raise(EidosError::immutable(context, self.element_type()).with_span(span))
    }

    fn push_error<T>(&self, context: &'static str, pushed: ValueKind) -> RuntimeResult<T> {
        if self.kind() == pushed {
            self.immutable(context, None)
        } else {
            raise(EidosError::type_error(
                context,
                format!("cannot push a {} element onto a {} value", pushed, self.kind()),
            ))
        }
    }

    /// Replaces the element at `index` with element 0 of `value`, coerced to this kind.
    pub fn set_value_at_index(
        &mut self,
        index: usize,
        value: &Value,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        const CONTEXT: &str = "Value::set_value_at_index";
        if !self.is_vector_based() {
            return self.immutable(CONTEXT, span);
        }
        self.check_index(CONTEXT, index, span)?;

        match &mut self.repr {
            Repr::Logical(Cardinal::Vector(v)) => v[index] = value.logical_at(0, span)?,
            Repr::Int(Cardinal::Vector(v)) => v[index] = value.int_at(0, span)?,
            Repr::Float(Cardinal::Vector(v)) => v[index] = value.float_at(0, span)?,
            Repr::String(Cardinal::Vector(v)) => v[index] = value.string_at(0, span)?,
            Repr::Object {
                elements: Cardinal::Vector(v),
                class,
            } => {
                let element = value.object_at(0, span)?;
                if !std::ptr::eq(element.class(), *class) {
                    return raise(
                        mixed_classes_error(CONTEXT, *class, element.class()).with_span(span),
                    );
                }
                v[index] = element;
            }
            _ => return self.immutable(CONTEXT, span),
        }
        Ok(())
    }

    fn prepare_typed_set(
        &self,
        context: &'static str,
        kind: ValueKind,
        index: usize,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        if self.kind() != kind {
            return raise(
                EidosError::type_error(
                    context,
                    format!("cannot store a {} element into a {} value", kind, self.kind()),
                )
                .with_span(span),
            );
        }
        if !self.is_vector_based() {
            return self.immutable(context, span);
        }
        self.check_index(context, index, span)
    }

    /// Stores `value` at `index` of a logical vector. No coercion takes place.
    pub fn set_logical_at(
        &mut self,
        index: usize,
        value: bool,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        self.prepare_typed_set("Value::set_logical_at", ValueKind::Logical, index, span)?;
        if let Repr::Logical(Cardinal::Vector(v)) = &mut self.repr {
            v[index] = value;
        }
        Ok(())
    }

    pub fn set_int_at(
        &mut self,
        index: usize,
        value: i64,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        self.prepare_typed_set("Value::set_int_at", ValueKind::Int, index, span)?;
        if let Repr::Int(Cardinal::Vector(v)) = &mut self.repr {
            v[index] = value;
        }
        Ok(())
    }

    pub fn set_float_at(
        &mut self,
        index: usize,
        value: f64,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        self.prepare_typed_set("Value::set_float_at", ValueKind::Float, index, span)?;
        if let Repr::Float(Cardinal::Vector(v)) = &mut self.repr {
            v[index] = value;
        }
        Ok(())
    }

    pub fn set_string_at(
        &mut self,
        index: usize,
        value: impl Into<String>,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        self.prepare_typed_set("Value::set_string_at", ValueKind::String, index, span)?;
        if let Repr::String(Cardinal::Vector(v)) = &mut self.repr {
            v[index] = value.into();
        }
        Ok(())
    }

    /// Stores `element` at `index`; it must belong to the vector's class.
    pub fn set_object_at(
        &mut self,
        index: usize,
        element: ElementRef,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        const CONTEXT: &str = "Value::set_object_at";
        self.prepare_typed_set(CONTEXT, ValueKind::Object, index, span)?;
        if let Repr::Object {
            elements: Cardinal::Vector(v),
            class,
        } = &mut self.repr
        {
            if !std::ptr::eq(*class, element.class()) {
                return raise(mixed_classes_error(CONTEXT, *class, element.class()).with_span(span));
            }
            v[index] = element;
        }
        Ok(())
    }

    /// Appends element `index` of `source`, which must be of the same kind.
    pub fn push_value_from_index_of(
        &mut self,
        source: &Value,
        index: usize,
        span: Option<Span>,
    ) -> RuntimeResult<()> {
        const CONTEXT: &str = "Value::push_value_from_index_of";
        if source.kind() != self.kind() {
            return raise(
                EidosError::type_error(
                    CONTEXT,
                    format!(
                        "cannot push a {} element onto a {} value",
                        source.kind(),
                        self.kind()
                    ),
                )
                .with_span(span),
            );
        }
        source.check_index(CONTEXT, index, span)?;

        match &source.repr {
            Repr::Logical(v) => self.push_logical(v.as_slice()[index]),
            Repr::Int(v) => self.push_int(v.as_slice()[index]),
            Repr::Float(v) => self.push_float(v.as_slice()[index]),
            Repr::String(v) => self.push_string(v.as_slice()[index].clone()),
            Repr::Object { elements, .. } => self.push_object(elements.as_slice()[index].clone()),
            Repr::Null => self.immutable(CONTEXT, span),
        }
    }

    pub fn push_logical(&mut self, value: bool) -> RuntimeResult<()> {
        match &mut self.repr {
            Repr::Logical(Cardinal::Vector(v)) => {
                v.push(value);
                Ok(())
            }
            _ => self.push_error("Value::push_logical", ValueKind::Logical),
        }
    }

    pub fn push_int(&mut self, value: i64) -> RuntimeResult<()> {
        match &mut self.repr {
            Repr::Int(Cardinal::Vector(v)) => {
                v.push(value);
                Ok(())
            }
            _ => self.push_error("Value::push_int", ValueKind::Int),
        }
    }

    pub fn push_float(&mut self, value: f64) -> RuntimeResult<()> {
        match &mut self.repr {
            Repr::Float(Cardinal::Vector(v)) => {
                v.push(value);
                Ok(())
            }
            _ => self.push_error("Value::push_float", ValueKind::Float),
        }
    }

    pub fn push_string(&mut self, value: impl Into<String>) -> RuntimeResult<()> {
        match &mut self.repr {
            Repr::String(Cardinal::Vector(v)) => {
                v.push(value.into());
                Ok(())
            }
            _ => self.push_error("Value::push_string", ValueKind::String),
        }
    }

    /// Appends an element. An empty vector of the undefined class adopts the element's class.
    pub fn push_object(&mut self, element: ElementRef) -> RuntimeResult<()> {
        const CONTEXT: &str = "Value::push_object";
        match &mut self.repr {
            Repr::Object {
                elements: Cardinal::Vector(v),
                class,
            } => {
                if class.is_undefined() {
                    *class = element.class();
                } else if !std::ptr::eq(*class, element.class()) {
                    return raise(mixed_classes_error(CONTEXT, *class, element.class()));
                }
                v.push(element);
                Ok(())
            }
            _ => self.push_error(CONTEXT, ValueKind::Object),
        }
    }

    /// Reserves room for `additional` more elements; no effect on singletons.
    pub fn reserve(&mut self, additional: usize) {
        match &mut self.repr {
            Repr::Logical(Cardinal::Vector(v)) => v.reserve(additional),
            Repr::Int(Cardinal::Vector(v)) => v.reserve(additional),
            Repr::Float(Cardinal::Vector(v)) => v.reserve(additional),
            Repr::String(Cardinal::Vector(v)) => v.reserve(additional),
            Repr::Object {
                elements: Cardinal::Vector(v),
                ..
            } => v.reserve(additional),
            _ => {}
        }
    }

    /// Stable in-place sort. `F` sorts before `T`, strings compare bytewise and
    /// NaN sorts last in either direction. Object values are ordered with
    /// [`Value::sort_by_property`] instead.
    pub fn sort(&mut self, ascending: bool) -> RuntimeResult<()> {
        const CONTEXT: &str = "Value::sort";
        if self.kind() == ValueKind::Object {
            return raise(EidosError::type_error(
                CONTEXT,
                "object values cannot be sorted directly; sort by a property instead",
            ));
        }

        fn directed(ordering: Ordering, ascending: bool) -> Ordering {
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        }

        match &mut self.repr {
            Repr::Logical(Cardinal::Vector(v)) => v.sort_by(|a, b| directed(a.cmp(b), ascending)),
            Repr::Int(Cardinal::Vector(v)) => v.sort_by(|a, b| directed(a.cmp(b), ascending)),
            Repr::Float(Cardinal::Vector(v)) => v.sort_by(|a, b| match (a.is_nan(), b.is_nan()) {
                (false, false) => directed(compare_floats(*a, *b), ascending),
                _ => compare_floats(*a, *b),
            }),
            Repr::String(Cardinal::Vector(v)) => {
                v.sort_by(|a, b| directed(a.as_bytes().cmp(b.as_bytes()), ascending))
            }
            _ => return self.immutable(CONTEXT, None),
        }
        Ok(())
    }
}

// Copies
impl Value {
    /// Independent copy with the same representation; never invisible.
    ///
    /// A singleton copies to a singleton and so stays immutable. Use
    /// [`Value::vector_based_copy`] for storage that can be mutated.
    pub fn copy_values(&self) -> ValueHandle {
        match self.repr {
            Repr::Null => Value::null(),
            _ => Value::allocate(self.repr.clone(), false),
        }
    }

    /// Mutable copy, in vector representation even when `self` is a singleton.
    pub fn vector_based_copy(&self) -> ValueHandle {
        match self.repr {
            Repr::Null => Value::null(),
            _ => Value::allocate(self.repr.to_vector(), false),
        }
    }

    /// Empty vector of the same kind (and class, for objects).
    pub fn new_matching_kind(&self) -> ValueHandle {
        match self.repr {
            Repr::Null => Value::null(),
            _ => Value::allocate(self.repr.empty_like(), false),
        }
    }

    pub fn invisible_copy(&self) -> ValueHandle {
        match self.repr {
            Repr::Null => Value::null_invisible(),
            _ => Value::allocate(self.repr.clone(), true),
        }
    }
}

/// Joins `values` end to end, promoting to the highest kind present.
///
/// NULL operands contribute nothing. Object values only join other object
/// values of the same class.
pub fn concatenate(values: &[ValueHandle], span: Option<Span>) -> RuntimeResult<ValueHandle> {
    const CONTEXT: &str = "concatenate";
    let mut highest = ValueKind::Null;
    let mut total = 0;
    let mut class: Option<&'static ObjectClass> = None;

    for value in values {
        let kind = value.kind();
        if kind == ValueKind::Null {
            continue;
        }
        if highest != ValueKind::Null && (kind == ValueKind::Object) != (highest == ValueKind::Object)
        {
            return raise(
                EidosError::type_error(CONTEXT, "object and non-object values cannot be mixed")
                    .with_span(span),
            );
        }
        if let Some(c) = value.object_class().filter(|c| !c.is_undefined()) {
            match class {
                Some(existing) if !std::ptr::eq(existing, c) => {
                    return raise(mixed_classes_error(CONTEXT, existing, c).with_span(span));
                }
                _ => class = Some(c),
            }
        }
        highest = highest.max(kind);
        total += value.count();
    }

    let non_null = values.iter().filter(|v| v.kind() != ValueKind::Null);
    let repr = match highest {
        ValueKind::Null => return Ok(Value::null()),
        ValueKind::Logical => {
            let mut out = Vec::with_capacity(total);
            for value in non_null {
                for i in 0..value.count() {
                    out.push(value.logical_at(i, span)?);
                }
            }
            Repr::Logical(Cardinal::Vector(out))
        }
        ValueKind::Int => {
            let mut out = Vec::with_capacity(total);
            for value in non_null {
                for i in 0..value.count() {
                    out.push(value.int_at(i, span)?);
                }
            }
            Repr::Int(Cardinal::Vector(out))
        }
        ValueKind::Float => {
            let mut out = Vec::with_capacity(total);
            for value in non_null {
                for i in 0..value.count() {
                    out.push(value.float_at(i, span)?);
                }
            }
            Repr::Float(Cardinal::Vector(out))
        }
        ValueKind::String => {
            let mut out = Vec::with_capacity(total);
            for value in non_null {
                for i in 0..value.count() {
                    out.push(value.string_at(i, span)?);
                }
            }
            Repr::String(Cardinal::Vector(out))
        }
        ValueKind::Object => {
            let mut out = Vec::with_capacity(total);
            for value in non_null {
                if let Some(elements) = value.object_elements() {
                    out.extend(elements.iter().cloned());
                }
            }
            Repr::Object {
                elements: Cardinal::Vector(out),
                class: class.unwrap_or(&UNDEFINED_CLASS),
            }
        }
    };
    Ok(Value::allocate(repr, false))
}

fn write_elements<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    empty: &str,
    mut write: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    if items.is_empty() {
        return f.write_str(empty);
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write(f, item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Null => f.write_str("NULL"),
            Repr::Logical(v) => write_elements(f, v.as_slice(), "logical(0)", |f, b| {
                f.write_str(coerce::format_logical(*b))
            }),
            Repr::Int(v) => write_elements(f, v.as_slice(), "integer(0)", |f, i| {
                f.write_str(itoa::Buffer::new().format(*i))
            }),
            Repr::Float(v) => write_elements(f, v.as_slice(), "float(0)", |f, x| {
                f.write_str(&coerce::format_float(*x))
            }),
            Repr::String(v) => write_elements(f, v.as_slice(), "string(0)", |f, s| {
                f.write_str(&coerce::quote_string(s))
            }),
            Repr::Object { elements, class } => {
                let empty = format!("object()<{}>", class.element_type());
                write_elements(f, elements.as_slice(), &empty, |f, e| e.print(f))
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("kind", &self.kind())
            .field("count", &self.count())
            .field("invisible", &self.invisible)
            .field("elements", &format_args!("{}", self))
            .finish()
    }
}
