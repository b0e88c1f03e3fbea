//! Error types for the value and object runtime.
//!
//! Every failure the runtime detects is one of these variants, and every one of
//! them is reported through [`termination::raise`] so the process-wide
//! termination mode decides whether it ends the process or unwinds.

pub mod termination;

use serde::Serialize;
use thiserror::Error;

use crate::span::Span;

pub use termination::{
    clear_raise_message, last_diagnostic, last_diagnostic_json, last_error_position, raise,
    set_current_script, set_print_backtrace, set_termination_mode, termination_mode,
    trimmed_raise_message, untrimmed_raise_message, with_blame, Diagnostic, ErrorPosition,
    TerminationMode,
};

/// Result type of every fallible runtime operation.
pub type RuntimeResult<T> = Result<T, EidosError>;

/// The three families of errors the runtime distinguishes when reporting.
///
/// They are all fatal to the current evaluation; the category only shapes the
/// diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    /// Wrong kind for an operation, failed conversion, ordering objects.
    Type,
    /// Immutable mutation, read-only writes, unknown IDs, registry conflicts.
    Contract,
    /// Out-of-range indices and count mismatches.
    Capacity,
}

fn at(span: &Option<Span>) -> String {
    match span {
        Some(span) => format!(" at {}", span),
        None => String::new(),
    }
}

/// Runtime errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EidosError {
    #[error("{message}{}", at(.span))]
    Type {
        context: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("cannot convert {from} value {value} to type {to}{}", at(.span))]
    Conversion {
        context: &'static str,
        from: &'static str,
        to: &'static str,
        value: String,
        span: Option<Span>,
    },

    #[error("{element_type} value is immutable and cannot be modified{}", at(.span))]
    Immutable {
        context: &'static str,
        element_type: String,
        span: Option<Span>,
    },

    #[error("property {property} is not defined for object element type {element_type}{}", at(.span))]
    UnknownProperty {
        context: &'static str,
        element_type: String,
        property: String,
        span: Option<Span>,
    },

    #[error("method {method} is not defined on object element type {element_type}{}", at(.span))]
    UnknownMethod {
        context: &'static str,
        element_type: String,
        method: String,
        span: Option<Span>,
    },

    #[error("attempt to set read-only property {property} of object element type {element_type}{}", at(.span))]
    ReadOnlyProperty {
        context: &'static str,
        element_type: String,
        property: String,
        span: Option<Span>,
    },

    #[error("subscript {index} out of range for a value of size {count}{}", at(.span))]
    IndexOutOfRange {
        context: &'static str,
        index: usize,
        count: usize,
        span: Option<Span>,
    },

    #[error("assignment to property {property} requires a value of size 1 or {expected}, but got size {got}{}", at(.span))]
    CountMismatch {
        context: &'static str,
        property: String,
        expected: usize,
        got: usize,
        span: Option<Span>,
    },

    #[error("method {method} requires {expected} argument(s), but {got} were supplied{}", at(.span))]
    ArgumentCount {
        context: &'static str,
        method: String,
        expected: String,
        got: usize,
        span: Option<Span>,
    },

    #[error("{message}{}", at(.span))]
    Contract {
        context: &'static str,
        message: String,
        span: Option<Span>,
    },
}

impl EidosError {
    pub fn type_error(context: &'static str, message: impl Into<String>) -> Self {
        Self::Type {
            context,
            message: message.into(),
            span: None,
        }
    }

    pub fn conversion(
        context: &'static str,
        from: &'static str,
        to: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            context,
            from,
            to,
            value: value.into(),
            span: None,
        }
    }

    pub fn immutable(context: &'static str, element_type: impl Into<String>) -> Self {
        Self::Immutable {
            context,
            element_type: element_type.into(),
            span: None,
        }
    }

    pub fn unknown_property(
        context: &'static str,
        element_type: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self::UnknownProperty {
            context,
            element_type: element_type.into(),
            property: property.into(),
            span: None,
        }
    }

    pub fn unknown_method(
        context: &'static str,
        element_type: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self::UnknownMethod {
            context,
            element_type: element_type.into(),
            method: method.into(),
            span: None,
        }
    }

    pub fn read_only_property(
        context: &'static str,
        element_type: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self::ReadOnlyProperty {
            context,
            element_type: element_type.into(),
            property: property.into(),
            span: None,
        }
    }

    pub fn index_out_of_range(context: &'static str, index: usize, count: usize) -> Self {
        Self::IndexOutOfRange {
            context,
            index,
            count,
            span: None,
        }
    }

    pub fn count_mismatch(
        context: &'static str,
        property: impl Into<String>,
        expected: usize,
        got: usize,
    ) -> Self {
        Self::CountMismatch {
            context,
            property: property.into(),
            expected,
            got,
            span: None,
        }
    }

    pub fn argument_count(
        context: &'static str,
        method: impl Into<String>,
        expected: impl Into<String>,
        got: usize,
    ) -> Self {
        Self::ArgumentCount {
            context,
            method: method.into(),
            expected: expected.into(),
            got,
            span: None,
        }
    }

    pub fn contract(context: &'static str, message: impl Into<String>) -> Self {
        Self::Contract {
            context,
            message: message.into(),
            span: None,
        }
    }

    /// Attaches the span of the token to blame, replacing any previous one.
    pub fn with_span(mut self, blame: Option<Span>) -> Self {
        if blame.is_some() {
            *self.span_mut() = blame;
        }
        self
    }

    fn span_mut(&mut self) -> &mut Option<Span> {
        match self {
            Self::Type { span, .. }
            | Self::Conversion { span, .. }
            | Self::Immutable { span, .. }
            | Self::UnknownProperty { span, .. }
            | Self::UnknownMethod { span, .. }
            | Self::ReadOnlyProperty { span, .. }
            | Self::IndexOutOfRange { span, .. }
            | Self::CountMismatch { span, .. }
            | Self::ArgumentCount { span, .. }
            | Self::Contract { span, .. } => span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Type { span, .. }
            | Self::Conversion { span, .. }
            | Self::Immutable { span, .. }
            | Self::UnknownProperty { span, .. }
            | Self::UnknownMethod { span, .. }
            | Self::ReadOnlyProperty { span, .. }
            | Self::IndexOutOfRange { span, .. }
            | Self::CountMismatch { span, .. }
            | Self::ArgumentCount { span, .. }
            | Self::Contract { span, .. } => *span,
        }
    }

    /// Name of the runtime operation that detected the error.
    pub fn context(&self) -> &'static str {
        match self {
            Self::Type { context, .. }
            | Self::Conversion { context, .. }
            | Self::Immutable { context, .. }
            | Self::UnknownProperty { context, .. }
            | Self::UnknownMethod { context, .. }
            | Self::ReadOnlyProperty { context, .. }
            | Self::IndexOutOfRange { context, .. }
            | Self::CountMismatch { context, .. }
            | Self::ArgumentCount { context, .. }
            | Self::Contract { context, .. } => context,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Type { .. } | Self::Conversion { .. } => ErrorCategory::Type,
            Self::Immutable { .. }
            | Self::UnknownProperty { .. }
            | Self::UnknownMethod { .. }
            | Self::ReadOnlyProperty { .. }
            | Self::Contract { .. } => ErrorCategory::Contract,
            Self::IndexOutOfRange { .. }
            | Self::CountMismatch { .. }
            | Self::ArgumentCount { .. } => ErrorCategory::Capacity,
        }
    }
}
