//! Shared constant values of the current runtime instance.

use super::{Cardinal, Repr, Value, ValueHandle};

struct Constants {
    null: ValueHandle,
    null_invisible: ValueHandle,
    logical_true: ValueHandle,
    logical_false: ValueHandle,
}

thread_local! {
    static CONSTANTS: Constants = Constants {
        null: Value::allocate(Repr::Null, false),
        null_invisible: Value::allocate(Repr::Null, true),
        logical_true: Value::allocate(Repr::Logical(Cardinal::Singleton(true)), false),
        logical_false: Value::allocate(Repr::Logical(Cardinal::Singleton(false)), false),
    };
}

/// Forces construction of this thread's constants.
pub fn materialize() {
    CONSTANTS.with(|_| {});
}

pub fn null() -> ValueHandle {
    CONSTANTS.with(|c| c.null.clone())
}

pub fn null_invisible() -> ValueHandle {
    CONSTANTS.with(|c| c.null_invisible.clone())
}

pub fn logical_true() -> ValueHandle {
    CONSTANTS.with(|c| c.logical_true.clone())
}

pub fn logical_false() -> ValueHandle {
    CONSTANTS.with(|c| c.logical_false.clone())
}

pub fn logical(value: bool) -> ValueHandle {
    if value {
        logical_true()
    } else {
        logical_false()
    }
}
