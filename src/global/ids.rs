//! Global string IDs reserved by the runtime.
//!
//! Host types register their own names with fixed IDs in
//! `[LAST_ENTRY, LAST_CONTEXT_ENTRY)`. Names interned on demand are numbered
//! from `LAST_CONTEXT_ENTRY` upward.

use super::registry::GlobalStringId;

macro_rules! reserved_ids {
    ($($name:ident = $value:expr => $text:expr,)*) => {
        $(pub const $name: GlobalStringId = GlobalStringId($value);)*

        /// Every reserved ID paired with its string, in ID order.
        pub const RESERVED: &[(GlobalStringId, &str)] = &[$(($name, $text),)*];
    };
}

reserved_ids! {
    NONE = 0 => "",
    METHOD = 1 => "method",
    SIZE = 2 => "size",
    PROPERTY = 3 => "property",
    STR = 4 => "str",
    APPLY_VALUE = 5 => "applyValue",
    T = 6 => "T",
    F = 7 => "F",
    NULL = 8 => "NULL",
    PI = 9 => "PI",
    E = 10 => "E",
    INF = 11 => "INF",
    NAN = 12 => "NAN",
    TEST_ELEMENT = 13 => "_TestElement",
    YOLK = 14 => "_yolk",
    INCREMENT = 15 => "_increment",
    CUBIC_YOLK = 16 => "_cubicYolk",
    SQUARE_TEST = 17 => "_squareTest",
    WEIGHTS = 18 => "weights",
    N = 19 => "n",
    X = 20 => "x",
    Y = 21 => "y",
    Z = 22 => "z",
    COLOR = 23 => "color",
}

/// First ID available to host types.
pub const LAST_ENTRY: GlobalStringId = GlobalStringId(24);

/// End of the host range; on-demand IDs start here.
pub const LAST_CONTEXT_ENTRY: GlobalStringId = GlobalStringId(10_000);
