//! Value-kind masks used by property and method signatures.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use super::ValueKind;

/// A set of acceptable value kinds, plus `OPTIONAL` and `SINGLETON` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueMask(pub u32);

impl ValueMask {
    pub const NONE: Self = Self(0x0000_0000);
    pub const NULL: Self = Self(0x0000_0001);
    pub const LOGICAL: Self = Self(0x0000_0002);
    pub const INT: Self = Self(0x0000_0004);
    pub const FLOAT: Self = Self(0x0000_0008);
    pub const STRING: Self = Self(0x0000_0010);
    pub const OBJECT: Self = Self(0x0000_0020);

    pub const OPTIONAL: Self = Self(0x8000_0000);
    pub const SINGLETON: Self = Self(0x4000_0000);
    pub const FLAG_STRIP: Self = Self(0x3FFF_FFFF);

    pub const NUMERIC: Self = Self(Self::INT.0 | Self::FLOAT.0);
    pub const LOGICAL_EQUIV: Self = Self(Self::LOGICAL.0 | Self::NUMERIC.0);
    pub const ANY_BASE: Self = Self(Self::NULL.0 | Self::LOGICAL_EQUIV.0 | Self::STRING.0);
    pub const ANY: Self = Self(Self::ANY_BASE.0 | Self::OBJECT.0);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The kinds alone, without flags.
    pub const fn stripped(self) -> Self {
        Self(self.0 & Self::FLAG_STRIP.0)
    }

    pub const fn is_optional(self) -> bool {
        self.0 & Self::OPTIONAL.0 != 0
    }

    pub const fn is_singleton(self) -> bool {
        self.0 & Self::SINGLETON.0 != 0
    }

    pub fn for_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Null => Self::NULL,
            ValueKind::Logical => Self::LOGICAL,
            ValueKind::Int => Self::INT,
            ValueKind::Float => Self::FLOAT,
            ValueKind::String => Self::STRING,
            ValueKind::Object => Self::OBJECT,
        }
    }

    pub fn accepts_kind(self, kind: ValueKind) -> bool {
        self.0 & Self::for_kind(kind).0 != 0
    }
}

impl BitOr for ValueMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ValueMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ValueMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for ValueMask {
    /// `integer`, `numeric`, `logical|string`, `*` for anything, `+` for anything
    /// but object; a trailing `$` marks the singleton flag.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self.stripped();
        match kinds {
            Self::ANY => f.write_str("*")?,
            Self::ANY_BASE => f.write_str("+")?,
            Self::NONE => f.write_str("void")?,
            _ => {
                let mut parts: Vec<&str> = Vec::new();
                if kinds.contains(Self::NULL) {
                    parts.push("NULL");
                }
                if kinds.contains(Self::LOGICAL) {
                    parts.push("logical");
                }
                if kinds.contains(Self::NUMERIC) {
                    parts.push("numeric");
                } else if kinds.contains(Self::INT) {
                    parts.push("integer");
                } else if kinds.contains(Self::FLOAT) {
                    parts.push("float");
                }
                if kinds.contains(Self::STRING) {
                    parts.push("string");
                }
                if kinds.contains(Self::OBJECT) {
                    parts.push("object");
                }
                f.write_str(&parts.join("|"))?;
            }
        }
        if self.is_singleton() {
            f.write_str("$")?;
        }
        Ok(())
    }
}
