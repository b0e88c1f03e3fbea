//! Object classes: the shared reflective descriptor of a family of elements.

use std::fmt;
use std::sync::OnceLock;

use ahash::AHashMap;

use super::signature::{ArgumentSpec, MethodSignature, PropertySignature};
use crate::error::{raise, with_blame, EidosError, RuntimeResult};
use crate::global::{ids, string_for_global_id, GlobalStringId};
use crate::span::Span;
use crate::value::{Value, ValueHandle, ValueMask};

/// Handles the host's own class methods. Called with the receiving class.
pub type ClassMethodFn =
    fn(&'static ObjectClass, GlobalStringId, &[ValueHandle]) -> RuntimeResult<ValueHandle>;

/// Properties sorted by name with an ID index.
#[derive(Debug)]
pub struct PropertyTable {
    sorted: Vec<PropertySignature>,
    by_id: AHashMap<GlobalStringId, usize>,
}

impl PropertyTable {
    /// Sorts `properties` by name. Two properties sharing a name or an ID are rejected.
    pub fn new(mut properties: Vec<PropertySignature>) -> RuntimeResult<Self> {
        properties.sort_by(|a, b| a.name.cmp(b.name));
        let mut by_id = AHashMap::with_capacity(properties.len());
        for (index, property) in properties.iter().enumerate() {
            if index > 0 && properties[index - 1].name == property.name {
                return Err(EidosError::contract(
                    "PropertyTable::new",
                    format!("duplicate property name {}", property.name),
                ));
            }
            if by_id.insert(property.id, index).is_some() {
                return Err(EidosError::contract(
                    "PropertyTable::new",
                    format!("duplicate property ID {} for {}", property.id.0, property.name),
                ));
            }
        }
        Ok(Self {
            sorted: properties,
            by_id,
        })
    }

    pub fn get(&self, id: GlobalStringId) -> Option<&PropertySignature> {
        self.by_id.get(&id).map(|&index| &self.sorted[index])
    }

    pub fn as_slice(&self) -> &[PropertySignature] {
        &self.sorted
    }
}

/// Methods sorted by name with an ID index.
#[derive(Debug)]
pub struct MethodTable {
    sorted: Vec<MethodSignature>,
    by_id: AHashMap<GlobalStringId, usize>,
}

impl MethodTable {
    pub fn new(mut methods: Vec<MethodSignature>) -> RuntimeResult<Self> {
        methods.sort_by(|a, b| a.name.cmp(b.name));
        let mut by_id = AHashMap::with_capacity(methods.len());
        for (index, method) in methods.iter().enumerate() {
            if by_id.insert(method.id, index).is_some() {
                return Err(EidosError::contract(
                    "MethodTable::new",
                    format!("duplicate method {}", method.name),
                ));
            }
        }
        Ok(Self {
            sorted: methods,
            by_id,
        })
    }

    pub fn get(&self, id: GlobalStringId) -> Option<&MethodSignature> {
        self.by_id.get(&id).map(|&index| &self.sorted[index])
    }

    pub fn as_slice(&self) -> &[MethodSignature] {
        &self.sorted
    }
}

/// Methods every class answers to.
fn universal_methods() -> Vec<MethodSignature> {
    let name_filter = ValueMask::STRING | ValueMask::SINGLETON | ValueMask::OPTIONAL;
    vec![
        MethodSignature::class_method("method", ValueMask::STRING)
            .with_argument(ArgumentSpec::new("methodName", name_filter)),
        MethodSignature::class_method("property", ValueMask::STRING)
            .with_argument(ArgumentSpec::new("propertyName", name_filter)),
        MethodSignature::instance("size", ValueMask::INT | ValueMask::SINGLETON),
        MethodSignature::instance("str", ValueMask::STRING | ValueMask::SINGLETON),
    ]
}

/// Reflective descriptor shared by all elements of one type.
///
/// Declared as a `static` by the host; the tables are built on first use and
/// never change afterwards.
pub struct ObjectClass {
    element_type: &'static str,
    property_builder: fn() -> Vec<PropertySignature>,
    method_builder: fn() -> Vec<MethodSignature>,
    class_methods: Option<ClassMethodFn>,
    properties: OnceLock<PropertyTable>,
    methods: OnceLock<MethodTable>,
}

fn no_properties() -> Vec<PropertySignature> {
    Vec::new()
}

fn no_methods() -> Vec<MethodSignature> {
    Vec::new()
}

/// Class of empty object vectors that have not seen an element.
pub static UNDEFINED_CLASS: ObjectClass = ObjectClass::new("undefined", no_properties, no_methods);

impl ObjectClass {
    pub const fn new(
        element_type: &'static str,
        property_builder: fn() -> Vec<PropertySignature>,
        method_builder: fn() -> Vec<MethodSignature>,
    ) -> Self {
        Self {
            element_type,
            property_builder,
            method_builder,
            class_methods: None,
            properties: OnceLock::new(),
            methods: OnceLock::new(),
        }
    }

    pub const fn with_class_methods(mut self, handler: ClassMethodFn) -> Self {
        self.class_methods = Some(handler);
        self
    }

    pub fn element_type(&self) -> &'static str {
        self.element_type
    }

    pub fn is_undefined(&self) -> bool {
        std::ptr::eq(self, &UNDEFINED_CLASS)
    }

    fn property_table(&self) -> &PropertyTable {
        self.properties.get_or_init(|| {
            let table = PropertyTable::new((self.property_builder)())
                .unwrap_or_else(|e| panic!("{}: {}", self.element_type, e));
            tracing::debug!(class = self.element_type, count = table.sorted.len(), "built property table");
            table
        })
    }

    fn method_table(&self) -> &MethodTable {
        self.methods.get_or_init(|| {
            let mut methods = (self.method_builder)();
            methods.extend(universal_methods());
            let table = MethodTable::new(methods)
                .unwrap_or_else(|e| panic!("{}: {}", self.element_type, e));
            tracing::debug!(class = self.element_type, count = table.sorted.len(), "built method table");
            table
        })
    }

    /// Declared properties, sorted by name.
    pub fn properties(&self) -> &[PropertySignature] {
        self.property_table().as_slice()
    }

    /// Declared methods plus the universal ones, sorted by name.
    pub fn methods(&self) -> &[MethodSignature] {
        self.method_table().as_slice()
    }

    pub fn signature_for_property(&self, id: GlobalStringId) -> Option<&PropertySignature> {
        self.property_table().get(id)
    }

    pub fn signature_for_property_or_raise(
        &self,
        id: GlobalStringId,
        span: Option<Span>,
    ) -> RuntimeResult<&PropertySignature> {
        match self.signature_for_property(id) {
            Some(signature) => Ok(signature),
            None => raise(
                EidosError::unknown_property(
                    "ObjectClass::signature_for_property",
                    self.element_type,
                    string_for_global_id(id),
                )
                .with_span(span),
            ),
        }
    }

    pub fn signature_for_method(&self, id: GlobalStringId) -> Option<&MethodSignature> {
        self.method_table().get(id)
    }

    pub fn signature_for_method_or_raise(
        &self,
        id: GlobalStringId,
        span: Option<Span>,
    ) -> RuntimeResult<&MethodSignature> {
        match self.signature_for_method(id) {
            Some(signature) => Ok(signature),
            None => raise(
                EidosError::unknown_method(
                    "ObjectClass::signature_for_method",
                    self.element_type,
                    string_for_global_id(id),
                )
                .with_span(span),
            ),
        }
    }

    /// Runs a class method: `method()`, `property()` or one of the host's.
    pub fn execute_class_method(
        &'static self,
        method_id: GlobalStringId,
        args: &[ValueHandle],
        span: Option<Span>,
    ) -> RuntimeResult<ValueHandle> {
        let signature = self.signature_for_method_or_raise(method_id, span)?;
        if !signature.is_class_method {
            return raise(
                EidosError::contract(
                    "ObjectClass::execute_class_method",
                    format!("{}() is an instance method of {}", signature.name, self.element_type),
                )
                .with_span(span),
            );
        }
        signature.check_arguments(args, span)?;

        let result = match method_id {
            ids::METHOD => {
                let filter = name_filter(args, span)?;
                let lines = self
                    .methods()
                    .iter()
                    .filter(|m| filter.as_deref().map_or(true, |name| m.name == name))
                    .map(|m| m.to_string())
                    .collect();
                Value::string_vector(lines)
            }
            ids::PROPERTY => {
                let filter = name_filter(args, span)?;
                let lines = self
                    .properties()
                    .iter()
                    .filter(|p| filter.as_deref().map_or(true, |name| p.name == name))
                    .map(|p| p.to_string())
                    .collect();
                Value::string_vector(lines)
            }
            _ => match self.class_methods {
                Some(handler) => with_blame(span, || handler(self, method_id, args))?,
                None => {
                    return raise(
                        EidosError::unknown_method(
                            "ObjectClass::execute_class_method",
                            self.element_type,
                            signature.name,
                        )
                        .with_span(span),
                    )
                }
            },
        };
        signature.check_return(&result, span)?;
        Ok(result)
    }
}

fn name_filter(args: &[ValueHandle], span: Option<Span>) -> RuntimeResult<Option<String>> {
    match args.first() {
        Some(arg) if arg.count() > 0 => Ok(Some(arg.string_at(0, span)?)),
        _ => Ok(None),
    }
}

impl fmt::Debug for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectClass")
            .field("element_type", &self.element_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn duplicated() -> Vec<PropertySignature> {
        vec![
            PropertySignature::new("mass", false, ValueMask::FLOAT),
            PropertySignature::new("mass", true, ValueMask::FLOAT),
        ]
    }

    fn shuffled() -> Vec<PropertySignature> {
        vec![
            PropertySignature::new("zeta", true, ValueMask::INT),
            PropertySignature::new("alpha", false, ValueMask::STRING),
            PropertySignature::new("mid", false, ValueMask::FLOAT),
        ]
    }

    static DUPLICATED_CLASS: ObjectClass = ObjectClass::new("Duplicated", duplicated, no_methods);
    static SHUFFLED_CLASS: ObjectClass = ObjectClass::new("Shuffled", shuffled, no_methods);

    #[test]
    fn test_duplicate_property_rejected() {
        assert!(PropertyTable::new(duplicated()).is_err());
    }

    #[test]
    #[should_panic(expected = "duplicate property name mass")]
    fn test_duplicate_property_panics_on_first_access() {
        DUPLICATED_CLASS.properties();
    }

    #[test]
    fn test_properties_sorted_and_stable() {
        let names: Vec<_> = SHUFFLED_CLASS.properties().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);

        let first = SHUFFLED_CLASS.properties().as_ptr();
        assert_eq!(SHUFFLED_CLASS.properties().as_ptr(), first);
    }

    #[test]
    fn test_universal_methods_present() {
        let names: Vec<_> = SHUFFLED_CLASS.methods().iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["method", "property", "size", "str"]);
        assert!(SHUFFLED_CLASS.signature_for_method(ids::SIZE).is_some());
    }

    #[test]
    fn test_property_listing() {
        let listing = SHUFFLED_CLASS.execute_class_method(ids::PROPERTY, &[], None).unwrap();
        assert_eq!(
            listing.to_string(),
            "\"alpha <-> (string)\" \"mid <-> (float)\" \"zeta => (integer)\""
        );

        let filtered = SHUFFLED_CLASS
            .execute_class_method(ids::PROPERTY, &[Value::string_singleton("mid")], None)
            .unwrap();
        assert_eq!(filtered.count(), 1);
    }

    #[test]
    fn test_unknown_property_raises() {
        let err = SHUFFLED_CLASS
            .signature_for_property_or_raise(ids::COLOR, None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "property color is not defined for object element type Shuffled"
        );
    }

    #[test]
    fn test_undefined_class() {
        assert!(UNDEFINED_CLASS.is_undefined());
        assert!(!SHUFFLED_CLASS.is_undefined());
        assert!(UNDEFINED_CLASS.properties().is_empty());
    }
}
