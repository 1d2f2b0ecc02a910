//! Declarative schema descriptors
//!
//! A `Schema` describes the shape a generated payload must have:
//! required fields, primitive types, closed enumerated value sets,
//! array cardinality, bounded numeric ranges, and recursive
//! substructure for syntax-tree-like data. Schemas are built once per
//! endpoint and shared read-only across concurrent requests.

/// Structural schema for a JSON value
#[derive(Debug, Clone)]
pub enum Schema {
    /// Any JSON value
    Any,
    /// A boolean
    Bool,
    /// A string, optionally required to contain fixed markers
    String { must_contain: Vec<String> },
    /// An integer with optional inclusive bounds
    Integer { min: Option<i64>, max: Option<i64> },
    /// A number with optional inclusive bounds
    Number { min: Option<f64>, max: Option<f64> },
    /// A string drawn from a closed vocabulary
    Enum { values: Vec<String> },
    /// An array with optional inclusive length bounds
    Array {
        items: Box<Schema>,
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    /// An object with declared fields
    Object { fields: Vec<Field> },
    /// A string-keyed map with unconstrained values
    Map,
    /// Introduces a recursion point; `SelfRef` nodes inside refer back
    /// to the nearest enclosing `Recursive`
    Recursive(Box<Schema>),
    /// Reference to the nearest enclosing `Recursive` binder
    SelfRef,
}

/// One declared object field
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
    /// Whether an explicit JSON null satisfies the field
    pub nullable: bool,
}

impl Field {
    /// A field that must be present
    pub fn required(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            schema,
            required: true,
            nullable: false,
        }
    }

    /// A field that may be absent
    pub fn optional(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            schema,
            required: false,
            nullable: false,
        }
    }

    /// Additionally accept an explicit null
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl Schema {
    /// An unconstrained string
    pub fn string() -> Self {
        Schema::String { must_contain: Vec::new() }
    }

    /// A string that must contain every listed marker
    pub fn string_containing(markers: &[&str]) -> Self {
        Schema::String {
            must_contain: markers.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// An unbounded integer
    pub fn integer() -> Self {
        Schema::Integer { min: None, max: None }
    }

    /// An integer within an inclusive range
    pub fn bounded_integer(min: i64, max: i64) -> Self {
        Schema::Integer { min: Some(min), max: Some(max) }
    }

    /// A string drawn from a closed vocabulary
    pub fn enumeration(values: &[&str]) -> Self {
        Schema::Enum {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// An array of any length
    pub fn array_of(items: Schema) -> Self {
        Schema::Array { items: Box::new(items), min_len: None, max_len: None }
    }

    /// An array of exactly `len` elements
    pub fn array_exactly(items: Schema, len: usize) -> Self {
        Schema::Array {
            items: Box::new(items),
            min_len: Some(len),
            max_len: Some(len),
        }
    }

    /// An object with the given fields
    pub fn object(fields: Vec<Field>) -> Self {
        Schema::Object { fields }
    }

    /// A recursive structure whose `SelfRef` nodes refer back here
    pub fn recursive(inner: Schema) -> Self {
        Schema::Recursive(Box::new(inner))
    }
}
