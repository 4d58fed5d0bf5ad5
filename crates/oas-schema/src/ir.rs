//! The normalized intermediate representation both emitters lower from.

use indexmap::IndexMap;

/// A proto/Go scalar, independent of target language spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
}

/// The type of a field, once arrays (`repeated`) are stripped off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(ScalarType),
    /// A reference to another named schema (message, union wrapper, or enum).
    NamedRef(String),
    Timestamp,
    Bytes,
    /// A reference to a generated (nested or top-level) integer enum.
    Enum(String),
}

/// A member of a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Sanitized, message-unique identifier.
    pub name: String,
    /// Original property name, preserved for `json_name`/JSON tags.
    pub json_name: String,
    pub type_ref: TypeRef,
    pub repeated: bool,
    pub description: Option<String>,
    /// Inline string-enum values, rendered as a documentation comment.
    pub enum_values: Option<Vec<String>>,
    /// Explicit `x-proto-number`, if the owning message uses explicit numbering.
    pub number: Option<i64>,
}

/// A generated integer enum (always proto-side).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    /// `(symbol, number)` pairs; index 0 is always `(UNSPECIFIED, 0)`.
    pub values: Vec<(String, i64)>,
}

impl EnumDef {
    pub fn from_symbols(name: String, description: Option<String>, symbols: &[String]) -> Self {
        let mut values = vec![("UNSPECIFIED".to_string(), 0)];
        for (i, symbol) in symbols.iter().enumerate() {
            values.push((symbol.clone(), (i + 1) as i64));
        }
        Self {
            name,
            description,
            values,
        }
    }
}

/// A generated record type: either a regular message (fields only) or a
/// union wrapper (variants only).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub original_schema_name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    /// Inline objects hoisted from properties, sharing this message's scope.
    pub nested_messages: Vec<Message>,
    /// Inline integer enums hoisted from properties, sharing this message's scope.
    pub nested_enums: Vec<EnumDef>,
    pub is_union: bool,
    /// Ordered variant type names, present only when `is_union`.
    pub union_variants: Vec<String>,
    pub discriminator_property: Option<String>,
    /// Lowercased discriminator value -> variant type name.
    pub discriminator_map: IndexMap<String, String>,
}

impl Message {
    pub fn regular(name: String, original_schema_name: String) -> Self {
        Self {
            name,
            original_schema_name,
            description: None,
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            is_union: false,
            union_variants: Vec::new(),
            discriminator_property: None,
            discriminator_map: IndexMap::new(),
        }
    }
}

/// One top-level generated item, in source (schema-declaration) order.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Message(Message),
    Enum(EnumDef),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Message(m) => &m.name,
            Definition::Enum(e) => &e.name,
        }
    }

    pub fn original_schema_name(&self) -> &str {
        match self {
            Definition::Message(m) => &m.original_schema_name,
            Definition::Enum(e) => &e.name,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Definition::Message(m) => Some(m),
            Definition::Enum(_) => None,
        }
    }
}
