//! The resolved OpenAPI document view this crate builds its IR from.
//!
//! Real OpenAPI documents are parsed and `$ref`-resolved upstream of this
//! crate; here we only need a typed, order-preserving projection of
//! `components.schemas` and the handful of per-schema fields the IR
//! builder and example engine read. `IndexMap` is used everywhere document
//! order matters, since it is load-bearing for output determinism.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// A minimally-parsed OpenAPI 3.x document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: Option<String>,
    pub swagger: Option<String>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, RawSchema>,
}

/// `type:` can be a single string or (OpenAPI 3.1+) an array of strings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SchemaTypeSet {
    Single(String),
    Multi(Vec<String>),
}

impl SchemaTypeSet {
    /// Non-null member types, in declaration order.
    pub fn non_null_types(&self) -> Vec<&str> {
        match self {
            SchemaTypeSet::Single(t) => vec![t.as_str()],
            SchemaTypeSet::Multi(types) => types
                .iter()
                .map(String::as_str)
                .filter(|t| *t != "null")
                .collect(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            SchemaTypeSet::Single(_) => false,
            SchemaTypeSet::Multi(types) => types.iter().any(|t| t == "null"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Discriminator {
    #[serde(rename = "propertyName")]
    pub property_name: Option<String>,
    #[serde(default)]
    pub mapping: IndexMap<String, String>,
}

/// A resolved schema node: either a `$ref` or an inline schema body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSchema {
    #[serde(rename = "$ref")]
    pub ref_: Option<String>,

    #[serde(rename = "type", default)]
    pub schema_type: Option<SchemaTypeSet>,

    pub format: Option<String>,

    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,

    #[serde(default)]
    pub properties: IndexMap<String, RawSchema>,

    #[serde(default)]
    pub required: Vec<String>,

    pub items: Option<Box<RawSchema>>,

    #[serde(rename = "oneOf")]
    pub one_of: Option<Vec<RawSchema>>,

    #[serde(rename = "allOf")]
    pub all_of: Option<Vec<RawSchema>>,

    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<RawSchema>>,

    pub not: Option<Box<RawSchema>>,

    pub discriminator: Option<Discriminator>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,

    #[serde(rename = "minLength")]
    pub min_length: Option<usize>,
    #[serde(rename = "maxLength")]
    pub max_length: Option<usize>,

    #[serde(rename = "minItems")]
    pub min_items: Option<usize>,
    #[serde(rename = "maxItems")]
    pub max_items: Option<usize>,

    pub description: Option<String>,
    pub example: Option<serde_json::Value>,
    pub default: Option<serde_json::Value>,

    /// Catches vendor extensions (`x-proto-number`, etc.) and any other
    /// unrecognized keys.
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl RawSchema {
    /// The single non-`null` type declared, or `None` if untyped.
    ///
    /// Returns `Err` if the schema declares more than one non-null type.
    pub fn effective_type(&self) -> Result<Option<&str>> {
        let Some(type_set) = &self.schema_type else {
            return Ok(None);
        };
        let non_null = type_set.non_null_types();
        match non_null.len() {
            0 => Ok(None),
            1 => Ok(Some(non_null[0])),
            _ => Err(Error::UnsupportedMultiType),
        }
    }

    /// Vendor extension value for `x-proto-number`, if present.
    pub fn proto_number_extension(&self) -> Option<&serde_json::Value> {
        self.extensions.get("x-proto-number")
    }

    pub fn is_ref(&self) -> bool {
        self.ref_.is_some()
    }
}

/// Parse raw OpenAPI document bytes (YAML or JSON).
pub fn parse_document(bytes: &[u8]) -> Result<OpenApiDocument> {
    if bytes.is_empty() {
        return Err(Error::EmptyInput);
    }
    let doc: OpenApiDocument = match serde_json::from_slice(bytes) {
        Ok(doc) => doc,
        Err(json_err) => {
            serde_yaml::from_slice(bytes).map_err(|_| Error::Parse(json_err.to_string()))?
        }
    };
    validate_version(&doc)?;
    Ok(doc)
}

fn validate_version(doc: &OpenApiDocument) -> Result<()> {
    if let Some(swagger) = &doc.swagger {
        if swagger.starts_with("2.") {
            return Err(Error::UnsupportedVersion);
        }
    }
    match &doc.openapi {
        Some(v) if v.starts_with("3.") => Ok(()),
        Some(_) => Err(Error::UnsupportedVersion),
        None => Err(Error::UnsupportedSpecType),
    }
}

/// Ordered `(name, schema)` entries from `components.schemas`.
pub fn schema_entries(doc: &OpenApiDocument) -> Vec<(String, RawSchema)> {
    doc.components
        .schemas
        .iter()
        .map(|(name, schema)| (name.clone(), schema.clone()))
        .collect()
}

/// Parse `#/components/schemas/<Name>` into `<Name>`.
pub fn parse_ref(reference: &str) -> Result<String> {
    const PREFIX: &str = "#/components/schemas/";
    if let Some(name) = reference.strip_prefix(PREFIX) {
        if name.is_empty() {
            return Err(Error::EmptyReferenceName);
        }
        Ok(name.to_string())
    } else {
        Err(Error::InvalidReference(reference.to_string()))
    }
}
