//! Error taxonomy for schema ingestion, validation and classification.
//!
//! Messages are substring-matched by callers, so the exact phrases below
//! are contract, not style.

use thiserror::Error;

/// Errors produced while parsing, validating or classifying an OpenAPI
/// document.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input document is empty")]
    EmptyInput,

    #[error("required option '{0}' is missing")]
    MissingOption(&'static str),

    #[error("selection must not be empty when include_all is false")]
    EmptySelection,

    #[error("failed to parse OpenAPI document: {0}")]
    Parse(String),

    #[error("supplied spec is a different version")]
    UnsupportedVersion,

    #[error("spec type not supported")]
    UnsupportedSpecType,

    #[error("allOf is not supported")]
    AllOfUnsupported,

    #[error("anyOf is not supported")]
    AnyOfUnsupported,

    #[error("not is not supported")]
    NotUnsupported,

    #[error("oneOf without a discriminator is not supported")]
    OneOfWithoutDiscriminator,

    #[error("inline oneOf variants are not supported; every variant must be a $ref")]
    InlineOneOfVariant,

    #[error("oneOf variant '{0}' does not define the discriminator property '{1}'")]
    VariantMissingDiscriminatorProperty(String, String),

    #[error("oneOf is only supported as a top-level discriminated union")]
    UnsupportedNestedCombinator,

    #[error("only objects and enums supported at top level")]
    UnsupportedTopLevelShape,

    #[error("nested arrays (array of array) are not supported")]
    NestedArraysUnsupported,

    #[error("multi-type properties are only supported as a nullable decoration of a single type")]
    UnsupportedMultiType,

    #[error("invalid schema: minLength > maxLength")]
    MinLengthGreaterThanMaxLength,

    #[error("invalid schema: minItems > maxItems")]
    MinItemsGreaterThanMaxItems,

    #[error("array must have items defined")]
    ArrayMissingItems,

    #[error("enum schema must declare an explicit type")]
    EnumMissingType,

    #[error("enum values must all be of the declared type")]
    EnumMixedTypes,

    #[error("enum values must not be null or empty")]
    EnumNullOrEmptyValue,

    #[error("x-proto-number must be a valid integer")]
    InvalidFieldNumberNotInteger,

    #[error("x-proto-number {0} is out of range (1..=536870911)")]
    InvalidFieldNumberOutOfRange(i64),

    #[error("x-proto-number {0} falls in the reserved range 19000..=19999")]
    InvalidFieldNumberReserved(i64),

    #[error("x-proto-number {0} is duplicated within message '{1}'")]
    DuplicateFieldNumber(i64, String),

    #[error(
        "x-proto-number must be specified on all fields or none (found on {found} of {total} fields)"
    )]
    MixedFieldNumbers { found: usize, total: usize },

    #[error("invalid reference '{0}': must be of the form #/components/schemas/<Name>")]
    InvalidReference(String),

    #[error("invalid reference: empty schema name")]
    EmptyReferenceName,

    #[error("field override for '{0}' has wrong type")]
    InvalidExampleOverrideType(String),

    #[error("cannot derive message/enum name from plural array property '{0}'")]
    PluralArrayPropertyName(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
