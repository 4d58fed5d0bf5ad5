//! Public facade wiring the schema/classifier, both emitters, and the
//! example engine into three entry points.
//!
//! Everything here is thin: parse + build + classify once
//! ([`oas_schema::load`]), then hand the same IR to whichever emitter the
//! caller asked for. The example pipeline is independent of classification
//! and is forwarded to [`oas_example`] untouched.

use indexmap::IndexMap;

pub use oas_example::{ExampleOptions, ExampleResult};
pub use oas_schema::classify::{Location, TypeMapEntry};
pub use oas_schema::error::{Error, Result};

/// `name -> { location, reason }`, one entry per `components.schemas` name.
pub type TypeMap = IndexMap<String, TypeMapEntry>;

/// Options for the combined proto3 + Go-struct pipeline.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub package_name: String,
    pub package_path: String,
    /// Defaults to `package_path` when absent.
    pub go_package_path: Option<String>,
}

/// Options for the struct-only pipeline, which bypasses classification and
/// emits every schema as a Go struct.
#[derive(Debug, Clone)]
pub struct StructOnlyOptions {
    pub go_package_path: String,
}

/// Result of [`convert`]. Either byte block may be empty: proto is empty iff
/// every type is in `StructSet`, and struct output is empty iff every type is
/// in `ProtoSet`.
#[derive(Debug, Clone, Default)]
pub struct ConvertResult {
    pub protobuf_bytes: Vec<u8>,
    pub struct_bytes: Vec<u8>,
    pub type_map: TypeMap,
}

/// Result of [`generate_structs`].
#[derive(Debug, Clone, Default)]
pub struct StructResult {
    pub struct_bytes: Vec<u8>,
    pub type_map: TypeMap,
}

/// Parse `doc_bytes`, build the IR, classify it into `ProtoSet`/`StructSet`,
/// and lower each half into its target text.
pub fn convert(doc_bytes: &[u8], options: ConvertOptions) -> Result<ConvertResult> {
    if options.package_name.is_empty() {
        return Err(Error::MissingOption("package_name"));
    }
    if options.package_path.is_empty() {
        return Err(Error::MissingOption("package_path"));
    }
    let go_package_path = options
        .go_package_path
        .clone()
        .unwrap_or_else(|| options.package_path.clone());

    tracing::info!(package = %options.package_name, "converting OpenAPI document");

    let (output, classification) = oas_schema::load(doc_bytes)?;

    let proto_bytes = oas_gen_proto::generate_proto_file(
        &output.definitions,
        &classification,
        &oas_gen_proto::GenerateProtoOptions {
            package_name: &options.package_name,
            go_package_path: &go_package_path,
        },
    )
    .into_bytes();

    let struct_bytes = if classification.struct_set.is_empty() {
        Vec::new()
    } else {
        oas_gen_go::generate_go_package(
            &output.definitions,
            Some(&classification.struct_set),
            &go_package_path,
        )
        .into_bytes()
    };

    Ok(ConvertResult {
        protobuf_bytes: proto_bytes,
        struct_bytes,
        type_map: classification.type_map(),
    })
}

/// Build the IR, skip classification, and emit every schema as a Go struct.
/// `type_map` still reflects the would-be classification so callers can tell
/// which types would normally have gone proto-side.
pub fn generate_structs(doc_bytes: &[u8], options: StructOnlyOptions) -> Result<StructResult> {
    if options.go_package_path.is_empty() {
        return Err(Error::MissingOption("go_package_path"));
    }

    tracing::info!(go_package_path = %options.go_package_path, "generating struct-only package");

    let (output, classification) = oas_schema::load(doc_bytes)?;
    let struct_bytes =
        oas_gen_go::generate_go_package(&output.definitions, None, &options.go_package_path)
            .into_bytes();

    Ok(StructResult {
        struct_bytes,
        type_map: classification.type_map(),
    })
}

/// Synthesize deterministic JSON examples. Forwarded verbatim to
/// [`oas_example::generate_examples`] - the example engine reads the raw
/// schema view, not the IR, and never consults classification.
pub fn generate_examples(doc_bytes: &[u8], options: ExampleOptions) -> Result<ExampleResult> {
    oas_example::generate_examples(doc_bytes, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_empty_package_name_is_a_missing_option() {
        let err = convert(
            br#"{"openapi":"3.0.3","components":{"schemas":{}}}"#,
            ConvertOptions {
                package_name: String::new(),
                package_path: "github.com/example/proto/v1".to_string(),
                go_package_path: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingOption("package_name")));
    }

    #[test]
    fn go_package_path_defaults_to_package_path() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "User": {"type":"object","properties":{"name":{"type":"string"}}}
            }}
        }"#;
        let result = convert(
            bytes,
            ConvertOptions {
                package_name: "testpkg".to_string(),
                package_path: "github.com/example/proto/v1".to_string(),
                go_package_path: None,
            },
        )
        .unwrap();
        let proto = String::from_utf8(result.protobuf_bytes).unwrap();
        assert!(proto.contains("option go_package = \"github.com/example/proto/v1\";"));
    }

    #[test]
    fn struct_only_mode_rejects_empty_go_package_path() {
        let bytes = br#"{"openapi":"3.0.3","components":{"schemas":{}}}"#;
        let err = generate_structs(
            bytes,
            StructOnlyOptions {
                go_package_path: String::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingOption("go_package_path")));
    }
}
