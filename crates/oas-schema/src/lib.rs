//! OpenAPI component-schema ingestion, IR construction, validation,
//! dependency-graph analysis and Go/proto classification.
//!
//! This crate owns the front half of the pipeline: raw document bytes in,
//! a normalized IR plus a struct/proto partition out. The two code
//! emitters and the example engine live in sibling crates and consume
//! only [`ir`] and [`classify`] types.

pub mod builder;
pub mod classify;
pub mod document;
pub mod error;
pub mod graph;
pub mod ir;
pub mod naming;

pub use builder::{BuildOutput, build};
pub use classify::{Classification, Location, TypeMapEntry, classify};
pub use document::{OpenApiDocument, RawSchema, parse_document, parse_ref, schema_entries};
pub use error::{Error, Result};
pub use graph::{DependencyGraph, GraphNode};
pub use ir::{Definition, EnumDef, Field, Message, ScalarType, TypeRef};

/// Parse, build the IR, and classify in one call - the shape every
/// top-level facade in `oas-codegen` wraps.
pub fn load(doc_bytes: &[u8]) -> Result<(BuildOutput, Classification)> {
    let doc = document::parse_document(doc_bytes)?;
    let output = builder::build(&doc)?;
    let classification = classify::classify(&output.graph);
    Ok((output, classification))
}
