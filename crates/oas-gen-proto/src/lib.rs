//! Proto3 schema generation for the `ProtoSet` half of a classified
//! OpenAPI document.

pub mod emit;

pub use emit::{GenerateProtoOptions, generate_proto_file};
