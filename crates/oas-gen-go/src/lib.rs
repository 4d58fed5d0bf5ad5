//! Go struct/JSON code generation for the `StructSet` half of a classified
//! OpenAPI document.

pub mod emit;

pub use emit::generate_go_package;
