//! Deterministic JSON example synthesis over OpenAPI component schemas.
//!
//! Independent of the struct/proto classifier: this crate walks the same
//! raw schema view [`oas_schema::document`] exposes, not the IR, since
//! constraint- and heuristic-driven generation needs the original
//! `minimum`/`maximum`/`format`/`example` fields the IR already folded
//! away.

mod engine;

pub use engine::{ExampleOptions, ExampleResult, generate_examples};
