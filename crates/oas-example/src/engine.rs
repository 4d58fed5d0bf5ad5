//! The per-schema recursive walk: constraint resolution, field-name
//! heuristics, cycle/depth guarding, and the seeded PRNG.

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use oas_schema::document::{RawSchema, parse_document, parse_ref};
use oas_schema::error::{Error, Result};

const DEFAULT_MAX_DEPTH: u32 = 5;

/// Inputs to a single example-generation call.
#[derive(Debug, Clone)]
pub struct ExampleOptions {
    /// Generate exactly these schemas. Ignored when `include_all` is true.
    pub schema_names: Option<Vec<String>>,
    pub include_all: bool,
    /// Cycle/depth guard bound; must be consulted before every `$ref` hop.
    pub max_depth: u32,
    /// `0` substitutes a wall-clock-derived seed once at entry.
    pub seed: u64,
    pub field_overrides: IndexMap<String, Value>,
}

impl Default for ExampleOptions {
    fn default() -> Self {
        Self {
            schema_names: None,
            include_all: false,
            max_depth: DEFAULT_MAX_DEPTH,
            seed: 0,
            field_overrides: IndexMap::new(),
        }
    }
}

/// `name -> generated JSON document bytes`.
#[derive(Debug, Clone, Default)]
pub struct ExampleResult {
    pub examples: IndexMap<String, Vec<u8>>,
}

/// Parse `doc_bytes`, select schemas per `options`, and synthesize one JSON
/// document per selected schema using a single PRNG seeded once and reused
/// across the whole call.
pub fn generate_examples(doc_bytes: &[u8], options: &ExampleOptions) -> Result<ExampleResult> {
    let doc = parse_document(doc_bytes)?;
    let schemas = doc.components.schemas;

    let selection: Vec<String> = if options.include_all {
        schemas.keys().cloned().collect()
    } else {
        let names = options.schema_names.clone().unwrap_or_default();
        if names.is_empty() {
            return Err(Error::EmptySelection);
        }
        names
    };

    let seed = if options.seed == 0 {
        time_based_seed()
    } else {
        options.seed
    };

    let mut walker = Walker {
        schemas: &schemas,
        overrides: &options.field_overrides,
        max_depth: options.max_depth,
        rng: StdRng::seed_from_u64(seed),
    };

    let mut examples = IndexMap::new();
    for name in &selection {
        let value = walker.generate_named(name)?;
        let bytes = serde_json::to_vec(&value).expect("generated examples are always valid JSON");
        examples.insert(name.clone(), bytes);
    }
    Ok(ExampleResult { examples })
}

fn time_based_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Per-call walk state: the schema table, the override map, the depth
/// bound, and the single reused PRNG, threaded explicitly rather than
/// reached for through global state.
struct Walker<'a> {
    schemas: &'a IndexMap<String, RawSchema>,
    overrides: &'a IndexMap<String, Value>,
    max_depth: u32,
    rng: StdRng,
}

const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const CURSOR_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

impl<'a> Walker<'a> {
    fn generate_named(&mut self, name: &str) -> Result<Value> {
        let schema = self
            .schemas
            .get(name)
            .ok_or_else(|| Error::InvalidReference(name.to_string()))?;
        let mut path = vec![name.to_string()];
        let value = self.generate(None, schema, &mut path, 0)?;
        Ok(value.unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Resolve one property/item value, honoring the
    /// Example > Default > Override > Heuristic > Generated precedence
    /// and the `$ref` cycle/depth guard. Returns `None` when the guard
    /// fires, so the caller can drop the key/item and keep going.
    fn generate(
        &mut self,
        field_name: Option<&str>,
        schema: &RawSchema,
        path: &mut Vec<String>,
        depth: u32,
    ) -> Result<Option<Value>> {
        if let Some(example) = &schema.example {
            return Ok(Some(coerce_numeric(schema, example)));
        }
        if let Some(default) = &schema.default {
            return Ok(Some(coerce_numeric(schema, default)));
        }
        if !schema.is_ref() {
            if let Some(name) = field_name {
                if let Some(override_value) = self.overrides.get(name) {
                    return Ok(Some(apply_override(schema, name, override_value)?));
                }
            }
        }

        if schema.is_ref() {
            let target_name = parse_ref(schema.ref_.as_ref().expect("checked is_ref()"))?;
            if path.contains(&target_name) || depth >= self.max_depth {
                return Ok(None);
            }
            let target = self
                .schemas
                .get(&target_name)
                .ok_or_else(|| Error::InvalidReference(target_name.clone()))?;
            path.push(target_name);
            let result = self.generate(field_name, target, path, depth + 1);
            path.pop();
            return result;
        }

        let effective_type = schema.effective_type()?;
        match effective_type.as_deref() {
            Some("integer") => Ok(Some(self.generate_integer(schema))),
            Some("number") => Ok(Some(self.generate_number(schema))),
            Some("boolean") => Ok(Some(self.generate_boolean())),
            Some("array") => self.generate_array(schema, path, depth),
            Some("object") => self.generate_object(schema, path, depth),
            Some("string") => Ok(Some(self.generate_string(field_name, schema))),
            None if !schema.properties.is_empty() => self.generate_object(schema, path, depth),
            _ => Ok(Some(self.generate_string(field_name, schema))),
        }
    }

    fn generate_object(
        &mut self,
        schema: &RawSchema,
        path: &mut Vec<String>,
        depth: u32,
    ) -> Result<Option<Value>> {
        let mut map = Map::with_capacity(schema.properties.len());
        for (prop_name, prop_schema) in &schema.properties {
            if let Some(value) = self.generate(Some(prop_name), prop_schema, path, depth)? {
                map.insert(prop_name.clone(), value);
            }
        }
        Ok(Some(Value::Object(map)))
    }

    fn generate_array(
        &mut self,
        schema: &RawSchema,
        path: &mut Vec<String>,
        depth: u32,
    ) -> Result<Option<Value>> {
        let base = schema.min_items.unwrap_or(0).max(1);
        let len = match schema.max_items {
            Some(max_items) => base.min(max_items),
            None => base,
        };
        let mut items = Vec::with_capacity(len);
        if let Some(item_schema) = &schema.items {
            for _ in 0..len {
                if let Some(value) = self.generate(None, item_schema, path, depth)? {
                    items.push(value);
                }
            }
        }
        Ok(Some(Value::Array(items)))
    }

    fn generate_integer(&mut self, schema: &RawSchema) -> Value {
        let lo = schema.minimum.unwrap_or(1.0);
        let hi = schema.maximum.unwrap_or(100.0);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (lo, lo) };
        let lo = lo.round() as i64;
        let hi = hi.round() as i64;
        let value = if lo >= hi {
            lo
        } else {
            self.rng.gen_range(lo..=hi)
        };
        Value::from(value)
    }

    fn generate_number(&mut self, schema: &RawSchema) -> Value {
        let lo = schema.minimum.unwrap_or(1.0);
        let hi = schema.maximum.unwrap_or(100.0);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (lo, lo) };
        let value = if hi - lo < f64::EPSILON {
            lo
        } else {
            self.rng.gen_range(lo..hi)
        };
        Value::from(value)
    }

    fn generate_boolean(&mut self) -> Value {
        Value::Bool(false)
    }

    fn generate_string(&mut self, field_name: Option<&str>, schema: &RawSchema) -> Value {
        // A declared enum fixes the value domain, so it wins over the
        // name heuristic even for fields like `message`/`error`/`cursor` -
        // a heuristic string would otherwise violate the enum constraint.
        if let Some(values) = &schema.enum_values {
            if let Some(first) = values.first() {
                return first.clone();
            }
        }

        let mut generated = if let Some(name) = field_name {
            if let Some(value) = self.heuristic_by_name(name) {
                value
            } else {
                self.generate_by_format(schema.format.as_deref())
            }
        } else {
            self.generate_by_format(schema.format.as_deref())
        };

        generated = self.apply_length_constraints(generated, schema);
        Value::String(generated)
    }

    /// Case-insensitive field-name heuristics, checked before `format`.
    fn heuristic_by_name(&mut self, name: &str) -> Option<String> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "cursor" | "first" | "after" => {
                let len = self.rng.gen_range(16..=32);
                Some(self.random_string(len, CURSOR_CHARSET))
            }
            "error" => Some("An error occurred".to_string()),
            "message" => Some("This is a message".to_string()),
            _ => None,
        }
    }

    fn generate_by_format(&mut self, format: Option<&str>) -> String {
        match format {
            Some("email") => "user@example.com".to_string(),
            Some("uuid") => self.random_uuid(),
            Some("uri") => format!("https://example.com/{}", self.random_string(8, ALNUM)),
            Some("date") => self.random_date(),
            Some("date-time") => format!("{}T00:00:00Z", self.random_date()),
            Some("hostname") => format!("{}.example.com", self.random_string(6, ALNUM)),
            _ => self.random_string(10, ALNUM),
        }
    }

    fn random_uuid(&mut self) -> String {
        let groups = [8, 4, 4, 4, 12];
        groups
            .iter()
            .map(|&len| self.random_hex(len))
            .collect::<Vec<_>>()
            .join("-")
    }

    fn random_hex(&mut self, len: usize) -> String {
        const HEX: &[u8] = b"0123456789abcdef";
        self.random_string(len, HEX)
    }

    fn random_date(&mut self) -> String {
        let year = 2020 + self.rng.gen_range(0..5);
        let month = self.rng.gen_range(1..=12);
        let day = self.rng.gen_range(1..=28);
        format!("{year:04}-{month:02}-{day:02}")
    }

    fn random_string(&mut self, len: usize, charset: &[u8]) -> String {
        (0..len)
            .map(|_| {
                let idx = self.rng.gen_range(0..charset.len());
                charset[idx] as char
            })
            .collect()
    }

    /// Pad (preserving `@`/`://` structure) or truncate to satisfy
    /// `minLength`/`maxLength`.
    fn apply_length_constraints(&mut self, s: String, schema: &RawSchema) -> String {
        let mut s = s;
        if let Some(min_length) = schema.min_length {
            let current = s.chars().count();
            if current < min_length {
                let deficit = min_length - current;
                let filler = self.random_string(deficit, ALNUM);
                s = if let Some(at) = s.find('@') {
                    let (local, domain) = s.split_at(at);
                    format!("{local}{filler}{domain}")
                } else {
                    format!("{s}{filler}")
                };
            }
        }
        if let Some(max_length) = schema.max_length {
            if s.chars().count() > max_length {
                s = s.chars().take(max_length).collect();
            }
        }
        s
    }
}

/// Downcast a JSON `example`/`default` value to the schema's declared
/// numeric type (e.g. `5.0` on an `integer` field becomes `5`).
fn coerce_numeric(schema: &RawSchema, value: &Value) -> Value {
    let Ok(Some(ty)) = schema.effective_type() else {
        return value.clone();
    };
    match ty {
        "integer" => match value.as_f64() {
            Some(f) => Value::from(f.round() as i64),
            None => value.clone(),
        },
        "number" => match value.as_f64() {
            Some(f) => Value::from(f),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

fn apply_override(schema: &RawSchema, field_name: &str, value: &Value) -> Result<Value> {
    let ty = schema.effective_type()?.unwrap_or("string");
    let matches_type = match ty {
        "integer" => value.as_f64().is_some_and(|f| f.fract() == 0.0),
        "number" => value.is_number(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        _ => true,
    };
    if !matches_type {
        return Err(Error::InvalidExampleOverrideType(field_name.to_string()));
    }
    Ok(value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(names: &[&str], seed: u64) -> ExampleOptions {
        ExampleOptions {
            schema_names: Some(names.iter().map(|s| s.to_string()).collect()),
            include_all: false,
            max_depth: 5,
            seed,
            field_overrides: IndexMap::new(),
        }
    }

    #[test]
    fn string_enum_picks_first_declared_value() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Status": {"type":"object","properties":{
                    "state": {"type":"string","enum":["pending","active","completed"]}
                }}
            }}
        }"#;
        let result = generate_examples(bytes, &opts(&["Status"], 42)).unwrap();
        let value: Value = serde_json::from_slice(&result.examples["Status"]).unwrap();
        assert_eq!(value, serde_json::json!({"state": "pending"}));
    }

    #[test]
    fn same_seed_is_byte_identical_across_runs() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Thing": {"type":"object","properties":{
                    "count": {"type":"integer","minimum":10,"maximum":50}
                }}
            }}
        }"#;
        let a = generate_examples(bytes, &opts(&["Thing"], 42)).unwrap();
        let b = generate_examples(bytes, &opts(&["Thing"], 42)).unwrap();
        assert_eq!(a.examples["Thing"], b.examples["Thing"]);
    }

    #[test]
    fn integer_respects_declared_bounds() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Thing": {"type":"object","properties":{
                    "count": {"type":"integer","minimum":10,"maximum":50}
                }}
            }}
        }"#;
        let result = generate_examples(bytes, &opts(&["Thing"], 42)).unwrap();
        let value: Value = serde_json::from_slice(&result.examples["Thing"]).unwrap();
        let count = value["count"].as_i64().unwrap();
        assert!((10..=50).contains(&count));
    }

    #[test]
    fn circular_reference_terminates_and_omits_the_cycle_edge() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Node": {"type":"object","properties":{
                    "value": {"type":"integer"},
                    "next": {"$ref":"#/components/schemas/Node"}
                }}
            }}
        }"#;
        let result = generate_examples(bytes, &opts(&["Node"], 7)).unwrap();
        let value: Value = serde_json::from_slice(&result.examples["Node"]).unwrap();
        assert!(value.get("value").is_some());
        assert!(value.get("next").is_none());
    }

    #[test]
    fn example_takes_precedence_over_override() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Thing": {"type":"object","properties":{
                    "name": {"type":"string","example":"fixed-value"}
                }}
            }}
        }"#;
        let mut options = opts(&["Thing"], 1);
        options
            .field_overrides
            .insert("name".to_string(), serde_json::json!("override-value"));
        let result = generate_examples(bytes, &options).unwrap();
        let value: Value = serde_json::from_slice(&result.examples["Thing"]).unwrap();
        assert_eq!(value["name"], "fixed-value");
    }

    #[test]
    fn override_with_wrong_type_errors() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Thing": {"type":"object","properties":{
                    "count": {"type":"integer"}
                }}
            }}
        }"#;
        let mut options = opts(&["Thing"], 1);
        options
            .field_overrides
            .insert("count".to_string(), serde_json::json!("not-a-number"));
        let err = generate_examples(bytes, &options).unwrap_err();
        assert!(matches!(err, Error::InvalidExampleOverrideType(ref f) if f == "count"));
    }

    #[test]
    fn empty_selection_without_include_all_errors() {
        let bytes = br#"{"openapi":"3.0.3","components":{"schemas":{}}}"#;
        let options = ExampleOptions {
            schema_names: None,
            include_all: false,
            ..ExampleOptions::default()
        };
        let err = generate_examples(bytes, &options).unwrap_err();
        assert!(matches!(err, Error::EmptySelection));
    }

    #[test]
    fn enum_values_win_over_name_heuristic_for_heuristic_named_fields() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Response": {"type":"object","properties":{
                    "message": {"type":"string","enum":["ok","degraded"]},
                    "cursor": {"type":"string","enum":["none"]}
                }}
            }}
        }"#;
        let result = generate_examples(bytes, &opts(&["Response"], 9)).unwrap();
        let value: Value = serde_json::from_slice(&result.examples["Response"]).unwrap();
        assert_eq!(value["message"], "ok");
        assert_eq!(value["cursor"], "none");
    }

    #[test]
    fn cursor_field_uses_cursor_charset_heuristic() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Page": {"type":"object","properties":{
                    "cursor": {"type":"string"}
                }}
            }}
        }"#;
        let result = generate_examples(bytes, &opts(&["Page"], 9)).unwrap();
        let value: Value = serde_json::from_slice(&result.examples["Page"]).unwrap();
        let cursor = value["cursor"].as_str().unwrap();
        assert!((16..=32).contains(&cursor.len()));
    }

    #[test]
    fn array_length_respects_min_and_max_items() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Thing": {"type":"object","properties":{
                    "tags": {"type":"array","items":{"type":"string"},"minItems":3,"maxItems":5}
                }}
            }}
        }"#;
        let result = generate_examples(bytes, &opts(&["Thing"], 3)).unwrap();
        let value: Value = serde_json::from_slice(&result.examples["Thing"]).unwrap();
        let len = value["tags"].as_array().unwrap().len();
        assert!((3..=5).contains(&len));
    }
}
