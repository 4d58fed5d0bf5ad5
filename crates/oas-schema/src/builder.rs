//! Walks the raw document into the normalized IR, validating domain
//! invariants along the way.

use indexmap::IndexMap;

use crate::document::{OpenApiDocument, RawSchema, parse_ref, schema_entries};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::ir::{Definition, EnumDef, Field, Message, ScalarType, TypeRef};
use crate::naming::{NameTracker, is_plural, sanitize_identifier, to_pascal_case};

/// Output of a full build pass: ordered top-level definitions plus the
/// dependency graph the classifier partitions.
pub struct BuildOutput {
    pub definitions: Vec<Definition>,
    pub graph: DependencyGraph,
}

/// Build the IR and dependency graph from a parsed OpenAPI document.
pub fn build(doc: &OpenApiDocument) -> Result<BuildOutput> {
    let entries = schema_entries(doc);
    let by_name: IndexMap<String, RawSchema> = entries.iter().cloned().collect();

    let mut builder = Builder {
        by_name: &by_name,
        graph: DependencyGraph::new(),
    };

    let mut definitions = Vec::with_capacity(entries.len());
    for (name, schema) in &entries {
        builder.graph.ensure_node(name);
        #[cfg(feature = "tracing")]
        tracing::debug!(schema = %name, "building IR entry");
        let definition = builder.build_top_level(name, schema)?;
        definitions.push(definition);
    }

    Ok(BuildOutput {
        definitions,
        graph: builder.graph,
    })
}

struct Builder<'a> {
    by_name: &'a IndexMap<String, RawSchema>,
    graph: DependencyGraph,
}

impl<'a> Builder<'a> {
    fn build_top_level(&mut self, name: &str, schema: &RawSchema) -> Result<Definition> {
        validate_schema_constraints(schema)?;

        if let Some(variants) = &schema.one_of {
            if !variants.is_empty() {
                return self.build_union(name, schema, variants);
            }
        }

        let effective_type = schema.effective_type()?;
        match effective_type {
            Some("object") => self
                .build_object_message(&to_pascal_case(name), name, schema, name)
                .map(Definition::Message),
            Some("integer") if schema.enum_values.is_some() => self.build_top_level_enum(name, schema),
            _ => Err(Error::UnsupportedTopLevelShape),
        }
    }

    fn build_top_level_enum(&self, name: &str, schema: &RawSchema) -> Result<Definition> {
        validate_enum(schema)?;
        let enum_name = to_pascal_case(name);
        let prefix = crate::naming::to_screaming_snake_case(&enum_name);
        let symbols = integer_enum_symbols(schema, &prefix);
        Ok(Definition::Enum(EnumDef::from_symbols(
            enum_name,
            schema.description.clone(),
            &symbols,
        )))
    }

    fn build_union(&mut self, name: &str, schema: &RawSchema, variants: &[RawSchema]) -> Result<Definition> {
        let discriminator = schema
            .discriminator
            .as_ref()
            .ok_or(Error::OneOfWithoutDiscriminator)?;
        let property_name = discriminator
            .property_name
            .clone()
            .ok_or(Error::OneOfWithoutDiscriminator)?;

        let mut raw_variant_names = Vec::with_capacity(variants.len());
        let mut union_variants = Vec::with_capacity(variants.len());

        for variant in variants {
            if !variant.is_ref() {
                return Err(Error::InlineOneOfVariant);
            }
            let raw_name = parse_ref(variant.ref_.as_ref().unwrap())?;
            let variant_schema = self
                .by_name
                .get(&raw_name)
                .ok_or_else(|| Error::InvalidReference(raw_name.clone()))?;
            if !variant_schema.properties.contains_key(&property_name) {
                return Err(Error::VariantMissingDiscriminatorProperty(
                    raw_name.clone(),
                    property_name.clone(),
                ));
            }
            union_variants.push(to_pascal_case(&raw_name));
            raw_variant_names.push(raw_name);
        }

        // Variants are marked Go-only by the classifier's variant rule, not by
        // a dependency edge.
        self.graph.mark_oneof(name, raw_variant_names.clone());

        let mut discriminator_map = IndexMap::new();
        if !discriminator.mapping.is_empty() {
            for (label, ref_value) in &discriminator.mapping {
                let raw_name = parse_ref(ref_value)?;
                discriminator_map.insert(label.to_lowercase(), to_pascal_case(&raw_name));
            }
        } else {
            for raw_name in &raw_variant_names {
                discriminator_map.insert(raw_name.to_lowercase(), to_pascal_case(raw_name));
            }
        }

        let mut message = Message::regular(to_pascal_case(name), name.to_string());
        message.description = schema.description.clone();
        message.is_union = true;
        message.union_variants = union_variants;
        message.discriminator_property = Some(property_name);
        message.discriminator_map = discriminator_map;

        Ok(Definition::Message(message))
    }

    fn build_object_message(
        &mut self,
        message_name: &str,
        original_schema_name: &str,
        schema: &RawSchema,
        top_owner: &str,
    ) -> Result<Message> {
        let mut message = Message::regular(message_name.to_string(), original_schema_name.to_string());
        message.description = schema.description.clone();

        let mut tracker = NameTracker::new();
        let mut field_numbers = Vec::with_capacity(schema.properties.len());

        for (prop_name, prop_schema) in &schema.properties {
            let field = self.build_field(prop_name, prop_schema, top_owner, &mut message, &mut tracker)?;
            field_numbers.push(field.number);
            message.fields.push(field);
        }

        validate_field_numbers(message_name, &field_numbers)?;
        Ok(message)
    }

    fn build_field(
        &mut self,
        prop_name: &str,
        prop_schema: &RawSchema,
        top_owner: &str,
        message: &mut Message,
        tracker: &mut NameTracker,
    ) -> Result<Field> {
        validate_schema_constraints(prop_schema)?;
        if prop_schema.one_of.as_ref().is_some_and(|v| !v.is_empty()) {
            return Err(Error::UnsupportedNestedCombinator);
        }

        let field_name = tracker.assign(&sanitize_identifier(prop_name));
        let number = extract_field_number(prop_schema)?;
        let description = prop_schema.description.clone();

        if prop_schema.is_ref() {
            let target = self.resolve_ref(prop_schema, top_owner)?;
            return Ok(Field {
                name: field_name,
                json_name: prop_name.to_string(),
                type_ref: TypeRef::NamedRef(target),
                repeated: false,
                description,
                enum_values: None,
                number,
            });
        }

        let effective_type = prop_schema.effective_type()?;

        if effective_type.as_deref() == Some("array") {
            let (type_ref, enum_values) =
                self.build_array_element(prop_name, prop_schema, top_owner, message)?;
            return Ok(Field {
                name: field_name,
                json_name: prop_name.to_string(),
                type_ref,
                repeated: true,
                description,
                enum_values,
                number,
            });
        }

        if effective_type.as_deref() == Some("object") {
            let nested_name = to_pascal_case(prop_name);
            let nested = self.build_object_message(&nested_name, prop_name, prop_schema, top_owner)?;
            message.nested_messages.push(nested);
            return Ok(Field {
                name: field_name,
                json_name: prop_name.to_string(),
                type_ref: TypeRef::NamedRef(nested_name),
                repeated: false,
                description,
                enum_values: None,
                number,
            });
        }

        if effective_type.as_deref() == Some("integer") && prop_schema.enum_values.is_some() {
            validate_enum(prop_schema)?;
            let nested_name = to_pascal_case(prop_name);
            let prefix = crate::naming::to_screaming_snake_case(&nested_name);
            let symbols = integer_enum_symbols(prop_schema, &prefix);
            message.nested_enums.push(EnumDef::from_symbols(
                nested_name.clone(),
                prop_schema.description.clone(),
                &symbols,
            ));
            return Ok(Field {
                name: field_name,
                json_name: prop_name.to_string(),
                type_ref: TypeRef::Enum(nested_name),
                repeated: false,
                description,
                enum_values: None,
                number,
            });
        }

        if effective_type.as_deref() == Some("string") && prop_schema.enum_values.is_some() {
            validate_enum(prop_schema)?;
            let symbols = string_enum_values(prop_schema)?;
            return Ok(Field {
                name: field_name,
                json_name: prop_name.to_string(),
                type_ref: TypeRef::Scalar(ScalarType::String),
                repeated: false,
                description,
                enum_values: Some(symbols),
                number,
            });
        }

        let type_name = effective_type.unwrap_or("string");
        let type_ref = scalar_type_ref(type_name, prop_schema.format.as_deref());
        Ok(Field {
            name: field_name,
            json_name: prop_name.to_string(),
            type_ref,
            repeated: false,
            description,
            enum_values: None,
            number,
        })
    }

    fn build_array_element(
        &mut self,
        prop_name: &str,
        prop_schema: &RawSchema,
        top_owner: &str,
        message: &mut Message,
    ) -> Result<(TypeRef, Option<Vec<String>>)> {
        let item_schema = prop_schema.items.as_ref().ok_or(Error::ArrayMissingItems)?;
        validate_schema_constraints(item_schema)?;
        if item_schema.one_of.as_ref().is_some_and(|v| !v.is_empty()) {
            return Err(Error::UnsupportedNestedCombinator);
        }

        let item_effective_type = item_schema.effective_type()?;
        if item_effective_type.as_deref() == Some("array") {
            return Err(Error::NestedArraysUnsupported);
        }

        if item_schema.is_ref() {
            let target = self.resolve_ref(item_schema, top_owner)?;
            return Ok((TypeRef::NamedRef(target), None));
        }

        match item_effective_type.as_deref() {
            Some("object") => {
                if is_plural(prop_name) {
                    return Err(Error::PluralArrayPropertyName(prop_name.to_string()));
                }
                let nested_name = to_pascal_case(prop_name);
                let nested = self.build_object_message(&nested_name, prop_name, item_schema, top_owner)?;
                message.nested_messages.push(nested);
                Ok((TypeRef::NamedRef(nested_name), None))
            }
            Some("integer") if item_schema.enum_values.is_some() => {
                if is_plural(prop_name) {
                    return Err(Error::PluralArrayPropertyName(prop_name.to_string()));
                }
                validate_enum(item_schema)?;
                let nested_name = to_pascal_case(prop_name);
                let prefix = crate::naming::to_screaming_snake_case(&nested_name);
                let symbols = integer_enum_symbols(item_schema, &prefix);
                message.nested_enums.push(EnumDef::from_symbols(
                    nested_name.clone(),
                    item_schema.description.clone(),
                    &symbols,
                ));
                Ok((TypeRef::Enum(nested_name), None))
            }
            Some("string") if item_schema.enum_values.is_some() => {
                validate_enum(item_schema)?;
                let symbols = string_enum_values(item_schema)?;
                Ok((TypeRef::Scalar(ScalarType::String), Some(symbols)))
            }
            Some(other) => Ok((scalar_type_ref(other, item_schema.format.as_deref()), None)),
            None => Ok((TypeRef::Scalar(ScalarType::String), None)),
        }
    }

    fn resolve_ref(&mut self, schema: &RawSchema, top_owner: &str) -> Result<String> {
        let reference = schema.ref_.as_ref().expect("caller checked is_ref()");
        let raw_name = parse_ref(reference)?;
        self.graph.add_edge(top_owner, &raw_name);
        Ok(to_pascal_case(&raw_name))
    }
}

fn validate_schema_constraints(schema: &RawSchema) -> Result<()> {
    if schema.all_of.is_some() {
        return Err(Error::AllOfUnsupported);
    }
    if schema.any_of.is_some() {
        return Err(Error::AnyOfUnsupported);
    }
    if schema.not.is_some() {
        return Err(Error::NotUnsupported);
    }
    if let (Some(min_len), Some(max_len)) = (schema.min_length, schema.max_length) {
        if min_len > max_len {
            return Err(Error::MinLengthGreaterThanMaxLength);
        }
    }
    if let (Some(min_items), Some(max_items)) = (schema.min_items, schema.max_items) {
        if min_items > max_items {
            return Err(Error::MinItemsGreaterThanMaxItems);
        }
    }
    Ok(())
}

fn validate_enum(schema: &RawSchema) -> Result<()> {
    let values = schema
        .enum_values
        .as_ref()
        .expect("caller checked enum_values.is_some()");
    let ty = schema.effective_type()?.ok_or(Error::EnumMissingType)?;
    for value in values {
        if value.is_null() {
            return Err(Error::EnumNullOrEmptyValue);
        }
        match ty {
            "integer" => {
                if value.as_i64().is_none() && value.as_u64().is_none() {
                    return Err(Error::EnumMixedTypes);
                }
            }
            "string" => match value.as_str() {
                Some(s) if !s.is_empty() => {}
                Some(_) => return Err(Error::EnumNullOrEmptyValue),
                None => return Err(Error::EnumMixedTypes),
            },
            _ => return Err(Error::EnumMixedTypes),
        }
    }
    Ok(())
}

fn integer_enum_symbols(schema: &RawSchema, prefix: &str) -> Vec<String> {
    schema
        .enum_values
        .as_ref()
        .expect("caller validated enum_values")
        .iter()
        .map(|v| {
            let n = v.as_i64().or_else(|| v.as_u64().map(|u| u as i64)).unwrap_or(0);
            format!("{prefix}_{n}")
        })
        .collect()
}

fn string_enum_values(schema: &RawSchema) -> Result<Vec<String>> {
    schema
        .enum_values
        .as_ref()
        .expect("caller validated enum_values")
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or(Error::EnumMixedTypes))
        .collect()
}

/// Map a scalar OpenAPI type+format pair to an IR [`TypeRef`].
fn scalar_type_ref(type_name: &str, format: Option<&str>) -> TypeRef {
    match type_name {
        "string" => match format {
            Some("byte") | Some("binary") => TypeRef::Bytes,
            Some("date") | Some("date-time") => TypeRef::Timestamp,
            _ => TypeRef::Scalar(ScalarType::String),
        },
        "integer" => match format {
            Some("int64") => TypeRef::Scalar(ScalarType::Int64),
            _ => TypeRef::Scalar(ScalarType::Int32),
        },
        "number" => match format {
            Some("float") => TypeRef::Scalar(ScalarType::Float32),
            _ => TypeRef::Scalar(ScalarType::Float64),
        },
        "boolean" => TypeRef::Scalar(ScalarType::Bool),
        _ => TypeRef::Scalar(ScalarType::String),
    }
}

fn extract_field_number(schema: &RawSchema) -> Result<Option<i64>> {
    let Some(value) = schema.proto_number_extension() else {
        return Ok(None);
    };
    let n = value.as_i64().ok_or(Error::InvalidFieldNumberNotInteger)?;
    if !(1..=536_870_911).contains(&n) {
        return Err(Error::InvalidFieldNumberOutOfRange(n));
    }
    if (19000..=19999).contains(&n) {
        return Err(Error::InvalidFieldNumberReserved(n));
    }
    Ok(Some(n))
}

fn validate_field_numbers(message_name: &str, numbers: &[Option<i64>]) -> Result<()> {
    let total = numbers.len();
    let found = numbers.iter().filter(|n| n.is_some()).count();
    if found != 0 && found != total {
        return Err(Error::MixedFieldNumbers { found, total });
    }
    if found == total && total > 0 {
        let mut seen = std::collections::HashSet::new();
        for n in numbers.iter().flatten() {
            if !seen.insert(*n) {
                return Err(Error::DuplicateFieldNumber(*n, message_name.to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn build_from_json(src: &str) -> Result<BuildOutput> {
        let doc = parse_document(src.as_bytes()).unwrap();
        build(&doc)
    }

    #[test]
    fn builds_simple_message() {
        let out = build_from_json(
            r#"{
                "openapi": "3.0.3",
                "components": {"schemas": {
                    "User": {"type": "object", "properties": {
                        "userId": {"type": "string"},
                        "email": {"type": "string"},
                        "age": {"type": "integer"}
                    }}
                }}
            }"#,
        )
        .unwrap();
        assert_eq!(out.definitions.len(), 1);
        let message = out.definitions[0].as_message().unwrap();
        assert_eq!(message.name, "User");
        assert_eq!(message.fields.len(), 3);
        assert_eq!(message.fields[0].json_name, "userId");
    }

    #[test]
    fn rejects_all_of() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Thing": {"allOf": [{"type":"object"}]}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::AllOfUnsupported));
    }

    #[test]
    fn rejects_oneof_without_discriminator() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Dog": {"type":"object","properties":{"bark":{"type":"string"}}},
                "Cat": {"type":"object","properties":{"meow":{"type":"string"}}},
                "Pet": {"oneOf":[{"$ref":"#/components/schemas/Dog"},{"$ref":"#/components/schemas/Cat"}]}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::OneOfWithoutDiscriminator));
    }

    #[test]
    fn builds_discriminated_union() {
        let out = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Dog": {"type":"object","properties":{"petType":{"type":"string"},"bark":{"type":"string"}}},
                "Cat": {"type":"object","properties":{"petType":{"type":"string"},"meow":{"type":"string"}}},
                "Pet": {
                    "oneOf":[{"$ref":"#/components/schemas/Dog"},{"$ref":"#/components/schemas/Cat"}],
                    "discriminator": {"propertyName":"petType"}
                }
            }}}"#,
        )
        .unwrap();
        let pet = out
            .definitions
            .iter()
            .find(|d| d.name() == "Pet")
            .unwrap()
            .as_message()
            .unwrap();
        assert!(pet.is_union);
        assert_eq!(pet.union_variants, vec!["Dog".to_string(), "Cat".to_string()]);
        assert_eq!(pet.discriminator_map.get("dog"), Some(&"Dog".to_string()));
    }

    #[test]
    fn rejects_mixed_field_numbers() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Thing": {"type":"object","properties":{
                    "a": {"type":"string","x-proto-number": 1},
                    "b": {"type":"string"},
                    "c": {"type":"string"}
                }}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MixedFieldNumbers { found: 1, total: 3 }
        ));
    }

    #[test]
    fn rejects_reserved_field_number() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Thing": {"type":"object","properties":{
                    "a": {"type":"string","x-proto-number": 19500}
                }}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidFieldNumberReserved(19500)));
    }

    #[test]
    fn rejects_plural_array_property_for_inline_object() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Thing": {"type":"object","properties":{
                    "tags": {"type":"array","items":{"type":"object","properties":{"name":{"type":"string"}}}}
                }}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::PluralArrayPropertyName(_)));
    }

    #[test]
    fn allows_plural_array_property_for_string_enum() {
        let out = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Thing": {"type":"object","properties":{
                    "statuses": {"type":"array","items":{"type":"string","enum":["a","b"]}}
                }}
            }}}"#,
        )
        .unwrap();
        let message = out.definitions[0].as_message().unwrap();
        assert!(message.fields[0].repeated);
    }

    #[test]
    fn rejects_nested_arrays() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Thing": {"type":"object","properties":{
                    "grid": {"type":"array","items":{"type":"array","items":{"type":"string"}}}
                }}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NestedArraysUnsupported));
    }

    #[test]
    fn rejects_min_length_gt_max_length() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Thing": {"type":"object","properties":{
                    "name": {"type":"string","minLength":20,"maxLength":10}
                }}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MinLengthGreaterThanMaxLength));
    }

    #[test]
    fn top_level_string_enum_rejected() {
        let err = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Color": {"type":"string","enum":["red","green"]}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedTopLevelShape));
    }

    #[test]
    fn top_level_integer_enum_gets_unspecified_zero() {
        let out = build_from_json(
            r#"{"openapi":"3.0.3","components":{"schemas":{
                "Status": {"type":"integer","enum":[1,2,3]}
            }}}"#,
        )
        .unwrap();
        let Definition::Enum(e) = &out.definitions[0] else {
            panic!("expected enum");
        };
        assert_eq!(e.values[0], ("UNSPECIFIED".to_string(), 0));
        assert_eq!(e.values.len(), 4);
    }
}
