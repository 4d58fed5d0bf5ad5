//! Lowers `StructSet` IR messages into Go struct text with JSON tags,
//! union marshal/unmarshal routines, and package imports.

use std::fmt::Write as _;

use indexmap::IndexSet;
use oas_schema::ir::{Definition, Field, Message, ScalarType, TypeRef};
use oas_schema::naming::to_pascal_case;

/// Render every message selected by `struct_set` as Go source.
///
/// `struct_set` of `None` means the struct-only path: classification is
/// bypassed and every message in `definitions` is emitted (unions still
/// get their marshal/unmarshal routines).
pub fn generate_go_package(
    definitions: &[Definition],
    struct_set: Option<&IndexSet<String>>,
    go_package_path: &str,
) -> String {
    let package_name = derive_package_name(go_package_path);
    let messages = select_messages(definitions, struct_set);

    let mut body = String::new();
    for message in &messages {
        emit_message(&mut body, message);
    }

    let mut out = String::new();
    writeln!(out, "package {package_name}").unwrap();
    out.push('\n');
    if let Some(imports) = render_imports(&messages) {
        out.push_str(&imports);
        out.push('\n');
    }
    out.push_str(&body);
    out
}

fn derive_package_name(go_package_path: &str) -> String {
    let segments: Vec<&str> = go_package_path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(&last) = segments.last() else {
        return "main".to_string();
    };
    if is_version_segment(last) && segments.len() > 1 {
        segments[segments.len() - 2].to_string()
    } else {
        last.to_string()
    }
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn select_messages<'a>(
    definitions: &'a [Definition],
    struct_set: Option<&IndexSet<String>>,
) -> Vec<&'a Message> {
    let mut result = Vec::new();
    for definition in definitions {
        if let Definition::Message(message) = definition {
            let include = struct_set.is_none_or(|set| set.contains(&message.original_schema_name));
            if include {
                flatten_messages(message, &mut result);
            }
        }
    }
    result
}

fn flatten_messages<'a>(message: &'a Message, out: &mut Vec<&'a Message>) {
    out.push(message);
    for nested in &message.nested_messages {
        flatten_messages(nested, out);
    }
}

fn render_imports(messages: &[&Message]) -> Option<String> {
    let has_union = messages.iter().any(|m| m.is_union);
    let has_timestamp = messages
        .iter()
        .any(|m| m.fields.iter().any(|f| matches!(f.type_ref, TypeRef::Timestamp)));

    if !has_union && !has_timestamp {
        return None;
    }

    let mut out = String::new();
    writeln!(out, "import (").unwrap();
    if has_union {
        writeln!(out, "\t\"encoding/json\"").unwrap();
        writeln!(out, "\t\"fmt\"").unwrap();
        writeln!(out, "\t\"strings\"").unwrap();
    }
    if has_timestamp {
        writeln!(out, "\t\"time\"").unwrap();
    }
    writeln!(out, ")").unwrap();
    Some(out)
}

fn emit_message(out: &mut String, message: &Message) {
    if message.is_union {
        emit_union_struct(out, message);
        emit_union_marshal(out, message);
        emit_union_unmarshal(out, message);
    } else {
        emit_struct(out, message);
    }
}

fn emit_doc(out: &mut String, description: &Option<String>, indent: &str) {
    if let Some(doc) = description {
        for line in doc.lines() {
            writeln!(out, "{indent}// {line}").unwrap();
        }
    }
}

fn emit_struct(out: &mut String, message: &Message) {
    emit_doc(out, &message.description, "");
    writeln!(out, "type {} struct {{", message.name).unwrap();
    for field in &message.fields {
        emit_field(out, field);
    }
    writeln!(out, "}}").unwrap();
    out.push('\n');
}

fn emit_field(out: &mut String, field: &Field) {
    emit_doc(out, &field.description, "\t");
    if let Some(values) = &field.enum_values {
        writeln!(out, "\t// enum: [{}]", values.join(", ")).unwrap();
    }
    let go_name = to_pascal_case(&field.name);
    let type_name = go_field_type(field);
    writeln!(out, "\t{go_name} {type_name} `json:\"{}\"`", field.json_name).unwrap();
}

fn go_field_type(field: &Field) -> String {
    if field.repeated {
        match &field.type_ref {
            TypeRef::NamedRef(name) => format!("[]*{name}"),
            other => format!("[]{}", go_base_type(other)),
        }
    } else {
        match &field.type_ref {
            TypeRef::NamedRef(name) => format!("*{name}"),
            other => go_base_type(other),
        }
    }
}

fn go_base_type(type_ref: &TypeRef) -> String {
    match type_ref {
        TypeRef::Scalar(scalar) => go_scalar_type(*scalar).to_string(),
        TypeRef::NamedRef(name) => name.clone(),
        TypeRef::Timestamp => "time.Time".to_string(),
        TypeRef::Bytes => "[]byte".to_string(),
        // Enums always emit proto-side; a struct-side field referencing one
        // carries the wire-compatible underlying integer.
        TypeRef::Enum(_) => "int32".to_string(),
    }
}

fn go_scalar_type(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::String => "string",
        ScalarType::Int32 => "int32",
        ScalarType::Int64 => "int64",
        ScalarType::Float32 => "float32",
        ScalarType::Float64 => "float64",
        ScalarType::Bool => "bool",
    }
}

fn emit_union_struct(out: &mut String, message: &Message) {
    emit_doc(out, &message.description, "");
    writeln!(out, "type {} struct {{", message.name).unwrap();
    for variant in &message.union_variants {
        writeln!(out, "\t{variant} *{variant} `json:\"-\"`").unwrap();
    }
    writeln!(out, "}}").unwrap();
    out.push('\n');
}

fn emit_union_marshal(out: &mut String, message: &Message) {
    let name = &message.name;
    writeln!(out, "func (u *{name}) MarshalJSON() ([]byte, error) {{").unwrap();
    writeln!(out, "\tset := 0").unwrap();
    for variant in &message.union_variants {
        writeln!(out, "\tif u.{variant} != nil {{").unwrap();
        writeln!(out, "\t\tset++").unwrap();
        writeln!(out, "\t}}").unwrap();
    }
    writeln!(out, "\tif set > 1 {{").unwrap();
    writeln!(out, "\t\treturn nil, fmt.Errorf(\"{name}: multiple variants set\")").unwrap();
    writeln!(out, "\t}}").unwrap();
    for variant in &message.union_variants {
        writeln!(out, "\tif u.{variant} != nil {{").unwrap();
        writeln!(out, "\t\treturn json.Marshal(u.{variant})").unwrap();
        writeln!(out, "\t}}").unwrap();
    }
    writeln!(out, "\treturn nil, fmt.Errorf(\"{name}: no variant set\")").unwrap();
    writeln!(out, "}}").unwrap();
    out.push('\n');
}

fn emit_union_unmarshal(out: &mut String, message: &Message) {
    let name = &message.name;
    let discriminator_property = message.discriminator_property.as_deref().unwrap_or_default();
    let envelope_field = to_pascal_case(discriminator_property);

    writeln!(out, "func (u *{name}) UnmarshalJSON(data []byte) error {{").unwrap();
    writeln!(out, "\tvar envelope struct {{").unwrap();
    writeln!(
        out,
        "\t\t{envelope_field} string `json:\"{discriminator_property}\"`"
    )
    .unwrap();
    writeln!(out, "\t}}").unwrap();
    writeln!(out, "\tif err := json.Unmarshal(data, &envelope); err != nil {{").unwrap();
    writeln!(out, "\t\treturn err").unwrap();
    writeln!(out, "\t}}").unwrap();
    for variant in &message.union_variants {
        writeln!(out, "\tu.{variant} = nil").unwrap();
    }
    writeln!(out, "\tswitch strings.ToLower(envelope.{envelope_field}) {{").unwrap();
    for (label, variant) in &message.discriminator_map {
        writeln!(out, "\tcase \"{label}\":").unwrap();
        writeln!(out, "\t\tvar v {variant}").unwrap();
        writeln!(out, "\t\tif err := json.Unmarshal(data, &v); err != nil {{").unwrap();
        writeln!(out, "\t\t\treturn err").unwrap();
        writeln!(out, "\t\t}}").unwrap();
        writeln!(out, "\t\tu.{variant} = &v").unwrap();
        writeln!(out, "\t\treturn nil").unwrap();
    }
    writeln!(out, "\tdefault:").unwrap();
    writeln!(
        out,
        "\t\treturn fmt.Errorf(\"unknown {discriminator_property}: %s\", envelope.{envelope_field})"
    )
    .unwrap();
    writeln!(out, "\t}}").unwrap();
    writeln!(out, "}}").unwrap();
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use oas_schema::load;

    #[test]
    fn derives_package_name_from_last_segment() {
        assert_eq!(derive_package_name("github.com/acme/petstore"), "petstore");
    }

    #[test]
    fn derives_package_name_skipping_version_segment() {
        assert_eq!(derive_package_name("github.com/acme/petstore/v2"), "petstore");
        assert_eq!(derive_package_name("github.com/acme/petstore/v10"), "petstore");
    }

    #[test]
    fn plain_struct_has_no_imports_and_no_pointer_scalars() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Dog": {"type":"object","properties":{"petType":{"type":"string"},"bark":{"type":"string"}}},
                "Cat": {"type":"object","properties":{"petType":{"type":"string"},"meow":{"type":"string"}}},
                "Pet": {
                    "oneOf":[{"$ref":"#/components/schemas/Dog"},{"$ref":"#/components/schemas/Cat"}],
                    "discriminator": {"propertyName":"petType"}
                }
            }}
        }"#;
        let (output, classification) = load(bytes).unwrap();
        let go_src = generate_go_package(&output.definitions, Some(&classification.struct_set), "github.com/acme/petstore");
        assert!(go_src.contains("package petstore"));
        assert!(go_src.contains("\"encoding/json\""));
        assert!(go_src.contains("type Pet struct {"));
        assert!(go_src.contains("Dog *Dog `json:\"-\"`"));
        assert!(go_src.contains("func (u *Pet) MarshalJSON()"));
        assert!(go_src.contains("multiple variants set"));
        assert!(go_src.contains("case \"dog\":"));
        assert!(go_src.contains("case \"cat\":"));
        assert!(go_src.contains("unknown petType"));
    }

    #[test]
    fn reference_and_array_fields_use_correct_pointer_shape() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Address": {"type":"object","properties":{"city":{"type":"string"}}},
                "Dog": {"type":"object","properties":{"petType":{"type":"string"}}},
                "Cat": {"type":"object","properties":{"petType":{"type":"string"}}},
                "Pet": {
                    "oneOf":[{"$ref":"#/components/schemas/Dog"},{"$ref":"#/components/schemas/Cat"}],
                    "discriminator": {"propertyName":"petType"}
                },
                "Owner": {"type":"object","properties":{
                    "homeAddress": {"$ref":"#/components/schemas/Address"},
                    "pets": {"type":"array","items":{"$ref":"#/components/schemas/Pet"}}
                }}
            }}
        }"#;
        let (output, classification) = load(bytes).unwrap();
        let go_src = generate_go_package(&output.definitions, Some(&classification.struct_set), "github.com/acme/petstore");
        assert!(go_src.contains("HomeAddress *Address `json:\"homeAddress\"`"));
        assert!(go_src.contains("Pets []*Pet `json:\"pets\"`"));
    }

    #[test]
    fn struct_only_mode_ignores_classification() {
        let bytes = br#"{
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Address": {"type":"object","properties":{"city":{"type":"string"}}}
            }}
        }"#;
        let (output, _classification) = load(bytes).unwrap();
        let go_src = generate_go_package(&output.definitions, None, "github.com/acme/petstore");
        assert!(go_src.contains("type Address struct {"));
        assert!(go_src.contains("City string `json:\"city\"`"));
    }
}
