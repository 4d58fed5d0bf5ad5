//! Lowers `ProtoSet` IR messages and every enum into proto3 text.

use std::fmt::Write as _;

use oas_schema::classify::Classification;
use oas_schema::ir::{Definition, EnumDef, Field, Message, ScalarType, TypeRef};

/// Package naming inputs for a single proto file.
pub struct GenerateProtoOptions<'a> {
    pub package_name: &'a str,
    pub go_package_path: &'a str,
}

/// Render every message in `classification.proto_set`, plus every enum
/// unconditionally, as proto3 source text.
///
/// Returns an empty string when `proto_set` is empty and `struct_set` is
/// not - nothing proto-shaped survived classification, so there is no
/// `.proto` file to emit.
pub fn generate_proto_file(
    definitions: &[Definition],
    classification: &Classification,
    options: &GenerateProtoOptions,
) -> String {
    if classification.proto_set.is_empty() && !classification.struct_set.is_empty() {
        return String::new();
    }

    let uses_timestamp = definitions.iter().any(|def| match def {
        Definition::Message(m) if classification.proto_set.contains(&m.original_schema_name) => {
            message_uses_timestamp(m)
        }
        _ => false,
    });

    let mut out = String::new();
    writeln!(out, "syntax = \"proto3\";").unwrap();
    out.push('\n');
    writeln!(out, "package {};", options.package_name).unwrap();
    if uses_timestamp {
        writeln!(out, "import \"google/protobuf/timestamp.proto\";").unwrap();
    }
    writeln!(out, "option go_package = \"{}\";", options.go_package_path).unwrap();

    for def in definitions {
        match def {
            Definition::Message(m) if classification.proto_set.contains(&m.original_schema_name) => {
                out.push('\n');
                emit_message(&mut out, m, 0);
            }
            // A message classified struct-code never reaches proto text,
            // but integer enums are always proto-side: any it carries
            // (inline or nested arbitrarily deep) still need a home here.
            Definition::Message(m) => {
                for enum_def in collect_nested_enums(m) {
                    out.push('\n');
                    emit_enum(&mut out, enum_def, 0);
                }
            }
            Definition::Enum(e) => {
                out.push('\n');
                emit_enum(&mut out, e, 0);
            }
        }
    }

    out
}

fn collect_nested_enums(message: &Message) -> Vec<&EnumDef> {
    let mut result: Vec<&EnumDef> = message.nested_enums.iter().collect();
    for nested in &message.nested_messages {
        result.extend(collect_nested_enums(nested));
    }
    result
}

fn message_uses_timestamp(message: &Message) -> bool {
    message
        .fields
        .iter()
        .any(|f| matches!(f.type_ref, TypeRef::Timestamp))
        || message.nested_messages.iter().any(message_uses_timestamp)
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

fn emit_doc(out: &mut String, description: &Option<String>, indent: usize) {
    if let Some(doc) = description {
        let p = pad(indent);
        for line in doc.lines() {
            writeln!(out, "{p}// {line}").unwrap();
        }
    }
}

fn emit_message(out: &mut String, message: &Message, indent: usize) {
    let p = pad(indent);
    emit_doc(out, &message.description, indent);
    writeln!(out, "{p}message {} {{", message.name).unwrap();

    for nested in &message.nested_messages {
        out.push('\n');
        emit_message(out, nested, indent + 1);
        out.push('\n');
    }
    for nested_enum in &message.nested_enums {
        out.push('\n');
        emit_enum(out, nested_enum, indent + 1);
        out.push('\n');
    }

    let numbers = field_numbers(&message.fields);
    for (field, number) in message.fields.iter().zip(numbers) {
        emit_field(out, field, number, indent + 1);
    }

    writeln!(out, "{p}}}").unwrap();
}

/// Explicit `x-proto-number`s verbatim when present on every field;
/// otherwise sequential from 1 in source order.
fn field_numbers(fields: &[Field]) -> Vec<i64> {
    if fields.iter().all(|f| f.number.is_some()) && !fields.is_empty() {
        fields.iter().map(|f| f.number.unwrap()).collect()
    } else {
        (1..=fields.len() as i64).collect()
    }
}

fn emit_field(out: &mut String, field: &Field, number: i64, indent: usize) {
    let p = pad(indent);
    emit_doc(out, &field.description, indent);
    if let Some(values) = &field.enum_values {
        writeln!(out, "{p}// enum: [{}]", values.join(", ")).unwrap();
    }
    let repeated = if field.repeated { "repeated " } else { "" };
    let type_name = proto_type_name(&field.type_ref);
    writeln!(
        out,
        "{p}{repeated}{type_name} {} = {number} [json_name = \"{}\"];",
        field.name, field.json_name
    )
    .unwrap();
}

fn proto_type_name(type_ref: &TypeRef) -> String {
    match type_ref {
        TypeRef::Scalar(scalar) => proto_scalar_name(*scalar).to_string(),
        TypeRef::NamedRef(name) => name.clone(),
        TypeRef::Timestamp => "google.protobuf.Timestamp".to_string(),
        TypeRef::Bytes => "bytes".to_string(),
        TypeRef::Enum(name) => name.clone(),
    }
}

fn proto_scalar_name(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::String => "string",
        ScalarType::Int32 => "int32",
        ScalarType::Int64 => "int64",
        ScalarType::Float32 => "float",
        ScalarType::Float64 => "double",
        ScalarType::Bool => "bool",
    }
}

fn emit_enum(out: &mut String, enum_def: &EnumDef, indent: usize) {
    let p = pad(indent);
    emit_doc(out, &enum_def.description, indent);
    writeln!(out, "{p}enum {} {{", enum_def.name).unwrap();
    let inner = pad(indent + 1);
    for (symbol, number) in &enum_def.values {
        writeln!(out, "{inner}{symbol} = {number};").unwrap();
    }
    writeln!(out, "{p}}}").unwrap();
}
