//! Proto3 Text Rendering
//!
//! Direct string building for each record kind. Rendering performs no
//! validation; identical records always produce identical text.

use super::enums::{EnumValues, ProtoEnum};
use super::message::{MessageKind, ProtoField, ProtoMessage};

/// Import path of the ywrapper value messages
pub const YWRAPPER_IMPORT: &str = "github.com/openconfig/ygot/proto/ywrapper/ywrapper.proto";
/// Import path of the yext field options
pub const YEXT_IMPORT: &str = "github.com/openconfig/ygot/proto/yext/yext.proto";

/// Inputs to a file header
#[derive(Debug, Clone)]
pub struct Proto3Header<'a> {
    pub package: &'a str,
    pub caller_name: &'a str,
    pub source_files: &'a [String],
    pub include_paths: &'a [String],
    /// Relative import paths of other generated packages
    pub imports: &'a [String],
    pub base_import_path: &'a str,
    pub wrapper_types: bool,
    pub annotate_schema_paths: bool,
}

pub fn render_header(header: &Proto3Header<'_>) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "// {} is generated by {} as a protobuf\n",
        header.package, header.caller_name
    ));
    output.push_str("// representation of a YANG schema.\n");
    output.push_str("//\n");
    output.push_str("// Input schema modules:\n");
    for file in header.source_files {
        output.push_str(&format!("//  - {}\n", file));
    }
    output.push_str("// Include paths:\n");
    for path in header.include_paths {
        output.push_str(&format!("//   - {}\n", path));
    }
    output.push_str("syntax = \"proto3\";\n\n");
    output.push_str(&format!("package {};\n", header.package));

    let mut imports = Vec::new();
    if header.wrapper_types {
        imports.push(YWRAPPER_IMPORT.to_string());
    }
    if header.annotate_schema_paths {
        imports.push(YEXT_IMPORT.to_string());
    }
    for import in header.imports {
        imports.push(format!("{}.proto", join_import(header.base_import_path, import)));
    }

    if !imports.is_empty() {
        output.push('\n');
        for import in imports {
            output.push_str(&format!("import \"{}\";\n", import));
        }
    }

    output
}

fn join_import(base: &str, import: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        import.to_string()
    } else {
        format!("{}/{}", base, import)
    }
}

/// Render a message, preceded by a blank line
pub fn render_message(msg: &ProtoMessage) -> String {
    let mut output = String::from("\n");

    match msg.kind {
        MessageKind::Directory => {
            output.push_str(&format!(
                "// {} represents the {} YANG schema element.\n",
                msg.name, msg.yang_path
            ));
        }
        MessageKind::ListKey => {
            output.push_str(&format!(
                "// {} represents the list element {} of the YANG schema. It\n",
                msg.name, msg.yang_path
            ));
            output.push_str(
                "// contains only the keys of the list, and an embedded message containing all entries\n",
            );
            output.push_str("// below this entity in the schema.\n");
        }
    }

    output.push_str(&format!("message {} {{\n", msg.name));
    for (name, values) in &msg.enums {
        output.push_str(&format!("  enum {} {{\n", name));
        render_values(&mut output, "    ", name, values);
        output.push_str("  }\n");
    }
    for field in &msg.fields {
        output.push_str(&render_field(field));
    }
    output.push_str("}\n");

    output
}

fn render_field(field: &ProtoField) -> String {
    let mut line = String::from("  ");
    if field.repeated {
        line.push_str("repeated ");
    }
    line.push_str(&format!("{} {} = {}", field.type_name, field.name, field.tag));
    if !field.extensions.is_empty() {
        line.push_str(&format!(" [{}]", field.extensions.join(", ")));
    }
    line.push_str(";\n");
    line
}

/// Render a package-level enum, preceded by a blank line
pub fn render_enum(e: &ProtoEnum) -> String {
    let mut output = String::from("\n");
    output.push_str(&format!(
        "// {} represents an enumerated type generated for the {}.\n",
        e.name, e.description
    ));
    output.push_str(&format!("enum {} {{\n", e.name));
    render_values(&mut output, "  ", &e.name, &e.values);
    output.push_str("}\n");
    output
}

fn render_values(output: &mut String, indent: &str, enum_name: &str, values: &EnumValues) {
    for (number, symbol) in values {
        output.push_str(&format!("{}{}_{} = {};\n", indent, enum_name, symbol, number));
    }
}
