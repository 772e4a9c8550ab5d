//! Codegen Configuration
//!
//! Two-tier configuration:
//! - GeneratorConfig: naming, packaging and annotation switches for a run
//! - ScalarMappings: the protobuf type table for YANG scalars
//!
//! Synthesis decisions (field order, key extraction, enum numbering) are
//! config-free. Only naming and rendering consult configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::schema::TypeKind;

// =============================================================================
// Generator Configuration
// =============================================================================

/// Settings consumed by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Collapse config/state and list-surrounding containers
    #[serde(default)]
    pub compress_paths: bool,

    /// Root of every generated package name
    #[serde(default = "default_base_package")]
    pub base_package_name: String,

    /// Package holding shared enumerations, below the base package
    #[serde(default = "default_enum_package")]
    pub enum_package_name: String,

    /// Prefix for cross-package import paths
    #[serde(default)]
    pub base_import_path: String,

    /// Name of the invoking tool, used in header comments
    #[serde(default = "default_caller_name")]
    pub caller_name: String,

    /// Map non-key leaves to ywrapper messages instead of plain scalars
    #[serde(default)]
    pub wrapper_types: bool,

    /// Annotate fields with their YANG schema path
    #[serde(default)]
    pub annotate_schema_paths: bool,

    /// JSON side-table holding previously assigned field tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ledger: Option<PathBuf>,
}

fn default_base_package() -> String {
    "openconfig".to_string()
}

fn default_enum_package() -> String {
    "enums".to_string()
}

fn default_caller_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            compress_paths: false,
            base_package_name: default_base_package(),
            enum_package_name: default_enum_package(),
            base_import_path: String::new(),
            caller_name: default_caller_name(),
            wrapper_types: false,
            annotate_schema_paths: false,
            tag_ledger: None,
        }
    }
}

impl GeneratorConfig {
    /// Fully qualified package of the shared enumerations
    pub fn enum_package(&self) -> String {
        format!("{}.{}", self.base_package_name, self.enum_package_name)
    }

    /// Relative import path of the shared enumeration package
    pub fn enum_import(&self) -> String {
        format!("{}/{}", self.base_package_name, self.enum_package_name)
    }

    /// Scalar table for leaves in value position
    pub fn value_mappings(&self) -> ScalarMappings {
        if self.wrapper_types {
            ScalarMappings::wrapper()
        } else {
            ScalarMappings::plain()
        }
    }
}

// =============================================================================
// Scalar Mappings
// =============================================================================

/// Protobuf type names for YANG scalar kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarMappings {
    pub string: String,
    pub boolean: String,
    pub signed32: String,
    pub signed64: String,
    pub unsigned32: String,
    pub unsigned64: String,
    pub decimal: String,
    pub bytes: String,
}

impl ScalarMappings {
    /// Plain proto3 scalars; always used for list keys
    pub fn plain() -> Self {
        Self {
            string: "string".to_string(),
            boolean: "bool".to_string(),
            signed32: "sint32".to_string(),
            signed64: "sint64".to_string(),
            unsigned32: "uint32".to_string(),
            unsigned64: "uint64".to_string(),
            decimal: "double".to_string(),
            bytes: "bytes".to_string(),
        }
    }

    /// ywrapper messages, which distinguish unset from zero values
    pub fn wrapper() -> Self {
        Self {
            string: "ywrapper.StringValue".to_string(),
            boolean: "ywrapper.BoolValue".to_string(),
            signed32: "ywrapper.IntValue".to_string(),
            signed64: "ywrapper.IntValue".to_string(),
            unsigned32: "ywrapper.UintValue".to_string(),
            unsigned64: "ywrapper.UintValue".to_string(),
            decimal: "ywrapper.Decimal64Value".to_string(),
            bytes: "ywrapper.BytesValue".to_string(),
        }
    }

    /// Table entry for a scalar kind; `None` for kinds without a mapping
    pub fn lookup(&self, kind: &TypeKind) -> Option<&str> {
        let name = match kind {
            TypeKind::String => &self.string,
            TypeKind::Boolean | TypeKind::Empty => &self.boolean,
            TypeKind::Int8 | TypeKind::Int16 | TypeKind::Int32 => &self.signed32,
            TypeKind::Int64 => &self.signed64,
            TypeKind::Uint8 | TypeKind::Uint16 | TypeKind::Uint32 => &self.unsigned32,
            TypeKind::Uint64 => &self.unsigned64,
            TypeKind::Decimal64 => &self.decimal,
            TypeKind::Binary => &self.bytes,
            TypeKind::Bits
            | TypeKind::InstanceIdentifier
            | TypeKind::Leafref
            | TypeKind::Enumeration { .. }
            | TypeKind::Identityref { .. }
            | TypeKind::Union { .. } => return None,
        };
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_table() {
        let table = ScalarMappings::plain();
        assert_eq!(table.lookup(&TypeKind::Uint8), Some("uint32"));
        assert_eq!(table.lookup(&TypeKind::Int64), Some("sint64"));
        assert_eq!(table.lookup(&TypeKind::Empty), Some("bool"));
        assert_eq!(table.lookup(&TypeKind::Bits), None);
    }

    #[test]
    fn test_wrapper_selection() {
        let config = GeneratorConfig {
            wrapper_types: true,
            ..GeneratorConfig::default()
        };
        assert_eq!(
            config.value_mappings().lookup(&TypeKind::String),
            Some("ywrapper.StringValue")
        );
    }
}
