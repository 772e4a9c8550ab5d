//! Type Mapping
//!
//! Maps YANG leaf types to protobuf field types. Scalars come from the
//! [`ScalarMappings`] table; enumerated types resolve to a synthesized enum
//! name, either embedded in the message (inline `enumeration` literals) or in
//! the shared enumeration package (typedefs, identityrefs, enumerated unions).

use super::config::{GeneratorConfig, ScalarMappings};
use super::names::{to_pascal_case, NameRegistry};
use crate::error::GenerationError;
use crate::schema::{SchemaNode, TypeDescriptor, TypeKind};

/// What a mapped type resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedKind {
    Scalar,
    Enum,
    /// A union of differing scalars, carried in its string form
    Union,
}

/// Result of mapping a leaf type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub type_name: String,
    pub kind: MappedKind,
    /// Import path required to reference the type, if any
    pub import: Option<String>,
}

impl MappedType {
    fn scalar(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kind: MappedKind::Scalar,
            import: None,
        }
    }

    pub fn is_enum(&self) -> bool {
        self.kind == MappedKind::Enum
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == MappedKind::Scalar
    }
}

/// Maps leaf types under one generator configuration
pub struct TypeMapper<'a> {
    config: &'a GeneratorConfig,
    value_table: ScalarMappings,
    key_table: ScalarMappings,
}

impl<'a> TypeMapper<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            value_table: config.value_mappings(),
            key_table: ScalarMappings::plain(),
        }
    }

    /// Map the type of `leaf`.
    ///
    /// In key context the plain scalar table is used and anything that is not
    /// a scalar or an enum is rejected with `KeyType`.
    pub fn map_type(
        &self,
        registry: &mut NameRegistry,
        leaf: &SchemaNode,
        leaf_type: &TypeDescriptor,
        key_context: bool,
    ) -> Result<MappedType, GenerationError> {
        let mapped = self.resolve(registry, leaf, leaf_type, key_context)?;

        if key_context && mapped.kind == MappedKind::Union {
            return Err(GenerationError::KeyType {
                list: leaf
                    .path
                    .split_last()
                    .map(|(_, parent)| format!("/{}", parent.join("/")))
                    .unwrap_or_default(),
                key: leaf.name.clone(),
                type_name: leaf_type.name.clone(),
            });
        }
        Ok(mapped)
    }

    fn resolve(
        &self,
        registry: &mut NameRegistry,
        leaf: &SchemaNode,
        leaf_type: &TypeDescriptor,
        key_context: bool,
    ) -> Result<MappedType, GenerationError> {
        let table = if key_context {
            &self.key_table
        } else {
            &self.value_table
        };

        match &leaf_type.kind {
            TypeKind::Enumeration { .. } if leaf_type.is_inline_enum() => Ok(MappedType {
                type_name: to_pascal_case(&leaf.name),
                kind: MappedKind::Enum,
                import: None,
            }),
            TypeKind::Enumeration { .. } | TypeKind::Identityref { .. } => {
                Ok(self.shared_enum(registry, leaf, leaf_type))
            }
            TypeKind::Union { .. } if leaf_type.contains_enum() => {
                Ok(self.shared_enum(registry, leaf, leaf_type))
            }
            TypeKind::Union { members } => self.resolve_union(leaf, leaf_type, members, table),
            kind => table
                .lookup(kind)
                .map(MappedType::scalar)
                .ok_or_else(|| unsupported(leaf, leaf_type)),
        }
    }

    fn shared_enum(
        &self,
        registry: &mut NameRegistry,
        leaf: &SchemaNode,
        leaf_type: &TypeDescriptor,
    ) -> MappedType {
        let name = registry.shared_enum_name(&leaf.path_string(), leaf_type);
        MappedType {
            type_name: format!("{}.{}", self.config.enum_package(), name),
            kind: MappedKind::Enum,
            import: Some(self.config.enum_import()),
        }
    }

    /// A union of scalars that all map to one protobuf type is that type;
    /// anything else is carried as a string.
    fn resolve_union(
        &self,
        leaf: &SchemaNode,
        leaf_type: &TypeDescriptor,
        members: &[TypeDescriptor],
        table: &ScalarMappings,
    ) -> Result<MappedType, GenerationError> {
        let mut resolved: Vec<String> = Vec::new();
        collect_union_scalars(leaf, members, table, &mut resolved)?;
        resolved.dedup();

        match resolved.as_slice() {
            [single] => Ok(MappedType::scalar(single.clone())),
            [] => Err(unsupported(leaf, leaf_type)),
            _ => Ok(MappedType {
                type_name: table.string.clone(),
                kind: MappedKind::Union,
                import: None,
            }),
        }
    }
}

fn collect_union_scalars(
    leaf: &SchemaNode,
    members: &[TypeDescriptor],
    table: &ScalarMappings,
    out: &mut Vec<String>,
) -> Result<(), GenerationError> {
    for member in members {
        match &member.kind {
            TypeKind::Union { members } => collect_union_scalars(leaf, members, table, out)?,
            kind => {
                let name = table.lookup(kind).ok_or_else(|| unsupported(leaf, member))?;
                if !out.iter().any(|seen| seen == name) {
                    out.push(name.to_string());
                }
            }
        }
    }
    Ok(())
}

fn unsupported(leaf: &SchemaNode, leaf_type: &TypeDescriptor) -> GenerationError {
    GenerationError::UnsupportedType {
        path: leaf.path_string(),
        type_name: leaf_type.name.clone(),
    }
}
