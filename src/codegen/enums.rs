//! Enumeration Numbering
//!
//! Turns enumerated YANG types into protobuf value tables. Value 0 is always
//! present: either `UNSET` or the declared default.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::names::{safe_proto_name, NameRegistry, SharedEnum};
use crate::error::{GenerationError, GenerationErrors};
use crate::schema::{IdentityBase, TypeDescriptor, TypeKind};

/// Symbol of value 0 when nothing else claims it
pub const UNSET: &str = "UNSET";

/// Value table of one enum: number -> symbol
pub type EnumValues = BTreeMap<i64, String>;

/// A package-level enumeration ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoEnum {
    pub name: String,
    /// Completes "an enumerated type generated for the ..."
    pub description: String,
    pub values: EnumValues,
}

/// Values of an enumeration, inline or typedef'd.
///
/// A declared default takes value 0; otherwise 0 is `UNSET`. Every other
/// member is numbered `ordinal + 1`, which must fit in an `int32`.
pub fn enumeration_values(
    path: &str,
    leaf_type: &TypeDescriptor,
) -> Result<EnumValues, GenerationError> {
    let members = match &leaf_type.kind {
        TypeKind::Enumeration { members } => members,
        _ => {
            return Err(GenerationError::UnknownEnumShape {
                name: path.to_string(),
            })
        }
    };

    let mut values = EnumValues::new();
    match &leaf_type.default {
        Some(default) => {
            if !members.iter().any(|m| &m.name == default) {
                return Err(GenerationError::InvalidDefault {
                    path: path.to_string(),
                    default: default.clone(),
                });
            }
            values.insert(0, safe_proto_name(default));
        }
        None => {
            values.insert(0, UNSET.to_string());
        }
    }

    for member in members {
        if leaf_type.default.as_deref() == Some(member.name.as_str()) {
            continue;
        }
        let number = member
            .value
            .checked_add(1)
            .filter(|n| i32::try_from(*n).is_ok())
            .ok_or_else(|| GenerationError::EnumValueRange {
                path: path.to_string(),
                member: member.name.clone(),
                value: member.value,
            })?;
        let symbol = safe_proto_name(&member.name);
        if let Some(existing) = values.insert(number, symbol.clone()) {
            return Err(GenerationError::Unimplemented(format!(
                "enumeration {} maps both {} and {} to value {}",
                path, existing, symbol, number
            )));
        }
    }

    Ok(values)
}

/// Values of an identity base: `UNSET` then the sanitized identity names in
/// sorted order from 1. Two identities that sanitize to one symbol are an
/// error.
pub fn identity_values(base: &IdentityBase) -> Result<EnumValues, GenerationError> {
    let mut names: Vec<(String, &str)> = base
        .values
        .iter()
        .map(|v| (safe_proto_name(v), v.as_str()))
        .collect();
    names.sort();
    names.dedup_by(|a, b| a.1 == b.1);

    if let Some(pair) = names.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(GenerationError::IdentityCollision {
            base: base.name.clone(),
            first: pair[0].1.to_string(),
            second: pair[1].1.to_string(),
            symbol: pair[0].0.clone(),
        });
    }

    let mut values = EnumValues::new();
    values.insert(0, UNSET.to_string());
    for (i, (symbol, _)) in names.into_iter().enumerate() {
        values.insert(i as i64 + 1, symbol);
    }
    Ok(values)
}

/// Build one shared enum from the type that produced it
pub fn shared_enum(def: &SharedEnum) -> Result<ProtoEnum, GenerationError> {
    let leaf_type = &def.leaf_type;
    match &leaf_type.kind {
        TypeKind::Identityref { base } => Ok(ProtoEnum {
            name: def.name.clone(),
            description: format!("YANG identity {}", base.name),
            values: identity_values(base)?,
        }),
        TypeKind::Enumeration { .. } if !leaf_type.is_inline_enum() => Ok(ProtoEnum {
            name: def.name.clone(),
            description: format!("YANG typedef {}", leaf_type.name),
            values: enumeration_values(&def.source_path, leaf_type)?,
        }),
        TypeKind::Union { .. } if leaf_type.contains_enum() => {
            Err(GenerationError::Unimplemented(format!(
                "support for multiple enumerations within a union for {}",
                def.name
            )))
        }
        _ => Err(GenerationError::UnknownEnumShape {
            name: def.name.clone(),
        }),
    }
}

/// Every shared enum collected by the registry, in name order
pub fn generate_shared_enums(registry: &NameRegistry) -> Result<Vec<ProtoEnum>, GenerationErrors> {
    let mut enums = Vec::new();
    let mut errors = GenerationErrors::new();

    for def in registry.shared_enums() {
        match shared_enum(def) {
            Ok(e) => {
                debug!(name = %e.name, values = e.values.len(), "generated shared enum");
                enums.push(e);
            }
            Err(e) => {
                warn!(name = %def.name, error = %e, "could not generate shared enum");
                errors.push(e);
            }
        }
    }

    errors.into_result(enums)
}
