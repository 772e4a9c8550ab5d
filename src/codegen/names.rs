//! Name Resolution
//!
//! Assigns canonical protobuf names to schema nodes, handling:
//! - Package derivation from the schema path (honoring path compression)
//! - Message name uniqueness within a package
//! - Key-wrapper message names for keyed lists
//! - Shared (package-level) enumeration names
//!
//! The registry is append-only for a run: once a name is assigned it never
//! changes, and every later lookup returns it unchanged.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::directory::{is_compressed_away, DirectorySet};
use crate::error::GenerationError;
use crate::schema::{NodeId, SchemaTree, TypeDescriptor, TypeKind};

// =============================================================================
// Shared Enumerations
// =============================================================================

/// A package-level enumeration collected while mapping leaf types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedEnum {
    /// Name within the enumeration package
    pub name: String,
    /// Path of the first leaf that referenced the type
    pub source_path: String,
    /// Type of that leaf
    pub leaf_type: TypeDescriptor,
}

// =============================================================================
// Name Registry
// =============================================================================

/// Registry of packages, message names and shared enumerations for one
/// generation run.
pub struct NameRegistry {
    base_package: String,

    /// (compress flag, anchor path) -> package name
    packages: HashMap<(bool, String), String>,

    /// Package names already handed out
    used_packages: HashSet<String>,

    /// node path -> message name
    messages: HashMap<String, String>,

    /// list path -> key-wrapper message name
    key_messages: HashMap<String, String>,

    /// package -> message names claimed in it
    package_scopes: HashMap<String, HashSet<String>>,

    /// identity of the schema type -> shared enum name
    enum_keys: HashMap<String, String>,

    /// shared enum name -> definition
    shared_enums: BTreeMap<String, SharedEnum>,

    /// Names claimed in the enumeration package
    enum_scope: HashSet<String>,

    /// Whether message names may still be assigned on first use
    frozen: bool,

    disambiguated: usize,
}

impl NameRegistry {
    /// A cold registry that assigns names on first use
    pub fn new(base_package: impl Into<String>) -> Self {
        Self {
            base_package: base_package.into(),
            packages: HashMap::new(),
            used_packages: HashSet::new(),
            messages: HashMap::new(),
            key_messages: HashMap::new(),
            package_scopes: HashMap::new(),
            enum_keys: HashMap::new(),
            shared_enums: BTreeMap::new(),
            enum_scope: HashSet::new(),
            frozen: false,
            disambiguated: 0,
        }
    }

    /// Claim a package name up front so no schema-derived package takes it,
    /// e.g. the package holding shared enumerations.
    pub fn with_reserved_package(mut self, package: impl Into<String>) -> Self {
        self.used_packages.insert(package.into());
        self
    }

    /// Run the naming pre-pass over every directory and freeze the registry.
    ///
    /// Afterwards message and key-wrapper names are lookup-only.
    pub fn prepopulated(
        mut self,
        tree: &SchemaTree,
        directories: &DirectorySet,
        compress_paths: bool,
    ) -> Result<Self, GenerationError> {
        let registry = &mut self;

        for dir in directories.iter() {
            if tree.node(dir.node).parent.is_none() {
                continue;
            }
            registry.unique_message_name(tree, dir.node, compress_paths)?;
        }

        // Key wrappers live in the package of the message holding the list
        // field, so they can only be named once every parent is known.
        for parent in directories.iter() {
            if tree.node(parent.node).parent.is_none() {
                continue;
            }
            let parent_pkg = registry.package_for(tree, parent.node, compress_paths);
            for (_, field) in parent.sorted_fields() {
                let node = tree.node(field);
                if !node.is_keyed_list() {
                    continue;
                }
                let list_name = registry.unique_message_name(tree, field, compress_paths)?;
                registry.key_message_name(tree, field, &list_name, &parent_pkg)?;
            }
        }

        registry.frozen = true;
        Ok(self)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // =========================================================================
    // Packages
    // =========================================================================

    /// Package holding the message generated for `id`.
    ///
    /// Derived from the node's ancestors (excluding the module), skipping the
    /// levels that path compression elides. Siblings share an anchor and so
    /// always resolve to the same package.
    pub fn package_for(&mut self, tree: &SchemaTree, id: NodeId, compress_paths: bool) -> String {
        let mut parts = Vec::new();
        let mut anchor = None;
        let mut current = tree.node(id).parent;

        while let Some(ancestor) = current {
            let node = tree.node(ancestor);
            if node.parent.is_none() {
                break;
            }
            if !is_compressed_away(tree, ancestor, compress_paths) {
                anchor.get_or_insert(ancestor);
                parts.push(safe_proto_name(&node.name));
            }
            current = node.parent;
        }

        let anchor_path = anchor
            .map(|a| tree.node(a).path_string())
            .unwrap_or_default();
        let cache_key = (compress_paths, anchor_path);
        if let Some(pkg) = self.packages.get(&cache_key) {
            return pkg.clone();
        }

        parts.push(self.base_package.clone());
        parts.reverse();
        let candidate = parts.join(".");

        let pkg = disambiguate(&candidate, &mut self.used_packages);
        if pkg != candidate {
            self.disambiguated += 1;
        }

        debug!(anchor = %cache_key.1, package = %pkg, "assigned package");
        self.packages.insert(cache_key, pkg.clone());
        pkg
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Canonical message name for a container or list node
    pub fn unique_message_name(
        &mut self,
        tree: &SchemaTree,
        id: NodeId,
        compress_paths: bool,
    ) -> Result<String, GenerationError> {
        let node = tree.node(id);
        let path = node.path_string();

        if let Some(name) = self.messages.get(&path) {
            return Ok(name.clone());
        }
        if self.frozen {
            return Err(GenerationError::NameResolution {
                path,
                reason: "no message name was assigned before generation".to_string(),
            });
        }

        let pkg = self.package_for(tree, id, compress_paths);
        let candidate = to_pascal_case(&node.name);
        let name = self.claim_in_package(&pkg, &candidate);

        debug!(path = %path, package = %pkg, message = %name, "assigned message name");
        self.messages.insert(path, name.clone());
        Ok(name)
    }

    /// Name of the key-wrapper message for a keyed list, placed in the
    /// package of the message that holds the list field.
    pub fn key_message_name(
        &mut self,
        tree: &SchemaTree,
        list: NodeId,
        list_message: &str,
        parent_package: &str,
    ) -> Result<String, GenerationError> {
        let path = tree.node(list).path_string();

        if let Some(name) = self.key_messages.get(&path) {
            return Ok(name.clone());
        }
        if self.frozen {
            return Err(GenerationError::NameResolution {
                path,
                reason: "no key message name was assigned before generation".to_string(),
            });
        }

        let name = self.claim_in_package(parent_package, &format!("{}Key", list_message));
        debug!(path = %path, message = %name, "assigned key message name");
        self.key_messages.insert(path, name.clone());
        Ok(name)
    }

    fn claim_in_package(&mut self, pkg: &str, candidate: &str) -> String {
        let scope = self.package_scopes.entry(pkg.to_string()).or_default();
        let name = disambiguate(candidate, scope);
        if name != candidate {
            self.disambiguated += 1;
        }
        name
    }

    // =========================================================================
    // Shared Enumerations
    // =========================================================================

    /// Name of the package-level enum for a typedef enumeration, identityref
    /// or enumerated union, recording it for later emission.
    ///
    /// Every leaf referencing the same typedef or identity base shares one
    /// enum; unions are per leaf.
    pub fn shared_enum_name(&mut self, leaf_path: &str, leaf_type: &TypeDescriptor) -> String {
        let (key, candidate) = match &leaf_type.kind {
            TypeKind::Identityref { base } => (
                format!(
                    "identity:{}:{}",
                    base.module.as_deref().unwrap_or_default(),
                    base.name
                ),
                to_pascal_case(&base.name),
            ),
            TypeKind::Union { .. } => (
                format!("union:{}", leaf_path),
                to_pascal_case(leaf_path.rsplit('/').next().unwrap_or(leaf_path)),
            ),
            _ => (
                format!("typedef:{}", leaf_type.name),
                to_pascal_case(&leaf_type.name),
            ),
        };

        if let Some(name) = self.enum_keys.get(&key) {
            return name.clone();
        }

        let name = disambiguate(&candidate, &mut self.enum_scope);
        if name != candidate {
            self.disambiguated += 1;
        }

        debug!(source = %leaf_path, name = %name, "collected shared enum");
        self.enum_keys.insert(key, name.clone());
        self.shared_enums.insert(
            name.clone(),
            SharedEnum {
                name: name.clone(),
                source_path: leaf_path.to_string(),
                leaf_type: leaf_type.clone(),
            },
        );
        name
    }

    /// Shared enums in name order
    pub fn shared_enums(&self) -> impl Iterator<Item = &SharedEnum> {
        self.shared_enums.values()
    }

    /// Counts for run summaries
    pub fn stats(&self) -> NameRegistryStats {
        NameRegistryStats {
            packages: self.used_packages.len(),
            messages: self.messages.len(),
            key_messages: self.key_messages.len(),
            shared_enums: self.shared_enums.len(),
            disambiguated: self.disambiguated,
        }
    }
}

/// Statistics from name resolution
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NameRegistryStats {
    pub packages: usize,
    pub messages: usize,
    pub key_messages: usize,
    pub shared_enums: usize,
    pub disambiguated: usize,
}

// =============================================================================
// Helpers
// =============================================================================

/// Return `candidate`, or the first `candidate_N` (N = 1, 2, ...) not yet in
/// `used`, and claim it.
pub fn disambiguate(candidate: &str, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.to_string()) {
        return candidate.to_string();
    }

    let mut n = 1;
    loop {
        let name = format!("{}_{}", candidate, n);
        if used.insert(name.clone()) {
            return name;
        }
        n += 1;
    }
}

/// Replace every character protobuf does not allow in identifiers.
///
/// YANG identifiers may contain `-` and `.`, and enum names may contain
/// almost anything; protobuf allows only letters, digits and `_`.
pub fn safe_proto_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Convert a YANG identifier to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' || c == '.' || c == ' ' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    safe_proto_name(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NodeDef;

    fn tree() -> SchemaTree {
        SchemaTree::from_def(NodeDef::module(
            "openconfig-interfaces",
            vec![NodeDef::container(
                "interfaces",
                vec![NodeDef::list(
                    "interface",
                    &["name"],
                    vec![
                        NodeDef::leaf("name", TypeDescriptor::string()),
                        NodeDef::container(
                            "config",
                            vec![NodeDef::leaf("name", TypeDescriptor::string())],
                        ),
                        NodeDef::container(
                            "state",
                            vec![NodeDef::leaf("name", TypeDescriptor::string())],
                        ),
                    ],
                )],
            )],
        ))
        .unwrap()
    }

    #[test]
    fn test_disambiguate_appends_stable_suffix() {
        let mut used = HashSet::new();
        assert_eq!(disambiguate("name", &mut used), "name");
        assert_eq!(disambiguate("name", &mut used), "name_1");
        assert_eq!(disambiguate("name", &mut used), "name_2");
        assert_eq!(disambiguate("other", &mut used), "other");
    }

    #[test]
    fn test_safe_proto_name_is_idempotent() {
        for input in ["a-b.c", "10G*", "x/y z", "plain_name"] {
            let once = safe_proto_name(input);
            assert_eq!(safe_proto_name(&once), once);
        }
        assert_eq!(safe_proto_name("admin-status"), "admin_status");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("interface"), "Interface");
        assert_eq!(to_pascal_case("admin-status"), "AdminStatus");
        assert_eq!(to_pascal_case("ETHERNET_CSMACD"), "ETHERNETCSMACD");
    }

    #[test]
    fn test_uncompressed_packages_follow_path() {
        let tree = tree();
        let mut registry = NameRegistry::new("openconfig");
        let config = tree.find("/openconfig-interfaces/interfaces/interface/config").unwrap();
        let state = tree.find("/openconfig-interfaces/interfaces/interface/state").unwrap();
        let interfaces = tree.find("/openconfig-interfaces/interfaces").unwrap();

        assert_eq!(
            registry.package_for(&tree, config, false),
            "openconfig.interfaces.interface"
        );
        assert_eq!(
            registry.package_for(&tree, state, false),
            "openconfig.interfaces.interface"
        );
        assert_eq!(registry.package_for(&tree, interfaces, false), "openconfig");
        // idempotent
        assert_eq!(
            registry.package_for(&tree, config, false),
            "openconfig.interfaces.interface"
        );
    }

    #[test]
    fn test_compressed_packages_skip_elided_levels() {
        let tree = tree();
        let mut registry = NameRegistry::new("openconfig");
        let list = tree.find("/openconfig-interfaces/interfaces/interface").unwrap();
        assert_eq!(registry.package_for(&tree, list, true), "openconfig");
    }

    #[test]
    fn test_message_names_unique_per_package() {
        let tree = tree();
        let mut registry = NameRegistry::new("openconfig");
        let config = tree.find("/openconfig-interfaces/interfaces/interface/config").unwrap();
        let state = tree.find("/openconfig-interfaces/interfaces/interface/state").unwrap();

        assert_eq!(registry.unique_message_name(&tree, config, false).unwrap(), "Config");
        assert_eq!(registry.unique_message_name(&tree, state, false).unwrap(), "State");
        assert_eq!(registry.unique_message_name(&tree, config, false).unwrap(), "Config");
        assert_eq!(registry.stats().messages, 2);
    }

    #[test]
    fn test_frozen_registry_reports_missing_names() {
        let tree = tree();
        let directories = DirectorySet::collect(&tree, false);
        let mut registry = NameRegistry::new("openconfig")
            .prepopulated(&tree, &directories, false)
            .unwrap();
        assert!(registry.is_frozen());

        let list = tree.find("/openconfig-interfaces/interfaces/interface").unwrap();
        assert_eq!(registry.unique_message_name(&tree, list, false).unwrap(), "Interface");

        // The module root never gets a message, so a frozen lookup fails.
        let err = registry.unique_message_name(&tree, tree.root(), false).unwrap_err();
        assert!(matches!(err, GenerationError::NameResolution { .. }));
    }

    #[test]
    fn test_reserved_package_is_never_derived() {
        let tree = SchemaTree::from_def(NodeDef::module(
            "m",
            vec![NodeDef::container(
                "enums",
                vec![NodeDef::container(
                    "admin-state",
                    vec![NodeDef::leaf("value", TypeDescriptor::string())],
                )],
            )],
        ))
        .unwrap();
        let mut registry =
            NameRegistry::new("openconfig").with_reserved_package("openconfig.enums");
        let admin_state = tree.find("/m/enums/admin-state").unwrap();
        assert_eq!(registry.package_for(&tree, admin_state, false), "openconfig.enums_1");
    }

    #[test]
    fn test_shared_enums_deduplicate_by_type_identity() {
        let mut registry = NameRegistry::new("openconfig");
        let ty = TypeDescriptor::identityref("interface-type", &["ethernetCsmacd"]);
        let a = registry.shared_enum_name("/m/a/type", &ty);
        let b = registry.shared_enum_name("/m/b/type", &ty);
        assert_eq!(a, "InterfaceType");
        assert_eq!(a, b);
        assert_eq!(registry.shared_enums().count(), 1);
    }
}
