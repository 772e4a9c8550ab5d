//! Message Synthesis
//!
//! Builds the message records for one directory: the directory's own message
//! plus a key-wrapper message for every keyed list it holds. Field errors are
//! collected rather than short-circuited; a directory yields either all of
//! its messages or every error found while building them.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, trace};

use super::config::GeneratorConfig;
use super::directory::{holding_directory, Directory, DirectorySet};
use super::enums::{enumeration_values, EnumValues};
use super::names::{disambiguate, safe_proto_name, NameRegistry};
use super::tags::TagLedger;
use super::types::TypeMapper;
use crate::error::{GenerationError, GenerationErrors};
use crate::schema::{NodeId, NodeKind, SchemaNode, SchemaTree};

// =============================================================================
// Records
// =============================================================================

/// One field of a generated message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoField {
    pub tag: u32,
    pub name: String,
    pub type_name: String,
    pub repeated: bool,
    /// Field options, rendered inside `[...]`
    pub extensions: Vec<String>,
}

/// Which template a message renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Directory,
    ListKey,
}

/// A generated message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoMessage {
    pub name: String,
    pub package: String,
    /// Schema path the message was generated for
    pub yang_path: String,
    pub fields: Vec<ProtoField>,
    /// Embedded enums by name
    pub enums: BTreeMap<String, EnumValues>,
    /// Import paths, deduplicated in first-use order
    pub imports: Vec<String>,
    pub kind: MessageKind,
}

/// A field whose tag is not assigned yet
struct PendingField {
    name: String,
    type_name: String,
    repeated: bool,
    extensions: Vec<String>,
}

/// Per-message name scopes and collected requirements
struct MessageScope {
    field_names: HashSet<String>,
    enum_names: HashSet<String>,
    fields: Vec<PendingField>,
    enums: BTreeMap<String, EnumValues>,
    imports: Vec<String>,
}

impl MessageScope {
    fn new() -> Self {
        Self {
            field_names: HashSet::new(),
            enum_names: HashSet::new(),
            fields: Vec::new(),
            enums: BTreeMap::new(),
            imports: Vec::new(),
        }
    }

    fn field_name(&mut self, yang_name: &str) -> String {
        disambiguate(&safe_proto_name(yang_name), &mut self.field_names)
    }

    fn import(&mut self, path: String) {
        if !self.imports.contains(&path) {
            self.imports.push(path);
        }
    }

    fn into_message(
        self,
        name: String,
        package: String,
        yang_path: String,
        tags: Vec<u32>,
        kind: MessageKind,
    ) -> ProtoMessage {
        let fields = self
            .fields
            .into_iter()
            .zip(tags)
            .map(|(f, tag)| ProtoField {
                tag,
                name: f.name,
                type_name: f.type_name,
                repeated: f.repeated,
                extensions: f.extensions,
            })
            .collect();

        ProtoMessage {
            name,
            package,
            yang_path,
            fields,
            enums: self.enums,
            imports: self.imports,
            kind,
        }
    }
}

/// Import path of a package, relative to the base import path
pub fn package_import(package: &str) -> String {
    package.replace('.', "/")
}

// =============================================================================
// Synthesizer
// =============================================================================

/// Builds message records for the directories of one tree
pub struct MessageSynthesizer<'a> {
    tree: &'a SchemaTree,
    directories: &'a DirectorySet,
    config: &'a GeneratorConfig,
    mapper: TypeMapper<'a>,
}

impl<'a> MessageSynthesizer<'a> {
    pub fn new(
        tree: &'a SchemaTree,
        directories: &'a DirectorySet,
        config: &'a GeneratorConfig,
    ) -> Self {
        Self {
            tree,
            directories,
            config,
            mapper: TypeMapper::new(config),
        }
    }

    fn compress(&self) -> bool {
        self.config.compress_paths
    }

    /// Messages for `dir`: key wrappers first, then the directory's own
    /// message.
    pub fn synthesize(
        &self,
        dir: &Directory,
        registry: &mut NameRegistry,
        ledger: &mut TagLedger,
    ) -> Result<Vec<ProtoMessage>, GenerationErrors> {
        let node = self.tree.node(dir.node);
        let name = registry.unique_message_name(self.tree, dir.node, self.compress())?;
        let package = registry.package_for(self.tree, dir.node, self.compress());
        debug!(path = %dir.path, message = %name, package = %package, "synthesizing message");

        let mut errors = GenerationErrors::new();
        let mut scope = MessageScope::new();
        let mut key_wrappers = Vec::new();

        // Keys move to the wrapper, which only exists when some message holds
        // the list
        let strip_keys = node.is_keyed_list()
            && holding_directory(self.tree, dir.node, self.compress()).is_some();

        for (field_name, child_id) in dir.sorted_fields() {
            if strip_keys && node.key.iter().any(|k| k == field_name) {
                trace!(field = %field_name, "key leaf moved to key message");
                continue;
            }

            let child = self.tree.node(child_id);
            trace!(field = %field_name, kind = ?child.kind, "mapping field");
            let result = match child.kind {
                NodeKind::List => {
                    self.list_field(registry, &package, child_id)
                        .map(|(field, import, wrapper)| {
                            key_wrappers.extend(wrapper);
                            (field, import)
                        })
                }
                NodeKind::Container => self.container_field(registry, &package, child_id),
                NodeKind::Leaf | NodeKind::LeafList => {
                    self.leaf_field(registry, &mut scope, child)
                }
                NodeKind::Module | NodeKind::Anydata => Err(GenerationError::UnknownFieldKind {
                    message: dir.path.clone(),
                    field: field_name.to_string(),
                }
                .into()),
            };

            match result {
                Ok((mut field, import)) => {
                    field.name = scope.field_name(field_name);
                    if self.config.annotate_schema_paths {
                        field.extensions.push(schema_path_option(child));
                    }
                    if let Some(import) = import {
                        scope.import(import);
                    }
                    scope.fields.push(field);
                }
                Err(e) => errors.extend(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let field_names: Vec<String> = scope.fields.iter().map(|f| f.name.clone()).collect();
        let tags = ledger.assign(&dir.path, &field_names)?;

        let mut messages: Vec<ProtoMessage> = key_wrappers;
        messages.push(scope.into_message(
            name,
            package,
            dir.path.clone(),
            tags,
            MessageKind::Directory,
        ));
        Ok(messages)
    }

    /// Reference to a child message, with the import it needs
    fn message_ref(
        &self,
        registry: &mut NameRegistry,
        package: &str,
        child: NodeId,
    ) -> Result<(String, Option<String>), GenerationError> {
        let name = registry.unique_message_name(self.tree, child, self.compress())?;
        let child_package = registry.package_for(self.tree, child, self.compress());
        let import = (child_package != package).then(|| package_import(&child_package));
        Ok((format!("{}.{}", child_package, name), import))
    }

    fn container_field(
        &self,
        registry: &mut NameRegistry,
        package: &str,
        child: NodeId,
    ) -> Result<(PendingField, Option<String>), GenerationErrors> {
        let (type_name, import) = self.message_ref(registry, package, child)?;
        Ok((pending(type_name, false), import))
    }

    fn list_field(
        &self,
        registry: &mut NameRegistry,
        package: &str,
        child: NodeId,
    ) -> Result<(PendingField, Option<String>, Option<ProtoMessage>), GenerationErrors> {
        let (type_name, import) = self.message_ref(registry, package, child)?;
        let list = self.tree.node(child);
        if !list.is_keyed_list() {
            return Ok((pending(type_name, true), import, None));
        }

        let wrapper = self.key_message(registry, package, child, type_name)?;
        let wrapper_type = format!("{}.{}", package, wrapper.name);
        Ok((pending(wrapper_type, true), import, Some(wrapper)))
    }

    /// The key wrapper of a keyed list: key leaves in declared order, then the
    /// list's own message. Tags are 1..n in that order.
    fn key_message(
        &self,
        registry: &mut NameRegistry,
        package: &str,
        list_id: NodeId,
        list_type: String,
    ) -> Result<ProtoMessage, GenerationErrors> {
        let list = self.tree.node(list_id);
        let list_path = list.path_string();
        let list_message = registry.unique_message_name(self.tree, list_id, self.compress())?;
        let name = registry.key_message_name(self.tree, list_id, &list_message, package)?;

        let mut errors = GenerationErrors::new();
        let mut scope = MessageScope::new();

        for key in &list.key {
            match self.key_field(registry, &mut scope, list_id, key) {
                Ok(mut field) => {
                    field.name = scope.field_name(key);
                    scope.fields.push(field);
                }
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let list_package = list_type
            .rsplit_once('.')
            .map(|(pkg, _)| pkg.to_string())
            .unwrap_or_default();
        if list_package != package {
            scope.import(package_import(&list_package));
        }
        let mut value = pending(list_type, false);
        value.name = scope.field_name(&list.name);
        scope.fields.push(value);

        let tags = (1..=scope.fields.len() as u32).collect();
        debug!(list = %list_path, message = %name, "synthesized key message");
        Ok(scope.into_message(
            name,
            package.to_string(),
            list_path,
            tags,
            MessageKind::ListKey,
        ))
    }

    fn key_field(
        &self,
        registry: &mut NameRegistry,
        scope: &mut MessageScope,
        list_id: NodeId,
        key: &str,
    ) -> Result<PendingField, GenerationError> {
        let list = self.tree.node(list_id);
        let list_path = list.path_string();

        // With compression the key leaf may have been hoisted out of config
        let key_id = self
            .directories
            .get(&list_path)
            .and_then(|d| d.fields.get(key))
            .or_else(|| list.children.get(key))
            .copied()
            .ok_or_else(|| GenerationError::MissingKey {
                list: list_path.clone(),
                key: key.to_string(),
            })?;

        let key_node = self.tree.node(key_id);
        let leaf_type = match (&key_node.kind, &key_node.leaf_type) {
            (NodeKind::Leaf, Some(ty)) => ty,
            _ => {
                return Err(GenerationError::KeyType {
                    list: list_path,
                    key: key.to_string(),
                    type_name: format!("{:?}", key_node.kind).to_lowercase(),
                })
            }
        };

        let mapped = self.mapper.map_type(registry, key_node, leaf_type, true)?;
        let type_name = if leaf_type.is_inline_enum() {
            self.embed_enum(scope, key_node, &mapped.type_name)?
        } else {
            if let Some(import) = mapped.import {
                scope.import(import);
            }
            mapped.type_name
        };
        Ok(pending(type_name, false))
    }

    fn leaf_field(
        &self,
        registry: &mut NameRegistry,
        scope: &mut MessageScope,
        leaf: &SchemaNode,
    ) -> Result<(PendingField, Option<String>), GenerationErrors> {
        let leaf_type = leaf.leaf_type.as_ref().ok_or_else(|| GenerationError::UnsupportedType {
            path: leaf.path_string(),
            type_name: "<none>".to_string(),
        })?;

        let mapped = self.mapper.map_type(registry, leaf, leaf_type, false)?;
        let repeated = leaf.kind == NodeKind::LeafList;

        if leaf_type.is_inline_enum() {
            let enum_name = self.embed_enum(scope, leaf, &mapped.type_name)?;
            return Ok((pending(enum_name, repeated), None));
        }
        Ok((pending(mapped.type_name, repeated), mapped.import))
    }

    /// Add an embedded enum for an inline enumeration leaf, returning its
    /// name within the message.
    fn embed_enum(
        &self,
        scope: &mut MessageScope,
        leaf: &SchemaNode,
        candidate: &str,
    ) -> Result<String, GenerationError> {
        let leaf_type = leaf
            .leaf_type
            .as_ref()
            .ok_or_else(|| GenerationError::UnknownEnumShape {
                name: leaf.path_string(),
            })?;
        let values = enumeration_values(&leaf.path_string(), leaf_type)?;
        let name = disambiguate(candidate, &mut scope.enum_names);
        scope.enums.insert(name.clone(), values);
        Ok(name)
    }
}

fn pending(type_name: String, repeated: bool) -> PendingField {
    PendingField {
        name: String::new(),
        type_name,
        repeated,
        extensions: Vec::new(),
    }
}

fn schema_path_option(node: &SchemaNode) -> String {
    format!("(yext.schemapath) = \"{}\"", node.path_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeDef, TypeDescriptor, TypeKind};

    fn run(
        def: NodeDef,
        config: &GeneratorConfig,
        path: &str,
    ) -> Result<Vec<ProtoMessage>, GenerationErrors> {
        let tree = SchemaTree::from_def(def).unwrap();
        let directories = DirectorySet::collect(&tree, config.compress_paths);
        let mut registry = NameRegistry::new(config.base_package_name.clone());
        let mut ledger = TagLedger::new();
        let synth = MessageSynthesizer::new(&tree, &directories, config);
        synth.synthesize(directories.get(path).unwrap(), &mut registry, &mut ledger)
    }

    fn field_names(msg: &ProtoMessage) -> Vec<&str> {
        msg.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_fields_sorted_and_tagged() {
        let def = NodeDef::module(
            "m",
            vec![NodeDef::container(
                "top",
                vec![
                    NodeDef::leaf("b", TypeDescriptor::string()),
                    NodeDef::leaf("a", TypeDescriptor::boolean()),
                    NodeDef::leaf_list("c", TypeDescriptor::builtin(TypeKind::Int64)),
                ],
            )],
        );
        let msgs = run(def, &GeneratorConfig::default(), "/m/top").unwrap();
        assert_eq!(msgs.len(), 1);

        let top = &msgs[0];
        assert_eq!(top.name, "Top");
        assert_eq!(top.package, "openconfig");
        assert_eq!(field_names(top), vec!["a", "b", "c"]);
        assert_eq!(top.fields.iter().map(|f| f.tag).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(top.fields[2].type_name, "sint64");
        assert!(top.fields[2].repeated);
    }

    #[test]
    fn test_keyed_list_moves_keys_to_wrapper() {
        let def = NodeDef::module(
            "m",
            vec![NodeDef::container(
                "entries",
                vec![
                    NodeDef::leaf("description", TypeDescriptor::string()),
                    NodeDef::list(
                        "entry",
                        &["id", "kind"],
                        vec![
                            NodeDef::leaf("value", TypeDescriptor::string()),
                            NodeDef::leaf("kind", TypeDescriptor::enumeration(&[("A", 0)])),
                            NodeDef::leaf("id", TypeDescriptor::builtin(TypeKind::Uint32)),
                        ],
                    ),
                ],
            )],
        );
        let config = GeneratorConfig::default();

        let list = run(def.clone(), &config, "/m/entries/entry").unwrap();
        assert_eq!(field_names(&list[0]), vec!["value"]);

        let parent = run(def, &config, "/m/entries").unwrap();
        assert_eq!(parent.len(), 2);

        let wrapper = &parent[0];
        assert_eq!(wrapper.kind, MessageKind::ListKey);
        assert_eq!(wrapper.name, "EntryKey");
        assert_eq!(wrapper.package, "openconfig");
        assert_eq!(field_names(wrapper), vec!["id", "kind", "entry"]);
        assert_eq!(wrapper.fields.iter().map(|f| f.tag).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(wrapper.fields[1].type_name, "Kind");
        assert!(wrapper.enums.contains_key("Kind"));
        assert_eq!(wrapper.fields[2].type_name, "openconfig.entries.Entry");
        assert_eq!(wrapper.imports, vec!["openconfig/entries"]);

        let main = &parent[1];
        assert_eq!(field_names(main), vec!["description", "entry"]);
        assert_eq!(main.fields[1].type_name, "openconfig.EntryKey");
        assert!(main.fields[1].repeated);
        assert_eq!(main.imports, vec!["openconfig/entries"]);
    }

    #[test]
    fn test_missing_key() {
        let def = NodeDef::module(
            "m",
            vec![NodeDef::container(
                "entries",
                vec![NodeDef::list(
                    "entry",
                    &["id"],
                    vec![NodeDef::leaf("value", TypeDescriptor::string())],
                )],
            )],
        );
        let errs = run(def, &GeneratorConfig::default(), "/m/entries").unwrap_err();
        assert_eq!(
            errs.into_vec(),
            vec![GenerationError::MissingKey {
                list: "/m/entries/entry".to_string(),
                key: "id".to_string(),
            }]
        );
    }

    #[test]
    fn test_errors_accumulate_across_fields() {
        let def = NodeDef::module(
            "m",
            vec![NodeDef::container(
                "top",
                vec![
                    NodeDef::leaf("a", TypeDescriptor::builtin(TypeKind::Bits)),
                    NodeDef::leaf("b", TypeDescriptor::string()),
                    NodeDef::leaf(
                        "c",
                        TypeDescriptor::enumeration(&[("X", 0)]).with_default("Y"),
                    ),
                    NodeDef::anydata("d"),
                ],
            )],
        );
        let errs = run(def, &GeneratorConfig::default(), "/m/top").unwrap_err();
        let errs = errs.into_vec();
        assert_eq!(errs.len(), 3);
        assert!(matches!(errs[0], GenerationError::UnsupportedType { .. }));
        assert!(matches!(errs[1], GenerationError::InvalidDefault { .. }));
        assert!(matches!(errs[2], GenerationError::UnknownFieldKind { .. }));
    }

    #[test]
    fn test_colliding_field_names_are_disambiguated() {
        let def = NodeDef::module(
            "m",
            vec![NodeDef::container(
                "top",
                vec![
                    NodeDef::leaf("a-b", TypeDescriptor::string()),
                    NodeDef::leaf("a_b", TypeDescriptor::string()),
                ],
            )],
        );
        let msgs = run(def, &GeneratorConfig::default(), "/m/top").unwrap();
        assert_eq!(field_names(&msgs[0]), vec!["a_b", "a_b_1"]);
    }

    #[test]
    fn test_schema_path_annotations() {
        let def = NodeDef::module(
            "m",
            vec![NodeDef::container(
                "top",
                vec![NodeDef::leaf("a", TypeDescriptor::string())],
            )],
        );
        let config = GeneratorConfig {
            annotate_schema_paths: true,
            ..GeneratorConfig::default()
        };
        let msgs = run(def, &config, "/m/top").unwrap();
        assert_eq!(
            msgs[0].fields[0].extensions,
            vec!["(yext.schemapath) = \"/m/top/a\"".to_string()]
        );
    }
}
