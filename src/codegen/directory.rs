//! Directories
//!
//! A directory is a schema node that becomes a message, together with the
//! fields that message carries. Without path compression the fields are the
//! node's own children. With compression:
//! - `config`/`state` containers vanish and their children are hoisted into
//!   the enclosing directory (direct children win, then `config`, then `state`)
//! - a container whose only child is a list vanishes and the list is hoisted
//!   into the enclosing directory under its own name

use std::collections::HashMap;

use crate::schema::{NodeId, NodeKind, SchemaTree};

/// A message-producing node and its field map
#[derive(Debug, Clone)]
pub struct Directory {
    pub node: NodeId,
    pub path: String,
    pub fields: HashMap<String, NodeId>,
}

impl Directory {
    /// Fields in lexicographic name order
    pub fn sorted_fields(&self) -> Vec<(&str, NodeId)> {
        let mut fields: Vec<(&str, NodeId)> = self
            .fields
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}

/// Whether path compression removes `id` from the message hierarchy
pub fn is_compressed_away(tree: &SchemaTree, id: NodeId, compress_paths: bool) -> bool {
    if !compress_paths {
        return false;
    }
    let node = tree.node(id);
    if node.kind != NodeKind::Container {
        return false;
    }
    is_config_or_state(tree, id) || is_list_surround(tree, id)
}

/// Nearest ancestor of `id` that produces a message, if any
pub fn holding_directory(tree: &SchemaTree, id: NodeId, compress_paths: bool) -> Option<NodeId> {
    let mut current = tree.node(id).parent;
    while let Some(ancestor) = current {
        let node = tree.node(ancestor);
        if node.parent.is_none() {
            return None;
        }
        if !is_compressed_away(tree, ancestor, compress_paths) {
            return Some(ancestor);
        }
        current = node.parent;
    }
    None
}

fn is_config_or_state(tree: &SchemaTree, id: NodeId) -> bool {
    let node = tree.node(id);
    let under_directory = node
        .parent
        .map(|p| tree.node(p).kind.is_directory())
        .unwrap_or(false);
    under_directory && (node.name == "config" || node.name == "state")
}

fn is_list_surround(tree: &SchemaTree, id: NodeId) -> bool {
    let node = tree.node(id);
    node.children.len() == 1
        && node
            .children
            .values()
            .all(|child| tree.node(*child).kind == NodeKind::List)
}

/// Every directory of a tree in bottom-up order
#[derive(Debug, Clone, Default)]
pub struct DirectorySet {
    order: Vec<Directory>,
    by_path: HashMap<String, usize>,
}

impl DirectorySet {
    /// Collect directories, children before parents and siblings in name
    /// order. The module root is never a directory.
    pub fn collect(tree: &SchemaTree, compress_paths: bool) -> Self {
        let mut set = Self::default();
        set.visit(tree, tree.root(), compress_paths);
        set
    }

    fn visit(&mut self, tree: &SchemaTree, id: NodeId, compress_paths: bool) {
        for (_, child) in tree.sorted_children(id) {
            self.visit(tree, child, compress_paths);
        }

        let node = tree.node(id);
        if node.parent.is_none()
            || !node.kind.is_directory()
            || is_compressed_away(tree, id, compress_paths)
        {
            return;
        }

        let dir = Directory {
            node: id,
            path: node.path_string(),
            fields: fields_of(tree, id, compress_paths),
        };
        self.by_path.insert(dir.path.clone(), self.order.len());
        self.order.push(dir);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directory> {
        self.order.iter()
    }

    pub fn get(&self, path: &str) -> Option<&Directory> {
        self.by_path.get(path).map(|i| &self.order[*i])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn fields_of(tree: &SchemaTree, id: NodeId, compress_paths: bool) -> HashMap<String, NodeId> {
    let mut direct = Vec::new();
    let mut hoisted_config = Vec::new();
    let mut hoisted_state = Vec::new();

    for (name, child) in tree.sorted_children(id) {
        if !is_compressed_away(tree, child, compress_paths) || is_list_surround(tree, child) {
            expand_field(tree, name, child, compress_paths, &mut direct);
        } else if name == "config" {
            expand_field(tree, name, child, compress_paths, &mut hoisted_config);
        } else {
            expand_field(tree, name, child, compress_paths, &mut hoisted_state);
        }
    }

    let mut fields = HashMap::new();
    for (name, child) in direct.into_iter().chain(hoisted_config).chain(hoisted_state) {
        fields.entry(name.to_string()).or_insert(child);
    }
    fields
}

/// Push `child` as a field, or the fields it contributes when compression
/// removes it. Elided levels nest, e.g. a list surround inside `config`.
fn expand_field<'a>(
    tree: &'a SchemaTree,
    name: &'a str,
    child: NodeId,
    compress_paths: bool,
    out: &mut Vec<(&'a str, NodeId)>,
) {
    if !is_compressed_away(tree, child, compress_paths) {
        out.push((name, child));
        return;
    }
    for (inner_name, inner) in tree.sorted_children(child) {
        expand_field(tree, inner_name, inner, compress_paths, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeDef, TypeDescriptor};

    fn tree() -> SchemaTree {
        SchemaTree::from_def(NodeDef::module(
            "m",
            vec![NodeDef::container(
                "interfaces",
                vec![NodeDef::list(
                    "interface",
                    &["name"],
                    vec![
                        NodeDef::leaf("name", TypeDescriptor::string()),
                        NodeDef::container(
                            "config",
                            vec![
                                NodeDef::leaf("name", TypeDescriptor::string()),
                                NodeDef::leaf("mtu", TypeDescriptor::string()),
                            ],
                        ),
                        NodeDef::container(
                            "state",
                            vec![
                                NodeDef::leaf("mtu", TypeDescriptor::boolean()),
                                NodeDef::leaf("oper-status", TypeDescriptor::string()),
                            ],
                        ),
                    ],
                )],
            )],
        ))
        .unwrap()
    }

    #[test]
    fn test_uncompressed_directories_are_bottom_up() {
        let tree = tree();
        let set = DirectorySet::collect(&tree, false);
        let paths: Vec<&str> = set.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/m/interfaces/interface/config",
                "/m/interfaces/interface/state",
                "/m/interfaces/interface",
                "/m/interfaces",
            ]
        );
    }

    #[test]
    fn test_compressed_directories_hoist_config_and_state() {
        let tree = tree();
        let set = DirectorySet::collect(&tree, true);
        let paths: Vec<&str> = set.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["/m/interfaces/interface"]);

        let list = set.get("/m/interfaces/interface").unwrap();
        let names: Vec<&str> = list.sorted_fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["mtu", "name", "oper-status"]);

        // the list is top level once its surrounding container is elided
        assert_eq!(holding_directory(&tree, list.node, true), None);
        let config = tree.find("/m/interfaces/interface/config").unwrap();
        assert_eq!(holding_directory(&tree, config, false), Some(list.node));

        // direct child wins over config, config wins over state
        assert_eq!(list.fields["name"], tree.find("/m/interfaces/interface/name").unwrap());
        assert_eq!(
            list.fields["mtu"],
            tree.find("/m/interfaces/interface/config/mtu").unwrap()
        );
    }

    #[test]
    fn test_list_surround_inside_config_is_expanded() {
        let tree = SchemaTree::from_def(NodeDef::module(
            "m",
            vec![NodeDef::container(
                "top",
                vec![
                    NodeDef::leaf("x", TypeDescriptor::string()),
                    NodeDef::container(
                        "config",
                        vec![NodeDef::container(
                            "servers",
                            vec![NodeDef::list(
                                "server",
                                &["addr"],
                                vec![NodeDef::leaf("addr", TypeDescriptor::string())],
                            )],
                        )],
                    ),
                ],
            )],
        ))
        .unwrap();
        let set = DirectorySet::collect(&tree, true);
        let paths: Vec<&str> = set.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["/m/top/config/servers/server", "/m/top"]);

        let top = set.get("/m/top").unwrap();
        let names: Vec<&str> = top.sorted_fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["server", "x"]);

        let server = tree.find("/m/top/config/servers/server").unwrap();
        assert_eq!(top.fields["server"], server);
        assert_eq!(holding_directory(&tree, server, true), Some(top.node));
    }
}
