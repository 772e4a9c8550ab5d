//! Code Generation
//!
//! Generates proto3 source from a YANG schema tree.
//!
//! Architecture:
//! - DirectorySet: every message-producing node with its (possibly hoisted) fields
//! - NameRegistry: packages and message names, pre-populated then frozen
//! - MessageSynthesizer: Directory -> ProtoMessage records, errors accumulated
//! - enums: shared enumeration value tables
//! - render: records -> text
//!
//! Output is all-or-nothing: a run that hits any error returns every error
//! and no files.

pub mod config;
pub mod directory;
pub mod enums;
pub mod message;
pub mod names;
pub mod render;
pub mod tags;
pub mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::config::SourceConfig;
use crate::error::{GenerationError, GenerationErrors};
use crate::schema::{NodeId, SchemaTree};

use self::config::GeneratorConfig;
use self::directory::DirectorySet;
use self::enums::generate_shared_enums;
use self::message::{package_import, MessageSynthesizer};
use self::names::NameRegistry;
use self::render::{render_enum, render_header, render_message, Proto3Header};
use self::tags::TagLedger;

// =============================================================================
// Generated Output
// =============================================================================

/// Rendered messages of one directory, with the package they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    pub package: String,
    /// Message text, key wrappers first
    pub code: String,
    /// Import paths of other packages, in first-use order
    pub imports: Vec<String>,
}

/// One generated `.proto` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoFile {
    pub package: String,
    /// Path relative to the output directory
    pub path: PathBuf,
    pub imports: Vec<String>,
    pub content: String,
}

impl ProtoFile {
    pub fn checksum(&self) -> Checksum {
        Checksum::from_text(&self.content)
    }
}

/// Every file of a generation run, by package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proto3Output {
    pub files: BTreeMap<String, ProtoFile>,
}

impl Proto3Output {
    pub fn get(&self, package: &str) -> Option<&ProtoFile> {
        self.files.get(package)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtoFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file below `dir`, returning the written paths
    pub fn write_to(&self, dir: &Path) -> crate::Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for file in self.files.values() {
            let path = dir.join(&file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &file.content)?;
            debug!(path = %path.display(), "wrote proto file");
            written.push(path);
        }
        Ok(written)
    }
}

/// Path of a package's file relative to the output directory
pub fn package_path(package: &str) -> PathBuf {
    PathBuf::from(format!("{}.proto", package.replace('.', "/")))
}

#[derive(Default)]
struct PackageBody {
    code: String,
    imports: Vec<String>,
}

impl PackageBody {
    fn add(&mut self, code: &str, imports: &[String]) {
        self.code.push_str(code);
        for import in imports {
            if !self.imports.contains(import) {
                self.imports.push(import.clone());
            }
        }
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Proto3 generator for one configuration
pub struct ProtoGenerator {
    config: GeneratorConfig,
    sources: SourceConfig,
}

impl ProtoGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            sources: SourceConfig::default(),
        }
    }

    /// Record input files and include paths for header comments
    pub fn with_sources(mut self, sources: SourceConfig) -> Self {
        self.sources = sources;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Directories of `tree` under this generator's compression setting
    pub fn directories(&self, tree: &SchemaTree) -> DirectorySet {
        DirectorySet::collect(tree, self.config.compress_paths)
    }

    /// An empty registry that assigns names on first use. The shared
    /// enumeration package is reserved.
    pub fn cold_registry(&self) -> NameRegistry {
        NameRegistry::new(self.config.base_package_name.clone())
            .with_reserved_package(self.config.enum_package())
    }

    /// A registry with every message name assigned, ready for generation
    pub fn registry(
        &self,
        tree: &SchemaTree,
        directories: &DirectorySet,
    ) -> Result<NameRegistry, GenerationError> {
        self.cold_registry()
            .prepopulated(tree, directories, self.config.compress_paths)
    }

    /// Generate and render the messages for the node `id`.
    ///
    /// Fails for the module root, and for nodes that path compression
    /// removed from the message hierarchy.
    pub fn write_message(
        &self,
        tree: &SchemaTree,
        directories: &DirectorySet,
        id: NodeId,
        registry: &mut NameRegistry,
        ledger: &mut TagLedger,
    ) -> Result<GeneratedMessage, GenerationErrors> {
        let node = tree.node(id);
        let path = node.path_string();
        if node.parent.is_none() {
            return Err(GenerationError::ModuleMessage { path }.into());
        }

        let dir = directories
            .get(&path)
            .ok_or_else(|| GenerationError::NameResolution {
                path: path.clone(),
                reason: "node does not produce a message".to_string(),
            })?;

        let synth = MessageSynthesizer::new(tree, directories, &self.config);
        let messages = synth.synthesize(dir, registry, ledger)?;

        let package = registry.package_for(tree, id, self.config.compress_paths);
        let own_import = package_import(&package);
        let mut body = PackageBody::default();
        for msg in &messages {
            let imports: Vec<String> = msg
                .imports
                .iter()
                .filter(|i| **i != own_import)
                .cloned()
                .collect();
            body.add(&render_message(msg), &imports);
        }

        Ok(GeneratedMessage {
            package,
            code: body.code,
            imports: body.imports,
        })
    }

    /// Generate every file for `tree`, recording new field tags in `ledger`
    pub fn generate(
        &self,
        tree: &SchemaTree,
        ledger: &mut TagLedger,
    ) -> Result<Proto3Output, GenerationErrors> {
        let directories = self.directories(tree);
        let mut registry = self.registry(tree, &directories)?;
        self.generate_with_registry(tree, &directories, &mut registry, ledger)
    }

    /// Generate every file using an existing registry, cold or pre-populated
    pub fn generate_with_registry(
        &self,
        tree: &SchemaTree,
        directories: &DirectorySet,
        registry: &mut NameRegistry,
        ledger: &mut TagLedger,
    ) -> Result<Proto3Output, GenerationErrors> {
        let mut errors = GenerationErrors::new();
        let mut packages: BTreeMap<String, PackageBody> = BTreeMap::new();
        let mut message_count = 0;

        for dir in directories.iter() {
            match self.write_message(tree, directories, dir.node, registry, ledger) {
                Ok(generated) => {
                    message_count += 1;
                    packages
                        .entry(generated.package)
                        .or_default()
                        .add(&generated.code, &generated.imports);
                }
                Err(errs) => {
                    for e in errs.iter() {
                        warn!(path = %dir.path, error = %e, "message generation failed");
                    }
                    errors.extend(errs);
                }
            }
        }

        let enum_package = self.config.enum_package();
        match generate_shared_enums(registry) {
            Ok(shared) if !shared.is_empty() => {
                let body = packages.entry(enum_package).or_default();
                for e in &shared {
                    body.add(&render_enum(e), &[]);
                }
            }
            Ok(_) => {}
            Err(errs) => errors.extend(errs),
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let stats = registry.stats();
        info!(
            files = packages.len(),
            messages = message_count,
            key_messages = stats.key_messages,
            shared_enums = stats.shared_enums,
            disambiguated = stats.disambiguated,
            "generated proto3 output"
        );

        let files = packages
            .into_iter()
            .map(|(package, body)| {
                let file = self.render_file(&package, body);
                (package, file)
            })
            .collect();
        Ok(Proto3Output { files })
    }

    fn render_file(&self, package: &str, body: PackageBody) -> ProtoFile {
        let own_import = package_import(package);
        let imports: Vec<String> = body
            .imports
            .into_iter()
            .filter(|i| *i != own_import)
            .collect();

        let header = Proto3Header {
            package,
            caller_name: &self.config.caller_name,
            source_files: &self.sources.yang_files,
            include_paths: &self.sources.include_paths,
            imports: &imports,
            base_import_path: &self.config.base_import_path,
            wrapper_types: self.config.wrapper_types,
            annotate_schema_paths: self.config.annotate_schema_paths,
        };

        let mut content = render_header(&header);
        content.push_str(&body.code);

        ProtoFile {
            package: package.to_string(),
            path: package_path(package),
            imports,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeDef, TypeDescriptor, TypeKind};

    fn tree() -> SchemaTree {
        SchemaTree::from_def(NodeDef::module(
            "m",
            vec![NodeDef::container(
                "interface",
                vec![
                    NodeDef::leaf("name", TypeDescriptor::string()),
                    NodeDef::leaf("enabled", TypeDescriptor::boolean()),
                    NodeDef::leaf("type", TypeDescriptor::identityref("interface-type", &["ETH"])),
                    NodeDef::container(
                        "counters",
                        vec![NodeDef::leaf("in-octets", TypeDescriptor::builtin(TypeKind::Uint64))],
                    ),
                ],
            )],
        ))
        .unwrap()
    }

    #[test]
    fn test_write_message_for_module_fails() {
        let tree = tree();
        let generator = ProtoGenerator::new(GeneratorConfig::default());
        let directories = generator.directories(&tree);
        let mut registry = NameRegistry::new("openconfig");
        let mut ledger = TagLedger::new();

        let errs = generator
            .write_message(&tree, &directories, tree.root(), &mut registry, &mut ledger)
            .unwrap_err();
        assert_eq!(
            errs.into_vec(),
            vec![GenerationError::ModuleMessage { path: "/m".to_string() }]
        );
    }

    #[test]
    fn test_write_message_returns_package_and_imports() {
        let tree = tree();
        let generator = ProtoGenerator::new(GeneratorConfig::default());
        let directories = generator.directories(&tree);
        let mut registry = NameRegistry::new("openconfig");
        let mut ledger = TagLedger::new();

        let id = tree.find("/m/interface").unwrap();
        let generated = generator
            .write_message(&tree, &directories, id, &mut registry, &mut ledger)
            .unwrap();
        assert_eq!(generated.package, "openconfig");
        assert_eq!(generated.imports, vec!["openconfig/interface", "openconfig/enums"]);
        assert!(generated.code.contains("openconfig.interface.Counters counters = 1;"));
        assert!(generated.code.contains("openconfig.enums.InterfaceType type = 4;"));
    }

    #[test]
    fn test_generate_groups_by_package() {
        let tree = tree();
        let generator = ProtoGenerator::new(GeneratorConfig::default());
        let mut ledger = TagLedger::new();
        let output = generator.generate(&tree, &mut ledger).unwrap();

        let packages: Vec<&str> = output.files.keys().map(String::as_str).collect();
        assert_eq!(packages, vec!["openconfig", "openconfig.enums", "openconfig.interface"]);

        let enums = output.get("openconfig.enums").unwrap();
        assert_eq!(enums.path, PathBuf::from("openconfig/enums.proto"));
        assert!(enums.content.contains("InterfaceType_ETH = 1;"));
        assert!(enums.imports.is_empty());
    }

    #[test]
    fn test_write_to_creates_package_dirs() {
        let tree = tree();
        let generator = ProtoGenerator::new(GeneratorConfig::default());
        let output = generator.generate(&tree, &mut TagLedger::new()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = output.write_to(dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("openconfig/interface.proto").exists());
    }
}
