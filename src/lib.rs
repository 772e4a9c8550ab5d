//! YANG Proto Generator
//!
//! Compiles a parsed YANG schema tree into proto3 source: one message per
//! container or list, key-wrapper messages for keyed lists, and shared
//! enumerations for typedefs and identities.
//!
//! ## Features
//!
//! - **Deterministic Output**: Field order never depends on input order
//! - **Stable Tags**: A tag ledger keeps wire tags fixed across regeneration
//! - **Path Compression**: Optional collapsing of config/state and list-surrounding containers
//! - **Complete Diagnostics**: Every mapping error of a run is reported together
//!
//! ## Pipeline
//!
//! ```text
//! SchemaTree (JSON IR)
//!   -> DirectorySet         message-producing nodes and their fields
//!   -> NameRegistry         packages and message names, then frozen
//!   -> MessageSynthesizer   ProtoMessage records per directory
//!   -> render               proto3 text, grouped into one file per package
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod drift;
pub mod error;
pub mod schema;

pub use checksum::Checksum;
pub use codegen::config::GeneratorConfig;
pub use codegen::tags::TagLedger;
pub use codegen::{GeneratedMessage, Proto3Output, ProtoFile, ProtoGenerator};
pub use config::ProtogenConfig;
pub use error::{GenerationError, GenerationErrors, ProtogenError, Result};
pub use schema::{NodeDef, NodeKind, SchemaTree, TypeDescriptor, TypeKind};
