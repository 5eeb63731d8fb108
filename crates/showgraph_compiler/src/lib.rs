// SPDX-License-Identifier: MIT OR Apache-2.0
//! Show graph compiler for lighting shows.
//!
//! Turns an editable graph of lighting filters into the flat, fully resolved
//! show file a realtime lighting engine loads:
//! - Virtual filters (macros) unfold into concrete subgraphs
//! - Singleton filters are deduplicated per scene
//! - Every channel link is rewritten and type checked
//! - Output is written for the editor (authoring) or the engine (deployment)
//!
//! ## Architecture
//!
//! The [`ShowDocument`] model is owned by the editing layer. A [`Compiler`]
//! borrows it and derives a disposable [`CompiledShow`], which the
//! [`writer`] renders as XML. Rewrites from expansion and deduplication are
//! collected in a per-scene [`SubstitutionTable`] and only applied when the
//! [`Resolver`] binds links.

pub mod compiler;
pub mod config;
pub mod error;
pub mod expansion;
pub mod filter;
pub mod kind;
pub mod optimizer;
pub mod port;
pub mod reader;
pub mod resolver;
pub mod scene;
pub mod show;
pub mod value;
pub mod virtual_filters;
pub mod writer;

pub use compiler::{CompileMode, CompiledScene, CompiledShow, Compiler};
pub use config::{CompilerConfig, ConfigError, SchemaInfo};
pub use error::{CompileError, Result};
pub use filter::{Filter, FilterNode};
pub use kind::{FilterFamily, FilterKind};
pub use port::{PortRef, PortSignature};
pub use reader::{read_show, ReadError};
pub use resolver::{Resolver, SubstitutionTable};
pub use scene::{GraphError, Scene};
pub use show::{ShowDocument, Universe, UniverseLocation};
pub use value::{ColorHsi, Value, ValueType};
pub use virtual_filters::{MacroLibrary, VirtualFilter};
pub use writer::{write_show, WriteError};
