//! Sable type checker: module loading and type resolution.
//!
//! Builds the transitive module graph from a main file, installs every
//! declaration into per-module symbol tables, and resolves the type of
//! every non-imported type, function and constant. Semantic errors
//! accumulate (with `unknown` poisoning in place of failed types) and
//! surface from [`TypeChecker::check`] as one combined failure.
//!
//! # Architecture
//!
//! - [`module`]: the module arena entry -- AST plus five name-keyed tables
//! - [`loader`]: path resolution, the module cache, `process_declarations`
//! - `resolver`: name lookup, generic instantiation, the resolve driver
//! - `expr`: expression and statement checking
//! - [`ops`]: the operator typing rule set
//! - [`assign`]: assignability and upper bounds
//! - [`error`] / [`diagnostics`]: error data and ariadne rendering

pub mod assign;
pub mod diagnostics;
pub mod error;
mod expr;
pub mod loader;
pub mod module;
pub mod ops;
mod resolver;

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use sable_common::fs::FileSystem;
use sable_common::ops::OperatorTable;
use sable_common::span::Span;
use sable_common::types::ModuleId;

pub use error::{CheckFailure, TypeckError, TypeckErrorKind};
pub use loader::{resolve_import_path, SOURCE_EXTENSION};
pub use module::{ExportBinding, Module, SymbolEntry, SymbolKind};

/// The type checker: owns the module arena, the path cache, the operator
/// table and the error list.
///
/// Single-threaded and not reentrant: all shared mutable state (the
/// module vector, the path cache, and the `resolving`/`ty` fields on
/// declaration entries) is mutated strictly during [`TypeChecker::check`].
/// A caller that wants to abort simply drops the instance.
#[derive(Debug)]
pub struct TypeChecker<F: FileSystem> {
    fs: F,
    operators: OperatorTable,
    modules: Vec<Module>,
    path_cache: FxHashMap<PathBuf, ModuleId>,
    errors: Vec<TypeckError>,
}

impl<F: FileSystem> TypeChecker<F> {
    /// Create a checker over the given filesystem capability and operator
    /// table. The table is built once by the caller and threaded through.
    pub fn new(fs: F, operators: OperatorTable) -> Self {
        Self {
            fs,
            operators,
            modules: Vec::new(),
            path_cache: FxHashMap::default(),
            errors: Vec::new(),
        }
    }

    /// Check the program rooted at `main_path`: load the transitive
    /// module graph, then resolve every declaration. A non-empty error
    /// list surfaces as a single combined failure.
    pub fn check(&mut self, main_path: &Path) -> Result<(), CheckFailure> {
        match self.load_module(main_path) {
            Ok(_) => self.resolve_all(),
            // Lexical and syntactic errors abort loading outright.
            Err(error) => self.errors.push(error),
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CheckFailure {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }

    /// The loaded modules, in load order. The main module is first.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    /// Read the source of a loaded module back from the filesystem, for
    /// diagnostic rendering.
    pub fn read_source(&self, path: &Path) -> Option<String> {
        self.fs.read(path).ok()
    }

    pub(crate) fn push_error(&mut self, module: ModuleId, kind: TypeckErrorKind, span: Span) {
        let path = self.modules[module.0 as usize].path.clone();
        self.errors.push(TypeckError::new(kind, path, span));
    }
}
