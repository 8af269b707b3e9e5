//! The module model: one loaded source file plus its name-keyed tables.
//!
//! Modules live in the checker's arena indexed by [`ModuleId`]; every
//! cross-module reference is a module id plus a name, never a pointer, so
//! cyclic import graphs and recursive types stay representable with plain
//! owned data.

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use sable_common::span::Span;
use sable_common::types::{ModuleId, Type};
use sable_parser::ast::Program;

/// What kind of binding a name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Function,
    Constant,
    Namespace,
}

/// One entry in a module's type/function/constant table.
///
/// `resolving` and `ty` are the only fields mutated after loading: the
/// resolver sets the flag while it works on the entry (cycle detection)
/// and caches the finished type, after which the entry is frozen.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    /// Index of the declaration in the module's `ast.decls`, for local
    /// symbols. Imported entries have no local declaration.
    pub decl: Option<usize>,
    /// For imported entries: the source module and its export name.
    pub imported: Option<(ModuleId, String)>,
    /// Cycle-detection flag, set while this entry is being resolved.
    pub resolving: bool,
    /// Cached resolved type.
    pub ty: Option<Type>,
    /// Span of the declaring name, for diagnostics.
    pub span: Span,
}

impl SymbolEntry {
    pub fn local(decl: usize, span: Span) -> Self {
        Self {
            decl: Some(decl),
            imported: None,
            resolving: false,
            ty: None,
            span,
        }
    }

    pub fn imported(source: ModuleId, export_name: String, span: Span) -> Self {
        Self {
            decl: None,
            imported: Some((source, export_name)),
            resolving: false,
            ty: None,
            span,
        }
    }
}

/// One entry in a module's export table.
#[derive(Debug, Clone)]
pub enum ExportBinding {
    /// An export backed by a local (or imported) binding of this module.
    Local {
        kind: SymbolKind,
        value_name: String,
        span: Span,
    },
    /// An export-forward: re-exports `source_name` from another module
    /// without binding it locally.
    Forward {
        module: ModuleId,
        source_name: String,
        span: Span,
    },
}

impl ExportBinding {
    pub fn span(&self) -> Span {
        match self {
            ExportBinding::Local { span, .. } | ExportBinding::Forward { span, .. } => *span,
        }
    }
}

/// A loaded module.
#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    /// Canonical absolute path. The module cache keys on this, so no two
    /// modules share one.
    pub path: PathBuf,
    pub ast: Program,
    /// alias -> imported binding, merged into the kind tables below; kept
    /// for diagnostics.
    pub imports: FxHashMap<String, (ModuleId, String, SymbolKind)>,
    /// export name -> binding.
    pub exports: FxHashMap<String, ExportBinding>,
    pub types: FxHashMap<String, SymbolEntry>,
    pub functions: FxHashMap<String, SymbolEntry>,
    pub constants: FxHashMap<String, SymbolEntry>,
    /// namespace alias -> target module (wildcard imports).
    pub namespaces: FxHashMap<String, ModuleId>,
    /// Span of the binding previously installed under a name, used to
    /// point name-clash errors at whichever declaration comes later.
    pub binding_spans: FxHashMap<String, Span>,
}

impl Module {
    pub fn new(id: ModuleId, path: PathBuf, ast: Program) -> Self {
        Self {
            id,
            path,
            ast,
            imports: FxHashMap::default(),
            exports: FxHashMap::default(),
            types: FxHashMap::default(),
            functions: FxHashMap::default(),
            constants: FxHashMap::default(),
            namespaces: FxHashMap::default(),
            binding_spans: FxHashMap::default(),
        }
    }

    /// Whether any of the four mutually-unique tables binds `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.types.contains_key(name)
            || self.functions.contains_key(name)
            || self.constants.contains_key(name)
            || self.namespaces.contains_key(name)
    }

    /// The kind a bound name denotes, if any.
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        if self.types.contains_key(name) {
            Some(SymbolKind::Type)
        } else if self.functions.contains_key(name) {
            Some(SymbolKind::Function)
        } else if self.constants.contains_key(name) {
            Some(SymbolKind::Constant)
        } else if self.namespaces.contains_key(name) {
            Some(SymbolKind::Namespace)
        } else {
            None
        }
    }

    pub fn table_mut(&mut self, kind: SymbolKind) -> &mut FxHashMap<String, SymbolEntry> {
        match kind {
            SymbolKind::Type => &mut self.types,
            SymbolKind::Function => &mut self.functions,
            SymbolKind::Constant => &mut self.constants,
            SymbolKind::Namespace => unreachable!("namespaces have their own table"),
        }
    }
}
