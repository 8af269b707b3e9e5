//! Module loading: path resolution, the module cache, and
//! `process_declarations`.
//!
//! Loading is depth-first: a module is parsed, registered in the cache
//! (keyed by its normalized path, so every physical file loads exactly
//! once), and its declarations are processed in the fixed order imports,
//! types, functions, constants, exports, export-forwards. Processing an
//! import recursively loads the dependency.
//!
//! Lexical and syntactic errors abort the whole check; semantic errors
//! (unresolvable specifiers, missing exports, name clashes) accumulate
//! and loading continues.

use std::path::{Path, PathBuf};

use sable_common::fs::{normalize, FileSystem};
use sable_common::span::{Pos, Span};
use sable_common::types::ModuleId;
use sable_parser::ast::{
    Declaration, ExportForwardDeclaration, ImportDeclaration, Program,
};
use sable_parser::lower::lower_program;
use sable_parser::precedence::{resolve_program, PrecedenceErrorKind};

use crate::error::{TypeckError, TypeckErrorKind};
use crate::module::{ExportBinding, Module, SymbolEntry, SymbolKind};
use crate::TypeChecker;

/// The fixed source file extension.
pub const SOURCE_EXTENSION: &str = "sab";

impl<F: FileSystem> TypeChecker<F> {
    /// Load a module (and, transitively, everything it imports). Returns
    /// the cached id when the file has been loaded before.
    pub(crate) fn load_module(&mut self, path: &Path) -> Result<ModuleId, TypeckError> {
        let path = normalize(path);
        if let Some(&id) = self.path_cache.get(&path) {
            return Ok(id);
        }

        let origin = Span::point(Pos::start());
        let source = self.fs.read(&path).map_err(|err| {
            TypeckError::new(
                TypeckErrorKind::Syntax(format!("cannot read module: {err}")),
                path.clone(),
                origin,
            )
        })?;

        let parse = sable_parser::parse(&source, &self.operators).map_err(|lex| {
            TypeckError::new(
                TypeckErrorKind::Syntax(lex.kind.to_string()),
                path.clone(),
                lex.span,
            )
        })?;
        if let Some(err) = parse.errors().first() {
            return Err(TypeckError::new(
                TypeckErrorKind::Syntax(err.message.clone()),
                path,
                err.span,
            ));
        }

        let mut program = lower_program(&parse, &source);
        for err in resolve_program(&mut program, &self.operators) {
            let kind = match err.kind {
                PrecedenceErrorKind::AssociativityConflict { left, right } => {
                    TypeckErrorKind::AssociativityConflict { left, right }
                }
                PrecedenceErrorKind::UnknownOperator(op) => {
                    TypeckErrorKind::UnknownOperator { op }
                }
            };
            self.errors.push(TypeckError::new(kind, path.clone(), err.span));
        }
        hoist_inline_exports(&mut program);

        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module::new(id, path.clone(), program));
        self.path_cache.insert(path, id);

        self.process_declarations(id)?;
        Ok(id)
    }

    /// Install every declaration of a module into its tables, in the
    /// fixed phase order.
    fn process_declarations(&mut self, module: ModuleId) -> Result<(), TypeckError> {
        let idx = module.0 as usize;
        let decl_count = self.modules[idx].ast.decls.len();

        // Phase 1: imports (loading dependencies as needed).
        for i in 0..decl_count {
            let import = match &self.modules[idx].ast.decls[i] {
                Declaration::Import(decl) => Some(decl.clone()),
                _ => None,
            };
            if let Some(decl) = import {
                self.process_import(module, &decl)?;
            }
        }

        // Phases 2-4: types, functions, constants.
        for kind in [SymbolKind::Type, SymbolKind::Function, SymbolKind::Constant] {
            for i in 0..decl_count {
                let named = match (&self.modules[idx].ast.decls[i], kind) {
                    (Declaration::Type(decl), SymbolKind::Type) => {
                        Some((decl.name.clone(), name_span(&decl.locations)))
                    }
                    (Declaration::Function(decl), SymbolKind::Function) => {
                        Some((decl.name.clone(), name_span(&decl.locations)))
                    }
                    (Declaration::Constant(decl), SymbolKind::Constant) => {
                        Some((decl.name.clone(), name_span(&decl.locations)))
                    }
                    _ => None,
                };
                if let Some((name, span)) = named {
                    self.bind_symbol(module, kind, name, SymbolEntry::local(i, span));
                }
            }
        }

        // Phase 5: exports.
        for i in 0..decl_count {
            let export = match &self.modules[idx].ast.decls[i] {
                Declaration::Export(decl) => Some(decl.clone()),
                _ => None,
            };
            if let Some(decl) = export {
                for entry in &decl.entries {
                    self.process_export_entry(
                        module,
                        &entry.export_name,
                        &entry.value_name,
                        entry.locations.span(),
                    );
                }
            }
        }

        // Phase 6: export-forwards.
        for i in 0..decl_count {
            let forward = match &self.modules[idx].ast.decls[i] {
                Declaration::ExportForward(decl) => Some(decl.clone()),
                _ => None,
            };
            if let Some(decl) = forward {
                self.process_forward(module, &decl)?;
            }
        }

        Ok(())
    }

    fn process_import(
        &mut self,
        module: ModuleId,
        decl: &ImportDeclaration,
    ) -> Result<(), TypeckError> {
        let module_span = decl
            .locations
            .get("module")
            .unwrap_or_else(|| decl.locations.span());
        let importing_path = self.modules[module.0 as usize].path.clone();
        let Some(resolved) =
            resolve_import_path(&self.fs, &importing_path, &decl.module_name)
        else {
            self.push_error(
                module,
                TypeckErrorKind::ModuleNotFound {
                    specifier: decl.module_name.clone(),
                },
                module_span,
            );
            return Ok(());
        };
        let target = self.load_module(&resolved)?;

        for entry in &decl.entries {
            let span = entry
                .locations
                .get("alias")
                .unwrap_or_else(|| entry.locations.span());
            if entry.import_name == "*" {
                self.bind_namespace(module, entry.alias_name.clone(), target, span);
                continue;
            }
            let Some(kind) = self.export_kind(target, &entry.import_name) else {
                self.push_error(
                    module,
                    TypeckErrorKind::ModuleDoesNotExport {
                        module: decl.module_name.clone(),
                        name: entry.import_name.clone(),
                    },
                    span,
                );
                continue;
            };
            let installed = self.bind_symbol(
                module,
                kind,
                entry.alias_name.clone(),
                SymbolEntry::imported(target, entry.import_name.clone(), span),
            );
            if installed {
                self.modules[module.0 as usize].imports.insert(
                    entry.alias_name.clone(),
                    (target, entry.import_name.clone(), kind),
                );
            }
        }
        Ok(())
    }

    fn process_export_entry(
        &mut self,
        module: ModuleId,
        export_name: &str,
        value_name: &str,
        span: Span,
    ) {
        let idx = module.0 as usize;
        if self.modules[idx].exports.contains_key(export_name) {
            self.push_error(
                module,
                TypeckErrorKind::ExportClash {
                    name: export_name.to_owned(),
                },
                span,
            );
            return;
        }
        match self.modules[idx].kind_of(value_name) {
            Some(SymbolKind::Namespace) | None => {
                self.push_error(
                    module,
                    TypeckErrorKind::ValueNotDefined {
                        name: value_name.to_owned(),
                    },
                    span,
                );
            }
            Some(kind) => {
                self.modules[idx].exports.insert(
                    export_name.to_owned(),
                    ExportBinding::Local {
                        kind,
                        value_name: value_name.to_owned(),
                        span,
                    },
                );
            }
        }
    }

    fn process_forward(
        &mut self,
        module: ModuleId,
        decl: &ExportForwardDeclaration,
    ) -> Result<(), TypeckError> {
        let module_span = decl
            .locations
            .get("module")
            .unwrap_or_else(|| decl.locations.span());
        let importing_path = self.modules[module.0 as usize].path.clone();
        let Some(resolved) =
            resolve_import_path(&self.fs, &importing_path, &decl.module_name)
        else {
            self.push_error(
                module,
                TypeckErrorKind::ModuleNotFound {
                    specifier: decl.module_name.clone(),
                },
                module_span,
            );
            return Ok(());
        };
        let target = self.load_module(&resolved)?;

        for entry in &decl.entries {
            let span = entry.locations.span();
            if entry.import_name == "*" {
                // Forward every export of the target except its default.
                let mut names: Vec<String> = self.modules[target.0 as usize]
                    .exports
                    .keys()
                    .filter(|name| *name != "default")
                    .cloned()
                    .collect();
                names.sort();
                for name in names {
                    self.install_forward(module, &name, target, &name, span);
                }
            } else {
                if self.export_kind(target, &entry.import_name).is_none() {
                    self.push_error(
                        module,
                        TypeckErrorKind::ModuleDoesNotExport {
                            module: decl.module_name.clone(),
                            name: entry.import_name.clone(),
                        },
                        span,
                    );
                    continue;
                }
                self.install_forward(module, &entry.export_name, target, &entry.import_name, span);
            }
        }
        Ok(())
    }

    fn install_forward(
        &mut self,
        module: ModuleId,
        export_name: &str,
        target: ModuleId,
        source_name: &str,
        span: Span,
    ) {
        let idx = module.0 as usize;
        if self.modules[idx].exports.contains_key(export_name) {
            self.push_error(
                module,
                TypeckErrorKind::ExportClash {
                    name: export_name.to_owned(),
                },
                span,
            );
            return;
        }
        self.modules[idx].exports.insert(
            export_name.to_owned(),
            ExportBinding::Forward {
                module: target,
                source_name: source_name.to_owned(),
                span,
            },
        );
    }

    /// Install a symbol, enforcing that types, functions, constants,
    /// imports and namespaces share one namespace. The clash error points
    /// at whichever of the two bindings appears later in the source.
    fn bind_symbol(
        &mut self,
        module: ModuleId,
        kind: SymbolKind,
        name: String,
        entry: SymbolEntry,
    ) -> bool {
        let idx = module.0 as usize;
        if self.modules[idx].binds(&name) {
            let previous = self.modules[idx]
                .binding_spans
                .get(&name)
                .copied()
                .unwrap_or(entry.span);
            let span = later_span(previous, entry.span);
            self.push_error(module, TypeckErrorKind::NameClash { name }, span);
            return false;
        }
        let target = &mut self.modules[idx];
        target.binding_spans.insert(name.clone(), entry.span);
        target.table_mut(kind).insert(name, entry);
        true
    }

    fn bind_namespace(&mut self, module: ModuleId, alias: String, target: ModuleId, span: Span) {
        let idx = module.0 as usize;
        if self.modules[idx].binds(&alias) {
            let previous = self.modules[idx]
                .binding_spans
                .get(&alias)
                .copied()
                .unwrap_or(span);
            let at = later_span(previous, span);
            self.push_error(module, TypeckErrorKind::NameClash { name: alias }, at);
            return;
        }
        let m = &mut self.modules[idx];
        m.binding_spans.insert(alias.clone(), span);
        m.namespaces.insert(alias, target);
    }

    /// The kind of a module's export, chasing forward links. `None` when
    /// the export does not exist (or a forward cycle never grounds out).
    pub(crate) fn export_kind(&self, module: ModuleId, name: &str) -> Option<SymbolKind> {
        let mut visited = rustc_hash::FxHashSet::default();
        let mut current = (module, name.to_owned());
        loop {
            if !visited.insert(current.clone()) {
                return None;
            }
            match self.modules[current.0 .0 as usize].exports.get(&current.1)? {
                ExportBinding::Local { kind, .. } => return Some(*kind),
                ExportBinding::Forward {
                    module,
                    source_name,
                    ..
                } => current = (*module, source_name.clone()),
            }
        }
    }
}

/// Move inline export values (`export func f...`, `export default const
/// ...`) to top level, so every local symbol is addressed by one
/// declaration index. The export entry keeps only its value name.
fn hoist_inline_exports(program: &mut Program) {
    let mut hoisted = Vec::new();
    for decl in &mut program.decls {
        if let Declaration::Export(export) = decl {
            for entry in &mut export.entries {
                if let Some(value) = entry.value.take() {
                    hoisted.push(*value);
                }
            }
        }
    }
    program.decls.extend(hoisted);
}

/// Resolve an import specifier relative to the importing module.
///
/// Relative specifiers resolve against the importing module's directory;
/// the bare `.` walks ancestor directories to the nearest `index.sab`.
/// Bare names walk ancestors trying `<dir>/packages/<name>`. A candidate
/// resolves to its `index.sab` (when a directory), itself (when a file),
/// or `<candidate>.sab`.
pub fn resolve_import_path<F: FileSystem>(
    fs: &F,
    importing: &Path,
    specifier: &str,
) -> Option<PathBuf> {
    let dir = importing.parent()?;

    if specifier == "." || specifier == ".." {
        let start = normalize(&dir.join(specifier));
        let mut current = Some(start.as_path());
        while let Some(d) = current {
            let index = d.join(format!("index.{SOURCE_EXTENSION}"));
            if fs.exists(&index) && !fs.is_directory(&index) {
                return Some(normalize(&index));
            }
            current = d.parent();
        }
        return None;
    }

    if specifier.starts_with('.') {
        let candidate = normalize(&dir.join(specifier));
        return resolve_candidate(fs, &candidate);
    }

    let mut current = Some(dir);
    while let Some(d) = current {
        let candidate = d.join("packages").join(specifier);
        if let Some(found) = resolve_candidate(fs, &candidate) {
            return Some(found);
        }
        current = d.parent();
    }
    None
}

fn resolve_candidate<F: FileSystem>(fs: &F, candidate: &Path) -> Option<PathBuf> {
    if fs.is_directory(candidate) {
        let index = candidate.join(format!("index.{SOURCE_EXTENSION}"));
        if fs.exists(&index) && !fs.is_directory(&index) {
            return Some(normalize(&index));
        }
    } else if fs.exists(candidate) {
        return Some(normalize(candidate));
    }
    let with_ext = candidate.with_file_name(format!(
        "{}.{SOURCE_EXTENSION}",
        candidate.file_name()?.to_string_lossy()
    ));
    if fs.exists(&with_ext) && !fs.is_directory(&with_ext) {
        return Some(normalize(&with_ext));
    }
    None
}

/// The span of a declaration's name, falling back to its full span.
fn name_span(locations: &sable_parser::ast::Locations) -> Span {
    locations
        .get("name")
        .unwrap_or_else(|| locations.span())
}

/// Whichever span starts later in the source.
fn later_span(a: Span, b: Span) -> Span {
    if b.start.offset >= a.start.offset {
        b
    } else {
        a
    }
}
