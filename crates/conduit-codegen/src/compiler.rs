// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Public entry point.
//!
//! # Pipeline
//!
//! ```text
//! ResourceNode
//!     │
//!     ▼
//! Context::new ─────► relations::resolve ─► validation ─► hooks ─► crud
//!     │                     │                                        │
//!     │                     ├──► relations::generate (loaders)       │
//!     │                     └──► schema::generate (DDL)              │
//!     ▼                                                              ▼
//! model::generate ──────────────────────────────────────────► assemble file
//! ```
//!
//! Every call builds its own [`Context`] and emitters, so one
//! [`ResourceCompiler`] can serve any number of threads.

use std::collections::{BTreeMap, BTreeSet};

use conduit_ast::{RelationshipKind, ResourceNode};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::CompilerConfig,
    context::Context,
    crud,
    emit::ImportSet,
    error::{CompileError, Diagnostic},
    hooks,
    metadata::ResourceMetadata,
    model,
    naming::column_name,
    relations,
    runtime::{self, GeneratedFile},
    schema::{self, Schema},
    validation
};

/// First line of every generated Go file.
pub const GENERATED_HEADER: &str = "// Code generated by conduit. DO NOT EDIT.";

/// Output of compiling one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledResource {
    /// Resource name as declared.
    pub name:        String,
    /// Go file name: `blog_post.go`.
    pub file_name:   String,
    /// Complete Go file.
    pub source:      String,
    /// Up and down migrations.
    #[serde(skip)]
    pub schema:      Schema,
    /// Inventory of the generated code.
    pub metadata:    ResourceMetadata,
    /// Non-fatal findings, in generation order.
    pub diagnostics: Vec<Diagnostic>
}

/// Output of compiling several resources.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    /// Compiled resources sorted by name.
    pub resources: Vec<CompiledResource>,
    /// Runtime support files.
    pub runtime:   Vec<GeneratedFile>
}

impl BatchOutput {
    /// One migration for the whole batch.
    ///
    /// Tables are created after the tables their `belongs_to` keys
    /// reference and dropped in reverse. Resources in a reference cycle keep
    /// name order.
    #[must_use]
    pub fn migration(&self) -> Schema {
        let order = self.creation_order();
        let mut migration = Schema::default();
        for index in &order {
            migration.up.push_str(&self.resources[*index].schema.up);
        }
        for index in order.iter().rev() {
            migration.down.push_str(&self.resources[*index].schema.down);
        }
        migration
    }

    fn creation_order(&self) -> Vec<usize> {
        let position: BTreeMap<&str, usize> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.as_str(), i))
            .collect();
        let dependencies: Vec<BTreeSet<usize>> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.metadata
                    .relationships
                    .iter()
                    .filter(|rel| rel.kind == RelationshipKind::BelongsTo)
                    .filter_map(|rel| position.get(rel.target.as_str()).copied())
                    .filter(|&target| target != i)
                    .collect()
            })
            .collect();

        let mut order = Vec::with_capacity(self.resources.len());
        let mut placed = vec![false; self.resources.len()];
        loop {
            let ready = (0..self.resources.len()).find(|&i| {
                !placed[i] && dependencies[i].iter().all(|&d| placed[d])
            });
            let Some(next) = ready.or_else(|| placed.iter().position(|p| !p)) else {
                break;
            };
            placed[next] = true;
            order.push(next);
        }
        order
    }
}

/// Compiles resources into Go source, DDL and metadata.
///
/// # Example
///
/// ```rust
/// use conduit_ast::{ConstraintNode, ExprNode, FieldNode, ResourceNode, TypeNode};
/// use conduit_codegen::{CompilerConfig, ResourceCompiler};
///
/// let post = ResourceNode::new("Post").with_field(
///     FieldNode::new("title", TypeNode::primitive("string"))
///         .constraint(ConstraintNode::new("min").arg(ExprNode::int(5)))
/// );
///
/// let compiled = ResourceCompiler::new(CompilerConfig::default())
///     .compile(&post)
///     .unwrap();
///
/// assert_eq!(compiled.file_name, "post.go");
/// assert!(compiled.source.contains("func (p *Post) Create(ctx context.Context, db *sql.DB) error {"));
/// assert!(compiled.schema.up.contains("CHECK (char_length(title) >= 5)"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceCompiler {
    config: CompilerConfig
}

impl ResourceCompiler {
    /// Compiler with the given options.
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config
        }
    }

    /// Options in use.
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile one resource.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem, see [`CompileError`]. Nothing
    /// is emitted for a failing resource.
    pub fn compile(&self, resource: &ResourceNode) -> Result<CompiledResource, CompileError> {
        let name = resource.name.as_str();
        debug!(resource = name, "analyzing resource");
        let ctx = Context::new(resource, &self.config)?;
        let relations = relations::resolve(&ctx)?;

        debug!(resource = name, fields = ctx.fields.len(), "generating validation");
        let validation = validation::generate(&ctx)?;

        debug!(resource = name, hooks = resource.hooks.len(), "compiling hooks");
        let hooks = hooks::generate(&ctx);

        debug!(resource = name, "generating persistence methods");
        let crud = crud::generate(&ctx, &hooks, &validation);
        let (declaration, declaration_imports) = model::generate(&ctx);
        let (loaders, loader_imports) = relations::generate(&ctx, &relations);

        debug!(resource = name, table = %ctx.table, "deriving schema");
        let schema = schema::generate(&ctx, &relations)?;
        let metadata = ResourceMetadata::extract(&ctx, &hooks, &relations);

        let mut imports = ImportSet::new();
        for set in [
            &declaration_imports,
            &crud.imports,
            &validation.imports,
            &hooks.imports,
            &loader_imports
        ] {
            imports.merge(set);
        }

        let mut sections = vec![declaration, crud.source, validation.source];
        sections.extend(
            [hooks.source, loaders]
                .into_iter()
                .filter(|s| !s.is_empty())
        );
        let source = format!(
            "{GENERATED_HEADER}\n\npackage {}\n\n{}\n{}",
            self.config.package,
            imports.render(),
            sections.join("\n")
        );

        let mut diagnostics = validation.diagnostics;
        diagnostics.extend(hooks.diagnostics);
        diagnostics.extend(crud.diagnostics);
        debug!(
            resource = name,
            bytes = source.len(),
            diagnostics = diagnostics.len(),
            "resource compiled"
        );

        Ok(CompiledResource {
            name: resource.name.clone(),
            file_name: format!("{}.go", column_name(&ctx.type_name)),
            source,
            schema,
            metadata,
            diagnostics
        })
    }

    /// Compile several resources, sorted by name, plus the runtime files.
    ///
    /// # Errors
    ///
    /// Returns the first failing resource's error.
    pub fn compile_batch(&self, resources: &[ResourceNode]) -> Result<BatchOutput, CompileError> {
        debug!(count = resources.len(), "compiling batch");
        let mut compiled = resources
            .iter()
            .map(|r| self.compile(r))
            .collect::<Result<Vec<_>, _>>()?;
        compiled.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(BatchOutput {
            resources: compiled,
            runtime:   runtime::files()
        })
    }
}
