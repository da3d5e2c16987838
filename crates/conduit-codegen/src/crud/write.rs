// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Create, update and delete.

use conduit_ast::{HookEvent, HookTiming};

use super::{AfterHooks, begin, check, hook_calls, require_rows};
use crate::{
    context::{AutoValue, Context, join_columns, placeholders},
    emit::{Emitter, ImportSet},
    hooks::CompiledHooks,
    translate::{Fragment, coerce},
    types::TypeRef,
    validation::CompiledValidation
};

impl Context<'_> {
    /// `p.Field = now`, wrapping for nullable timestamps.
    fn assign_now(&self, out: &mut Emitter, imports: &mut ImportSet, field_name: &str, ty: &TypeRef) {
        let value = coerce(
            Fragment::new("now").typed(TypeRef::time()),
            ty,
            &self.go_types
        );
        imports.merge(&value.imports);
        out.line(format!("{}.{field_name} = {}", self.receiver, value.code));
    }

    fn validate_call(&self, validation: &CompiledValidation, event: &str) -> String {
        if validation.conditional {
            format!("{}.ValidateOn(\"{event}\")", self.receiver)
        } else {
            format!("{}.Validate()", self.receiver)
        }
    }

    /// Generate `Create`.
    ///
    /// # SQL Pattern
    ///
    /// ```sql
    /// INSERT INTO schema.table (col1, col2, ...) VALUES ($1, $2, ...)
    /// -- serial keys:
    /// INSERT INTO schema.table (col2, ...) VALUES ($1, ...) RETURNING id
    /// ```
    pub fn create_method(
        &self,
        hooks: &CompiledHooks,
        validation: &CompiledValidation
    ) -> (String, ImportSet) {
        let recv = &self.receiver;
        let noun = self.noun();
        let mut imports = ImportSet::new();
        let mut out = Emitter::new();

        out.line(format!(
            "// Create inserts the {}, running its hooks and validation.",
            self.type_name
        ));
        out.open(format!(
            "func ({recv} *{}) Create(ctx context.Context, db *sql.DB) error {{",
            self.type_name
        ));

        if self.id().auto == AutoValue::Uuid {
            out.line(format!("{recv}.{} = uuid.New()", self.id().go_name));
        }
        let stamped: Vec<_> = self.columns().filter(|f| f.auto.is_timestamp()).collect();
        if !stamped.is_empty() {
            imports.add_std("time");
            out.line("now := time.Now().UTC()");
            for field in stamped {
                self.assign_now(&mut out, &mut imports, &field.go_name, &field.ty);
            }
        }

        hook_calls(
            &mut out,
            recv,
            "ctx",
            hooks,
            HookTiming::Before,
            &[HookEvent::Create, HookEvent::Save]
        );
        check(
            &mut out,
            &self.validate_call(validation, "create"),
            &format!("validate {noun}"),
            ""
        );
        begin(&mut out, &format!("{noun} create"), "");

        let columns: Vec<_> = self.insert_columns().collect();
        let values = columns
            .iter()
            .map(|f| f.bind_value(recv))
            .collect::<Vec<_>>();
        let insert = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                join_columns(columns.iter().copied()),
                placeholders(columns.len(), 1)
            )
        };
        let args = values
            .iter()
            .map(|v| format!(", {v}"))
            .collect::<String>();

        if self.returns_id() {
            out.line(format!(
                "const query = `{insert} RETURNING {}`",
                self.id().column
            ));
            check(
                &mut out,
                &format!(
                    "tx.QueryRowContext(ctx, query{args}).Scan(&{recv}.{})",
                    self.id().go_name
                ),
                &format!("insert {noun}"),
                ""
            );
        } else {
            out.line(format!("const query = `{insert}`"));
            out.open(format!(
                "if _, err := tx.ExecContext(ctx, query{args}); err != nil {{"
            ));
            out.line(format!("return fmt.Errorf(\"insert {noun}: %w\", err)"));
            out.close("}");
        }

        AfterHooks::call(&mut out, recv, hooks, &[HookEvent::Create, HookEvent::Save])
            .commit(&mut out, &format!("commit {noun} create"));
        out.line("return nil");
        out.close("}");
        (out.finish(), imports)
    }

    /// Generate `Update`, writing every updatable column.
    ///
    /// # SQL Pattern
    ///
    /// ```sql
    /// UPDATE schema.table SET col1 = $1, col2 = $2 WHERE id = $3
    /// ```
    pub fn update_method(
        &self,
        hooks: &CompiledHooks,
        validation: &CompiledValidation
    ) -> (String, ImportSet) {
        let recv = &self.receiver;
        let noun = self.noun();
        let id = self.id();
        let mut imports = ImportSet::new();
        let mut out = Emitter::new();

        out.line(format!(
            "// Update writes the {} back, running its hooks and validation.",
            self.type_name
        ));
        out.open(format!(
            "func ({recv} *{}) Update(ctx context.Context, db *sql.DB) error {{",
            self.type_name
        ));

        let touched: Vec<_> = self
            .columns()
            .filter(|f| f.auto == AutoValue::UpdatedAt)
            .collect();
        if !touched.is_empty() {
            imports.add_std("time");
            out.line("now := time.Now().UTC()");
            for field in touched {
                self.assign_now(&mut out, &mut imports, &field.go_name, &field.ty);
            }
        }

        hook_calls(
            &mut out,
            recv,
            "ctx",
            hooks,
            HookTiming::Before,
            &[HookEvent::Update, HookEvent::Save]
        );
        check(
            &mut out,
            &self.validate_call(validation, "update"),
            &format!("validate {noun}"),
            ""
        );
        begin(&mut out, &format!("{noun} update"), "");

        let columns: Vec<_> = self.update_columns().collect();
        let set = if columns.is_empty() {
            format!("{col} = {col}", col = id.column)
        } else {
            columns
                .iter()
                .enumerate()
                .map(|(i, f)| format!("{} = ${}", f.column, i + 1))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let args = columns
            .iter()
            .map(|f| format!(", {}", f.bind_value(recv)))
            .collect::<String>();
        out.line(format!(
            "const query = `UPDATE {} SET {set} WHERE {} = ${}`",
            self.table,
            id.column,
            columns.len() + 1
        ));
        out.line(format!(
            "res, err := tx.ExecContext(ctx, query{args}, {recv}.{})",
            id.go_name
        ));
        out.open("if err != nil {");
        out.line(format!("return fmt.Errorf(\"update {noun}: %w\", err)"));
        out.close("}");
        require_rows(
            &mut out,
            self,
            "res",
            "update",
            &format!("{recv}.{}", id.go_name)
        );

        AfterHooks::call(&mut out, recv, hooks, &[HookEvent::Update, HookEvent::Save])
            .commit(&mut out, &format!("commit {noun} update"));
        out.line("return nil");
        out.close("}");
        (out.finish(), imports)
    }

    /// Generate `Delete`.
    ///
    /// # SQL Pattern
    ///
    /// ```sql
    /// DELETE FROM schema.table WHERE id = $1
    /// ```
    pub fn delete_method(&self, hooks: &CompiledHooks) -> String {
        let recv = &self.receiver;
        let noun = self.noun();
        let id = self.id();
        let mut out = Emitter::new();

        out.line(format!("// Delete removes the {}.", self.type_name));
        out.open(format!(
            "func ({recv} *{}) Delete(ctx context.Context, db *sql.DB) error {{",
            self.type_name
        ));
        hook_calls(
            &mut out,
            recv,
            "ctx",
            hooks,
            HookTiming::Before,
            &[HookEvent::Delete]
        );
        begin(&mut out, &format!("{noun} delete"), "");
        out.line(format!(
            "const query = `DELETE FROM {} WHERE {} = $1`",
            self.table, id.column
        ));
        out.line(format!(
            "res, err := tx.ExecContext(ctx, query, {recv}.{})",
            id.go_name
        ));
        out.open("if err != nil {");
        out.line(format!("return fmt.Errorf(\"delete {noun}: %w\", err)"));
        out.close("}");
        require_rows(
            &mut out,
            self,
            "res",
            "delete",
            &format!("{recv}.{}", id.go_name)
        );
        AfterHooks::call(&mut out, recv, hooks, &[HookEvent::Delete])
            .commit(&mut out, &format!("commit {noun} delete"));
        out.line("return nil");
        out.close("}");
        out.finish()
    }
}
