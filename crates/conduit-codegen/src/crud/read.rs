// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Query methods and row scanning.

use crate::{context::Context, emit::Emitter};

impl Context<'_> {
    /// Generate `FindResByID`.
    ///
    /// # SQL Pattern
    ///
    /// ```sql
    /// SELECT col1, col2, ... FROM schema.table WHERE id = $1
    /// ```
    ///
    /// A missing row is reported as `types.ErrNotFound`.
    pub fn find_by_id_method(&self) -> String {
        let id = self.id();
        let recv = &self.receiver;
        let mut out = Emitter::new();
        out.line(format!(
            "// Find{}ByID loads the {} with the given {}.",
            self.type_name,
            self.type_name,
            id.column
        ));
        out.open(format!(
            "func Find{}ByID(ctx context.Context, db *sql.DB, id {}) (*{}, error) {{",
            self.type_name, id.ty.go, self.type_name
        ));
        out.line(format!(
            "const query = `SELECT {} FROM {} WHERE {} = $1`",
            self.select_list(),
            self.table,
            id.column
        ));
        out.line(format!(
            "{recv}, err := scan{}(db.QueryRowContext(ctx, query, id))",
            self.type_name
        ));
        out.open("if errors.Is(err, sql.ErrNoRows) {");
        out.line(format!(
            "return nil, fmt.Errorf(\"{} %v: %w\", id, types.ErrNotFound)",
            self.noun()
        ));
        out.close("}");
        out.open("if err != nil {");
        out.line(format!("return nil, fmt.Errorf(\"find {}: %w\", err)", self.noun()));
        out.close("}");
        out.line(format!("return {recv}, nil"));
        out.close("}");
        out.finish()
    }

    /// Generate `FindAllRes` with the configured page-size clamp.
    ///
    /// # SQL Pattern
    ///
    /// ```sql
    /// SELECT ... FROM schema.table ORDER BY id LIMIT $1 OFFSET $2
    /// ```
    pub fn find_all_method(&self) -> String {
        let config = self.config;
        let mut out = Emitter::new();
        out.line(format!(
            "// FindAll{} lists {} ordered by {}. A limit below one selects {} rows; limits above {} are clamped.",
            self.plural,
            self.nouns(),
            self.id().column,
            config.default_page_size,
            config.max_page_size
        ));
        out.open(format!(
            "func FindAll{}(ctx context.Context, db *sql.DB, limit, offset int) ([]*{}, error) {{",
            self.plural, self.type_name
        ));
        out.open("if limit <= 0 {");
        out.line(format!("limit = {}", config.default_page_size));
        out.close("}");
        out.open(format!("if limit > {} {{", config.max_page_size));
        out.line(format!("limit = {}", config.max_page_size));
        out.close("}");
        out.open("if offset < 0 {");
        out.line("offset = 0");
        out.close("}");
        out.line(format!(
            "const query = `SELECT {} FROM {} ORDER BY {} LIMIT $1 OFFSET $2`",
            self.select_list(),
            self.table,
            self.id().column
        ));
        out.line("rows, err := db.QueryContext(ctx, query, limit, offset)");
        out.open("if err != nil {");
        out.line(format!("return nil, fmt.Errorf(\"list {}: %w\", err)", self.nouns()));
        out.close("}");
        out.line(format!("return collect{}(rows)", self.plural));
        out.close("}");
        out.finish()
    }

    /// Generate `FindResWhere`, the building block of relationship loaders.
    pub fn find_where_method(&self) -> String {
        let mut out = Emitter::new();
        out.line(format!(
            "// Find{}Where lists {} matching a SQL condition with positional arguments.",
            self.plural,
            self.nouns()
        ));
        out.open(format!(
            "func Find{}Where(ctx context.Context, db *sql.DB, condition string, args ...any) ([]*{}, error) {{",
            self.plural, self.type_name
        ));
        out.line(format!(
            "query := \"SELECT {} FROM {} WHERE \" + condition + \" ORDER BY {}\"",
            self.select_list(),
            self.table,
            self.id().column
        ));
        out.line("rows, err := db.QueryContext(ctx, query, args...)");
        out.open("if err != nil {");
        out.line(format!("return nil, fmt.Errorf(\"query {}: %w\", err)", self.nouns()));
        out.close("}");
        out.line(format!("return collect{}(rows)", self.plural));
        out.close("}");
        out.finish()
    }

    /// Generate `scanRes`, reading one row in column-plan order.
    pub fn scan_helper(&self) -> String {
        let recv = &self.receiver;
        let targets = self
            .columns()
            .map(|f| f.scan_target(recv))
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = Emitter::new();
        out.open(format!(
            "func scan{}(row interface{{ Scan(dest ...any) error }}) (*{}, error) {{",
            self.type_name, self.type_name
        ));
        out.line(format!("var {recv} {}", self.type_name));
        out.open(format!("if err := row.Scan({targets}); err != nil {{"));
        out.line("return nil, err");
        out.close("}");
        out.line(format!("return &{recv}, nil"));
        out.close("}");
        out.finish()
    }

    /// Generate `collectRes`, draining a result set.
    pub fn collect_helper(&self) -> String {
        let mut out = Emitter::new();
        out.open(format!(
            "func collect{}(rows *sql.Rows) ([]*{}, error) {{",
            self.plural, self.type_name
        ));
        out.line("defer rows.Close()");
        out.line(format!("var items []*{}", self.type_name));
        out.open("for rows.Next() {");
        out.line(format!("item, err := scan{}(rows)", self.type_name));
        out.open("if err != nil {");
        out.line("return nil, err");
        out.close("}");
        out.line("items = append(items, item)");
        out.close("}");
        out.open("if err := rows.Err(); err != nil {");
        out.line(format!("return nil, fmt.Errorf(\"read {}: %w\", err)", self.nouns()));
        out.close("}");
        out.line("return items, nil");
        out.close("}");
        out.finish()
    }
}
