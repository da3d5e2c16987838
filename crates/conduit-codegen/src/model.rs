// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Go struct declaration.
//!
//! Columns are aligned the way `gofmt` aligns them, so the emitted file is
//! already formatted.

use crate::{context::Context, emit::ImportSet};

/// Generate the struct declaration and the packages its field types need.
pub fn generate(ctx: &Context<'_>) -> (String, ImportSet) {
    let mut imports = ImportSet::new();
    let mut out = String::new();

    match ctx.resource.documentation.as_deref().map(str::trim) {
        Some(doc) if !doc.is_empty() => {
            for line in doc.lines() {
                out.push_str(format!("// {}", line.trim_end()).trim_end());
                out.push('\n');
            }
        }
        _ => out.push_str(&format!("// {} is a persisted resource.\n", ctx.type_name))
    }

    let name_width = ctx.fields.iter().map(|f| f.go_name.len()).max().unwrap_or(0);
    let type_width = ctx.fields.iter().map(|f| f.ty.go.len()).max().unwrap_or(0);

    out.push_str(&format!("type {} struct {{\n", ctx.type_name));
    for field in &ctx.fields {
        imports.merge(&field.ty.imports);
        out.push_str(&format!(
            "\t{:name_width$} {:type_width$} {}\n",
            field.go_name,
            field.ty.go,
            field.tag()
        ));
    }
    out.push_str("}\n");
    (out, imports)
}
