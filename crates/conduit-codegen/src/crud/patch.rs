// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Partial update from a JSON document.
//!
//! Keys are checked before anything is loaded, in sorted order so the first
//! reported problem does not depend on map iteration:
//!
//! | Key | Result |
//! |-----|--------|
//! | primary key, `@auto` timestamps | `PatchError{Field, "field is read-only"}` |
//! | writable field | accepted |
//! | anything else | `PatchError` listing the valid fields |

use crate::{
    context::Context,
    emit::{Emitter, ImportSet}
};

fn quoted<'k>(keys: impl Iterator<Item = &'k str>) -> String {
    keys.map(|k| format!("\"{k}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Context<'_> {
    /// Generate `PatchRes`.
    pub fn patch_method(&self) -> (String, ImportSet) {
        let recv = &self.receiver;
        let mut imports = ImportSet::new();
        imports.add_std("encoding/json");
        imports.add_std("slices");

        let read_only: Vec<&str> = self.read_only().map(|f| f.name.as_str()).collect();
        let mut writable: Vec<&str> = self
            .columns()
            .filter(|f| !f.primary && !f.auto.is_timestamp())
            .map(|f| f.name.as_str())
            .collect();
        writable.sort_unstable();

        let mut out = Emitter::new();
        out.line(format!(
            "// Patch{} applies a partial JSON document to the {} with the given {}.",
            self.type_name,
            self.type_name,
            self.id().column
        ));
        out.open(format!(
            "func Patch{}(ctx context.Context, db *sql.DB, id {}, payload []byte) (*{}, error) {{",
            self.type_name,
            self.id().ty.go,
            self.type_name
        ));
        out.line("var fields map[string]json.RawMessage");
        out.open("if err := json.Unmarshal(payload, &fields); err != nil {");
        out.line("return nil, &types.PatchError{Message: fmt.Sprintf(\"invalid payload: %v\", err)}");
        out.close("}");
        out.open("if len(fields) == 0 {");
        out.line("return nil, &types.PatchError{Message: \"empty patch\"}");
        out.close("}");
        out.line("keys := make([]string, 0, len(fields))");
        out.open("for key := range fields {");
        out.line("keys = append(keys, key)");
        out.close("}");
        out.line("slices.Sort(keys)");
        out.open("for _, key := range keys {");
        out.line("switch key {");
        let mut in_case = false;
        let mut case = |out: &mut Emitter, label: String| {
            if in_case {
                out.reopen(label);
            } else {
                out.open(label);
                in_case = true;
            }
        };
        if !read_only.is_empty() {
            case(&mut out, format!("case {}:", quoted(read_only.iter().copied())));
            out.line("return nil, &types.PatchError{Field: key, Message: \"field is read-only\"}");
        }
        if !writable.is_empty() {
            case(&mut out, format!("case {}:", quoted(writable.iter().copied())));
        }
        case(&mut out, "default:".to_string());
        out.line(format!(
            "return nil, &types.PatchError{{Field: key, Message: \"unknown field; valid fields: {}\"}}",
            writable.join(", ")
        ));
        out.close("}");
        out.close("}");

        out.line(format!(
            "{recv}, err := Find{}ByID(ctx, db, id)",
            self.type_name
        ));
        out.open("if err != nil {");
        out.line("return nil, err");
        out.close("}");
        out.open(format!("if err := json.Unmarshal(payload, {recv}); err != nil {{"));
        out.line("return nil, &types.PatchError{Message: fmt.Sprintf(\"invalid payload: %v\", err)}");
        out.close("}");
        out.open(format!("if err := {recv}.Update(ctx, db); err != nil {{"));
        out.line("return nil, err");
        out.close("}");
        out.line(format!("return {recv}, nil"));
        out.close("}");
        (out.finish(), imports)
    }
}
