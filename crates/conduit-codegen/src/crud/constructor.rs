// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `NewRes` constructor with field defaults.

use crate::{
    context::Context,
    emit::Emitter,
    translate::{ExprTranslator, Fragment, Scope, coerce}
};

impl Context<'_> {
    /// Generate `NewRes`, assigning every declared default.
    ///
    /// # Generated Code
    ///
    /// ```go
    /// // NewPost returns a Post with its declared defaults applied.
    /// func NewPost() *Post {
    ///     p := &Post{}
    ///     p.Status = "draft"
    ///     return p
    /// }
    /// ```
    pub fn constructor(&self) -> Fragment {
        let recv = &self.receiver;
        let name = format!("New{}", self.type_name);
        let scope = Scope::new(self, name.as_str());
        let mut frag = Fragment::default();
        let mut out = Emitter::new();

        out.line(format!(
            "// {name} returns a {} with its declared defaults applied.",
            self.type_name
        ));
        out.open(format!("func {name}() *{} {{", self.type_name));
        out.line(format!("{recv} := &{}{{}}", self.type_name));
        for field in &self.fields {
            let Some(default) = field.node.and_then(|n| n.default.as_ref()) else {
                continue;
            };
            let value = ExprTranslator::new(&scope).translate(default);
            let value = coerce(value, &field.ty, &self.go_types);
            let code = frag.absorb(value);
            out.line(format!("{recv}.{} = {code}", field.go_name));
        }
        out.line(format!("return {recv}"));
        out.close("}");

        frag.code = out.finish();
        frag
    }
}
