use once_cell::sync::Lazy;
use regex::Regex;

use crate::diag::{Diagnostic, ElabError};
use crate::name::Name;
use crate::notation;
use crate::pexpr::{
    mk_abs, mk_app, mk_app_n, mk_const, mk_let, mk_local, mk_mdata, mk_pi, mk_sort, Literal, Pexpr,
};
use crate::resolve::{resolve_term, Candidate};
use crate::scope::VarDecl;
use crate::source::Span;
use crate::state::Elab;
use crate::syntax::{Binder, MatchArm, ProjField, Syntax};

/// Translates one concrete-syntax term into a pre-term against the current
/// elaboration state. Errors abort the enclosing command, not the module.
pub fn to_pexpr(elab: &mut Elab, syntax: &Syntax) -> Result<Pexpr, ElabError> {
    Translator {
        elab,
        locals: vec![],
    }
    .visit(syntax)
}

/// A helper constant the kernel recognizes; `match`, anonymous
/// constructors, and projections lower into applications of these.
fn builtin(name: &str) -> Pexpr {
    mk_const(Name::anon().str(name), vec![])
}

static RE_NUM_LIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:0[xX][0-9a-fA-F]+|0[bB][01]+|0|[1-9][0-9]*)$").unwrap());

struct Translator<'a, 'b> {
    elab: &'b mut Elab<'a>,
    /// binder-bound names, innermost last
    locals: Vec<Name>,
}

impl Translator<'_, '_> {
    fn is_local(&self, name: &Name) -> bool {
        name.is_atomic() && self.locals.iter().rev().any(|x| x == name)
    }

    fn visit(&mut self, syntax: &Syntax) -> Result<Pexpr, ElabError> {
        let span = syntax.span().cloned();
        let expr = match syntax {
            Syntax::Ident { name, univs, span } => self.visit_ident(name, univs, span.as_ref())?,
            Syntax::App { fun, args, .. } => {
                let fun = self.visit(fun)?;
                let mut elab_args = vec![];
                for arg in args {
                    elab_args.push(self.visit(arg)?);
                }
                mk_app_n(fun, elab_args)
            }
            Syntax::Fun { binders, body, .. } => self.visit_fun(binders, body)?,
            Syntax::Pi { binders, body, .. } => self.visit_pi(binders, body)?,
            Syntax::Let {
                name,
                ty,
                value,
                body,
                ..
            } => {
                let ty = match ty {
                    Some(ty) => Some(self.visit(ty)?),
                    None => None,
                };
                let value = self.visit(value)?;
                self.locals.push(name.clone());
                let body = self.visit(body);
                self.locals.pop();
                mk_let(name.clone(), ty, value, body?)
            }
            Syntax::Have {
                name,
                ty,
                proof,
                body,
                ..
            } => {
                // have h : t := p, b  ⇒  (fun (h : t), b) p
                let name = name.clone().unwrap_or_else(|| Name::from("this"));
                let ty = self.visit(ty)?;
                let proof = self.visit(proof)?;
                self.locals.push(name.clone());
                let body = self.visit(body);
                self.locals.pop();
                mk_app(
                    mk_abs(name, Default::default(), Some(ty), body?),
                    proof,
                )
            }
            Syntax::Show { ty, proof, .. } => {
                // type ascription helper
                let ty = self.visit(ty)?;
                let proof = self.visit(proof)?;
                mk_app_n(builtin("_ann"), [ty, proof])
            }
            Syntax::Match { discrs, arms, .. } => self.visit_match(discrs, arms)?,
            Syntax::StructInst {
                struct_name,
                fields,
                catchall,
                span,
            } => self.visit_struct_inst(struct_name.as_ref(), fields, catchall.as_deref(), span)?,
            Syntax::AnonCtor { args, .. } => {
                let mut elab_args = vec![];
                for arg in args {
                    elab_args.push(self.visit(arg)?);
                }
                mk_app_n(builtin("_anon_ctor"), elab_args)
            }
            Syntax::Sort { level, .. } => mk_sort(level.clone()),
            Syntax::Proj { expr, field, .. } => {
                let expr = self.visit(expr)?;
                match field {
                    ProjField::Index(i) => {
                        mk_app(mk_const(Name::anon().str("_proj").num(*i), vec![]), expr)
                    }
                    ProjField::Name(fld) => mk_app(
                        mk_const(Name::anon().str("_field").append(fld), vec![]),
                        expr,
                    ),
                }
            }
            Syntax::NumLit { text, span } => self.visit_num_lit(text, span.as_ref()),
            Syntax::StrLit { text, span } => self.visit_str_lit(text, span.as_ref()),
            Syntax::Placeholder { .. } => Pexpr::Hole,
            Syntax::Notation { kind, args, span } => {
                self.visit_notation(kind, args, span.as_ref())?
            }
        };
        Ok(mk_mdata(span, expr))
    }

    fn visit_ident(
        &mut self,
        name: &Name,
        univs: &[crate::pexpr::Level],
        span: Option<&Span>,
    ) -> Result<Pexpr, ElabError> {
        if self.is_local(name) {
            if !univs.is_empty() {
                return Err(ElabError::UnexpectedSyntax {
                    kind: "universe annotation on a local",
                    span: span.cloned(),
                });
            }
            return Ok(mk_local(name.clone()));
        }
        match resolve_term(self.elab.state, name, span)? {
            Candidate::Decl(full) => Ok(mk_const(full, univs.to_vec())),
            Candidate::Var(var) => {
                if !univs.is_empty() {
                    return Err(ElabError::UnexpectedSyntax {
                        kind: "universe annotation on a variable",
                        span: span.cloned(),
                    });
                }
                Ok(mk_local(var))
            }
        }
    }

    /// Elaborates one binder group, pushing its names; returns the names
    /// paired with their (already elaborated) types. The caller pops.
    fn visit_binders(
        &mut self,
        binders: &[Binder],
    ) -> Result<Vec<(Name, crate::pexpr::BinderInfo, Option<Pexpr>)>, ElabError> {
        let mut acc = vec![];
        for binder in binders {
            // the domain is elaborated before its names come into scope
            let ty = match &binder.ty {
                Some(ty) => Some(self.visit(ty)?),
                None => None,
            };
            for name in &binder.names {
                self.locals.push(name.clone());
                acc.push((name.clone(), binder.info, ty.clone()));
            }
        }
        Ok(acc)
    }

    fn visit_fun(&mut self, binders: &[Binder], body: &Syntax) -> Result<Pexpr, ElabError> {
        let binders = self.visit_binders(binders)?;
        let body = self.visit(body);
        self.locals.truncate(self.locals.len() - binders.len());
        let mut m = body?;
        for (name, info, ty) in binders.into_iter().rev() {
            m = mk_abs(name, info, ty, m);
        }
        Ok(m)
    }

    fn visit_pi(&mut self, binders: &[Binder], body: &Syntax) -> Result<Pexpr, ElabError> {
        let binders = self.visit_binders(binders)?;
        let body = self.visit(body);
        self.locals.truncate(self.locals.len() - binders.len());
        let mut m = body?;
        for (name, info, ty) in binders.into_iter().rev() {
            m = mk_pi(name, info, ty.unwrap_or(Pexpr::Hole), m);
        }
        Ok(m)
    }

    /// Lowers `match` into an application of the equations helper: each arm
    /// becomes a lambda over its pattern variables around
    /// `(_eqn pats... rhs)`, the arms are collected under `_eqns`, and the
    /// result is applied to the discriminants.
    fn visit_match(&mut self, discrs: &[Syntax], arms: &[MatchArm]) -> Result<Pexpr, ElabError> {
        let mut elab_discrs = vec![];
        for discr in discrs {
            elab_discrs.push(self.visit(discr)?);
        }
        let mut eqns = vec![];
        for arm in arms {
            let mut pvars = vec![];
            let mut pats = vec![];
            for pat in &arm.pats {
                pats.push(self.visit_pattern(pat, &mut pvars)?);
            }
            for pvar in &pvars {
                self.locals.push(pvar.clone());
            }
            let rhs = self.visit(&arm.rhs);
            self.locals.truncate(self.locals.len() - pvars.len());
            let mut eqn = mk_app_n(builtin("_eqn"), pats.into_iter().chain([rhs?]));
            for pvar in pvars.into_iter().rev() {
                eqn = mk_abs(pvar, Default::default(), None, eqn);
            }
            eqns.push(eqn);
        }
        Ok(mk_app_n(mk_app_n(builtin("_eqns"), eqns), elab_discrs))
    }

    /// Pattern position: identifiers that do not resolve to anything become
    /// pattern variables; constructors stay constants. Order of first
    /// occurrence is preserved.
    fn visit_pattern(
        &mut self,
        pat: &Syntax,
        pvars: &mut Vec<Name>,
    ) -> Result<Pexpr, ElabError> {
        let span = pat.span().cloned();
        let expr = match pat {
            Syntax::Ident { name, univs, span } => {
                if name.is_atomic() && !self.is_local(name) {
                    let hits = crate::resolve::resolve(self.elab.state, name);
                    let is_decl = matches!(hits.first(), Some(Candidate::Decl(_)));
                    if !is_decl {
                        if !pvars.contains(name) {
                            pvars.push(name.clone());
                        }
                        return Ok(mk_mdata(span.clone(), mk_local(name.clone())));
                    }
                }
                self.visit_ident(name, univs, span.as_ref())?
            }
            Syntax::App { fun, args, .. } => {
                let fun = self.visit_pattern(fun, pvars)?;
                let mut elab_args = vec![];
                for arg in args {
                    elab_args.push(self.visit_pattern(arg, pvars)?);
                }
                mk_app_n(fun, elab_args)
            }
            Syntax::AnonCtor { args, .. } => {
                let mut elab_args = vec![];
                for arg in args {
                    elab_args.push(self.visit_pattern(arg, pvars)?);
                }
                mk_app_n(builtin("_anon_ctor"), elab_args)
            }
            Syntax::NumLit { text, span } => self.visit_num_lit(text, span.as_ref()),
            Syntax::StrLit { text, span } => self.visit_str_lit(text, span.as_ref()),
            Syntax::Placeholder { .. } => Pexpr::Hole,
            _ => {
                return Err(ElabError::UnexpectedSyntax {
                    kind: pat.kind(),
                    span,
                })
            }
        };
        Ok(mk_mdata(span, expr))
    }

    /// Structure instances lower into an application of the structure's
    /// `mk` constructor when the structure is known, with `..src` filling
    /// omitted fields through their projections; otherwise into the
    /// generic `_struct_inst` helper with fields in source order.
    fn visit_struct_inst(
        &mut self,
        struct_name: Option<&Name>,
        fields: &[(Name, Syntax)],
        catchall: Option<&Syntax>,
        span: &Option<Span>,
    ) -> Result<Pexpr, ElabError> {
        let known = match struct_name {
            Some(name) => match resolve_term(self.elab.state, name, span.as_ref())? {
                Candidate::Decl(full) => {
                    let decl_fields = self
                        .elab
                        .state
                        .env
                        .get(&full)
                        .map(|decl| decl.fields.clone())
                        .unwrap_or_default();
                    Some((full, decl_fields))
                }
                Candidate::Var(_) => None,
            },
            None => None,
        };
        match known {
            Some((full, decl_fields)) if !decl_fields.is_empty() => {
                let catchall = match catchall {
                    Some(src) => Some(self.visit(src)?),
                    None => None,
                };
                let mut args = vec![];
                for fld in &decl_fields {
                    if let Some((_, value)) = fields.iter().find(|(name, _)| name == fld) {
                        args.push(self.visit(value)?);
                    } else if let Some(src) = &catchall {
                        // fill from the source through its projection
                        let accessor = mk_const(full.append(fld), vec![]);
                        args.push(mk_app(accessor, src.clone()));
                    } else {
                        return Err(ElabError::UnexpectedSyntax {
                            kind: "structure instance with missing fields",
                            span: span.clone(),
                        });
                    }
                }
                Ok(mk_app_n(mk_const(full.str("mk"), vec![]), args))
            }
            _ => {
                // field list unknown: keep the source ordering
                let mut args = vec![];
                for (_, value) in fields {
                    args.push(self.visit(value)?);
                }
                if let Some(src) = catchall {
                    args.push(self.visit(src)?);
                }
                Ok(mk_app_n(builtin("_struct_inst"), args))
            }
        }
    }

    /// Literals degrade instead of aborting: malformed text becomes a
    /// sentinel value plus a diagnostic.
    fn visit_num_lit(&mut self, text: &str, span: Option<&Span>) -> Pexpr {
        let value = if RE_NUM_LIT.is_match(text) {
            let (radix, digits) = match text.get(..2) {
                Some("0x") | Some("0X") => (16, &text[2..]),
                Some("0b") | Some("0B") => (2, &text[2..]),
                _ => (10, text),
            };
            u128::from_str_radix(digits, radix).ok()
        } else {
            None
        };
        match value {
            Some(n) => Pexpr::Lit(Literal::Num(n)),
            None => {
                self.elab.log(Diagnostic::error(
                    format!("malformed numeric literal '{}'", text),
                    span.cloned(),
                ));
                Pexpr::Lit(Literal::Num(0))
            }
        }
    }

    fn visit_str_lit(&mut self, text: &str, span: Option<&Span>) -> Pexpr {
        match unescape(text) {
            Some(s) => Pexpr::Lit(Literal::Str(s)),
            None => {
                self.elab.log(Diagnostic::error(
                    format!("malformed string literal {:?}", text),
                    span.cloned(),
                ));
                Pexpr::Lit(Literal::Str(String::new()))
            }
        }
    }

    fn visit_notation(
        &mut self,
        kind: &Name,
        args: &[Syntax],
        span: Option<&Span>,
    ) -> Result<Pexpr, ElabError> {
        let Some(entry) = self.elab.state.parser_cfg.notations.find(kind).cloned() else {
            return Err(ElabError::UnexpectedSyntax {
                kind: "unregistered notation",
                span: span.cloned(),
            });
        };
        let Some(rhs) = &entry.rhs else {
            // reserved but never given a meaning
            return Err(ElabError::UnexpectedSyntax {
                kind: "reserved notation",
                span: span.cloned(),
            });
        };
        if args.len() != notation::arity_of(&entry) {
            return Err(ElabError::UnexpectedSyntax {
                kind: "notation arity",
                span: span.cloned(),
            });
        }
        let fun = self.visit(rhs)?;
        let mut elab_args = vec![];
        for arg in args {
            elab_args.push(self.visit(arg)?);
        }
        Ok(mk_app_n(fun, elab_args))
    }
}

fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '0' => out.push('\0'),
            _ => return None,
        }
    }
    Some(out)
}

/// Elaborates a declaration signature: the binders wrap the type in pis and
/// the value in lambdas, and section variables that occur (directly or
/// through another included variable's type) are abstracted in declaration
/// order.
pub fn elab_declaration(
    elab: &mut Elab,
    binders: &[Binder],
    ty: Option<&Syntax>,
    value: Option<&Syntax>,
) -> Result<(Option<Pexpr>, Option<Pexpr>), ElabError> {
    let mut translator = Translator {
        elab: &mut *elab,
        locals: vec![],
    };
    let groups = translator.visit_binders(binders)?;
    let ty = match ty {
        Some(ty) => Some(translator.visit(ty)?),
        None => None,
    };
    let value = match value {
        Some(value) => Some(translator.visit(value)?),
        None => None,
    };
    let mut ty = ty;
    let mut value = value;
    let bound: Vec<Name> = groups.iter().map(|(name, _, _)| name.clone()).collect();
    for (name, info, bty) in groups.into_iter().rev() {
        if let Some(t) = ty {
            ty = Some(mk_pi(
                name.clone(),
                info,
                bty.clone().unwrap_or(Pexpr::Hole),
                t,
            ));
        }
        if let Some(v) = value {
            value = Some(mk_abs(name, info, bty, v));
        }
    }

    let vars: Vec<VarDecl> = elab.current_scope()?.vars.clone();
    let included = included_vars(elab, &vars, ty.as_ref(), value.as_ref(), &bound)?;
    for (var, var_ty) in included.into_iter().rev() {
        if let Some(t) = ty {
            ty = Some(mk_pi(
                var.name.clone(),
                var.info,
                var_ty.clone().unwrap_or(Pexpr::Hole),
                t,
            ));
        }
        if let Some(v) = value {
            value = Some(mk_abs(var.name.clone(), var.info, var_ty, v));
        }
    }
    Ok((ty, value))
}

/// Which section variables must be abstracted? A variable is included if it
/// occurs in the type or value, or in the type of a later included
/// variable. A variable whose name is taken by an explicit binder is
/// shadowed and never re-abstracted. Types are elaborated with the earlier
/// variables in scope.
fn included_vars(
    elab: &mut Elab,
    vars: &[VarDecl],
    ty: Option<&Pexpr>,
    value: Option<&Pexpr>,
    bound: &[Name],
) -> Result<Vec<(VarDecl, Option<Pexpr>)>, ElabError> {
    let mut var_tys: Vec<Option<Pexpr>> = vec![];
    {
        let mut translator = Translator {
            elab: &mut *elab,
            locals: vec![],
        };
        for var in vars {
            let var_ty = match &var.ty {
                Some(ty) => Some(translator.visit(ty)?),
                None => None,
            };
            translator.locals.push(var.name.clone());
            var_tys.push(var_ty);
        }
    }
    let mut used = vec![false; vars.len()];
    for (i, var) in vars.iter().enumerate() {
        if bound.contains(&var.name) {
            continue;
        }
        let occurs = ty.is_some_and(|t| t.has_local(&var.name))
            || value.is_some_and(|v| v.has_local(&var.name));
        used[i] = occurs;
    }
    // a variable used by a later included variable's type is also included
    loop {
        let mut changed = false;
        for i in 0..vars.len() {
            if used[i] || bound.contains(&vars[i].name) {
                continue;
            }
            for j in (i + 1)..vars.len() {
                if used[j]
                    && var_tys[j]
                        .as_ref()
                        .is_some_and(|t| t.has_local(&vars[i].name))
                {
                    used[i] = true;
                    changed = true;
                    break;
                }
            }
        }
        if !changed {
            break;
        }
    }
    Ok(vars
        .iter()
        .zip(var_tys)
        .zip(used)
        .filter(|(_, used)| *used)
        .map(|((var, var_ty), _)| (var.clone(), var_ty))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Decl, DeclKind, Env};
    use crate::name::Name;
    use crate::notation::{NotationCmd, NotationItem, NotationSpec};
    use crate::pexpr::BinderInfo;
    use crate::state::{ElabState, FrontendConfig};
    use crate::syntax::{mk_ident, mk_placeholder, mk_syntax_app};

    fn setup(decls: &[&str]) -> (FrontendConfig, ElabState) {
        let cfg = FrontendConfig::new(Name::from("main"));
        let mut env = Env::default();
        for decl in decls {
            env.add_decl(Decl::new(Name::from(*decl), DeclKind::Def));
        }
        let state = ElabState::new(&cfg, env);
        (cfg, state)
    }

    fn translate(state: &mut ElabState, cfg: &FrontendConfig, syntax: &Syntax) -> String {
        let mut elab = Elab::new(cfg, state);
        to_pexpr(&mut elab, syntax).unwrap().to_string()
    }

    #[test]
    fn lambda_and_application() {
        let (cfg, mut state) = setup(&["f"]);
        let syntax = Syntax::Fun {
            binders: vec![Binder {
                names: vec![Name::from("x")],
                ty: Some(Box::new(mk_ident("f"))),
                info: BinderInfo::Default,
            }],
            body: Box::new(mk_syntax_app(mk_ident("f"), [mk_ident("x")])),
            span: None,
        };
        insta::assert_snapshot!(
            translate(&mut state, &cfg, &syntax),
            @"(lam x f (f (local x)))"
        );
    }

    #[test]
    fn binder_shadows_global() {
        let (cfg, mut state) = setup(&["x"]);
        let syntax = Syntax::Fun {
            binders: vec![Binder {
                names: vec![Name::from("x")],
                ty: None,
                info: BinderInfo::Default,
            }],
            body: Box::new(mk_ident("x")),
            span: None,
        };
        insta::assert_snapshot!(translate(&mut state, &cfg, &syntax), @"(lam x _ (local x))");
        // outside the binder the global is visible again
        insta::assert_snapshot!(translate(&mut state, &cfg, &mk_ident("x")), @"x");
    }

    #[test]
    fn pi_defaults_missing_domain_to_hole() {
        let (cfg, mut state) = setup(&[]);
        let syntax = Syntax::Pi {
            binders: vec![Binder {
                names: vec![Name::from("α")],
                ty: None,
                info: BinderInfo::Implicit,
            }],
            body: Box::new(mk_ident("α")),
            span: None,
        };
        insta::assert_snapshot!(
            translate(&mut state, &cfg, &syntax),
            @"(pi implicit α _ (local α))"
        );
    }

    #[test]
    fn let_and_have() {
        let (cfg, mut state) = setup(&["p", "h"]);
        let syntax = Syntax::Let {
            name: Name::from("y"),
            ty: None,
            value: Box::new(mk_ident("p")),
            body: Box::new(mk_ident("y")),
            span: None,
        };
        insta::assert_snapshot!(translate(&mut state, &cfg, &syntax), @"(let y _ p (local y))");

        let syntax = Syntax::Have {
            name: None,
            ty: Box::new(mk_ident("p")),
            proof: Box::new(mk_ident("h")),
            body: Box::new(mk_ident("this")),
            span: None,
        };
        insta::assert_snapshot!(
            translate(&mut state, &cfg, &syntax),
            @"((lam this p (local this)) h)"
        );
    }

    #[test]
    fn show_is_an_ascription() {
        let (cfg, mut state) = setup(&["p", "h"]);
        let syntax = Syntax::Show {
            ty: Box::new(mk_ident("p")),
            proof: Box::new(mk_ident("h")),
            span: None,
        };
        insta::assert_snapshot!(translate(&mut state, &cfg, &syntax), @"((_ann p) h)");
    }

    #[test]
    fn match_lowers_to_eqns() {
        let (cfg, mut state) = setup(&["nat.zero", "nat.succ", "b"]);
        let syntax = Syntax::Match {
            discrs: vec![mk_ident("b")],
            arms: vec![
                MatchArm {
                    pats: vec![mk_ident("nat.zero")],
                    rhs: mk_ident("b"),
                },
                MatchArm {
                    pats: vec![mk_syntax_app(mk_ident("nat.succ"), [mk_ident("n")])],
                    rhs: mk_ident("n"),
                },
            ],
            span: None,
        };
        insta::assert_snapshot!(
            translate(&mut state, &cfg, &syntax),
            @"(((_eqns ((_eqn nat.zero) b)) (lam n _ ((_eqn (nat.succ (local n))) (local n)))) b)"
        );
    }

    #[test]
    fn struct_inst_with_catchall() {
        let (cfg, mut state) = setup(&[]);
        let mut decl = Decl::new(Name::from("point"), DeclKind::Constant);
        decl.fields = vec![Name::from("x"), Name::from("y")];
        state.env.add_decl(decl);
        state
            .env
            .add_decl(Decl::new(Name::from("p0"), DeclKind::Def));
        state
            .env
            .add_decl(Decl::new(Name::from("one"), DeclKind::Def));
        let syntax = Syntax::StructInst {
            struct_name: Some(Name::from("point")),
            fields: vec![(Name::from("x"), mk_ident("one"))],
            catchall: Some(Box::new(mk_ident("p0"))),
            span: None,
        };
        insta::assert_snapshot!(
            translate(&mut state, &cfg, &syntax),
            @"((point.mk one) (point.y p0))"
        );
    }

    #[test]
    fn struct_inst_missing_field_is_an_error() {
        let (cfg, mut state) = setup(&[]);
        let mut decl = Decl::new(Name::from("point"), DeclKind::Constant);
        decl.fields = vec![Name::from("x"), Name::from("y")];
        state.env.add_decl(decl);
        state
            .env
            .add_decl(Decl::new(Name::from("one"), DeclKind::Def));
        let syntax = Syntax::StructInst {
            struct_name: Some(Name::from("point")),
            fields: vec![(Name::from("x"), mk_ident("one"))],
            catchall: None,
            span: None,
        };
        let mut elab = Elab::new(&cfg, &mut state);
        assert!(matches!(
            to_pexpr(&mut elab, &syntax),
            Err(ElabError::UnexpectedSyntax { .. })
        ));
    }

    #[test]
    fn literals_degrade_with_diagnostics() {
        let (cfg, mut state) = setup(&[]);
        let good = Syntax::NumLit {
            text: "0x2a".to_owned(),
            span: None,
        };
        insta::assert_snapshot!(translate(&mut state, &cfg, &good), @"(lit 42)");
        assert!(state.messages.is_empty());

        let bad = Syntax::NumLit {
            text: "0x".to_owned(),
            span: None,
        };
        insta::assert_snapshot!(translate(&mut state, &cfg, &bad), @"(lit 0)");
        assert_eq!(state.messages.len(), 1);

        let bad_str = Syntax::StrLit {
            text: "a\\q".to_owned(),
            span: None,
        };
        insta::assert_snapshot!(translate(&mut state, &cfg, &bad_str), @r#"(lit "")"#);
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn notation_expands_to_entity_application() {
        let (cfg, mut state) = setup(&["myOr", "a", "b"]);
        let kind = {
            let mut elab = Elab::new(&cfg, &mut state);
            crate::notation::register_notation(
                &mut elab,
                &NotationCmd {
                    spec: NotationSpec {
                        items: vec![
                            NotationItem::Arg { prec: 65 },
                            NotationItem::Symbol {
                                text: "⊕".to_owned(),
                                prec: Some(65),
                            },
                            NotationItem::Arg { prec: 65 },
                        ],
                    },
                    rhs: Some(mk_ident("myOr")),
                    span: None,
                },
            )
            .unwrap()
        };
        let syntax = Syntax::Notation {
            kind,
            args: vec![mk_ident("a"), mk_ident("b")],
            span: None,
        };
        insta::assert_snapshot!(translate(&mut state, &cfg, &syntax), @"((myOr a) b)");
    }

    #[test]
    fn unknown_identifier_fails() {
        let (cfg, mut state) = setup(&[]);
        let mut elab = Elab::new(&cfg, &mut state);
        assert!(matches!(
            to_pexpr(&mut elab, &mk_ident("ghost")),
            Err(ElabError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn placeholder_is_a_hole() {
        let (cfg, mut state) = setup(&[]);
        insta::assert_snapshot!(translate(&mut state, &cfg, &mk_placeholder()), @"_");
    }

    #[test]
    fn binder_shadows_section_variable() {
        let (cfg, mut state) = setup(&["nat"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.modify_current_scope(|mut scope| {
                scope.vars.push(VarDecl {
                    name: Name::from("n"),
                    info: BinderInfo::Default,
                    ty: Some(mk_ident("nat")),
                });
                ((), scope)
            })
            .unwrap();
        }
        let mut elab = Elab::new(&cfg, &mut state);
        let binders = [Binder {
            names: vec![Name::from("n")],
            ty: Some(Box::new(mk_ident("nat"))),
            info: BinderInfo::Default,
        }];
        let (_, value) =
            elab_declaration(&mut elab, &binders, None, Some(&mk_ident("n"))).unwrap();
        // the explicit binder takes the name; the shadowed variable must
        // not be abstracted a second time
        insta::assert_snapshot!(value.unwrap(), @"(lam n nat (local n))");
    }

    #[test]
    fn declaration_includes_used_variables() {
        let (cfg, mut state) = setup(&["nat"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.modify_current_scope(|mut scope| {
                scope.vars.push(VarDecl {
                    name: Name::from("α"),
                    info: BinderInfo::Implicit,
                    ty: None,
                });
                scope.vars.push(VarDecl {
                    name: Name::from("a"),
                    info: BinderInfo::Default,
                    ty: Some(mk_ident("α")),
                });
                scope.vars.push(VarDecl {
                    name: Name::from("unused"),
                    info: BinderInfo::Default,
                    ty: Some(mk_ident("nat")),
                });
                ((), scope)
            })
            .unwrap();
        }
        let mut elab = Elab::new(&cfg, &mut state);
        let (ty, value) = elab_declaration(
            &mut elab,
            &[],
            Some(&mk_ident("nat")),
            Some(&mk_ident("a")),
        )
        .unwrap();
        // `a` occurs in the value; its type mentions `α`, so both are
        // abstracted, in declaration order; `unused` is not.
        insta::assert_snapshot!(ty.unwrap(), @"(pi implicit α _ (pi a (local α) nat))");
        insta::assert_snapshot!(value.unwrap(), @"(lam implicit α _ (lam a (local α) (local a)))");
    }
}
