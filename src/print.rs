//! Display instances for pre-terms and levels. Output is an s-expression
//! rendering used by diagnostics and snapshot tests; metadata wrappers are
//! not shown.

use std::fmt;

use crate::pexpr::{BinderInfo, Level, Literal, Pexpr};

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Zero => write!(f, "0"),
            Level::Succ(inner) => write!(f, "(succ {})", inner),
            Level::Max(inner) => write!(f, "(max {} {})", inner.0, inner.1),
            Level::IMax(inner) => write!(f, "(imax {} {})", inner.0, inner.1),
            Level::Param(name) => write!(f, "{}", name),
            Level::Hole => write!(f, "_"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Num(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

fn binder_open(info: BinderInfo) -> &'static str {
    match info {
        BinderInfo::Default => "",
        BinderInfo::Implicit => "implicit ",
        BinderInfo::StrictImplicit => "strict-implicit ",
        BinderInfo::InstImplicit => "inst-implicit ",
    }
}

impl fmt::Display for Pexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pexpr::Var(i) => write!(f, "(var {})", i),
            Pexpr::Local(name) => write!(f, "(local {})", name),
            Pexpr::Const(inner) => {
                if inner.levels.is_empty() {
                    write!(f, "{}", inner.name)
                } else {
                    write!(f, "{}.{{", inner.name)?;
                    for (i, level) in inner.levels.iter().enumerate() {
                        if i != 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", level)?;
                    }
                    write!(f, "}}")
                }
            }
            Pexpr::App(inner) => write!(f, "({} {})", inner.fun, inner.arg),
            Pexpr::Abs(inner) => match &inner.ty {
                Some(ty) => write!(
                    f,
                    "(lam {}{} {} {})",
                    binder_open(inner.info),
                    inner.binder,
                    ty,
                    inner.body
                ),
                None => write!(
                    f,
                    "(lam {}{} _ {})",
                    binder_open(inner.info),
                    inner.binder,
                    inner.body
                ),
            },
            Pexpr::Pi(inner) => write!(
                f,
                "(pi {}{} {} {})",
                binder_open(inner.info),
                inner.binder,
                inner.ty,
                inner.body
            ),
            Pexpr::Let(inner) => match &inner.ty {
                Some(ty) => write!(
                    f,
                    "(let {} {} {} {})",
                    inner.name, ty, inner.value, inner.body
                ),
                None => write!(f, "(let {} _ {} {})", inner.name, inner.value, inner.body),
            },
            Pexpr::Sort(level) => write!(f, "(sort {})", level),
            Pexpr::Lit(lit) => write!(f, "(lit {})", lit),
            Pexpr::Hole => write!(f, "_"),
            Pexpr::MData(inner) => write!(f, "{}", inner.expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::pexpr::*;

    #[test]
    fn render_terms() {
        let e = mk_abs(
            Name::from("x"),
            BinderInfo::Default,
            Some(mk_const(Name::from("nat"), vec![])),
            mk_app(mk_local(Name::from("f")), Pexpr::Var(0)),
        );
        insta::assert_snapshot!(e, @"(lam x nat ((local f) (var 0)))");
    }

    #[test]
    fn render_levels_and_consts() {
        let e = mk_const(
            Name::from("eq"),
            vec![mk_level_succ(Level::Param(Name::from("u")))],
        );
        insta::assert_snapshot!(e, @"eq.{(succ u)}");
        insta::assert_snapshot!(mk_sort(mk_level_imax(Level::Zero, Level::Hole)), @"(sort (imax 0 _))");
    }

    #[test]
    fn mdata_is_invisible() {
        let file = std::sync::Arc::new(crate::source::File::new("<test>", "x"));
        let span = crate::source::Span::new(file, 0, 1);
        let e = mk_mdata(Some(span), mk_local(Name::from("x")));
        insta::assert_snapshot!(e, @"(local x)");
    }
}
