use std::sync::Arc;

use crate::name::Name;
use crate::source::Span;

/// A universe level expression. Parameters stay symbolic; solving them is
/// the kernel's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    Zero,
    Succ(Arc<Level>),
    Max(Arc<(Level, Level)>),
    IMax(Arc<(Level, Level)>),
    Param(Name),
    Hole,
}

pub fn mk_level_succ(l: Level) -> Level {
    Level::Succ(Arc::new(l))
}

pub fn mk_level_max(l1: Level, l2: Level) -> Level {
    Level::Max(Arc::new((l1, l2)))
}

pub fn mk_level_imax(l1: Level, l2: Level) -> Level {
    Level::IMax(Arc::new((l1, l2)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinderInfo {
    #[default]
    Default,
    Implicit,
    StrictImplicit,
    InstImplicit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Num(u128),
    Str(String),
}

/// A pre-term: the expression shape the kernel expects, prior to type
/// checking. Names are resolved but nothing is type-correct yet, and
/// placeholders (`Hole`) stand for terms the kernel must synthesize.
///
/// Source positions ride along as `MData` wrappers instead of being part of
/// the logical term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pexpr {
    /// de Bruijn index, only produced below binders
    Var(usize),
    /// a local constant (binder-bound or section variable)
    Local(Name),
    Const(Arc<PexprConst>),
    App(Arc<PexprApp>),
    Abs(Arc<PexprAbs>),
    Pi(Arc<PexprPi>),
    Let(Arc<PexprLet>),
    Sort(Level),
    Lit(Literal),
    Hole,
    MData(Arc<PexprMData>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PexprConst {
    pub name: Name,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PexprApp {
    pub fun: Pexpr,
    pub arg: Pexpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PexprAbs {
    pub binder: Name,
    pub info: BinderInfo,
    pub ty: Option<Pexpr>,
    pub body: Pexpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PexprPi {
    pub binder: Name,
    pub info: BinderInfo,
    pub ty: Pexpr,
    pub body: Pexpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PexprLet {
    pub name: Name,
    pub ty: Option<Pexpr>,
    pub value: Pexpr,
    pub body: Pexpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PexprMData {
    pub span: Span,
    pub expr: Pexpr,
}

pub fn mk_local(name: Name) -> Pexpr {
    Pexpr::Local(name)
}

pub fn mk_const(name: Name, levels: Vec<Level>) -> Pexpr {
    Pexpr::Const(Arc::new(PexprConst { name, levels }))
}

pub fn mk_app(fun: Pexpr, arg: Pexpr) -> Pexpr {
    Pexpr::App(Arc::new(PexprApp { fun, arg }))
}

pub fn mk_app_n(fun: Pexpr, args: impl IntoIterator<Item = Pexpr>) -> Pexpr {
    args.into_iter().fold(fun, mk_app)
}

pub fn mk_abs(binder: Name, info: BinderInfo, ty: Option<Pexpr>, body: Pexpr) -> Pexpr {
    Pexpr::Abs(Arc::new(PexprAbs {
        binder,
        info,
        ty,
        body,
    }))
}

pub fn mk_pi(binder: Name, info: BinderInfo, ty: Pexpr, body: Pexpr) -> Pexpr {
    Pexpr::Pi(Arc::new(PexprPi {
        binder,
        info,
        ty,
        body,
    }))
}

pub fn mk_let(name: Name, ty: Option<Pexpr>, value: Pexpr, body: Pexpr) -> Pexpr {
    Pexpr::Let(Arc::new(PexprLet {
        name,
        ty,
        value,
        body,
    }))
}

pub fn mk_sort(level: Level) -> Pexpr {
    Pexpr::Sort(level)
}

/// Wraps `e` with position metadata, if the originating node had any.
pub fn mk_mdata(span: Option<Span>, expr: Pexpr) -> Pexpr {
    match span {
        Some(span) => Pexpr::MData(Arc::new(PexprMData { span, expr })),
        None => expr,
    }
}

impl Pexpr {
    /// The term with all metadata wrappers stripped, for structural checks.
    pub fn unwrap_mdata(&self) -> &Pexpr {
        let mut expr = self;
        while let Pexpr::MData(inner) = expr {
            expr = &inner.expr;
        }
        expr
    }

    /// Does `name` occur as a `Local` anywhere in the term?
    pub fn has_local(&self, name: &Name) -> bool {
        match self {
            Pexpr::Local(x) => x == name,
            Pexpr::Var(_) | Pexpr::Const(_) | Pexpr::Sort(_) | Pexpr::Lit(_) | Pexpr::Hole => false,
            Pexpr::App(inner) => inner.fun.has_local(name) || inner.arg.has_local(name),
            Pexpr::Abs(inner) => {
                inner.ty.as_ref().is_some_and(|ty| ty.has_local(name)) || inner.body.has_local(name)
            }
            Pexpr::Pi(inner) => inner.ty.has_local(name) || inner.body.has_local(name),
            Pexpr::Let(inner) => {
                inner.ty.as_ref().is_some_and(|ty| ty.has_local(name))
                    || inner.value.has_local(name)
                    || inner.body.has_local(name)
            }
            Pexpr::MData(inner) => inner.expr.has_local(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mdata_is_transparent_to_unwrap() {
        let e = mk_local(Name::from("x"));
        assert_eq!(mk_mdata(None, e.clone()), e);
        assert_eq!(*e.unwrap_mdata(), e);
    }

    #[test]
    fn has_local_descends_binders() {
        let x = Name::from("x");
        let e = mk_abs(
            Name::from("y"),
            BinderInfo::Default,
            None,
            mk_app(mk_local(Name::from("y")), mk_local(x.clone())),
        );
        assert!(e.has_local(&x));
        assert!(!e.has_local(&Name::from("z")));
    }
}
