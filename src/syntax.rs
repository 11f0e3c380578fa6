use crate::name::Name;
use crate::pexpr::{BinderInfo, Level};
use crate::source::Span;

/// A parsed concrete-syntax tree for one term. Produced by the parser; the
/// elaborator only consumes it.
///
/// User-declared notations show up as `Notation` nodes carrying the kind
/// minted at registration time; everything else is a closed set of builtin
/// constructs, so translation dispatch is an exhaustive `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Ident {
        name: Name,
        /// explicit universe instantiation from a trailing `.{...}`
        univs: Vec<Level>,
        span: Option<Span>,
    },
    App {
        fun: Box<Syntax>,
        args: Vec<Syntax>,
        span: Option<Span>,
    },
    Fun {
        binders: Vec<Binder>,
        body: Box<Syntax>,
        span: Option<Span>,
    },
    Pi {
        binders: Vec<Binder>,
        body: Box<Syntax>,
        span: Option<Span>,
    },
    Let {
        name: Name,
        ty: Option<Box<Syntax>>,
        value: Box<Syntax>,
        body: Box<Syntax>,
        span: Option<Span>,
    },
    Have {
        name: Option<Name>,
        ty: Box<Syntax>,
        proof: Box<Syntax>,
        body: Box<Syntax>,
        span: Option<Span>,
    },
    Show {
        ty: Box<Syntax>,
        proof: Box<Syntax>,
        span: Option<Span>,
    },
    Match {
        discrs: Vec<Syntax>,
        arms: Vec<MatchArm>,
        span: Option<Span>,
    },
    /// `{ fld := e, ..src }` structure instance literal
    StructInst {
        struct_name: Option<Name>,
        fields: Vec<(Name, Syntax)>,
        /// the `..src` catch-all source, if present
        catchall: Option<Box<Syntax>>,
        span: Option<Span>,
    },
    /// `⟨e₁, ..., eₙ⟩`
    AnonCtor {
        args: Vec<Syntax>,
        span: Option<Span>,
    },
    Sort {
        level: Level,
        span: Option<Span>,
    },
    Proj {
        expr: Box<Syntax>,
        field: ProjField,
        span: Option<Span>,
    },
    /// raw literal text; validation happens during translation
    NumLit {
        text: String,
        span: Option<Span>,
    },
    StrLit {
        text: String,
        span: Option<Span>,
    },
    Placeholder {
        span: Option<Span>,
    },
    /// a node produced by a user-declared notation
    Notation {
        kind: Name,
        args: Vec<Syntax>,
        span: Option<Span>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binder {
    pub names: Vec<Name>,
    pub ty: Option<Box<Syntax>>,
    pub info: BinderInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pats: Vec<Syntax>,
    pub rhs: Syntax,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjField {
    Index(u64),
    Name(Name),
}

impl Syntax {
    pub fn span(&self) -> Option<&Span> {
        match self {
            Syntax::Ident { span, .. }
            | Syntax::App { span, .. }
            | Syntax::Fun { span, .. }
            | Syntax::Pi { span, .. }
            | Syntax::Let { span, .. }
            | Syntax::Have { span, .. }
            | Syntax::Show { span, .. }
            | Syntax::Match { span, .. }
            | Syntax::StructInst { span, .. }
            | Syntax::AnonCtor { span, .. }
            | Syntax::Sort { span, .. }
            | Syntax::Proj { span, .. }
            | Syntax::NumLit { span, .. }
            | Syntax::StrLit { span, .. }
            | Syntax::Placeholder { span }
            | Syntax::Notation { span, .. } => span.as_ref(),
        }
    }

    /// A stable tag for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Syntax::Ident { .. } => "identifier",
            Syntax::App { .. } => "application",
            Syntax::Fun { .. } => "fun",
            Syntax::Pi { .. } => "pi",
            Syntax::Let { .. } => "let",
            Syntax::Have { .. } => "have",
            Syntax::Show { .. } => "show",
            Syntax::Match { .. } => "match",
            Syntax::StructInst { .. } => "structure instance",
            Syntax::AnonCtor { .. } => "anonymous constructor",
            Syntax::Sort { .. } => "sort",
            Syntax::Proj { .. } => "projection",
            Syntax::NumLit { .. } => "numeric literal",
            Syntax::StrLit { .. } => "string literal",
            Syntax::Placeholder { .. } => "placeholder",
            Syntax::Notation { .. } => "notation",
        }
    }
}

/// Shorthand constructors, mainly for tests; real input carries spans from
/// the parser.
pub fn mk_ident(name: impl Into<Name>) -> Syntax {
    Syntax::Ident {
        name: name.into(),
        univs: vec![],
        span: None,
    }
}

pub fn mk_syntax_app(fun: Syntax, args: impl IntoIterator<Item = Syntax>) -> Syntax {
    Syntax::App {
        fun: Box::new(fun),
        args: args.into_iter().collect(),
        span: None,
    }
}

pub fn mk_placeholder() -> Syntax {
    Syntax::Placeholder { span: None }
}
