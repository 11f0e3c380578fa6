//! Command elaboration: the handler table, the individual command
//! elaborators, and the driver loop that feeds a module's commands through
//! them one at a time.

use crate::diag::{Diagnostic, ElabError, ResultSpanExt};
use crate::elab::elab_declaration;
use crate::env::{Decl, DeclKind, Env, Modifiers};
use crate::name::Name;
use crate::notation::{register_notation, reserve_notation, retract, NotationCmd};
use crate::pexpr::{Level, Pexpr};
use crate::rbmap::Map;
use crate::resolve::resolve_unique;
use crate::scope::{OptionValue, ScopeKind, VarDecl};
use crate::source::Span;
use crate::state::{Elab, ElabState, FrontendConfig};
use crate::syntax::{Binder, Syntax};

/// The parsed payload of a declaration command. `example` carries an
/// anonymous name and is elaborated but never recorded.
#[derive(Debug, Clone)]
pub struct DeclCmd {
    pub kind: DeclKind,
    pub name: Name,
    pub modifiers: Modifiers,
    pub attrs: Vec<Name>,
    pub doc: Option<String>,
    pub univ_params: Vec<Name>,
    pub binders: Vec<Binder>,
    pub ty: Option<Syntax>,
    pub value: Option<Syntax>,
    pub span: Option<Span>,
}

/// One top-level command, as handed over by the parser.
#[derive(Debug, Clone)]
pub enum Command {
    Module {
        name: Name,
        imports: Vec<Name>,
        span: Option<Span>,
    },
    Namespace {
        name: Name,
        span: Option<Span>,
    },
    Section {
        label: Option<Name>,
        span: Option<Span>,
    },
    End {
        name: Option<Name>,
        span: Option<Span>,
    },
    Universe {
        names: Vec<Name>,
        span: Option<Span>,
    },
    Variables {
        binders: Vec<Binder>,
        span: Option<Span>,
    },
    Decl(DeclCmd),
    Notation(NotationCmd),
    ReserveNotation(NotationCmd),
    Attribute {
        attr: Name,
        targets: Vec<Name>,
        span: Option<Span>,
    },
    Open {
        namespaces: Vec<Name>,
        span: Option<Span>,
    },
    Export {
        ns: Name,
        names: Vec<Name>,
        span: Option<Span>,
    },
    SetOption {
        name: Name,
        value: OptionValue,
        span: Option<Span>,
    },
    InitQuotient {
        span: Option<Span>,
    },
    Eoi {
        span: Option<Span>,
    },
}

impl Command {
    /// The dispatch key: the command's top-level kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Module { .. } => "module",
            Command::Namespace { .. } => "namespace",
            Command::Section { .. } => "section",
            Command::End { .. } => "end",
            Command::Universe { .. } => "universe",
            Command::Variables { .. } => "variables",
            Command::Decl(_) => "declaration",
            Command::Notation(_) => "notation",
            Command::ReserveNotation(_) => "reserve notation",
            Command::Attribute { .. } => "attribute",
            Command::Open { .. } => "open",
            Command::Export { .. } => "export",
            Command::SetOption { .. } => "set_option",
            Command::InitQuotient { .. } => "init_quotient",
            Command::Eoi { .. } => "end of input",
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            Command::Module { span, .. }
            | Command::Namespace { span, .. }
            | Command::Section { span, .. }
            | Command::End { span, .. }
            | Command::Universe { span, .. }
            | Command::Variables { span, .. }
            | Command::Attribute { span, .. }
            | Command::Open { span, .. }
            | Command::Export { span, .. }
            | Command::SetOption { span, .. }
            | Command::InitQuotient { span }
            | Command::Eoi { span } => span.as_ref(),
            Command::Decl(decl) => decl.span.as_ref(),
            Command::Notation(cmd) | Command::ReserveNotation(cmd) => cmd.span.as_ref(),
        }
    }
}

/// What a handler reports back to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Done,
}

type Handler = fn(&mut Elab<'_>, &Command) -> Result<Status, ElabError>;

/// The command-kind → handler table. Built once per session and passed
/// into the driver explicitly; there is no global registry.
pub struct Dispatcher {
    handlers: Map<&'static str, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let handlers = [
            ("module", elab_module as Handler),
            ("namespace", elab_namespace),
            ("section", elab_section),
            ("end", elab_end),
            ("universe", elab_universe),
            ("variables", elab_variables),
            ("declaration", elab_decl),
            ("notation", elab_notation),
            ("reserve notation", elab_reserve_notation),
            ("attribute", elab_attribute),
            ("open", elab_open),
            ("export", elab_export),
            ("set_option", elab_set_option),
            ("init_quotient", elab_init_quotient),
            ("end of input", elab_eoi),
        ]
        .into_iter()
        .collect();
        Dispatcher { handlers }
    }

    pub fn dispatch(&self, elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
        match self.handlers.find(&cmd.kind()) {
            Some(handler) => handler(elab, cmd),
            None => Err(unexpected(cmd)),
        }
    }
}

/// Runs a whole module: each command is elaborated against a snapshot of
/// the state, which is committed on success and discarded on failure, so a
/// failing command leaves everything but the message log untouched.
/// Terminates in the `Done` state once end-of-input is processed; commands
/// arriving after that are reported, not elaborated.
pub fn elab_commands(
    dispatcher: &Dispatcher,
    cfg: &FrontendConfig,
    imported: Env,
    commands: &[Command],
) -> ElabState {
    let mut state = ElabState::new(cfg, imported);
    let mut done = false;
    for cmd in commands {
        if done {
            state.messages.push(Diagnostic::error(
                format!("unexpected '{}' command after end of input", cmd.kind()),
                cmd.span().cloned(),
            ));
            continue;
        }
        let mut attempt = state.clone();
        let result = {
            let mut elab = Elab::new(cfg, &mut attempt);
            dispatcher.dispatch(&mut elab, cmd)
        };
        match result {
            Ok(Status::Done) => {
                state = attempt;
                done = true;
            }
            Ok(Status::Ready) => state = attempt,
            Err(err) => {
                state.messages.push(err.into_diagnostic());
                // a failing end-of-input still terminates the module
                if matches!(cmd, Command::Eoi { .. }) {
                    done = true;
                }
            }
        }
    }
    if !done {
        state
            .messages
            .push(ElabError::UnexpectedEndOfInput { span: None }.into_diagnostic());
    }
    state
}

fn unexpected(cmd: &Command) -> ElabError {
    ElabError::UnexpectedSyntax {
        kind: cmd.kind(),
        span: cmd.span().cloned(),
    }
}

fn elab_module(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Module {
        name,
        imports,
        span,
    } = cmd
    else {
        return Err(unexpected(cmd));
    };
    // imports were resolved by the host and arrive as the initial
    // environment; the header is traced and checked for consistency
    for import in imports {
        elab.log(Diagnostic::info(
            format!("importing '{}'", import),
            span.clone(),
        ));
    }
    if *name != elab.cfg.module {
        elab.log(Diagnostic::warning(
            format!(
                "module header names '{}' but '{}' is being elaborated",
                name, elab.cfg.module
            ),
            span.clone(),
        ));
    }
    Ok(Status::Ready)
}

fn elab_namespace(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Namespace { name, span } = cmd else {
        return Err(unexpected(cmd));
    };
    if name.is_anon() {
        return Err(ElabError::UnexpectedSyntax {
            kind: "anonymous namespace",
            span: span.clone(),
        });
    }
    elab.push_scope(ScopeKind::Namespace, name.clone())?;
    Ok(Status::Ready)
}

fn elab_section(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Section { label, .. } = cmd else {
        return Err(unexpected(cmd));
    };
    let label = label.clone().unwrap_or_else(Name::anon);
    elab.push_scope(ScopeKind::Section, label)?;
    Ok(Status::Ready)
}

fn elab_end(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::End { name, span } = cmd else {
        return Err(unexpected(cmd));
    };
    // the root scope is not closable
    if elab.depth() <= 1 {
        return Err(ElabError::NoOpenScope);
    }
    let scope = elab.pop_scope()?;
    let found = name.clone().unwrap_or_else(Name::anon);
    if scope.label != found {
        return Err(ElabError::EndNameMismatch {
            expected: scope.label,
            found,
            span: span.clone(),
        });
    }
    // notations do not outlive the scope that declared them
    if !scope.notations.is_empty() {
        elab.state.parser_cfg = retract(&elab.state.parser_cfg, &scope.notations);
    }
    Ok(Status::Ready)
}

fn elab_universe(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Universe { names, .. } = cmd else {
        return Err(unexpected(cmd));
    };
    for name in names {
        elab.modify_current_scope(|mut scope| {
            scope.univ_params = scope
                .univ_params
                .insert(name.clone(), Level::Param(name.clone()));
            ((), scope)
        })?;
    }
    Ok(Status::Ready)
}

fn elab_variables(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Variables { binders, .. } = cmd else {
        return Err(unexpected(cmd));
    };
    for binder in binders {
        // surface a bad type here rather than at every later use site
        if let Some(ty) = &binder.ty {
            crate::elab::to_pexpr(elab, ty)?;
        }
        for name in &binder.names {
            let var = VarDecl {
                name: name.clone(),
                info: binder.info,
                ty: binder.ty.clone().map(|ty| *ty),
            };
            elab.modify_current_scope(|mut scope| {
                // redeclaring a variable replaces the old binding
                scope.vars.retain(|v| v.name != var.name);
                scope.vars.push(var);
                ((), scope)
            })?;
        }
    }
    Ok(Status::Ready)
}

fn elab_decl(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Decl(d) = cmd else {
        return Err(unexpected(cmd));
    };
    match d.kind {
        DeclKind::Def | DeclKind::Example => {
            if d.value.is_none() {
                return Err(ElabError::UnexpectedSyntax {
                    kind: "declaration without a body",
                    span: d.span.clone(),
                });
            }
        }
        DeclKind::Theorem => {
            if d.ty.is_none() || d.value.is_none() {
                return Err(ElabError::UnexpectedSyntax {
                    kind: "theorem without a statement or proof",
                    span: d.span.clone(),
                });
            }
        }
        DeclKind::Axiom | DeclKind::Constant => {
            if d.ty.is_none() || d.value.is_some() {
                return Err(ElabError::UnexpectedSyntax {
                    kind: "axiom with a body or without a type",
                    span: d.span.clone(),
                });
            }
        }
    }

    let (ty, value) = elab_declaration(elab, &d.binders, d.ty.as_ref(), d.value.as_ref())
        .with_span(d.span.as_ref())?;

    let mut univ_params = d.univ_params.clone();
    let ambient: Vec<Name> = elab
        .current_scope()?
        .univ_params
        .keys()
        .cloned()
        .collect();
    for param in ambient {
        let occurs = ty.as_ref().is_some_and(|t| mentions_param(t, &param))
            || value.as_ref().is_some_and(|v| mentions_param(v, &param));
        if occurs && !univ_params.contains(&param) {
            univ_params.push(param);
        }
    }

    if d.kind == DeclKind::Example {
        // elaborated for checking only, never recorded
        return Ok(Status::Ready);
    }

    let mut decl = Decl::new(elab.qualify(&d.name)?, d.kind);
    decl.univ_params = univ_params;
    decl.modifiers = d.modifiers;
    decl.attrs = d.attrs.clone();
    decl.doc = d.doc.clone();
    decl.ty = ty;
    decl.value = value;
    elab.add_decl(decl)?;
    Ok(Status::Ready)
}

fn elab_notation(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Notation(notation) = cmd else {
        return Err(unexpected(cmd));
    };
    register_notation(elab, notation)?;
    Ok(Status::Ready)
}

fn elab_reserve_notation(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::ReserveNotation(notation) = cmd else {
        return Err(unexpected(cmd));
    };
    reserve_notation(elab, notation)?;
    Ok(Status::Ready)
}

fn elab_attribute(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Attribute {
        attr,
        targets,
        span,
    } = cmd
    else {
        return Err(unexpected(cmd));
    };
    for target in targets {
        let full = resolve_unique(elab.state, target, span.as_ref())?;
        let Some(decl) = elab.state.env.get(&full).cloned() else {
            return Err(ElabError::UnknownIdentifier {
                name: target.clone(),
                span: span.clone(),
            });
        };
        let mut decl = decl;
        if !decl.attrs.contains(attr) {
            decl.attrs.push(attr.clone());
        }
        elab.state.env.add_decl(decl);
    }
    Ok(Status::Ready)
}

/// Namespace references in `open`/`export` resolve against the namespace
/// index, innermost prefix first.
fn resolve_namespace(elab: &Elab, name: &Name, span: Option<&Span>) -> Result<Name, ElabError> {
    for scope in elab.state.scopes.iter().rev() {
        let qualified = scope.prefix.append(name);
        if elab.state.env.is_namespace(&qualified) {
            return Ok(qualified);
        }
    }
    if elab.state.env.is_namespace(name) {
        return Ok(name.clone());
    }
    Err(ElabError::UnknownIdentifier {
        name: name.clone(),
        span: span.cloned(),
    })
}

fn elab_open(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Open { namespaces, span } = cmd else {
        return Err(unexpected(cmd));
    };
    for ns in namespaces {
        let resolved = resolve_namespace(elab, ns, span.as_ref())?;
        elab.modify_current_scope(|mut scope| {
            if !scope.opens.contains(&resolved) {
                scope.opens.push(resolved);
            }
            ((), scope)
        })?;
    }
    Ok(Status::Ready)
}

fn elab_export(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Export { ns, names, span } = cmd else {
        return Err(unexpected(cmd));
    };
    let resolved = resolve_namespace(elab, ns, span.as_ref())?;
    for short in names {
        let target = resolved.append(short);
        if !elab.state.env.contains(&target) {
            return Err(ElabError::UnknownIdentifier {
                name: target,
                span: span.clone(),
            });
        }
        let alias = elab.qualify(short)?;
        let target = elab.state.env.dealias(&target);
        elab.state.env.add_alias(alias, target);
    }
    Ok(Status::Ready)
}

fn elab_set_option(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::SetOption { name, value, .. } = cmd else {
        return Err(unexpected(cmd));
    };
    elab.set_option(name.clone(), value.clone())?;
    Ok(Status::Ready)
}

fn elab_init_quotient(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::InitQuotient { .. } = cmd else {
        return Err(unexpected(cmd));
    };
    for name in ["quot", "quot.mk", "quot.lift", "quot.ind"] {
        elab.add_decl(Decl::new(Name::from(name), DeclKind::Constant))?;
    }
    Ok(Status::Ready)
}

fn elab_eoi(elab: &mut Elab, cmd: &Command) -> Result<Status, ElabError> {
    let Command::Eoi { span } = cmd else {
        return Err(unexpected(cmd));
    };
    if elab.depth() > 1 {
        return Err(ElabError::UnexpectedEndOfInput { span: span.clone() });
    }
    Ok(Status::Done)
}

/// Does `param` occur as a universe parameter anywhere in the term?
fn mentions_param(expr: &Pexpr, param: &Name) -> bool {
    fn in_level(level: &Level, param: &Name) -> bool {
        match level {
            Level::Zero | Level::Hole => false,
            Level::Succ(inner) => in_level(inner, param),
            Level::Max(inner) | Level::IMax(inner) => {
                in_level(&inner.0, param) || in_level(&inner.1, param)
            }
            Level::Param(name) => name == param,
        }
    }
    match expr {
        Pexpr::Var(_) | Pexpr::Local(_) | Pexpr::Lit(_) | Pexpr::Hole => false,
        Pexpr::Const(inner) => inner.levels.iter().any(|l| in_level(l, param)),
        Pexpr::Sort(level) => in_level(level, param),
        Pexpr::App(inner) => {
            mentions_param(&inner.fun, param) || mentions_param(&inner.arg, param)
        }
        Pexpr::Abs(inner) => {
            inner
                .ty
                .as_ref()
                .is_some_and(|ty| mentions_param(ty, param))
                || mentions_param(&inner.body, param)
        }
        Pexpr::Pi(inner) => mentions_param(&inner.ty, param) || mentions_param(&inner.body, param),
        Pexpr::Let(inner) => {
            inner
                .ty
                .as_ref()
                .is_some_and(|ty| mentions_param(ty, param))
                || mentions_param(&inner.value, param)
                || mentions_param(&inner.body, param)
        }
        Pexpr::MData(inner) => mentions_param(&inner.expr, param),
    }
}
