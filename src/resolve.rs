use crate::diag::ElabError;
use crate::name::Name;
use crate::source::Span;
use crate::state::ElabState;

/// A resolution hit: either a declaration in the environment (fully
/// qualified, aliases already chased) or an active `variable` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Decl(Name),
    Var(Name),
}

impl Candidate {
    pub fn name(&self) -> &Name {
        match self {
            Candidate::Decl(name) | Candidate::Var(name) => name,
        }
    }
}

/// Computes the candidate set for `name` against the current scope stack,
/// in priority order:
///
/// 1. `name` already names a declaration: that is the unique candidate;
/// 2. the current namespace prefix prepended to `name`;
/// 3. each open namespace, innermost scope first (ambient prefixes count as
///    opened);
/// 4. active `variable` bindings matching `name`.
///
/// Duplicates are dropped, preserving discovery order. The set is
/// re-derived on every occurrence since both the environment and the open
/// set evolve command by command.
pub fn resolve(state: &ElabState, name: &Name) -> Vec<Candidate> {
    if state.env.contains(name) {
        return vec![Candidate::Decl(state.env.dealias(name))];
    }

    let mut candidates: Vec<Candidate> = vec![];
    let mut add = |candidate: Candidate| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(scope) = state.scopes.last() {
        let qualified = scope.prefix.append(name);
        if state.env.contains(&qualified) {
            add(Candidate::Decl(state.env.dealias(&qualified)));
        }
    }

    for scope in state.scopes.iter().rev() {
        let ambient = scope.prefix.append(name);
        if state.env.contains(&ambient) {
            add(Candidate::Decl(state.env.dealias(&ambient)));
        }
        for ns in scope.opens.iter().rev() {
            let qualified = ns.append(name);
            if state.env.contains(&qualified) {
                add(Candidate::Decl(state.env.dealias(&qualified)));
            }
        }
    }

    // variables come after namespace hits; see DESIGN.md
    if name.is_atomic() {
        for scope in state.scopes.iter().rev() {
            for var in &scope.vars {
                if var.name == *name {
                    add(Candidate::Var(var.name.clone()));
                }
            }
        }
    }

    candidates
}

/// Resolution in term position: ambiguity is tolerated, the first
/// (highest-priority) candidate wins.
pub fn resolve_term(
    state: &ElabState,
    name: &Name,
    span: Option<&Span>,
) -> Result<Candidate, ElabError> {
    resolve(state, name)
        .into_iter()
        .next()
        .ok_or_else(|| ElabError::UnknownIdentifier {
            name: name.clone(),
            span: span.cloned(),
        })
}

/// Resolution where the target must be unique (`attribute`, `export`).
pub fn resolve_unique(
    state: &ElabState,
    name: &Name,
    span: Option<&Span>,
) -> Result<Name, ElabError> {
    let candidates = resolve(state, name);
    let mut names: Vec<Name> = vec![];
    for candidate in &candidates {
        if !names.contains(candidate.name()) {
            names.push(candidate.name().clone());
        }
    }
    if names.len() > 1 {
        return Err(ElabError::AmbiguousIdentifier {
            name: name.clone(),
            candidates: names,
            span: span.cloned(),
        });
    }
    match names.pop() {
        Some(unique) => Ok(unique),
        None => Err(ElabError::UnknownIdentifier {
            name: name.clone(),
            span: span.cloned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Decl, DeclKind, Env};
    use crate::scope::{ScopeKind, VarDecl};
    use crate::state::{Elab, FrontendConfig};

    fn state_with(decls: &[&str]) -> (FrontendConfig, ElabState) {
        let cfg = FrontendConfig::new(Name::from("main"));
        let mut env = Env::default();
        for decl in decls {
            env.add_decl(Decl::new(Name::from(*decl), DeclKind::Def));
        }
        let state = ElabState::new(&cfg, env);
        (cfg, state)
    }

    #[test]
    fn fully_qualified_short_circuits() {
        let (cfg, mut state) = state_with(&["foo.x", "x"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.push_scope(ScopeKind::Namespace, Name::from("foo")).unwrap();
        }
        // `foo.x` exists, so no other candidate is even considered
        let hits = resolve(&state, &Name::from("foo.x"));
        assert_eq!(hits, vec![Candidate::Decl(Name::from("foo.x"))]);
    }

    #[test]
    fn prefix_beats_open() {
        let (cfg, mut state) = state_with(&["foo.x", "bar.x"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.push_scope(ScopeKind::Namespace, Name::from("foo")).unwrap();
            elab.modify_current_scope(|mut scope| {
                scope.opens.push(Name::from("bar"));
                ((), scope)
            })
            .unwrap();
        }
        let hits = resolve(&state, &Name::from("x"));
        assert_eq!(
            hits,
            vec![
                Candidate::Decl(Name::from("foo.x")),
                Candidate::Decl(Name::from("bar.x")),
            ]
        );
        assert_eq!(
            resolve_term(&state, &Name::from("x"), None).unwrap(),
            Candidate::Decl(Name::from("foo.x"))
        );
    }

    #[test]
    fn opens_beat_variables() {
        let (cfg, mut state) = state_with(&["bar.x"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.modify_current_scope(|mut scope| {
                scope.opens.push(Name::from("bar"));
                scope.vars.push(VarDecl {
                    name: Name::from("x"),
                    info: Default::default(),
                    ty: None,
                });
                ((), scope)
            })
            .unwrap();
        }
        let hits = resolve(&state, &Name::from("x"));
        assert_eq!(
            hits,
            vec![
                Candidate::Decl(Name::from("bar.x")),
                Candidate::Var(Name::from("x")),
            ]
        );
    }

    #[test]
    fn unknown_and_ambiguous() {
        let (cfg, mut state) = state_with(&["foo.x", "bar.x"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.modify_current_scope(|mut scope| {
                scope.opens.push(Name::from("foo"));
                scope.opens.push(Name::from("bar"));
                ((), scope)
            })
            .unwrap();
        }
        assert!(matches!(
            resolve_term(&state, &Name::from("y"), None),
            Err(ElabError::UnknownIdentifier { .. })
        ));
        assert!(matches!(
            resolve_unique(&state, &Name::from("x"), None),
            Err(ElabError::AmbiguousIdentifier { .. })
        ));
    }

    #[test]
    fn resolution_is_idempotent() {
        let (cfg, mut state) = state_with(&["foo.x", "bar.x"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.push_scope(ScopeKind::Namespace, Name::from("foo")).unwrap();
            elab.modify_current_scope(|mut scope| {
                scope.opens.push(Name::from("bar"));
                ((), scope)
            })
            .unwrap();
        }
        let first = resolve(&state, &Name::from("x"));
        let second = resolve(&state, &Name::from("x"));
        assert_eq!(first, second);
    }

    #[test]
    fn innermost_open_wins() {
        let (cfg, mut state) = state_with(&["a.x", "b.x"]);
        {
            let mut elab = Elab::new(&cfg, &mut state);
            elab.modify_current_scope(|mut scope| {
                scope.opens.push(Name::from("a"));
                ((), scope)
            })
            .unwrap();
            elab.push_scope(ScopeKind::Section, Name::anon()).unwrap();
            elab.modify_current_scope(|mut scope| {
                scope.opens.push(Name::from("b"));
                ((), scope)
            })
            .unwrap();
        }
        let hits = resolve(&state, &Name::from("x"));
        // the section's own open is found before the inherited one
        assert_eq!(hits[0], Candidate::Decl(Name::from("b.x")));
    }
}
