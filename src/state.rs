use crate::diag::{Diagnostic, ElabError};
use crate::env::{Decl, Env};
use crate::name::Name;
use crate::notation::ParserConfig;
use crate::rbmap::Map;
use crate::scope::{OptionValue, Scope, ScopeKind};

/// Read-only configuration for one module's elaboration. Handlers see it
/// through [`Elab`] but can never replace it.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub module: Name,
    pub option_defaults: Map<Name, OptionValue>,
}

impl FrontendConfig {
    pub fn new(module: Name) -> Self {
        FrontendConfig {
            module,
            option_defaults: Map::new(),
        }
    }
}

/// The state threaded through a whole module's elaboration. It is only ever
/// mutated by replacement: the driver clones it before each command and
/// commits the clone on success, so a failing command leaves no partial
/// update behind. Cloning is cheap because every table inside shares
/// structure.
#[derive(Debug, Clone)]
pub struct ElabState {
    /// non-empty; the last element is the innermost scope
    pub scopes: Vec<Scope>,
    pub parser_cfg: ParserConfig,
    pub messages: Vec<Diagnostic>,
    pub env: Env,
    /// monotonically increasing, feeds fresh notation kinds
    pub next_idx: u64,
}

impl ElabState {
    pub fn new(cfg: &FrontendConfig, imported: Env) -> Self {
        ElabState {
            scopes: vec![Scope::root(cfg.module.clone())],
            parser_cfg: ParserConfig::default(),
            messages: vec![],
            env: imported,
            next_idx: 0,
        }
    }
}

/// The per-command elaboration context: immutable configuration plus a
/// handle on the current state. Every elaboration step reads the former,
/// replaces pieces of the latter, and short-circuits with `?`.
pub struct Elab<'a> {
    pub cfg: &'a FrontendConfig,
    pub state: &'a mut ElabState,
}

impl<'a> Elab<'a> {
    pub fn new(cfg: &'a FrontendConfig, state: &'a mut ElabState) -> Self {
        Elab { cfg, state }
    }

    pub fn current_scope(&self) -> Result<&Scope, ElabError> {
        self.state.scopes.last().ok_or(ElabError::NoOpenScope)
    }

    /// Applies a functional update to the innermost scope, replacing it in
    /// the stack and returning the auxiliary result.
    pub fn modify_current_scope<A>(
        &mut self,
        f: impl FnOnce(Scope) -> (A, Scope),
    ) -> Result<A, ElabError> {
        let scope = self.state.scopes.pop().ok_or(ElabError::NoOpenScope)?;
        let (result, scope) = f(scope);
        self.state.scopes.push(scope);
        Ok(result)
    }

    pub fn push_scope(&mut self, kind: ScopeKind, label: Name) -> Result<(), ElabError> {
        let child = self.current_scope()?.child(kind, label);
        self.state.scopes.push(child);
        Ok(())
    }

    pub fn pop_scope(&mut self) -> Result<Scope, ElabError> {
        self.state.scopes.pop().ok_or(ElabError::NoOpenScope)
    }

    pub fn depth(&self) -> usize {
        self.state.scopes.len()
    }

    /// The innermost namespace prefix.
    pub fn prefix(&self) -> Result<Name, ElabError> {
        Ok(self.current_scope()?.prefix.clone())
    }

    pub fn qualify(&self, name: &Name) -> Result<Name, ElabError> {
        Ok(self.prefix()?.append(name))
    }

    pub fn fresh_idx(&mut self) -> u64 {
        let idx = self.state.next_idx;
        self.state.next_idx += 1;
        idx
    }

    pub fn log(&mut self, diag: Diagnostic) {
        self.state.messages.push(diag);
    }

    /// Adds a declaration to the environment and records it in the current
    /// scope. Redeclaration silently shadows.
    pub fn add_decl(&mut self, decl: Decl) -> Result<(), ElabError> {
        let name = decl.name.clone();
        self.state.env.add_decl(decl);
        self.modify_current_scope(|mut scope| {
            scope.decls = scope.decls.insert(name, ());
            ((), scope)
        })
    }

    pub fn get_option(&self, name: &Name) -> Option<OptionValue> {
        if let Ok(scope) = self.current_scope() {
            if let Some(value) = scope.options.find(name) {
                return Some(value.clone());
            }
        }
        self.cfg.option_defaults.find(name).cloned()
    }

    pub fn set_option(&mut self, name: Name, value: OptionValue) -> Result<(), ElabError> {
        self.modify_current_scope(|mut scope| {
            scope.options = scope.options.insert(name, value);
            ((), scope)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> (FrontendConfig, ElabState) {
        let cfg = FrontendConfig::new(Name::from("main"));
        let state = ElabState::new(&cfg, Env::default());
        (cfg, state)
    }

    #[test]
    fn push_pop_restores_state() {
        let (cfg, mut state) = new_state();
        let scopes_before: Vec<Name> = state.scopes.iter().map(|s| s.prefix.clone()).collect();
        let env_before = state.env.num_decls();

        let mut elab = Elab::new(&cfg, &mut state);
        elab.push_scope(ScopeKind::Namespace, Name::from("foo")).unwrap();
        assert_eq!(elab.prefix().unwrap(), Name::from("foo"));
        let popped = elab.pop_scope().unwrap();
        assert_eq!(popped.label, Name::from("foo"));

        let scopes_after: Vec<Name> = state.scopes.iter().map(|s| s.prefix.clone()).collect();
        assert_eq!(scopes_before, scopes_after);
        assert_eq!(env_before, state.env.num_decls());
    }

    #[test]
    fn modify_current_scope_threads_result() {
        let (cfg, mut state) = new_state();
        let mut elab = Elab::new(&cfg, &mut state);
        let before = elab
            .modify_current_scope(|mut scope| {
                let n = scope.opens.len();
                scope.opens.push(Name::from("nat"));
                (n, scope)
            })
            .unwrap();
        assert_eq!(before, 0);
        assert_eq!(elab.current_scope().unwrap().opens, vec![Name::from("nat")]);
    }

    #[test]
    fn empty_stack_is_an_invariant_violation() {
        let (cfg, mut state) = new_state();
        state.scopes.clear();
        let elab = Elab::new(&cfg, &mut state);
        assert!(matches!(
            elab.current_scope(),
            Err(ElabError::NoOpenScope)
        ));
    }

    #[test]
    fn fresh_idx_is_monotonic() {
        let (cfg, mut state) = new_state();
        let mut elab = Elab::new(&cfg, &mut state);
        assert_eq!(elab.fresh_idx(), 0);
        assert_eq!(elab.fresh_idx(), 1);
        assert_eq!(state.next_idx, 2);
    }

    #[test]
    fn options_fall_back_to_defaults() {
        let mut cfg = FrontendConfig::new(Name::from("main"));
        cfg.option_defaults = cfg
            .option_defaults
            .insert(Name::from("pp.unicode"), OptionValue::Bool(true));
        let mut state = ElabState::new(&cfg, Env::default());
        let mut elab = Elab::new(&cfg, &mut state);
        assert_eq!(
            elab.get_option(&Name::from("pp.unicode")),
            Some(OptionValue::Bool(true))
        );
        elab.set_option(Name::from("pp.unicode"), OptionValue::Bool(false))
            .unwrap();
        assert_eq!(
            elab.get_option(&Name::from("pp.unicode")),
            Some(OptionValue::Bool(false))
        );
        assert_eq!(elab.get_option(&Name::from("pp.width")), None);
    }
}
