use crate::name::Name;
use crate::notation::NotationEntry;
use crate::pexpr::{BinderInfo, Level};
use crate::rbmap::Map;
use crate::syntax::Syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// the root scope of the module; behaves like a namespace
    Root,
    Namespace,
    Section,
}

/// A `variable` binding active in the current scope. Declarations that
/// mention it get abstracted over it.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Name,
    pub info: BinderInfo,
    pub ty: Option<Syntax>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Num(i64),
    Str(String),
}

/// An immutable snapshot of one lexical nesting level. Scopes are only ever
/// replaced wholesale (functional update through `modify_current_scope`),
/// never mutated in place while shared.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// the scope's own label; anonymous for plain `section`
    pub label: Name,
    /// full prefix: the parent's prefix followed by `label`
    pub prefix: Name,
    /// declarations made while this scope was innermost
    pub decls: Map<Name, ()>,
    /// notations declared while this scope was innermost, keyed by kind
    pub notations: Map<Name, NotationEntry>,
    /// explicitly opened namespaces, most recent last
    pub opens: Vec<Name>,
    pub univ_params: Map<Name, Level>,
    pub vars: Vec<VarDecl>,
    pub options: Map<Name, OptionValue>,
}

impl Scope {
    pub fn root(module: Name) -> Scope {
        Scope {
            kind: ScopeKind::Root,
            label: module,
            // module names do not qualify declarations
            prefix: Name::anon(),
            decls: Map::new(),
            notations: Map::new(),
            opens: vec![],
            univ_params: Map::new(),
            vars: vec![],
            options: Map::new(),
        }
    }

    /// A child scope entered by `namespace`/`section`. Variables, opened
    /// namespaces, universe parameters, and options are inherited; the
    /// declaration and notation records start empty.
    pub fn child(&self, kind: ScopeKind, label: Name) -> Scope {
        Scope {
            kind,
            prefix: self.prefix.append(&label),
            label,
            decls: Map::new(),
            notations: Map::new(),
            opens: self.opens.clone(),
            univ_params: self.univ_params.clone(),
            vars: self.vars.clone(),
            options: self.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_composition() {
        let root = Scope::root(Name::from("main"));
        assert_eq!(root.prefix, Name::anon());
        let foo = root.child(ScopeKind::Namespace, Name::from("foo"));
        assert_eq!(foo.prefix, Name::from("foo"));
        let bar = foo.child(ScopeKind::Namespace, Name::from("bar"));
        assert_eq!(bar.prefix, Name::from("foo.bar"));
    }

    #[test]
    fn anonymous_section_keeps_prefix() {
        let root = Scope::root(Name::from("main"));
        let ns = root.child(ScopeKind::Namespace, Name::from("foo"));
        let sec = ns.child(ScopeKind::Section, Name::anon());
        assert_eq!(sec.prefix, Name::from("foo"));
        assert!(sec.label.is_anon());
    }

    #[test]
    fn child_inherits_ambient_bindings() {
        let mut root = Scope::root(Name::from("main"));
        root.opens.push(Name::from("nat"));
        root.vars.push(VarDecl {
            name: Name::from("α"),
            info: Default::default(),
            ty: None,
        });
        let sec = root.child(ScopeKind::Section, Name::anon());
        assert_eq!(sec.opens, root.opens);
        assert_eq!(sec.vars, root.vars);
        assert!(sec.decls.is_empty());
    }
}
