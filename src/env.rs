use crate::name::Name;
use crate::pexpr::Pexpr;
use crate::rbmap::Map;

/// Declaration modifiers, as written before the declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub is_private: bool,
    pub is_protected: bool,
    pub is_noncomputable: bool,
    pub is_meta: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Def,
    Theorem,
    Axiom,
    Constant,
    Example,
}

/// One fully elaborated declaration, in the form handed to the kernel.
/// The elaborator never inspects a type-checking result; it only
/// accumulates these.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: Name,
    pub kind: DeclKind,
    pub univ_params: Vec<Name>,
    pub modifiers: Modifiers,
    pub attrs: Vec<Name>,
    pub doc: Option<String>,
    pub ty: Option<Pexpr>,
    pub value: Option<Pexpr>,
    /// field names, recorded for structure-like declarations so that
    /// structure instance literals can fill in `..src` sources
    pub fields: Vec<Name>,
}

impl Decl {
    pub fn new(name: Name, kind: DeclKind) -> Decl {
        Decl {
            name,
            kind,
            univ_params: vec![],
            modifiers: Modifiers::default(),
            attrs: vec![],
            doc: None,
            ty: None,
            value: None,
            fields: vec![],
        }
    }
}

/// The accumulating core environment: every declaration processed so far,
/// plus the namespace and alias indexes derived from them.
#[derive(Debug, Clone, Default)]
pub struct Env {
    decls: Map<Name, Decl>,
    /// every proper prefix of a declared name is a namespace
    namespaces: Map<Name, ()>,
    /// aliases introduced by `export`, mapping alias to target
    aliases: Map<Name, Name>,
}

impl Env {
    pub fn add_decl(&mut self, decl: Decl) {
        let mut ns = decl.name.clone();
        while let Some(parent) = ns.parent() {
            if parent.is_anon() {
                break;
            }
            self.namespaces = self.namespaces.insert(parent.clone(), ());
            ns = parent.clone();
        }
        self.decls = self.decls.insert(decl.name.clone(), decl);
    }

    pub fn add_alias(&mut self, alias: Name, target: Name) {
        self.aliases = self.aliases.insert(alias, target);
    }

    pub fn get(&self, name: &Name) -> Option<&Decl> {
        match self.decls.find(name) {
            Some(decl) => Some(decl),
            None => {
                let target = self.aliases.find(name)?;
                self.decls.find(target)
            }
        }
    }

    /// Does `name` refer to a declaration, directly or through an alias?
    pub fn contains(&self, name: &Name) -> bool {
        self.decls.contains(name) || self.aliases.contains(name)
    }

    /// Resolves one level of aliasing.
    pub fn dealias(&self, name: &Name) -> Name {
        self.aliases.find(name).cloned().unwrap_or_else(|| name.clone())
    }

    pub fn is_namespace(&self, name: &Name) -> bool {
        self.namespaces.contains(name)
    }

    pub fn decls(&self) -> impl Iterator<Item = (&Name, &Decl)> {
        self.decls.iter()
    }

    pub fn num_decls(&self) -> usize {
        self.decls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_become_namespaces() {
        let mut env = Env::default();
        env.add_decl(Decl::new(Name::from("foo.bar.baz"), DeclKind::Def));
        assert!(env.is_namespace(&Name::from("foo")));
        assert!(env.is_namespace(&Name::from("foo.bar")));
        assert!(!env.is_namespace(&Name::from("foo.bar.baz")));
        assert!(env.contains(&Name::from("foo.bar.baz")));
    }

    #[test]
    fn alias_lookup() {
        let mut env = Env::default();
        env.add_decl(Decl::new(Name::from("foo.x"), DeclKind::Def));
        env.add_alias(Name::from("x"), Name::from("foo.x"));
        assert!(env.contains(&Name::from("x")));
        assert_eq!(env.get(&Name::from("x")).unwrap().name, Name::from("foo.x"));
        assert_eq!(env.dealias(&Name::from("x")), Name::from("foo.x"));
        assert_eq!(env.dealias(&Name::from("y")), Name::from("y"));
    }
}
