use std::cmp::Ordering;
use std::fmt::Display;
use std::sync::Arc;

/// A hierarchical identifier, stored as a snoc list of components.
///
/// `Name` is cheap to clone and extend: `foo.bar.baz` shares its `foo.bar`
/// prefix with every other name built from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name(Arc<NameNode>);

#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
enum NameNode {
    #[default]
    Anon,
    Str(Name, String),
    Num(Name, u64),
}

impl Name {
    pub fn anon() -> Name {
        Name::default()
    }

    pub fn str(&self, s: impl Into<String>) -> Name {
        Name(Arc::new(NameNode::Str(self.clone(), s.into())))
    }

    pub fn num(&self, n: u64) -> Name {
        Name(Arc::new(NameNode::Num(self.clone(), n)))
    }

    pub fn is_anon(&self) -> bool {
        matches!(*self.0, NameNode::Anon)
    }

    pub fn parent(&self) -> Option<&Name> {
        match &*self.0 {
            NameNode::Anon => None,
            NameNode::Str(p, _) => Some(p),
            NameNode::Num(p, _) => Some(p),
        }
    }

    /// The last component, if it is a string one.
    pub fn last_str(&self) -> Option<&str> {
        match &*self.0 {
            NameNode::Str(_, s) => Some(s),
            _ => None,
        }
    }

    /// A single-component string name.
    pub fn is_atomic(&self) -> bool {
        self.parent().is_some_and(Name::is_anon)
    }

    pub fn num_components(&self) -> usize {
        match self.parent() {
            None => 0,
            Some(p) => p.num_components() + 1,
        }
    }

    /// Appends all components of `other` after the components of `self`.
    pub fn append(&self, other: &Name) -> Name {
        match &*other.0 {
            NameNode::Anon => self.clone(),
            NameNode::Str(p, s) => self.append(p).str(s.clone()),
            NameNode::Num(p, n) => self.append(p).num(*n),
        }
    }

    /// Does `pre` coincide with the leading components of `self`?
    pub fn starts_with(&self, pre: &Name) -> bool {
        if self == pre {
            return true;
        }
        match self.parent() {
            None => false,
            Some(p) => p.starts_with(pre),
        }
    }
}

impl From<&str> for Name {
    /// Splits on `.`; all-digit components become numeric ones.
    fn from(value: &str) -> Self {
        let mut name = Name::anon();
        if value.is_empty() {
            return name;
        }
        for part in value.split('.') {
            match part.parse::<u64>() {
                Ok(n) => name = name.num(n),
                Err(_) => name = name.str(part),
            }
        }
        name
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        // Shared suffixes are common, so short-circuit on pointer equality
        // before falling back to the structural order.
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.0.cmp(&other.0)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.0 {
            NameNode::Anon => write!(f, "[anon]"),
            NameNode::Str(p, s) => {
                if !p.is_anon() {
                    write!(f, "{}.", p)?;
                }
                write!(f, "{}", s)
            }
            NameNode::Num(p, n) => {
                if !p.is_anon() {
                    write!(f, "{}.", p)?;
                }
                write!(f, "{}", n)
            }
        }
    }
}
