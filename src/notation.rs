use once_cell::sync::Lazy;

use crate::diag::ElabError;
use crate::name::Name;
use crate::rbmap::Map;
use crate::source::Span;
use crate::state::Elab;
use crate::syntax::Syntax;

/// The precedence assigned to a notation symbol whose declaration left it
/// unspecified: literal (atomic) forms bind maximally.
pub const MAX_PREC: u32 = 1024;

/// One element of a `notation` specification, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum NotationItem {
    Symbol { text: String, prec: Option<u32> },
    /// a subterm argument parsed at the given right binding power
    Arg { prec: u32 },
    Binder,
    Binders,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotationSpec {
    pub items: Vec<NotationItem>,
}

impl NotationSpec {
    pub fn leading_symbol(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            NotationItem::Symbol { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn num_args(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !matches!(item, NotationItem::Symbol { .. }))
            .count()
    }
}

/// An entry of the shared token table fed back to the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEntry {
    pub text: String,
    pub prec: u32,
    /// true for tokens introduced by `reserve notation`
    pub reserved: bool,
}

/// A registered notation: the grammar shape plus the rewrite target. A
/// reserved notation has no right-hand side yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NotationEntry {
    pub kind: Name,
    pub spec: NotationSpec,
    pub rhs: Option<Syntax>,
}

impl NotationEntry {
    pub fn is_reserved(&self) -> bool {
        self.rhs.is_none()
    }
}

/// The evolving grammar configuration. The elaborator merges every
/// registered notation into this and hands it back to the parser before the
/// next command is parsed; this is the only state that flows out of the
/// elaborator.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub tokens: Map<String, TokenEntry>,
    /// notation kind → registered entry, what `to_pexpr` dispatches on
    pub notations: Map<Name, NotationEntry>,
    /// leading token text → notation kind, what the parser dispatches on
    pub leading: Map<String, Name>,
}

static BUILTIN_TOKENS: Lazy<Map<String, TokenEntry>> = Lazy::new(|| {
    let builtin = [
        "(", ")", "{", "}", "⟨", "⟩", "[", "]", ",", ":", ":=", "=>", "|", "_", "λ", "fun", "Π",
        "→", "Sort", "Prop", "Type", ".{",
    ];
    builtin
        .iter()
        .map(|&text| {
            (
                text.to_owned(),
                TokenEntry {
                    text: text.to_owned(),
                    prec: MAX_PREC,
                    reserved: false,
                },
            )
        })
        .collect()
});

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            tokens: BUILTIN_TOKENS.clone(),
            notations: Map::new(),
            leading: Map::new(),
        }
    }
}

/// The parsed payload of a `notation` command. `reserve notation` carries
/// the same shape without a right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct NotationCmd {
    pub spec: NotationSpec,
    pub rhs: Option<Syntax>,
    pub span: Option<Span>,
}

pub fn match_precedence(p1: Option<u32>, p2: Option<u32>) -> bool {
    match (p1, p2) {
        (Some(p1), Some(p2)) => p1 == p2,
        _ => true,
    }
}

/// Structural agreement of two specifications: same shape, same symbols,
/// and no contradicting explicit precedences.
pub fn match_spec(s1: &NotationSpec, s2: &NotationSpec) -> bool {
    if s1.items.len() != s2.items.len() {
        return false;
    }
    for (i1, i2) in s1.items.iter().zip(&s2.items) {
        let ok = match (i1, i2) {
            (
                NotationItem::Symbol { text: t1, prec: p1 },
                NotationItem::Symbol { text: t2, prec: p2 },
            ) => t1 == t2 && match_precedence(*p1, *p2),
            (NotationItem::Arg { prec: p1 }, NotationItem::Arg { prec: p2 }) => p1 == p2,
            (NotationItem::Binder, NotationItem::Binder) => true,
            (NotationItem::Binders, NotationItem::Binders) => true,
            _ => false,
        };
        if !ok {
            return false;
        }
    }
    true
}

/// Registers a `notation` command: mints a fresh kind, merges the tokens
/// and the combinator entry into the parser configuration, and records the
/// transformer under the new kind. Returns the minted kind.
pub fn register_notation(elab: &mut Elab, cmd: &NotationCmd) -> Result<Name, ElabError> {
    register(elab, cmd, false)
}

/// `reserve notation`: same token and precedence registration, but no
/// transformer; a later `notation` with a matching spec takes the slot.
pub fn reserve_notation(elab: &mut Elab, cmd: &NotationCmd) -> Result<Name, ElabError> {
    register(elab, cmd, true)
}

fn register(elab: &mut Elab, cmd: &NotationCmd, reserve: bool) -> Result<Name, ElabError> {
    let mut spec = cmd.spec.clone();

    if let Some(leading) = spec.leading_symbol() {
        let leading = leading.to_owned();
        let prior = elab.state.parser_cfg.tokens.find(&leading).cloned();
        if let Some(prior) = prior {
            if prior.reserved && !reserve {
                // a reserved slot exists; reuse it if the shapes agree
                let reserved_entry = elab
                    .state
                    .parser_cfg
                    .leading
                    .find(&leading)
                    .and_then(|kind| elab.state.parser_cfg.notations.find(kind))
                    .filter(|entry| entry.is_reserved())
                    .cloned();
                match reserved_entry {
                    Some(entry)
                        if match_spec(&entry.spec, &spec)
                            && match_precedence(
                                Some(prior.prec),
                                leading_prec(&spec),
                            ) =>
                    {
                        // inherit the precedences fixed at reservation time
                        spec = entry.spec;
                    }
                    _ => {
                        return Err(ElabError::AmbiguousNotation {
                            token: leading,
                            span: cmd.span.clone(),
                        });
                    }
                }
            } else if reserve {
                // reserving an already-taken token is always a conflict
                return Err(ElabError::AmbiguousNotation {
                    token: leading,
                    span: cmd.span.clone(),
                });
            }
            // a non-reserved duplicate is a deliberate override: the map
            // insert below overwrites the old entry
        }
    }

    let kind = Name::anon().str("_notation").num(elab.fresh_idx());

    let mut cfg = elab.state.parser_cfg.clone();
    for item in &spec.items {
        if let NotationItem::Symbol { text, prec } = item {
            cfg.tokens = cfg.tokens.insert(
                text.clone(),
                TokenEntry {
                    text: text.clone(),
                    prec: prec.unwrap_or(MAX_PREC),
                    reserved: reserve,
                },
            );
        }
    }
    let entry = NotationEntry {
        kind: kind.clone(),
        spec,
        rhs: if reserve { None } else { cmd.rhs.clone() },
    };
    if let Some(leading) = entry.spec.leading_symbol() {
        cfg.leading = cfg.leading.insert(leading.to_owned(), kind.clone());
    }
    cfg.notations = cfg.notations.insert(kind.clone(), entry.clone());
    elab.state.parser_cfg = cfg;

    elab.modify_current_scope(|mut scope| {
        scope.notations = scope.notations.insert(entry.kind.clone(), entry);
        ((), scope)
    })?;

    Ok(kind)
}

/// Removes a closed scope's notations from the parser configuration:
/// their combinator entries and leading-token dispatch are dropped, and
/// the token table is rebuilt from the builtins plus what the surviving
/// notations declare.
pub fn retract(cfg: &ParserConfig, retracted: &Map<Name, NotationEntry>) -> ParserConfig {
    let notations: Map<Name, NotationEntry> = cfg
        .notations
        .iter()
        .filter(|&(kind, _)| !retracted.contains(kind))
        .map(|(kind, entry)| (kind.clone(), entry.clone()))
        .collect();
    let leading: Map<String, Name> = cfg
        .leading
        .iter()
        .filter(|&(_, kind)| !retracted.contains(kind))
        .map(|(text, kind)| (text.clone(), kind.clone()))
        .collect();
    let mut tokens = BUILTIN_TOKENS.clone();
    for (_, entry) in notations.iter() {
        for item in &entry.spec.items {
            if let NotationItem::Symbol { text, prec } = item {
                tokens = tokens.insert(
                    text.clone(),
                    TokenEntry {
                        text: text.clone(),
                        prec: prec.unwrap_or(MAX_PREC),
                        reserved: entry.is_reserved(),
                    },
                );
            }
        }
    }
    ParserConfig {
        tokens,
        notations,
        leading,
    }
}

fn leading_prec(spec: &NotationSpec) -> Option<u32> {
    spec.items.iter().find_map(|item| match item {
        NotationItem::Symbol { prec, .. } => *prec,
        _ => None,
    })
}

/// The number of argument slots a kind expects; used by the translator to
/// sanity-check notation nodes coming back from the parser.
pub fn arity_of(entry: &NotationEntry) -> usize {
    entry.spec.num_args()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::mk_ident;

    fn infix_spec(sym: &str, prec: Option<u32>) -> NotationSpec {
        NotationSpec {
            items: vec![
                NotationItem::Arg {
                    prec: prec.unwrap_or(MAX_PREC),
                },
                NotationItem::Symbol {
                    text: sym.to_owned(),
                    prec,
                },
                NotationItem::Arg {
                    prec: prec.unwrap_or(MAX_PREC),
                },
            ],
        }
    }

    #[test]
    fn leading_symbol_skips_args() {
        let spec = infix_spec("⊕", Some(65));
        assert_eq!(spec.leading_symbol(), Some("⊕"));
        assert_eq!(spec.num_args(), 2);
    }

    #[test]
    fn spec_matching() {
        assert!(match_spec(&infix_spec("⊕", Some(65)), &infix_spec("⊕", Some(65))));
        // an unspecified precedence matches any reserved one
        assert!(match_spec(&infix_spec("⊕", None), &infix_spec("⊕", None)));
        assert!(!match_spec(&infix_spec("⊕", Some(65)), &infix_spec("⊕", Some(66))));
        assert!(!match_spec(&infix_spec("⊕", Some(65)), &infix_spec("⊗", Some(65))));
    }

    #[test]
    fn builtin_tokens_present() {
        let cfg = ParserConfig::default();
        assert!(cfg.tokens.contains(&"(".to_owned()));
        assert!(cfg.tokens.contains(&"λ".to_owned()));
        assert!(!cfg.tokens.contains(&"⊕".to_owned()));
    }

    #[test]
    fn retract_removes_only_the_given_kinds() {
        let e1 = NotationEntry {
            kind: Name::from("_notation.0"),
            spec: infix_spec("⊕", Some(65)),
            rhs: Some(mk_ident("myOr")),
        };
        let e2 = NotationEntry {
            kind: Name::from("_notation.1"),
            spec: infix_spec("⊗", Some(70)),
            rhs: Some(mk_ident("myAnd")),
        };
        let mut cfg = ParserConfig::default();
        for entry in [&e1, &e2] {
            for item in &entry.spec.items {
                if let NotationItem::Symbol { text, prec } = item {
                    cfg.tokens = cfg.tokens.insert(
                        text.clone(),
                        TokenEntry {
                            text: text.clone(),
                            prec: prec.unwrap_or(MAX_PREC),
                            reserved: false,
                        },
                    );
                }
            }
            cfg.leading = cfg
                .leading
                .insert(entry.spec.leading_symbol().unwrap().to_owned(), entry.kind.clone());
            cfg.notations = cfg.notations.insert(entry.kind.clone(), entry.clone());
        }

        let closed = Map::new().insert(e1.kind.clone(), e1);
        let cfg = retract(&cfg, &closed);
        assert!(cfg.notations.find(&Name::from("_notation.0")).is_none());
        assert!(cfg.notations.contains(&Name::from("_notation.1")));
        assert!(!cfg.tokens.contains(&"⊕".to_owned()));
        assert!(cfg.tokens.contains(&"⊗".to_owned()));
        assert!(cfg.leading.find(&"⊕".to_owned()).is_none());
        // builtins survive the rebuild
        assert!(cfg.tokens.contains(&"(".to_owned()));
    }

    #[test]
    fn notation_cmd_shape() {
        let cmd = NotationCmd {
            spec: infix_spec("⊕", Some(65)),
            rhs: Some(mk_ident("myOr")),
            span: None,
        };
        assert_eq!(cmd.spec.leading_symbol(), Some("⊕"));
    }
}
