//! The operator table.
//!
//! Operator precedence and associativity are data, not code: the table is
//! built once (in `main` or at the top of a pipeline) and threaded through
//! the precedence resolver and the type checker. There is no global mutable
//! registry.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Where an operator sits relative to its operand(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Fixity {
    Prefix,
    Postfix,
    Infix,
}

/// How same-precedence chains group.
///
/// `None` operators take no side themselves; in a chain they defer to their
/// neighbour, and two adjacent operators declared `Left` and `Right` at the
/// same precedence are a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Assoc {
    Left,
    Right,
    None,
}

/// A single operator entry: symbol, fixity, precedence level and
/// associativity. Higher precedence binds tighter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorDef {
    pub symbol: String,
    pub fixity: Fixity,
    pub precedence: u8,
    pub assoc: Assoc,
}

impl OperatorDef {
    pub fn new(symbol: impl Into<String>, fixity: Fixity, precedence: u8, assoc: Assoc) -> Self {
        Self {
            symbol: symbol.into(),
            fixity,
            precedence,
            assoc,
        }
    }
}

/// Error returned when registering an operator fails.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterError {
    /// An operator with the same symbol and fixity already exists.
    Duplicate { symbol: String, fixity: Fixity },
    /// Precedence levels run 0 through 9.
    PrecedenceOutOfRange(u8),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { symbol, fixity } => {
                write!(f, "operator `{symbol}` ({fixity:?}) is already registered")
            }
            Self::PrecedenceOutOfRange(p) => {
                write!(f, "operator precedence {p} is out of range (0-9)")
            }
        }
    }
}

impl std::error::Error for RegisterError {}

/// Highest precedence level. Levels 8 and 9 carry no built-in operators and
/// are intended for user-defined registration.
pub const MAX_PRECEDENCE: u8 = 9;

/// The operator table: built-in operators plus user registrations, keyed by
/// (symbol, fixity).
#[derive(Debug, Clone)]
pub struct OperatorTable {
    ops: FxHashMap<(String, Fixity), OperatorDef>,
}

impl OperatorTable {
    /// An empty table with no operators at all. Mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            ops: FxHashMap::default(),
        }
    }

    /// Register an operator. Symbol + fixity must be unique.
    pub fn register(&mut self, def: OperatorDef) -> Result<(), RegisterError> {
        if def.precedence > MAX_PRECEDENCE {
            return Err(RegisterError::PrecedenceOutOfRange(def.precedence));
        }
        let key = (def.symbol.clone(), def.fixity);
        if self.ops.contains_key(&key) {
            return Err(RegisterError::Duplicate {
                symbol: def.symbol,
                fixity: def.fixity,
            });
        }
        self.ops.insert(key, def);
        Ok(())
    }

    /// Look up an infix operator by symbol.
    pub fn infix(&self, symbol: &str) -> Option<&OperatorDef> {
        self.ops.get(&(symbol.to_owned(), Fixity::Infix))
    }

    /// Look up a prefix operator by symbol.
    pub fn prefix(&self, symbol: &str) -> Option<&OperatorDef> {
        self.ops.get(&(symbol.to_owned(), Fixity::Prefix))
    }

    /// Look up a postfix operator by symbol.
    pub fn postfix(&self, symbol: &str) -> Option<&OperatorDef> {
        self.ops.get(&(symbol.to_owned(), Fixity::Postfix))
    }

    /// Whether any postfix operator is registered (built-ins define none, so
    /// the expression parser only tries postfix suffixes when this is true).
    pub fn has_postfix(&self) -> bool {
        self.ops.keys().any(|(_, f)| *f == Fixity::Postfix)
    }
}

impl Default for OperatorTable {
    /// The built-in table.
    ///
    /// | Level | Assoc | Operators                                           |
    /// |------:|-------|-----------------------------------------------------|
    /// | 0     | left  | `=` `+=` `-=` `*=` `/=` `%=` `&=` `\|=` `^=` `&&=` `\|\|=` |
    /// | 1     | right | `$`                                                 |
    /// | 2     | right | `\|\|`                                              |
    /// | 3     | right | `&&`                                                |
    /// | 4     | none  | `==` `!=` `<` `>` `<=` `>=`                         |
    /// | 5     | left  | `+` `-`                                             |
    /// | 6     | left  | `*` `/` `%`                                         |
    /// | 7     | left  | `&` `\|` `^`                                        |
    ///
    /// Prefix: `-` `+` `!` `~`.
    fn default() -> Self {
        let mut table = Self::empty();
        let mut add = |symbol: &str, fixity: Fixity, precedence: u8, assoc: Assoc| {
            table
                .register(OperatorDef::new(symbol, fixity, precedence, assoc))
                .expect("built-in operator table must be register-clean");
        };

        for symbol in [
            "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "&&=", "||=",
        ] {
            add(symbol, Fixity::Infix, 0, Assoc::Left);
        }
        add("$", Fixity::Infix, 1, Assoc::Right);
        add("||", Fixity::Infix, 2, Assoc::Right);
        add("&&", Fixity::Infix, 3, Assoc::Right);
        for symbol in ["==", "!=", "<", ">", "<=", ">="] {
            add(symbol, Fixity::Infix, 4, Assoc::None);
        }
        for symbol in ["+", "-"] {
            add(symbol, Fixity::Infix, 5, Assoc::Left);
        }
        for symbol in ["*", "/", "%"] {
            add(symbol, Fixity::Infix, 6, Assoc::Left);
        }
        for symbol in ["&", "|", "^"] {
            add(symbol, Fixity::Infix, 7, Assoc::Left);
        }
        for symbol in ["-", "+", "!", "~"] {
            add(symbol, Fixity::Prefix, MAX_PRECEDENCE, Assoc::Right);
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_levels() {
        let table = OperatorTable::default();
        assert_eq!(table.infix("=").unwrap().precedence, 0);
        assert_eq!(table.infix("$").unwrap().assoc, Assoc::Right);
        assert_eq!(table.infix("&&").unwrap().precedence, 3);
        assert_eq!(table.infix("==").unwrap().assoc, Assoc::None);
        assert_eq!(table.infix("+").unwrap().precedence, 5);
        assert_eq!(table.infix("*").unwrap().precedence, 6);
        assert_eq!(table.infix("^").unwrap().precedence, 7);
        assert!(table.prefix("-").is_some());
        assert!(table.prefix("~").is_some());
        assert!(table.postfix("-").is_none());
        assert!(!table.has_postfix());
    }

    #[test]
    fn same_symbol_different_fixity_coexists() {
        let table = OperatorTable::default();
        assert!(table.infix("-").is_some());
        assert!(table.prefix("-").is_some());
    }

    #[test]
    fn register_user_operator() {
        let mut table = OperatorTable::default();
        table
            .register(OperatorDef::new("<?>", Fixity::Infix, 8, Assoc::Left))
            .unwrap();
        assert_eq!(table.infix("<?>").unwrap().precedence, 8);
        assert!(!table.has_postfix());
        table
            .register(OperatorDef::new("??", Fixity::Postfix, 9, Assoc::None))
            .unwrap();
        assert!(table.has_postfix());
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut table = OperatorTable::default();
        let err = table
            .register(OperatorDef::new("+", Fixity::Infix, 8, Assoc::Left))
            .unwrap_err();
        assert!(matches!(err, RegisterError::Duplicate { .. }));
    }

    #[test]
    fn register_rejects_out_of_range_precedence() {
        let mut table = OperatorTable::empty();
        let err = table
            .register(OperatorDef::new("@", Fixity::Infix, 10, Assoc::Left))
            .unwrap_err();
        assert_eq!(err, RegisterError::PrecedenceOutOfRange(10));
    }
}
