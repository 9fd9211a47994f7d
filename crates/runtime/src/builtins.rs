//! The built-in word table
//!
//! Maps every built-in to its source spelling and dispatches it on a `Vm`.
//! The compiler resolves a word with `Builtin::from_word` and emits a call to
//! the matching `kk_builtin_*` export.

use crate::vm::Vm;
use kk_core::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Abs,
    // Comparison
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    // Boolean
    And,
    Or,
    Not,
    // Shuffling
    Dup,
    Drop,
    Swap,
    Rot,
    Tuck,
    Over,
    Nip,
    // Pairs
    Cons,
    Car,
    Cdr,
    Uncons,
    // Containers
    Mka,
    Get,
    Set,
    Len,
    Stoa,
    Atos,
    // Conversion
    Num,
    Char,
    // I/O
    Put,
    Read,
    Trace,
}

impl Builtin {
    pub const ALL: [Builtin; 37] = [
        Builtin::Add,
        Builtin::Subtract,
        Builtin::Multiply,
        Builtin::Divide,
        Builtin::Modulo,
        Builtin::Abs,
        Builtin::Less,
        Builtin::Greater,
        Builtin::LessEqual,
        Builtin::GreaterEqual,
        Builtin::Equal,
        Builtin::NotEqual,
        Builtin::And,
        Builtin::Or,
        Builtin::Not,
        Builtin::Dup,
        Builtin::Drop,
        Builtin::Swap,
        Builtin::Rot,
        Builtin::Tuck,
        Builtin::Over,
        Builtin::Nip,
        Builtin::Cons,
        Builtin::Car,
        Builtin::Cdr,
        Builtin::Uncons,
        Builtin::Mka,
        Builtin::Get,
        Builtin::Set,
        Builtin::Len,
        Builtin::Stoa,
        Builtin::Atos,
        Builtin::Num,
        Builtin::Char,
        Builtin::Put,
        Builtin::Read,
        Builtin::Trace,
    ];

    /// Spelling in source programs
    pub fn word(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Subtract => "-",
            Builtin::Multiply => "*",
            Builtin::Divide => "/",
            Builtin::Modulo => "%",
            Builtin::Abs => "abs",
            Builtin::Less => "<",
            Builtin::Greater => ">",
            Builtin::LessEqual => "<=",
            Builtin::GreaterEqual => ">=",
            Builtin::Equal => "=",
            Builtin::NotEqual => "!=",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Not => "not",
            Builtin::Dup => "dup",
            Builtin::Drop => "drop",
            Builtin::Swap => "swap",
            Builtin::Rot => "rot",
            Builtin::Tuck => "tuck",
            Builtin::Over => "over",
            Builtin::Nip => "nip",
            Builtin::Cons => "cons",
            Builtin::Car => "car",
            Builtin::Cdr => "cdr",
            Builtin::Uncons => "uncons",
            Builtin::Mka => "mka",
            Builtin::Get => "get",
            Builtin::Set => "set",
            Builtin::Len => "len",
            Builtin::Stoa => "stoa",
            Builtin::Atos => "atos",
            Builtin::Num => "num",
            Builtin::Char => "char",
            Builtin::Put => "put",
            Builtin::Read => "read",
            Builtin::Trace => "s>",
        }
    }

    pub fn from_word(word: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|b| b.word() == word)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

impl Vm {
    /// Run one built-in word
    pub fn call(&mut self, builtin: Builtin) -> Result<()> {
        match builtin {
            Builtin::Add => self.add(),
            Builtin::Subtract => self.subtract(),
            Builtin::Multiply => self.multiply(),
            Builtin::Divide => self.divide(),
            Builtin::Modulo => self.modulo(),
            Builtin::Abs => self.abs(),
            Builtin::Less => self.less(),
            Builtin::Greater => self.greater(),
            Builtin::LessEqual => self.less_equal(),
            Builtin::GreaterEqual => self.greater_equal(),
            Builtin::Equal => self.equal(),
            Builtin::NotEqual => self.not_equal(),
            Builtin::And => self.and(),
            Builtin::Or => self.or(),
            Builtin::Not => self.not(),
            Builtin::Dup => self.dup(),
            Builtin::Drop => self.drop_top(),
            Builtin::Swap => self.swap(),
            Builtin::Rot => self.rot(),
            Builtin::Tuck => self.tuck(),
            Builtin::Over => self.over(),
            Builtin::Nip => self.nip(),
            Builtin::Cons => self.cons(),
            Builtin::Car => self.car(),
            Builtin::Cdr => self.cdr(),
            Builtin::Uncons => self.uncons(),
            Builtin::Mka => self.mka(),
            Builtin::Get => self.get(),
            Builtin::Set => self.set(),
            Builtin::Len => self.len(),
            Builtin::Stoa => self.stoa(),
            Builtin::Atos => self.atos(),
            Builtin::Num => self.num(),
            Builtin::Char => self.to_char(),
            Builtin::Put => self.put(),
            Builtin::Read => self.read(),
            Builtin::Trace => self.trace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kk_core::Cell;
    use std::collections::HashSet;

    #[test]
    fn test_words_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_word(builtin.word()), Some(builtin));
        }
        assert_eq!(Builtin::from_word("s>"), Some(Builtin::Trace));
        assert_eq!(Builtin::from_word("frobnicate"), None);
    }

    #[test]
    fn test_words_are_unique() {
        let words: HashSet<&str> = Builtin::ALL.iter().map(|b| b.word()).collect();
        assert_eq!(words.len(), Builtin::ALL.len());
    }

    #[test]
    fn test_call_dispatches() {
        let mut vm = Vm::new();
        vm.push_float(3.0);
        vm.push_float(4.0);
        vm.call(Builtin::from_word("-").unwrap()).unwrap();
        assert_eq!(vm.pop().unwrap(), Cell::Float(-1.0));
    }
}
