//! Cells and heap objects
//!
//! A `Cell` is what lives on the operand stack and inside containers. It is
//! `Copy` on purpose: copying the bits never touches a refcount, exactly like
//! copying the tagged union in generated code. Ownership is tracked by the
//! heap (see `heap.rs`), not by the Rust type system, so every copy of an
//! `Object` cell that is meant to outlive its source must be retained.

use std::fmt;

/// Handle to a heap object: arena slot index plus the slot's generation.
///
/// The generation is bumped whenever the slot is freed, so a handle that
/// outlived its object never resolves to the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ObjRef {
    /// Arena slot index (stable for the object's lifetime)
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Cell: the fixed-size tagged value the language talks about
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Cell {
    /// Empty value; terminates lists and marks `stoa` sentinels
    #[default]
    Null,

    /// IEEE 754 double
    Float(f64),

    /// Single byte character; also the boolean encoding (0 / 1)
    Char(u8),

    /// Reference to a heap object (string, pair or array)
    Object(ObjRef),
}

impl Cell {
    /// Boolean encoding used by comparison and logic words
    pub fn from_bool(b: bool) -> Self {
        Cell::Char(b as u8)
    }

    /// The referenced object, if any
    pub fn as_object(&self) -> Option<ObjRef> {
        match self {
            Cell::Object(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Abstract type of a cell: the object type for references, else the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Float,
    Char,
    String,
    Pair,
    Array,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Float => "float",
            Kind::Char => "char",
            Kind::String => "string",
            Kind::Pair => "pair",
            Kind::Array => "array",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Heap object payload
///
/// Every `Cell` stored in a `Pair` or `Array` is an owned reference: the
/// object releases it when it dies.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Mutable byte buffer with an explicit length
    String(Vec<u8>),

    /// Cons cell; a chain of pairs ending in `Null` is a list
    Pair { head: Cell, tail: Cell },

    /// Fixed-length sequence of cells
    Array(Vec<Cell>),
}

impl Object {
    pub fn kind(&self) -> Kind {
        match self {
            Object::String(_) => Kind::String,
            Object::Pair { .. } => Kind::Pair,
            Object::Array(_) => Kind::Array,
        }
    }

    /// Move the cells owned by this object into `out`, consuming it
    pub fn drain_children_into(self, out: &mut Vec<Cell>) {
        match self {
            Object::String(_) => {}
            Object::Pair { head, tail } => {
                out.push(head);
                out.push(tail);
            }
            Object::Array(cells) => out.extend(cells),
        }
    }
}
