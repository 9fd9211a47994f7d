//! Display and debug rendering of cells
//!
//! | cell   | display       | debug          |
//! |--------|---------------|----------------|
//! | Null   | `null`        | `null`         |
//! | Float  | `3`, `-1.5`   | same           |
//! | Char   | raw byte      | `a/97`         |
//! | String | raw bytes     | `"abc"`        |
//! | Pair   | `( h . t )`   | same, nested debug |
//! | Array  | `[ a b ]`     | same, nested debug |
//!
//! Output is bytes, not `str`: strings and chars are arbitrary bytes.

use crate::heap::Heap;
use crate::value::{Cell, Object};

/// Rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// What `put` prints
    Display,
    /// What the stack trace prints
    Debug,
}

/// Append the rendering of `cell` to `out`
pub fn render_into(heap: &Heap, cell: Cell, style: Style, out: &mut Vec<u8>) {
    match cell {
        Cell::Null => out.extend_from_slice(b"null"),
        Cell::Float(f) => out.extend_from_slice(f.to_string().as_bytes()),
        Cell::Char(c) => match style {
            Style::Display => out.push(c),
            Style::Debug => {
                out.push(c);
                out.extend_from_slice(format!("/{}", c).as_bytes());
            }
        },
        Cell::Object(r) => match heap.get(r) {
            Object::String(bytes) => match style {
                Style::Display => out.extend_from_slice(bytes),
                Style::Debug => {
                    out.push(b'"');
                    out.extend_from_slice(bytes);
                    out.push(b'"');
                }
            },
            Object::Pair { head, tail } => {
                // Walk the tail chain in a loop so long lists stay flat on the
                // native stack; only heads recurse.
                out.extend_from_slice(b"( ");
                render_into(heap, *head, style, out);
                out.extend_from_slice(b" . ");
                let mut open = 1;
                let mut rest = *tail;
                while let Some((h, t)) = heap.pair_fields(rest) {
                    out.extend_from_slice(b"( ");
                    render_into(heap, h, style, out);
                    out.extend_from_slice(b" . ");
                    open += 1;
                    rest = t;
                }
                render_into(heap, rest, style, out);
                for _ in 0..open {
                    out.extend_from_slice(b" )");
                }
            }
            Object::Array(cells) => {
                out.extend_from_slice(b"[ ");
                for c in cells {
                    render_into(heap, *c, style, out);
                    out.push(b' ');
                }
                out.push(b']');
            }
        },
    }
}

/// Render `cell` into a fresh buffer
pub fn render(heap: &Heap, cell: Cell, style: Style) -> Vec<u8> {
    let mut out = Vec::new();
    render_into(heap, cell, style, &mut out);
    out
}

/// Render `cell` lossily as a `String` (for messages and tests)
pub fn render_string(heap: &Heap, cell: Cell, style: Style) -> String {
    String::from_utf8_lossy(&render(heap, cell, style)).into_owned()
}
