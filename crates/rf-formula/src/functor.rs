//! Functor extraction: one lexical walk over the rewritten formula text.
//!
//! Produces the ordered list of functors (bare names, bracketed parameters,
//! calls with argument counts) the resolver will bind, and rewrites the text
//! so every resolved token site is wrapped in `{…}` for later in-place
//! substitution. Call arguments are extracted recursively so inner calls are
//! registered too.

use crate::preprocess::is_name_char;

/// A parsed token awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Functor {
    /// Symbol or call name (may be `::`-qualified, or a parameter literal).
    pub name: String,
    /// Rewritten argument text for calls, empty for plain symbols.
    pub body: String,
    /// Argument count; 0 means a plain symbol.
    pub nargs: usize,
    /// Set by the resolver once the functor is bound.
    pub found: bool,
}

impl Functor {
    /// A plain symbol (variable, parameter, constant or nested formula).
    pub fn symbol(name: &str) -> Self {
        Functor { name: name.to_string(), body: String::new(), nargs: 0, found: false }
    }

    /// A call with `nargs` comma-separated arguments.
    pub fn call(name: &str, body: &str, nargs: usize) -> Self {
        Functor { name: name.to_string(), body: body.to_string(), nargs, found: false }
    }

    /// True for call functors (`nargs > 0`).
    pub fn is_call(&self) -> bool {
        self.nargs > 0
    }
}

/// Walk `text` once, pushing functors and parameter literals (in encounter
/// order) and returning the rewritten text with `{…}` wrapping.
///
/// - `[lit]` emits a parameter functor named `lit` and rewrites to `{[lit]}`.
/// - a name run followed by `(` emits a call functor; its argument text is
///   extracted recursively and spliced back.
/// - a bare name run rewrites to `{name}`.
/// - operators, brackets and commas separate functors and pass through.
pub fn extract_functors(text: &str, funcs: &mut Vec<Functor>, params: &mut Vec<String>) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];

        if c == b'[' {
            let close = text[i..].find(']').map(|p| i + p).unwrap_or(bytes.len());
            let literal = &text[i + 1..close.min(bytes.len())];
            params.push(literal.to_string());
            funcs.push(Functor::symbol(literal));
            out.push_str("{[");
            out.push_str(literal);
            out.push_str("]}");
            i = (close + 1).min(bytes.len());
            continue;
        }

        if c.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && is_name_char(bytes[i]) {
                i += 1;
            }
            let name = &text[start..i];

            if i < bytes.len() && bytes[i] == b'(' {
                // Scan the balanced argument list, counting top-level commas.
                let body_start = i + 1;
                let mut depth = 1usize;
                let mut nargs = 1usize;
                let mut j = body_start;
                while j < bytes.len() && depth != 0 {
                    match bytes[j] {
                        b'(' => depth += 1,
                        b')' => depth -= 1,
                        b',' if depth == 1 => nargs += 1,
                        _ => {}
                    }
                    if depth != 0 {
                        j += 1;
                    }
                }
                let body = &text[body_start..j];
                if body.is_empty() {
                    funcs.push(Functor::call(name, "", 0));
                    out.push_str(name);
                    out.push_str("()");
                } else {
                    let rewritten = extract_functors(body, funcs, params);
                    funcs.push(Functor::call(name, &rewritten, nargs));
                    out.push_str(name);
                    out.push('(');
                    out.push_str(&rewritten);
                    out.push(')');
                }
                i = (j + 1).min(bytes.len());
            } else {
                funcs.push(Functor::symbol(name));
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            continue;
        }

        out.push(c as char);
        i += 1;
    }

    out
}

/// Deduplicate by (name, body, nargs), keeping first-occurrence order, and
/// clear all found flags.
pub fn dedup_functors(funcs: &mut Vec<Functor>) {
    let mut seen: Vec<(String, String, usize)> = Vec::new();
    funcs.retain(|f| {
        let key = (f.name.clone(), f.body.clone(), f.nargs);
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
    for f in funcs.iter_mut() {
        f.found = false;
    }
}
