//! Macro rewriter: textual expansion of formula shorthands.
//!
//! Runs fixed substitution passes over the raw input, in this order:
//! normalize (`**` → `^`, strip spaces), polynomial families (`polN`),
//! parametrized families (`gaus`/`landau`/`expo`, 1-D and 2-D, optional
//! normalized variant, variable list and parameter offset), right-associative
//! exponentiation (`^` → `pow(,)`), and `++` linear composition. Each pass is
//! idempotent once complete: preprocessing an already-expanded string is a
//! no-op.

/// Result of the rewrite passes.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Fully rewritten formula text.
    pub text: String,
    /// Classification code: 300+N for `polN`, 100 gaus, 200 landau, 400 expo.
    pub number: i32,
    /// Set by `polN` and `++` (the formula is a linear combination).
    pub linear: bool,
    /// Set when a normalized family variant (`gausn`, …) was expanded.
    pub normalized: bool,
    /// `(left, right)` raw sub-expressions captured per `++` marker.
    pub linear_parts: Vec<(String, String)>,
}

/// Characters that terminate an operand or a name.
pub(crate) fn is_operator(c: u8) -> bool {
    matches!(c, b'+' | b'^' | b'-' | b'/' | b'*' | b'<' | b'>' | b'|' | b'&' | b'!' | b'=')
}

pub(crate) fn is_bracket(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'{' | b'}')
}

/// Name characters are everything that is not an operator, round/brace
/// bracket or comma — letters, digits, `_`, `::`, and square brackets (so
/// `x[0]` scans as one name).
pub(crate) fn is_name_char(c: u8) -> bool {
    !is_bracket(c) && !is_operator(c) && c != b','
}

/// Run all rewrite passes over `input`.
pub fn preprocess(input: &str) -> Preprocessed {
    let mut text = input.replace("**", "^");
    text.retain(|c| c != ' ');
    let mut p = Preprocessed {
        text,
        number: 0,
        linear: false,
        normalized: false,
        linear_parts: Vec::new(),
    };
    handle_pol(&mut p.text, &mut p.number, &mut p.linear);
    handle_families(&mut p.text, &mut p.number, &mut p.normalized);
    handle_exponentiation(&mut p.text);
    handle_linear(&mut p.text, &mut p.linear, &mut p.linear_parts);
    p
}

/// Expand `polN`: an optional variable prefix, a decimal degree and an
/// optional `(k)` parameter offset become
/// `[k]+[k+1]*v+[k+2]*v^2+…+[k+N]*v^N`.
fn handle_pol(text: &mut String, number: &mut i32, linear: &mut bool) {
    while let Some(pos) = text.find("pol") {
        *linear = true;
        let bytes = text.as_bytes();

        // Variable prefix: longest run of name characters right before "pol";
        // empty prefix means the default variable x.
        let mut start = pos;
        while start > 0 && is_name_char(bytes[start - 1]) {
            start -= 1;
        }
        let variable = if start == pos { "x".to_string() } else { text[start..pos].to_string() };

        // Degree digits directly after "pol".
        let mut i = pos + 3;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let degree: i32 = text[pos + 3..i].parse().unwrap_or(0);

        // Optional parameter offset "(k)" immediately following the degree.
        let mut counter: i32 = 0;
        let mut end = i;
        if i < bytes.len() && bytes[i] == b'(' {
            if let Some(close) = text[i..].find(')') {
                let inner = &text[i + 1..i + close];
                if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                    counter = inner.parse().unwrap_or(0);
                    end = i + close + 1;
                }
            }
        }
        *number = 300 + degree;

        let mut replacement = format!("[{}]", counter);
        for d in 1..=degree {
            if d == 1 {
                replacement.push_str(&format!("+[{}]*{}", counter + 1, variable));
            } else {
                replacement.push_str(&format!("+[{}]*{}^{}", counter + d, variable, d));
            }
        }
        let pattern = text[start..end].to_string();
        *text = text.replace(&pattern, &replacement);
    }
}

/// Body templates per (family, dimension): `(plain, normalized)`. `{Vi}`
/// marks the i-th listed variable, `[n]` a parameter index before offset.
fn family_body(name: &str, dim: usize) -> Option<(&'static str, &'static str)> {
    let bodies = match (name, dim) {
        ("gaus", 1) => (
            "[0]*exp(-0.5*(({V0}-[1])/[2])^2)",
            "[0]*exp(-0.5*(({V0}-[1])/[2])^2)/(sqrt(2*pi)*[2])",
        ),
        ("gaus", 2) => ("[0]*exp(-0.5*(({V0}-[1])/[2])^2-0.5*(({V1}-[3])/[4])^2)", ""),
        ("landau", 1) => (
            "[0]*TMath::Landau({V0},[1],[2],false)",
            "[0]*TMath::Landau({V0},[1],[2],true)",
        ),
        // The plain 2-D form shares [0] as the amplitude of both factors.
        ("landau", 2) => ("[0]*TMath::Landau({V0},[1],[2],false)*TMath::Landau({V1},[3],[4],false)", ""),
        ("expo", 1) => ("exp([0]+[1]*{V0})", ""),
        ("expo", 2) => ("exp([0]+[1]*{V0})", "exp([0]+[1]*{V0}+[2]*{V1})"),
        _ => return None,
    };
    Some(bodies)
}

/// Expand the parametrized families `gaus`, `landau` and `expo`, with the
/// optional trailing `n` (normalized), `[v0,v1,…]` variable list and `(k)`
/// parameter offset. Legacy spellings `xygaus`/`xylandau`/`xyexpo` are
/// rewritten to the bracketed form first.
fn handle_families(text: &mut String, number: &mut i32, normalized: &mut bool) {
    *text = text.replace("xygaus", "gaus[x,y]");
    *text = text.replace("xylandau", "landau[x,y]");
    *text = text.replace("xyexpo", "expo[x,y]");

    for (fam, fam_number) in [("gaus", 100), ("landau", 200), ("expo", 400)] {
        'family: while let Some(pos) = text.find(fam) {
            let bytes = text.as_bytes();
            let mut i = pos + fam.len();

            let is_norm = i < bytes.len() && bytes[i] == b'n';
            if is_norm {
                i += 1;
            }

            // Optional [v0,v1,...] variable list; absent means 1-D over x.
            let variables: Vec<String>;
            if i < bytes.len() && bytes[i] == b'[' {
                let Some(close) = text[i..].find(']') else { break 'family };
                variables = text[i + 1..i + close]
                    .split(',')
                    .map(|v| v.to_string())
                    .collect();
                i += close + 1;
            } else {
                variables = vec!["x".to_string()];
            }
            let dim = variables.len();

            let Some((plain, norm_body)) = family_body(fam, dim) else {
                log::error!(
                    "PreProcessFormula: {} dimension function {} is not defined as a parametrized function",
                    dim,
                    fam
                );
                break 'family;
            };
            *number = fam_number;
            if is_norm {
                *normalized = true;
            }

            // Optional (k) parameter offset immediately following.
            let mut counter: i32 = 0;
            let mut end = i;
            if i < bytes.len() && bytes[i] == b'(' {
                if let Some(close) = text[i..].find(')') {
                    counter = text[i + 1..i + close].parse().unwrap_or(0);
                    end = i + close + 1;
                }
            }

            let body_src = if is_norm { norm_body } else { plain };
            if is_norm && body_src.is_empty() {
                log::error!(
                    "PreProcessFormula: {} dimension function {} has no normalized form",
                    dim,
                    fam
                );
                break 'family;
            }

            // Substitute {Vi} placeholders and shift [n] parameter indices.
            let mut body = String::with_capacity(body_src.len());
            let src = body_src.as_bytes();
            let mut j = 0;
            while j < src.len() {
                match src[j] {
                    b'{' => {
                        let close = body_src[j..].find('}').unwrap_or(0) + j;
                        let idx: usize = body_src[j + 2..close].parse().unwrap_or(0);
                        body.push_str(&variables[idx]);
                        j = close + 1;
                    }
                    b'[' => {
                        let close = body_src[j..].find(']').unwrap_or(0) + j;
                        let idx: i32 = body_src[j + 1..close].parse().unwrap_or(0);
                        body.push_str(&format!("[{}]", idx + counter));
                        j = close + 1;
                    }
                    c => {
                        body.push(c as char);
                        j += 1;
                    }
                }
            }
            text.replace_range(pos..end, &body);
        }
    }
}

/// Rewrite `L^R` as `pow(L,R)`, rightmost caret first so `a^b^c` associates
/// as `a^(b^c)`. Operands extend over matched parentheses and a run of name
/// characters, ending at the nearest operator, bracket or comma.
fn handle_exponentiation(text: &mut String) {
    while let Some(caret) = text.rfind('^') {
        let bytes = text.as_bytes();

        // Left operand: matched parentheses, then the leading name run
        // (captures a call like sin(x) in one piece).
        let mut start = caret;
        if start > 0 && bytes[start - 1] == b')' {
            let mut depth = 1usize;
            start -= 1;
            while start > 0 && depth != 0 {
                start -= 1;
                match bytes[start] {
                    b')' => depth += 1,
                    b'(' => depth -= 1,
                    _ => {}
                }
            }
        }
        while start > 0 && is_name_char(bytes[start - 1]) {
            start -= 1;
        }
        let left = text[start..caret].to_string();

        // Right operand: name run, then an optional matched group.
        let mut end = caret + 1;
        while end < bytes.len() && is_name_char(bytes[end]) {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'(' {
            let mut depth = 1usize;
            end += 1;
            while end < bytes.len() && depth != 0 {
                match bytes[end] {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => {}
                }
                end += 1;
            }
        }
        let right = text[caret + 1..end].to_string();

        let pattern = format!("{}^{}", left, right);
        let replacement = format!("pow({},{})", left, right);
        *text = text.replace(&pattern, &replacement);
    }
}

/// Rewrite `L++R` as `([n]*(L))+([n+1]*(R))`, advancing `n` by two per
/// marker, and capture the `(L, R)` pair so the caller can compile the
/// linear parts as child formulas.
fn handle_linear(text: &mut String, linear: &mut bool, parts: &mut Vec<(String, String)>) {
    if !text.contains("++") {
        return;
    }
    *text = text.replace("++", "@");
    let mut n = 0i32;
    while let Some(pos) = text.find('@') {
        *linear = true;
        let bytes = text.as_bytes();
        let mut l = pos;
        while l > 0 && bytes[l - 1] != b'@' {
            l -= 1;
        }
        let mut r = pos + 1;
        while r < bytes.len() && bytes[r] != b'@' {
            r += 1;
        }
        let left = text[l..pos].to_string();
        let right = text[pos + 1..r].to_string();
        let pattern = format!("{}@{}", left, right);
        let replacement = format!("([{}]*({}))+([{}]*({}))", n, left, n + 1, right);
        *text = text.replace(&pattern, &replacement);
        n += 2;
        parts.push((left, right));
    }
}
