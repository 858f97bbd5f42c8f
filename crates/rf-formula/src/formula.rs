//! The formula type: construction, symbol resolution and evaluation.
//!
//! A [`Formula`] is built from raw text, immediately macro-rewritten and
//! resolved against its symbol tables (variables, parameters, constants,
//! function aliases). It is then either ready (the evaluator is usable) or
//! incomplete, listing unresolved names. Parameter values may be mutated
//! freely afterwards; variable values are set per evaluation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bytecode::CompiledFormula;
use crate::directory;
use crate::functor::{dedup_functors, extract_functors, Functor};
use crate::preprocess::{is_name_char, preprocess};
use crate::symbols::{default_constants, SymbolTable};
use crate::tmath;

static INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// Re-entry bound for nested-formula inlining. Diamond-shaped reuse of the
/// same registered formula stays well under this; a reference cycle does not.
const MAX_NESTED_INLINES: usize = 8;

/// A symbolic formula over variables `x[i]` and parameters `p[j]`.
pub struct Formula {
    name: String,
    /// Raw user expression, as given.
    title: String,
    /// Preprocessed expression (macros expanded; `[i]` rewritten on rename).
    formula: String,
    /// Resolved canonical text handed to the bytecode back-end.
    canonical: String,
    /// Unique back-end name for this instance.
    compiled_name: String,
    compiled: Option<CompiledFormula>,
    funcs: Vec<Functor>,
    vars: SymbolTable,
    params: SymbolTable,
    consts: BTreeMap<String, f64>,
    aliases: BTreeMap<String, String>,
    ndim: usize,
    number: i32,
    linear: bool,
    normalized: bool,
    ready: bool,
    all_parameters_set: bool,
    linear_parts: Vec<Formula>,
    registered: bool,
}

/// Replace call sites of `short(` with `full(`, leaving longer names that
/// merely contain `short` (like `sinh` for `sin`) untouched.
fn replace_call_sites(text: &str, short: &str, full: &str) -> String {
    let needle = format!("{short}(");
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut from = 0usize;
    while let Some(rel) = text[from..].find(&needle) {
        let pos = from + rel;
        if pos == 0 || !is_name_char(bytes[pos - 1]) {
            out.push_str(&text[from..pos]);
            out.push_str(full);
            out.push('(');
        } else {
            out.push_str(&text[from..pos + needle.len()]);
        }
        from = pos + needle.len();
    }
    out.push_str(&text[from..]);
    out
}

/// Parse the literal indexed-observable form `x[k]`.
fn parse_indexed(name: &str) -> Option<usize> {
    let inner = name.strip_prefix("x[")?.strip_suffix(']')?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// Constants are inlined with fixed six-decimal formatting.
fn format_constant(v: f64) -> String {
    format!("{:.6}", v)
}

impl Formula {
    // ── Construction ───────────────────────────────────────────

    /// Build a formula from raw text, register it into the process-wide
    /// directory (unless the name is reserved) and resolve it.
    pub fn new(name: &str, expression: &str) -> Formula {
        let mut f = Formula::bare(name, expression);
        if directory::is_reserved(name) {
            log::error!("Formula: the name {} is reserved as a formula variable name", name);
        } else {
            f.registered = true;
        }
        let source = f.title.clone();
        f.prepare_from(&source);
        if f.registered {
            directory::register(&f.name, &f.formula);
        }
        f
    }

    /// Build an empty-bodied formula with `nparams` parameters named
    /// `"0".."n-1"` and `ndims` dimensions. Not registered and not ready;
    /// used as parameter storage.
    pub fn with_params(name: &str, nparams: usize, ndims: usize) -> Formula {
        let mut f = Formula::bare(name, "");
        f.ndim = ndims;
        for i in 0..nparams {
            f.params.add(&i.to_string(), 0.0);
        }
        f
    }

    /// Child-formula constructor (linear parts): resolved but never
    /// registered into the directory.
    fn internal(name: &str, expression: &str) -> Formula {
        let mut f = Formula::bare(name, expression);
        let source = f.title.clone();
        f.prepare_from(&source);
        f
    }

    fn bare(name: &str, expression: &str) -> Formula {
        let mut vars = SymbolTable::new();
        for v in ["x", "y", "z", "t"] {
            vars.add(v, 0.0);
        }
        Formula {
            name: name.to_string(),
            title: expression.to_string(),
            formula: expression.to_string(),
            canonical: String::new(),
            compiled_name: String::new(),
            compiled: None,
            funcs: Vec::new(),
            vars,
            params: SymbolTable::new(),
            consts: default_constants(),
            aliases: tmath::default_aliases(),
            ndim: 0,
            number: 0,
            linear: false,
            normalized: false,
            ready: false,
            all_parameters_set: false,
            linear_parts: Vec::new(),
            registered: false,
        }
    }

    /// Macro-rewrite `source`, extract functors and resolve them.
    fn prepare_from(&mut self, source: &str) {
        if !source.is_ascii() {
            log::error!("PreProcessFormula: expression must be ASCII: {}", source);
            self.formula = source.to_string();
            self.canonical.clear();
            self.funcs.clear();
            self.ready = false;
            return;
        }
        let pre = preprocess(source);
        self.formula = pre.text;
        if pre.number != 0 {
            self.number = pre.number;
        }
        if pre.linear {
            self.linear = true;
        }
        if pre.normalized {
            self.normalized = true;
        }
        for (left, right) in &pre.linear_parts {
            self.linear_parts.push(Formula::internal("__linear1", left));
            self.linear_parts.push(Formula::internal("__linear2", right));
        }

        self.funcs.clear();
        self.ready = false;
        let mut param_names = Vec::new();
        self.canonical = extract_functors(&self.formula, &mut self.funcs, &mut param_names);
        self.register_params(&param_names);
        dedup_functors(&mut self.funcs);
        self.resolve();
    }

    fn register_params(&mut self, names: &[String]) {
        for name in names {
            if !self.params.contains(name) {
                self.params.add(name, 0.0);
            }
        }
    }

    // ── Resolution ─────────────────────────────────────────────

    /// One resolution pass over the functor list. The list can grow while
    /// iterating (nested-formula inlining appends the inlined functors).
    fn resolve(&mut self) {
        let mut inline_counts: HashMap<String, usize> = HashMap::new();
        let mut i = 0;
        while i < self.funcs.len() {
            if self.funcs[i].found {
                i += 1;
                continue;
            }
            let name = self.funcs[i].name.clone();
            let nargs = self.funcs[i].nargs;
            let found = if nargs > 0 {
                self.resolve_call(&name, nargs)
            } else {
                self.resolve_symbol(&name, &mut inline_counts)
            };
            self.funcs[i].found = found;
            i += 1;
        }

        if let Some(f) = self.funcs.iter().find(|f| !f.found) {
            log::warn!(
                "ProcessFormula: \"{}\" has not been matched in the formula expression",
                f.name
            );
        }
        let all_matched = self.funcs.iter().all(|f| f.found);

        if !self.ready && all_matched && !self.canonical.is_empty() {
            self.ready = true;
            if self.params.is_empty() {
                self.all_parameters_set = true;
            }
            // A function of parameters alone is treated as 1-dimensional.
            if !self.params.is_empty() && self.ndim == 0 {
                self.ndim = 1;
                self.vars.add("x", 0.0);
                if let Some(e) = self.vars.get_mut("x") {
                    e.found = true;
                }
            }

            let mut cleaned: String = self.name.chars().filter(|c| *c != ' ').collect();
            if cleaned.contains("++") {
                cleaned = "RF__linearFunction".to_string();
            }
            let id = INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
            self.compiled_name = format!("{}_{}", cleaned, id);

            match CompiledFormula::compile(&self.canonical) {
                Ok(c) => self.compiled = Some(c),
                Err(e) => {
                    log::error!("ProcessFormula: cannot compile {}: {}", self.prototype(), e);
                    self.ready = false;
                }
            }
        }

        // Default variables that never matched are dropped.
        self.vars.retain_found();
    }

    fn resolve_call(&mut self, name: &str, nargs: usize) -> bool {
        if let Some(full) = self.aliases.get(name).cloned() {
            self.canonical = replace_call_sites(&self.canonical, name, &full);
            return true;
        }
        if name.contains("::") {
            if let Some(builtin) = tmath::builtin(name) {
                if builtin.nargs() == nargs {
                    return true;
                }
            }
        }
        log::error!("ProcessFormula: could not find {} function with {} argument(s)", name, nargs);
        false
    }

    fn resolve_symbol(&mut self, name: &str, inline_counts: &mut HashMap<String, usize>) -> bool {
        // Nested formula registered in the directory.
        if let Some(text) = directory::lookup(name) {
            let count = inline_counts.entry(name.to_string()).or_insert(0);
            if *count >= MAX_NESTED_INLINES {
                log::warn!("ProcessFormula: cyclic reference to formula {}", name);
                return false;
            }
            *count += 1;
            let pre = preprocess(&text);
            let mut param_names = Vec::new();
            let rewritten = extract_functors(&pre.text, &mut self.funcs, &mut param_names);
            self.register_params(&param_names);
            self.canonical = self.canonical.replace(&format!("{{{name}}}"), &rewritten);
            return true;
        }

        // Known variable: bind to its slot, growing nDim as needed.
        if let Some(entry) = self.vars.get(name) {
            let slot = entry.slot;
            if !entry.found {
                if let Some(e) = self.vars.get_mut(name) {
                    e.found = true;
                }
                if slot >= self.ndim {
                    self.ndim = slot + 1;
                    // Keep slots 0..nDim-1 populated: every prior-indexed
                    // variable counts as used.
                    for e in self.vars.iter_mut() {
                        if e.slot < slot && !e.found {
                            e.found = true;
                        }
                    }
                }
            }
            self.canonical = self.canonical.replace(&format!("{{{name}}}"), &format!("x[{slot}]"));
            return true;
        }

        // Indexed observable x[k]: grow the variable table up to slot k.
        if let Some(k) = parse_indexed(name) {
            if k >= self.ndim {
                self.ndim = k + 1;
                for j in 0..self.ndim {
                    let vname = format!("x[{j}]");
                    if !self.vars.contains(&vname) {
                        self.vars.add_at(&vname, 0.0, j);
                        if let Some(e) = self.vars.get_mut(&vname) {
                            e.found = true;
                        }
                    }
                }
            }
            // Strip only the {…} wrapper; the x[k] form is already canonical.
            self.canonical = self.canonical.replace(&format!("{{{name}}}"), name);
            return true;
        }

        // Constant: inline the numeric value.
        if let Some(&v) = self.consts.get(name) {
            self.canonical = self.canonical.replace(&format!("{{{name}}}"), &format_constant(v));
            return true;
        }

        // Parameter: bind to its slot.
        if let Some(entry) = self.params.get(name) {
            let slot = entry.slot;
            let pattern = format!("{{[{name}]}}");
            if self.canonical.contains(&pattern) {
                self.canonical = self.canonical.replace(&pattern, &format!("p[{slot}]"));
            }
            return true;
        }

        false
    }

    fn prototype(&self) -> String {
        let has_vars = self.ndim > 0;
        let has_pars = !self.params.is_empty();
        format!(
            "double {}({}{}{})",
            self.compiled_name,
            if has_vars { "double *x" } else { "" },
            if has_vars && has_pars { ", " } else { "" },
            if has_pars { "double *p" } else { "" },
        )
    }

    // ── Variables ──────────────────────────────────────────────

    /// Add a variable (or update its value) and re-run resolution when the
    /// name is new, so a formula missing this symbol can become ready.
    pub fn add_variable(&mut self, name: &str, value: f64) {
        if self.vars.contains(name) {
            self.vars.add(name, value);
        } else {
            self.vars.add(name, value);
            self.resolve();
        }
    }

    /// Add multiple variables; resolution is re-run once if any was new.
    pub fn add_variables(&mut self, vars: &[(&str, f64)]) {
        let mut any_new = false;
        for (name, value) in vars {
            if !self.vars.contains(name) {
                any_new = true;
            }
            self.vars.add(name, *value);
        }
        if any_new {
            self.resolve();
        }
    }

    /// Set the value of a known variable.
    pub fn set_variable(&mut self, name: &str, value: f64) {
        if !self.vars.set(name, value) {
            log::error!("SetVariable: variable {} is not defined", name);
        }
    }

    /// Set multiple known variables; unknown names are reported and skipped.
    pub fn set_variables(&mut self, vars: &[(&str, f64)]) {
        for (name, value) in vars {
            if !self.vars.set(name, *value) {
                log::error!("SetVariables: variable {} is not defined", name);
            }
        }
    }

    /// Value of a variable, or -1 when unknown.
    pub fn get_variable(&self, name: &str) -> f64 {
        match self.vars.get(name) {
            Some(e) => e.value,
            None => {
                log::error!("GetVariable: variable {} is not defined", name);
                -1.0
            }
        }
    }

    // ── Parameters ─────────────────────────────────────────────

    /// Set a parameter by name; unknown names are reported and ignored.
    pub fn set_parameter(&mut self, name: &str, value: f64) {
        if !self.params.contains(name) {
            log::error!("SetParameter: parameter {} is not defined", name);
            return;
        }
        self.params.set(name, value);
        if let Some(e) = self.params.get_mut(name) {
            e.found = true;
        }
        self.all_parameters_set = self.params.iter().all(|e| e.found);
    }

    /// Set a parameter by its decimal index name.
    pub fn set_parameter_index(&mut self, ipar: usize, value: f64) {
        self.set_parameter(&ipar.to_string(), value);
    }

    /// Bulk positional set by decimal names. A slice longer than `npar()` is
    /// ignored entirely.
    pub fn set_parameters(&mut self, params: &[f64]) {
        if params.len() > self.npar() {
            return;
        }
        for (i, value) in params.iter().enumerate() {
            self.set_parameter(&i.to_string(), *value);
        }
    }

    /// Set up to the first eleven parameters by position, stopping at
    /// `npar()`.
    pub fn set_positional_parameters(&mut self, values: &[f64]) {
        for (i, value) in values.iter().take(11).enumerate() {
            if self.npar() > i {
                self.set_parameter_index(i, *value);
            }
        }
    }

    /// Value of a parameter, or -1 when unknown.
    pub fn get_parameter(&self, name: &str) -> f64 {
        match self.params.get(name) {
            Some(e) => self.params.values()[e.slot],
            None => {
                log::error!("GetParameter: parameter {} is not defined", name);
                -1.0
            }
        }
    }

    /// Value of a parameter by its decimal index name.
    pub fn get_parameter_index(&self, ipar: usize) -> f64 {
        self.get_parameter(&ipar.to_string())
    }

    /// Name of the parameter occupying slot `ipar`.
    pub fn par_name(&self, ipar: usize) -> Option<&str> {
        self.params.by_slot(ipar).map(|e| e.name.as_str())
    }

    /// Parameter names in slot order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.params.names_by_slot().into_iter().map(|s| s.to_string()).collect()
    }

    /// Slot-ordered parameter values.
    pub fn parameters(&self) -> &[f64] {
        self.params.values()
    }

    /// Copy parameter values into `out`; slots past the stored vector read
    /// as -1.
    pub fn get_parameters_into(&self, out: &mut [f64]) {
        for (i, o) in out.iter_mut().enumerate().take(self.npar()) {
            *o = self.params.values().get(i).copied().unwrap_or(-1.0);
        }
    }

    /// Rename parameter slot `ipar`, rewriting `[ipar]` to `[name]` in the
    /// stored expression text.
    pub fn set_par_name(&mut self, ipar: usize, name: &str) {
        let current = ipar.to_string();
        let known = self.funcs.iter().any(|f| f.name == current && !f.is_call());
        if !known {
            log::error!("SetParName: parameter {} is not defined", ipar);
            return;
        }
        for f in self.funcs.iter_mut() {
            if f.name == current && !f.is_call() {
                f.name = name.to_string();
            }
        }
        self.formula = self.formula.replace(&format!("[{ipar}]"), &format!("[{name}]"));
        self.params.rename(&current, name);
        if self.registered {
            directory::register(&self.name, &self.formula);
        }
    }

    // ── Evaluation ─────────────────────────────────────────────

    /// Evaluate with explicit variable values (slot order) and, optionally,
    /// a fresh parameter vector.
    pub fn eval_par(&mut self, x: &[f64], params: Option<&[f64]>) -> f64 {
        if let Some(p) = params {
            self.set_parameters(p);
        }
        let n = x.len().min(self.vars.values().len());
        self.vars.values_mut()[..n].copy_from_slice(&x[..n]);
        self.eval()
    }

    /// Evaluate with the current variable and parameter values.
    pub fn eval(&mut self) -> f64 {
        if !self.ready {
            log::error!("Eval: formula not ready to execute; missing parameters/variables");
            for f in self.funcs.iter().filter(|f| !f.found) {
                log::warn!("Eval: {} is unknown", f.name);
            }
            return -1.0;
        }
        match &self.compiled {
            Some(c) => c.eval(self.vars.values(), self.params.values()),
            None => {
                log::error!("Eval: no compiled body for {}", self.compiled_name);
                -1.0
            }
        }
    }

    fn set_slot(&mut self, slot: usize, value: f64) {
        if self.ndim > slot {
            if let Some(s) = self.vars.values_mut().get_mut(slot) {
                *s = value;
            }
        }
    }

    /// Set the first variable and evaluate.
    pub fn eval1(&mut self, x: f64) -> f64 {
        self.set_slot(0, x);
        self.eval()
    }

    /// Set the first two variables and evaluate.
    pub fn eval2(&mut self, x: f64, y: f64) -> f64 {
        self.set_slot(0, x);
        self.set_slot(1, y);
        self.eval()
    }

    /// Set the first three variables and evaluate.
    pub fn eval3(&mut self, x: f64, y: f64, z: f64) -> f64 {
        self.set_slot(0, x);
        self.set_slot(1, y);
        self.set_slot(2, z);
        self.eval()
    }

    /// Set the first four variables and evaluate.
    pub fn eval4(&mut self, x: f64, y: f64, z: f64, t: f64) -> f64 {
        self.set_slot(0, x);
        self.set_slot(1, y);
        self.set_slot(2, z);
        self.set_slot(3, t);
        self.eval()
    }

    // ── Introspection ──────────────────────────────────────────

    /// User-given name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw expression text as given at construction.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Stored (macro-expanded) expression text.
    pub fn expression(&self) -> &str {
        &self.formula
    }

    /// Resolved canonical text over `x[i]`, `p[j]`, literals and qualified
    /// calls.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Number of dimensions (variables).
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of parameters.
    pub fn npar(&self) -> usize {
        self.params.len()
    }

    /// Classification code set by the macro rewriter (300+N for `polN`,
    /// 100 gaus, 200 landau, 400 expo; 0 otherwise).
    pub fn number(&self) -> i32 {
        self.number
    }

    /// True when the formula is a linear combination (`polN` or `++`).
    pub fn is_linear(&self) -> bool {
        self.linear
    }

    /// True when a normalized family variant was used.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// True when every functor is bound and the evaluator is usable.
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Names that failed to resolve.
    pub fn unresolved(&self) -> Vec<&str> {
        self.funcs.iter().filter(|f| !f.found).map(|f| f.name.as_str()).collect()
    }

    /// Sub-formulas captured by `++` composition (two per marker).
    pub fn linear_parts(&self) -> &[Formula] {
        &self.linear_parts
    }

    /// One linear part by index.
    pub fn linear_part(&self, i: usize) -> Option<&Formula> {
        self.linear_parts.get(i)
    }

    /// Mutable access to a linear part (evaluation needs it).
    pub fn linear_part_mut(&mut self, i: usize) -> Option<&mut Formula> {
        self.linear_parts.get_mut(i)
    }

    // ── Printing ───────────────────────────────────────────────

    /// Print the formula and, when `verbose`, its variables, parameters and
    /// canonical text. Unresolved functors and unset parameters are listed.
    pub fn print(&self, verbose: bool) {
        println!(
            " {:>20} : {} Ndim= {}, Npar= {}, Number= {}",
            self.name,
            self.title,
            self.ndim,
            self.npar(),
            self.number
        );
        println!(" Formula expression:");
        println!("\t{}", self.formula);
        if verbose {
            if self.ndim > 0 {
                println!("List of variables:");
                let mut entries: Vec<_> = self.vars.iter().collect();
                entries.sort_by_key(|e| e.slot);
                for e in entries {
                    println!(" {:>20} = {:>10}", e.name, self.vars.values()[e.slot]);
                }
            }
            if self.npar() > 0 {
                println!("List of parameters:");
                let mut entries: Vec<_> = self.params.iter().collect();
                entries.sort_by_key(|e| e.slot);
                for e in entries {
                    println!(" {:>20} = {:>10}", e.name, self.params.values()[e.slot]);
                }
            }
            println!("Expression passed to the evaluator:");
            println!("\t{}", self.canonical);
        }
        if !self.ready {
            log::warn!("Print: formula is not ready to execute; missing parameters/variables");
            for f in self.funcs.iter().filter(|f| !f.found) {
                println!("{} is unknown", f.name);
            }
        }
        if !self.all_parameters_set {
            log::info!("Print: not all parameters are set");
            for e in self.params.iter().filter(|e| !e.found) {
                println!("{} has default value {}", e.name, e.value);
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} Ndim= {}, Npar= {}, Number= {}",
            self.name,
            self.title,
            self.ndim,
            self.npar(),
            self.number
        )
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("canonical", &self.canonical)
            .field("ndim", &self.ndim)
            .field("npar", &self.npar())
            .field("ready", &self.ready)
            .finish()
    }
}

impl Clone for Formula {
    /// Cloning copies the symbol tables and text, then re-runs resolution on
    /// the clone, so each instance owns its compiled body (the safe pattern
    /// for per-thread evaluation).
    fn clone(&self) -> Self {
        let mut f = Formula {
            name: self.name.clone(),
            title: self.title.clone(),
            formula: self.formula.clone(),
            canonical: String::new(),
            compiled_name: String::new(),
            compiled: None,
            funcs: Vec::new(),
            vars: self.vars.clone(),
            params: self.params.clone(),
            consts: self.consts.clone(),
            aliases: self.aliases.clone(),
            ndim: self.ndim,
            number: self.number,
            linear: self.linear,
            normalized: self.normalized,
            ready: false,
            all_parameters_set: self.all_parameters_set,
            linear_parts: self.linear_parts.clone(),
            registered: false,
        };
        let source = f.formula.clone();
        f.prepare_from(&source);
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_call_sites() {
        assert_eq!(
            replace_call_sites("sin(x)+asin(x)", "sin", "TMath::Sin"),
            "TMath::Sin(x)+asin(x)"
        );
        assert_eq!(
            replace_call_sites("sinh(x)", "sin", "TMath::Sin"),
            "sinh(x)"
        );
        assert_eq!(
            replace_call_sites("sin(sin(x))", "sin", "TMath::Sin"),
            "TMath::Sin(TMath::Sin(x))"
        );
    }

    #[test]
    fn test_parse_indexed() {
        assert_eq!(parse_indexed("x[0]"), Some(0));
        assert_eq!(parse_indexed("x[12]"), Some(12));
        assert_eq!(parse_indexed("x[]"), None);
        assert_eq!(parse_indexed("y[0]"), None);
        assert_eq!(parse_indexed("x[a]"), None);
    }

    #[test]
    fn test_simple_resolution() {
        let mut f = Formula::new("fml_simple", "sin(x)/x");
        assert!(f.ready());
        assert_eq!(f.canonical(), "TMath::Sin(x[0])/x[0]");
        assert_eq!(f.ndim(), 1);
        assert_eq!(f.npar(), 0);
        f.set_variable("x", 1.0);
        assert!((f.eval() - 0.8414709848).abs() < 1e-9);
    }

    #[test]
    fn test_constant_inlining() {
        let mut f = Formula::new("fml_const", "2*pi");
        assert!(f.ready());
        assert_eq!(f.canonical(), "2*3.141593");
        assert!((f.eval() - 6.283186).abs() < 1e-9);
    }

    #[test]
    fn test_unresolved_formula_reports_and_returns_minus_one() {
        let mut f = Formula::new("fml_missing", "undefined_sym*2");
        assert!(!f.ready());
        assert_eq!(f.unresolved(), vec!["undefined_sym"]);
        assert_eq!(f.eval(), -1.0);
    }

    #[test]
    fn test_add_variable_makes_formula_ready() {
        let mut f = Formula::new("fml_late_var", "myvar*2");
        assert!(!f.ready());
        f.add_variable("myvar", 3.0);
        assert!(f.ready());
        assert_eq!(f.eval(), 6.0);
    }

    #[test]
    fn test_default_variable_purge() {
        let f = Formula::new("fml_purge", "x+1");
        assert_eq!(f.ndim(), 1);
        // y, z, t never matched and are gone.
        assert!(f.vars.get("y").is_none());
        assert!(f.vars.get("t").is_none());
    }

    #[test]
    fn test_y_raises_ndim_and_keeps_x() {
        let f = Formula::new("fml_y_only", "y*2");
        assert_eq!(f.ndim(), 2);
        // x is back-filled so slots 0..nDim-1 exist.
        assert!(f.vars.get("x").is_some());
        assert!(f.vars.get("z").is_none());
        assert_eq!(f.canonical(), "x[1]*2");
    }

    #[test]
    fn test_parameters_only_formula_is_one_dimensional() {
        let mut f = Formula::new("fml_pars_only", "[0]*[1]");
        assert!(f.ready());
        assert_eq!(f.ndim(), 1);
        assert_eq!(f.npar(), 2);
        f.set_parameters(&[3.0, 4.0]);
        assert_eq!(f.eval(), 12.0);
    }

    #[test]
    fn test_indexed_observables_grow_table() {
        let mut f = Formula::new("fml_indexed", "x[0]+x[3]");
        assert!(f.ready());
        assert_eq!(f.ndim(), 4);
        assert_eq!(f.canonical(), "x[0]+x[3]");
        assert_eq!(f.eval_par(&[1.0, 0.0, 0.0, 10.0], None), 11.0);
    }

    #[test]
    fn test_set_par_name_rewrites_expression() {
        let mut f = Formula::new("fml_rename", "[0]*x+[1]");
        f.set_par_name(1, "offset");
        assert_eq!(f.expression(), "[0]*x+[offset]");
        f.set_parameter("offset", 5.0);
        f.set_parameter_index(0, 2.0);
        assert_eq!(f.eval1(3.0), 11.0);
        assert_eq!(f.par_name(1), Some("offset"));
    }

    #[test]
    fn test_reserved_name_not_registered() {
        let _f = Formula::new("x", "1+1");
        assert!(directory::lookup("x").is_none());
    }

    #[test]
    fn test_unknown_accessors_return_minus_one() {
        let mut f = Formula::new("fml_access", "[0]*x");
        assert_eq!(f.get_parameter("nope"), -1.0);
        assert_eq!(f.get_variable("nope"), -1.0);
        f.set_parameter("nope", 1.0); // logged, ignored
        assert_eq!(f.npar(), 1);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut f = Formula::new("fml_clone", "[0]*x");
        f.set_parameter_index(0, 2.0);
        let mut g = f.clone();
        assert!(g.ready());
        g.set_parameter_index(0, 5.0);
        assert_eq!(f.eval1(1.0), 2.0);
        assert_eq!(g.eval1(1.0), 5.0);
    }

    #[test]
    fn test_non_ascii_expression_is_not_ready() {
        let mut f = Formula::new("fml_ascii", "2*π");
        assert!(!f.ready());
        assert_eq!(f.eval(), -1.0);
    }

    #[test]
    fn test_with_params_constructor() {
        let mut f = Formula::with_params("fml_storage", 3, 2);
        assert_eq!(f.npar(), 3);
        assert_eq!(f.ndim(), 2);
        assert!(!f.ready());
        f.set_parameter_index(2, 7.0);
        assert_eq!(f.get_parameter_index(2), 7.0);
        assert_eq!(f.eval(), -1.0);
    }
}
