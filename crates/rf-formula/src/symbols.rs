//! Symbol tables: named variable/parameter slots and the default constants.
//!
//! Variables and parameters share one table shape: an ordered name → entry
//! map plus a slot-indexed value vector (the vector handed to the evaluator).
//! A new entry takes the first slot past every live entry, and slots survive
//! value updates; purging entries never shrinks the value vector, so slots of
//! surviving entries stay valid and are never handed out again.

use std::collections::BTreeMap;

/// A named slot in a variable or parameter table.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    /// Symbol name as it appears in formula text.
    pub name: String,
    /// Current value (mirrored into the slot vector).
    pub value: f64,
    /// Index the evaluator reads from the corresponding value vector.
    pub slot: usize,
    /// Set once the resolver has matched at least one occurrence
    /// (for parameters: set once the user has assigned a value explicitly).
    pub found: bool,
}

/// Ordered map of symbol entries backed by a slot-indexed value vector.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<String, SymbolEntry>,
    values: Vec<f64>,
}

impl SymbolTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of named entries (not the slot-vector length).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a symbol, or update its value in place when the name exists.
    ///
    /// New entries get the first slot past every live entry, so a slot still
    /// occupied after a purge is never reassigned; the value vector grows as
    /// needed. Returns the entry's slot.
    pub fn add(&mut self, name: &str, value: f64) -> usize {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.value = value;
            self.values[entry.slot] = value;
            return entry.slot;
        }
        let slot = self.entries.values().map(|e| e.slot + 1).max().unwrap_or(0);
        if slot >= self.values.len() {
            self.values.resize(slot + 1, 0.0);
        }
        self.values[slot] = value;
        self.entries.insert(
            name.to_string(),
            SymbolEntry { name: name.to_string(), value, slot, found: false },
        );
        slot
    }

    /// Add a symbol at an explicit slot (indexed observables `x[k]` claim
    /// their own positions). Existing names are left untouched.
    pub fn add_at(&mut self, name: &str, value: f64, slot: usize) {
        if self.entries.contains_key(name) {
            return;
        }
        if slot >= self.values.len() {
            self.values.resize(slot + 1, 0.0);
        }
        self.values[slot] = value;
        self.entries.insert(
            name.to_string(),
            SymbolEntry { name: name.to_string(), value, slot, found: false },
        );
    }

    /// Update the value of an existing symbol. Returns false when absent.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.value = value;
                self.values[entry.slot] = value;
                true
            }
            None => false,
        }
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(name)
    }

    /// Mutable lookup by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SymbolEntry> {
        self.entries.get_mut(name)
    }

    /// True when the name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Rename an entry, preserving slot, value and found flag.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        match self.entries.remove(old) {
            Some(mut entry) => {
                entry.name = new.to_string();
                self.entries.insert(new.to_string(), entry);
                true
            }
            None => false,
        }
    }

    /// The slot-indexed value vector the evaluator reads.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable access to the slot-indexed value vector.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Iterate entries in name order (the map order).
    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.values()
    }

    /// Iterate entries mutably in name order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SymbolEntry> {
        self.entries.values_mut()
    }

    /// Entry names ordered by slot.
    pub fn names_by_slot(&self) -> Vec<&str> {
        let mut named: Vec<(&SymbolEntry, &str)> =
            self.entries.values().map(|e| (e, e.name.as_str())).collect();
        named.sort_by_key(|(e, _)| e.slot);
        named.into_iter().map(|(_, n)| n).collect()
    }

    /// Find the entry occupying a slot, if any.
    pub fn by_slot(&self, slot: usize) -> Option<&SymbolEntry> {
        self.entries.values().find(|e| e.slot == slot)
    }

    /// Drop entries whose `found` flag is still unset. The value vector is
    /// left alone so surviving slots stay valid.
    pub fn retain_found(&mut self) {
        self.entries.retain(|_, e| e.found);
    }
}

/// Default constants seeded into every formula: mathematical constants,
/// SI physical constants, and `true`/`false` as 1/0.
pub fn default_constants() -> BTreeMap<String, f64> {
    let mut consts = BTreeMap::new();
    consts.insert("pi".to_string(), std::f64::consts::PI);
    consts.insert("sqrt2".to_string(), std::f64::consts::SQRT_2);
    consts.insert("infinity".to_string(), f64::INFINITY);
    consts.insert("e".to_string(), std::f64::consts::E);
    consts.insert("ln10".to_string(), std::f64::consts::LN_10);
    consts.insert("loge".to_string(), std::f64::consts::LOG10_E);
    consts.insert("c".to_string(), 2.99792458e8);
    consts.insert("g".to_string(), 6.673e-11);
    consts.insert("h".to_string(), 6.62606876e-34);
    consts.insert("k".to_string(), 1.3806503e-23);
    consts.insert("sigma".to_string(), 5.6704e-8);
    consts.insert("r".to_string(), 8.314472);
    consts.insert("eg".to_string(), 0.5772156649015329);
    consts.insert("true".to_string(), 1.0);
    consts.insert("false".to_string(), 0.0);
    consts
}
