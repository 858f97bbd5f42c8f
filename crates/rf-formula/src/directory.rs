//! Process-wide directory of registered formulas.
//!
//! Construction registers a formula's expanded text under its name so later
//! formulas can reference it by name and have it inlined. Registering an
//! existing name replaces the prior entry. Every key carries a fixed internal
//! prefix so user-visible names cannot collide with internal helpers.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Prefix applied to every registered name.
pub const NAME_PREFIX: &str = "RF__";

/// Names reserved for formula variables; formulas with these names are not
/// registered.
pub const RESERVED_NAMES: [&str; 4] = ["x", "y", "z", "t"];

fn directory() -> &'static Mutex<HashMap<String, String>> {
    static DIRECTORY: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    DIRECTORY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// True for names in the reserved set.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Register `text` under `name`, replacing any prior entry.
pub fn register(name: &str, text: &str) {
    let mut map = directory().lock().unwrap_or_else(|e| e.into_inner());
    map.insert(format!("{NAME_PREFIX}{name}"), text.to_string());
}

/// Look up the registered text for `name`.
pub fn lookup(name: &str) -> Option<String> {
    let map = directory().lock().unwrap_or_else(|e| e.into_inner());
    map.get(&format!("{NAME_PREFIX}{name}")).cloned()
}
