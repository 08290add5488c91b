//! Configuration lookup capability.

use std::sync::Arc;

use super::{HostBindings, HostHandle};

/// Key/value lookup into the host-owned plugin configuration.
pub trait ConfigLoader: Send + Sync {
    /// The value for `key`, or the empty string when the key is absent.
    fn string(&self, key: &str) -> String;
}

/// `ConfigLoader` backed by the host bindings, unquoting raw values before
/// the plugin sees them.
pub struct BindingsConfig {
    bindings: Arc<dyn HostBindings>,
    handle: HostHandle,
}

impl BindingsConfig {
    pub(crate) fn new(bindings: Arc<dyn HostBindings>, handle: HostHandle) -> Self {
        Self { bindings, handle }
    }
}

impl ConfigLoader for BindingsConfig {
    fn string(&self, key: &str) -> String {
        match self.bindings.config_get(self.handle, key) {
            Some(raw) => unquote(&raw),
            None => String::new(),
        }
    }
}

/// Unescape a raw configuration value.
///
/// A value wrapped in double quotes is unescaped; an unquoted value that
/// carries a literal `\n` escape is unescaped as if it were quoted. A value
/// that cannot be parsed either way passes through unchanged.
pub fn unquote(raw: &str) -> String {
    if raw.len() >= 2 {
        if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            if let Some(unescaped) = unescape(inner) {
                return unescaped;
            }
        }
    }

    if raw.contains("\\n") {
        if let Some(unescaped) = unescape(raw) {
            return unescaped;
        }
    }

    raw.to_string()
}

fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            // A bare quote inside a quoted value is malformed.
            if c == '"' {
                return None;
            }
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            _ => return None,
        }
    }
    Some(out)
}
