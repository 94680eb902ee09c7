//! Namespace resolution for element type names.
//!
//! Each element may declare `xmlns="…"` (the default namespace) and
//! `xmlns:prefix="…"`. Declarations are visible to the element and its
//! descendants. Well-known schemes are rewritten to their runtime form.

use indexmap::IndexMap;
use smol_str::SmolStr;

/// The namespace of built-in components. Types in it are not prefixed.
pub const CORE_NAMESPACE: &str = "#uiml-core-ns";
/// The namespace of application components.
pub const APP_NAMESPACE: &str = "#app-ns";

/// Rewrites a declared namespace value to its resolved form.
///
/// Returns `None` for an empty value.
pub fn rewrite_scheme(value: &str) -> Option<SmolStr> {
    let value = value.trim();
    let resolved = match value {
        "" => return None,
        "core-ns" => CORE_NAMESPACE,
        "app-ns" | "component-ns" => APP_NAMESPACE,
        _ => match value.strip_prefix("component-ns:") {
            Some("") => return None,
            Some(prefix) => prefix,
            None => value,
        },
    };
    Some(SmolStr::new(resolved))
}

/// Declared namespaces, one frame per element nesting level.
#[derive(Debug, Default)]
pub struct NamespaceStack {
    frames: Vec<IndexMap<SmolStr, SmolStr>>,
}

impl NamespaceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the frame of a new element.
    pub fn push(&mut self) {
        self.frames.push(IndexMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Declares `prefix` (empty for the default namespace) in the innermost
    /// frame. Returns `false` if the value is not a valid namespace.
    pub fn declare(&mut self, prefix: &str, value: &str) -> bool {
        let Some(resolved) = rewrite_scheme(value) else {
            return false;
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(SmolStr::new(prefix), resolved);
        }
        true
    }

    /// Looks `prefix` up from the innermost frame outwards.
    pub fn resolve(&self, prefix: &str) -> Option<&SmolStr> {
        self.frames.iter().rev().find_map(|frame| frame.get(prefix))
    }

    /// Builds the type name of element `local` written with `prefix`.
    ///
    /// Unprefixed names use the default namespace, or the core namespace if
    /// none is declared. Returns `None` for an undeclared prefix.
    pub fn type_name(&self, prefix: Option<&str>, local: &str) -> Option<SmolStr> {
        let namespace = match prefix {
            Some(prefix) => self.resolve(prefix)?.as_str(),
            None => self.resolve("").map_or(CORE_NAMESPACE, |ns| ns.as_str()),
        };
        if namespace == CORE_NAMESPACE {
            Some(SmolStr::new(local))
        } else {
            Some(SmolStr::new(format!("{namespace}.{local}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scheme_rewrites() {
        assert_eq!(rewrite_scheme("core-ns").as_deref(), Some("#uiml-core-ns"));
        assert_eq!(rewrite_scheme("app-ns").as_deref(), Some("#app-ns"));
        assert_eq!(rewrite_scheme("component-ns").as_deref(), Some("#app-ns"));
        assert_eq!(rewrite_scheme("component-ns:Charts").as_deref(), Some("Charts"));
        assert_eq!(rewrite_scheme("Vendor.Controls").as_deref(), Some("Vendor.Controls"));
        assert_eq!(rewrite_scheme(" "), None);
        assert_eq!(rewrite_scheme("component-ns:"), None);
    }

    #[test]
    fn test_frames_shadow_and_pop() {
        let mut stack = NamespaceStack::new();
        stack.push();
        assert!(stack.declare("c", "component-ns"));
        assert_eq!(stack.type_name(None, "Button").as_deref(), Some("Button"));
        assert_eq!(stack.type_name(Some("c"), "Card").as_deref(), Some("#app-ns.Card"));

        stack.push();
        stack.declare("c", "component-ns:Charts");
        stack.declare("", "app-ns");
        assert_eq!(stack.type_name(Some("c"), "Pie").as_deref(), Some("Charts.Pie"));
        assert_eq!(stack.type_name(None, "Card").as_deref(), Some("#app-ns.Card"));

        stack.pop();
        assert_eq!(stack.type_name(Some("c"), "Pie").as_deref(), Some("#app-ns.Pie"));
        assert_eq!(stack.type_name(Some("x"), "Pie"), None);
    }
}
