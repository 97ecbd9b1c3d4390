//! Namespace diffing shared by both header passes.
//!
//! A change closes the open namespace completely and reopens the new one from
//! the root; nothing tries to share a common prefix.
use std::fmt::Write as _;

#[derive(Debug, Default)]
pub struct NamespaceScope {
    /// `None` until something has been entered. The default package is `Some("")`.
    current: Option<String>,
}

fn segments(namespace: &str) -> impl Iterator<Item = &str> {
    namespace.split("::").filter(|seg| !seg.is_empty())
}

impl NamespaceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Switch to `namespace` (`::java::lang` form), writing whatever braces it
    /// takes to get there.
    pub fn enter(&mut self, out: &mut String, namespace: &str) {
        if self.current.as_deref() == Some(namespace) {
            return;
        }
        self.close(out);
        for seg in segments(namespace) {
            let _ = write!(out, "namespace {seg} {{ ");
        }
        out.push('\n');
        self.current = Some(namespace.to_string());
    }

    pub fn close(&mut self, out: &mut String) {
        if let Some(open) = self.current.take() {
            for _ in segments(&open) {
                out.push('}');
            }
            out.push_str("\n\n");
        }
    }
}
