//! Hand-written overlays merged into generated types.
//!
//! `templates/java.lang.String.h` is pasted into the `String` declaration and
//! `templates/java.lang.String.cpp` into its implementation unit.
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::EmitError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    pub declaration: Option<String>,
    pub definition: Option<String>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.declaration.is_none() && self.definition.is_none()
    }
}

pub trait TemplateOverlay {
    /// Overlay for a binary class name such as `java.util.Map$Entry`.
    fn lookup(&self, name: &str) -> Result<Overlay, EmitError>;
}

/// No overlays at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateOverlay for NoTemplates {
    fn lookup(&self, _name: &str) -> Result<Overlay, EmitError> {
        Ok(Overlay::default())
    }
}

/// Overlays read from `<root>/<binary name>.h` and `.cpp`.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    root: PathBuf,
}

impl DirectoryTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, name: &str, extension: &str) -> Result<Option<String>, EmitError> {
        let path = self.root.join(format!("{name}.{extension}"));
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|source| EmitError::Overlay { path: path.clone(), source })?;
        log::debug!("overlay {}", path.display());
        // inlined verbatim, minus the trailing line terminator
        Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl TemplateOverlay for DirectoryTemplates {
    fn lookup(&self, name: &str) -> Result<Overlay, EmitError> {
        Ok(Overlay {
            declaration: self.read(name, "h")?,
            definition: self.read(name, "cpp")?,
        })
    }
}

/// In-memory overlays keyed by binary name.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplates {
    overlays: BTreeMap<String, Overlay>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, overlay: Overlay) -> Self {
        self.overlays.insert(name.to_string(), overlay);
        self
    }
}

impl TemplateOverlay for MemoryTemplates {
    fn lookup(&self, name: &str) -> Result<Overlay, EmitError> {
        Ok(self.overlays.get(name).cloned().unwrap_or_default())
    }
}
