//! C++ emission over a finished closure.
//!
//! Produces one declaration document (forward declarations for the visited
//! set, then a struct per chain member) and one implementation unit per
//! visited type. Everything is rendered into memory; writing is `output`'s job.
pub mod scope;
pub mod header;
pub mod source;
pub mod proxy;

use std::collections::BTreeMap;

use crate::closure::Closure;
use crate::error::EmitError;
use crate::model::{ClassInfo, TypeRef};
use crate::naming::{self, ValidMembers};
use crate::template::{Overlay, TemplateOverlay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// File name of the declaration document.
    pub header_name: String,
    /// Bridge runtime header the declaration document includes.
    pub helper_include: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            header_name: "API.h".to_string(),
            helper_include: "APIHelper.h".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct Bindings {
    pub header: Artifact,
    pub units: Vec<Artifact>,
}

impl Bindings {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        std::iter::once(&self.header).chain(self.units.iter())
    }

    pub fn unit(&self, file_name: &str) -> Option<&Artifact> {
        self.units.iter().find(|a| a.file_name == file_name)
    }
}

/// Everything the header and source writers need about one type.
pub(crate) struct TypeView<'a> {
    pub class: &'a ClassInfo,
    pub simple: String,
    pub namespace: String,
    pub super_name: String,
    /// Bound members only; see `Closure::members_of`.
    pub members: ValidMembers<'a>,
    pub interfaces: Vec<&'a str>,
    pub overlay: &'a Overlay,
}

impl<'a> TypeView<'a> {
    fn new(class: &'a ClassInfo, closure: &Closure, overlay: &'a Overlay) -> Self {
        Self {
            simple: naming::class_simple_name(&class.name),
            namespace: naming::class_namespace(&class.name),
            super_name: match &class.superclass {
                Some(name) => naming::class_full_name(name),
                None => naming::ROOT_OBJECT.to_string(),
            },
            members: closure.members_of(class),
            interfaces: closure.interfaces_of(class),
            class,
            overlay,
        }
    }

    /// Constructors call the user hook only when a declaration overlay
    /// declared one.
    fn init_hook(&self) -> &'static str {
        if self.overlay.declaration.is_some() { " __Initialize(); " } else { "" }
    }
}

// ------------------------------- Helpers --------------------------------- //

/// `const ::jint& arg0, const ::java::lang::String& arg1`
pub(crate) fn param_list(types: &[TypeRef]) -> String {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("const {}& arg{i}", naming::full_name(ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `arg0, arg1`
pub(crate) fn arg_names(n: usize) -> String {
    (0..n).map(|i| format!("arg{i}")).collect::<Vec<_>>().join(", ")
}

/// Bridge-call argument tail: `, arg0, (jobject)arg1`.
pub(crate) fn jni_args(types: &[TypeRef]) -> String {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| format!(", {}", jni_value(ty, &format!("arg{i}"))))
        .collect()
}

/// Wrapper objects are passed to the bridge as raw `jobject`.
pub(crate) fn jni_value(ty: &TypeRef, expr: &str) -> String {
    if ty.is_primitive() { expr.to_string() } else { format!("(jobject){expr}") }
}

pub(crate) fn static_prefix(is_static: bool) -> &'static str {
    if is_static { "static " } else { "" }
}

pub(crate) fn const_suffix(is_static: bool) -> &'static str {
    if is_static { "" } else { " const" }
}

// ------------------------------- Entry ----------------------------------- //

fn overlay_for<'o>(overlays: &'o BTreeMap<String, Overlay>, empty: &'o Overlay, name: &str) -> &'o Overlay {
    overlays.get(name).unwrap_or(empty)
}

pub fn emit(
    closure: &Closure,
    templates: &dyn TemplateOverlay,
    options: &EmitOptions,
) -> Result<Bindings, EmitError> {
    let mut overlays = BTreeMap::new();
    for class in closure.chain() {
        overlays.insert(class.name.clone(), templates.lookup(&class.name)?);
    }
    let empty = Overlay::default();
    let overlay_of = |name: &str| overlay_for(&overlays, &empty, name);

    let visited = closure.visited();

    let header = {
        let chain: Vec<TypeView<'_>> = closure
            .chain()
            .map(|c| TypeView::new(c, closure, overlay_of(&c.name)))
            .collect();
        Artifact {
            file_name: options.header_name.clone(),
            contents: header::render(&visited, &chain, options),
        }
    };

    let units = visited
        .iter()
        .map(|class| {
            let view = TypeView::new(class, closure, overlay_of(&class.name));
            Artifact {
                file_name: naming::unit_file_name(&class.name),
                contents: source::render(&view, options),
            }
        })
        .collect();

    log::debug!(
        "emitted {} for {} types, {} units",
        options.header_name,
        closure.len(),
        visited.len()
    );
    Ok(Bindings { header, units })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::{select, MatchMode, SelectOptions};
    use crate::metadata::ManifestProvider;
    use crate::template::{MemoryTemplates, NoTemplates};
    use serde_json::{json, Value};

    pub(crate) fn bindings(classes: Value, patterns: &[&str], templates: &dyn TemplateOverlay) -> Bindings {
        let provider = ManifestProvider::from_value(classes).unwrap();
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        let options = SelectOptions { mode: MatchMode::First, bootstrap: false };
        let selection = select(&provider, &patterns, options).unwrap();
        emit(&selection.closure, templates, &EmitOptions::default()).unwrap()
    }

    #[test]
    fn helper_lists() {
        let types = vec![TypeRef::class("java.lang.String"), TypeRef::Primitive(crate::model::Primitive::Int)];
        assert_eq!(param_list(&types), "const ::java::lang::String& arg0, const ::jint& arg1");
        assert_eq!(arg_names(2), "arg0, arg1");
        assert_eq!(jni_args(&types), ", (jobject)arg0, arg1");
        assert_eq!(param_list(&[]), "");
    }

    #[test]
    fn one_unit_per_visited_type() {
        let b = bindings(
            json!([
                { "name": "pkg.A", "super": "pkg.B" },
                { "name": "pkg.B" },
                { "name": "pkg.Outer$Inner" }
            ]),
            &["::pkg::A", "::pkg::Outer_Inner"],
            &NoTemplates,
        );
        let mut names: Vec<_> = b.units.iter().map(|u| u.file_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["pkg.A.cpp", "pkg.B.cpp", "pkg.Outer.Inner.cpp"]);
        assert_eq!(b.header.file_name, "API.h");
        assert_eq!(b.artifacts().count(), 4);
    }

    #[test]
    fn emission_is_deterministic() {
        let classes = json!([
            { "name": "pkg.A", "super": "pkg.B",
              "methods": [
                { "name": "foo", "descriptor": "(Ljava/lang/String;)V", "access": ["public"] },
                { "name": "foo", "descriptor": "(I)V", "access": ["public"] }
              ] },
            { "name": "pkg.B" },
            { "name": "java.lang.String" }
        ]);
        let one = bindings(classes.clone(), &["::pkg::A"], &NoTemplates);
        let two = bindings(classes, &["::pkg::A"], &NoTemplates);
        assert_eq!(one.header, two.header);
        assert_eq!(one.units, two.units);
    }

    #[test]
    fn overlays_flow_into_both_documents() {
        let templates = MemoryTemplates::new().with(
            "pkg.A",
            Overlay {
                declaration: Some("\tint Extra();".into()),
                definition: Some("int A::Extra() { return 42; }".into()),
            },
        );
        let b = bindings(json!([{ "name": "pkg.A" }]), &["::pkg::A"], &templates);
        assert!(b.header.contents.contains("\tint Extra();\nprivate:\n\tvoid __Initialize();"));
        assert!(b.header.contents.contains("explicit A(jobject o) : jni::Object(o) { __Initialize(); }"));
        let unit = b.unit("pkg.A.cpp").unwrap();
        assert!(unit.contents.contains("int A::Extra() { return 42; }"));
    }
}
