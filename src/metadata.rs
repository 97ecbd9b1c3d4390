//! Class metadata sources.
//!
//! The collector only sees the `MetadataProvider` trait. The shipped provider
//! reads JSON manifests (one per archive) describing classes the way `javap`
//! reports them: binary names, access flags and raw descriptors.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MetadataError, SignatureError};
use crate::model::{ClassInfo, ClassKind, Constructor, Field, Method, Modifiers, Visibility};
use crate::signature::{parse_field, parse_method};

pub trait MetadataProvider {
    /// Every loadable type name (binary, dotted), sorted.
    fn type_names(&self) -> Vec<String>;

    /// Resolve one type. Errors are per type; see `MetadataError::is_fatal`.
    fn load(&self, name: &str) -> Result<Arc<ClassInfo>, MetadataError>;
}

// ————————————————————————————————————————————————————————————————————————————
// MANIFEST FORMAT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AccessFlag {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Synthetic,
    Bridge,
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Deserialize)]
struct RawClass {
    name: String,
    #[serde(default)]
    kind: RawKind,
    #[serde(default, rename = "super")]
    superclass: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    anonymous: bool,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    methods: Vec<RawMethod>,
    #[serde(default)]
    constructors: Vec<RawConstructor>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    descriptor: String,
    #[serde(default)]
    access: Vec<AccessFlag>,
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    name: String,
    descriptor: String,
    #[serde(default)]
    access: Vec<AccessFlag>,
}

#[derive(Debug, Deserialize)]
struct RawConstructor {
    descriptor: String,
    #[serde(default)]
    access: Vec<AccessFlag>,
}

fn modifiers(access: &[AccessFlag]) -> Modifiers {
    let has = |flag| access.contains(&flag);
    let visibility = if has(AccessFlag::Public) {
        Visibility::Public
    } else if has(AccessFlag::Protected) {
        Visibility::Protected
    } else if has(AccessFlag::Private) {
        Visibility::Private
    } else {
        Visibility::Package
    };
    Modifiers {
        visibility,
        is_static: has(AccessFlag::Static),
        is_final: has(AccessFlag::Final),
        is_synthetic: has(AccessFlag::Synthetic),
    }
}

/// Manifests may spell names either `java/lang/String` or `java.lang.String`.
fn normalize_name(name: &str) -> String {
    name.trim().replace('/', ".")
}

impl RawClass {
    fn into_class(self) -> Result<ClassInfo, MetadataError> {
        let name = normalize_name(&self.name);
        let sig_err = |source: SignatureError| MetadataError::Signature { name: name.clone(), source };

        let kind = match self.kind {
            RawKind::Interface | RawKind::Annotation => ClassKind::Interface,
            RawKind::Class | RawKind::Enum => ClassKind::Class,
        };

        let mut fields = Vec::with_capacity(self.fields.len());
        for f in self.fields {
            fields.push(Field {
                ty: parse_field(&f.descriptor).map_err(sig_err)?,
                name: f.name,
                modifiers: modifiers(&f.access),
            });
        }

        let mut methods = Vec::with_capacity(self.methods.len());
        for m in self.methods {
            let (params, ret) = parse_method(&m.descriptor).map_err(sig_err)?;
            methods.push(Method {
                is_bridge: m.access.contains(&AccessFlag::Bridge),
                modifiers: modifiers(&m.access),
                name: m.name,
                params,
                ret,
            });
        }

        let mut constructors = Vec::with_capacity(self.constructors.len());
        for c in self.constructors {
            let (params, _) = parse_method(&c.descriptor).map_err(sig_err)?;
            constructors.push(Constructor { params, modifiers: modifiers(&c.access) });
        }

        // reflection semantics: interfaces have no superclass
        let superclass = match kind {
            ClassKind::Interface => None,
            ClassKind::Class => self.superclass.as_deref().map(normalize_name),
        };

        Ok(ClassInfo {
            interfaces: self.interfaces.iter().map(|i| normalize_name(i)).collect(),
            anonymous: self.anonymous,
            name,
            kind,
            superclass,
            fields,
            methods,
            constructors,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PROVIDER
// ————————————————————————————————————————————————————————————————————————————

/// Provider over one or more JSON manifests. Entries are decoded up front;
/// an entry that fails to decode stays in the table as its error so the
/// collector can skip it when reached.
#[derive(Debug, Default)]
pub struct ManifestProvider {
    entries: BTreeMap<String, Result<Arc<ClassInfo>, MetadataError>>,
}

impl ManifestProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every archive manifest. `pointer` selects the manifest node inside
    /// each document (e.g. `/data/classes`).
    pub fn open<P: AsRef<Path>>(paths: &[P], pointer: Option<&str>) -> Result<Self, MetadataError> {
        let mut provider = Self::new();
        for path in paths {
            let path = path.as_ref();
            let source = std::fs::read_to_string(path).map_err(|e| MetadataError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let document = crate::path_de::from_str_with_path::<Value>(&source).map_err(|message| {
                MetadataError::Document { path: path.to_path_buf(), message }
            })?;
            provider.add_document(path, document, pointer)?;
        }
        Ok(provider)
    }

    /// In-memory manifest, mostly for tests.
    pub fn from_value(document: Value) -> Result<Self, MetadataError> {
        let mut provider = Self::new();
        provider.add_document(Path::new("<memory>"), document, None)?;
        Ok(provider)
    }

    pub fn add_document(
        &mut self,
        path: &Path,
        mut document: Value,
        pointer: Option<&str>,
    ) -> Result<(), MetadataError> {
        if let Some(pointer) = pointer {
            document = document
                .pointer_mut(pointer)
                .map(Value::take)
                .ok_or_else(|| MetadataError::Pointer {
                    path: path.to_path_buf(),
                    pointer: pointer.to_string(),
                })?;
        }
        let entries = match document {
            Value::Array(xs) => xs,
            Value::Object(mut map) => match map.remove("classes") {
                Some(Value::Array(xs)) => xs,
                _ => {
                    return Err(MetadataError::Document {
                        path: path.to_path_buf(),
                        message: "expected a `classes` array".to_string(),
                    })
                }
            },
            _ => {
                return Err(MetadataError::Document {
                    path: path.to_path_buf(),
                    message: "expected an array of classes or an object with `classes`".to_string(),
                })
            }
        };
        for (index, entry) in entries.into_iter().enumerate() {
            self.add_entry(path, index, entry);
        }
        Ok(())
    }

    fn add_entry(&mut self, path: &Path, index: usize, entry: Value) {
        let Some(name) = entry.get("name").and_then(Value::as_str).map(normalize_name) else {
            log::warn!("{}: class entry #{index} has no name, skipped", path.display());
            return;
        };
        if self.entries.contains_key(&name) {
            log::debug!("{}: duplicate class `{name}` ignored", path.display());
            return;
        }
        let loaded = crate::path_de::from_value_with_path::<RawClass>(entry)
            .map_err(|message| MetadataError::Unloadable { name: name.clone(), message })
            .and_then(RawClass::into_class)
            .map(Arc::new);
        self.entries.insert(name, loaded);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataProvider for ManifestProvider {
    fn type_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn load(&self, name: &str) -> Result<Arc<ClassInfo>, MetadataError> {
        match self.entries.get(name) {
            Some(entry) => entry.clone(),
            None => Err(MetadataError::Missing(name.to_string())),
        }
    }
}

/// Source paths for an archive argument: `;`-separated list of paths.
pub fn split_archive_list(arg: &str) -> Vec<PathBuf> {
    arg.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Primitive, TypeRef};
    use serde_json::json;

    #[test]
    fn decodes_classes_members_and_flags() {
        let provider = ManifestProvider::from_value(json!({
            "classes": [{
                "name": "pkg/A",
                "super": "java/lang/Object",
                "interfaces": ["java.lang.Runnable"],
                "fields": [
                    { "name": "MAX", "descriptor": "I", "access": ["public", "static", "final"] }
                ],
                "methods": [
                    { "name": "run", "descriptor": "()V", "access": ["public"] },
                    { "name": "get", "descriptor": "()Ljava/lang/Object;", "access": ["public", "bridge", "synthetic"] }
                ],
                "constructors": [
                    { "descriptor": "(ILjava/lang/String;)V", "access": ["protected"] }
                ]
            }]
        }))
        .unwrap();

        assert_eq!(provider.type_names(), vec!["pkg.A".to_string()]);
        let a = provider.load("pkg.A").unwrap();
        assert_eq!(a.superclass.as_deref(), Some("java.lang.Object"));
        assert_eq!(a.interfaces, vec!["java.lang.Runnable".to_string()]);
        assert!(a.fields[0].modifiers.is_static_final());
        assert_eq!(a.fields[0].ty, TypeRef::Primitive(Primitive::Int));
        assert!(a.methods[1].is_bridge);
        assert!(a.methods[1].modifiers.is_synthetic);
        assert_eq!(a.constructors[0].modifiers.visibility, Visibility::Protected);
        assert_eq!(a.constructors[0].params.len(), 2);
    }

    #[test]
    fn interfaces_lose_their_superclass() {
        let provider = ManifestProvider::from_value(json!([
            { "name": "pkg.I", "kind": "interface", "super": "java.lang.Object" }
        ]))
        .unwrap();
        let i = provider.load("pkg.I").unwrap();
        assert!(i.is_interface());
        assert!(i.superclass.is_none());
    }

    #[test]
    fn broken_entries_are_unloadable_not_fatal() {
        let provider = ManifestProvider::from_value(json!([
            { "name": "pkg.Good" },
            { "name": "pkg.Bad", "fields": [{ "name": "x" }] },
            { "name": "pkg.Weird", "fields": [{ "name": "x", "descriptor": "Q" }] }
        ]))
        .unwrap();
        assert_eq!(provider.len(), 3);
        assert!(provider.load("pkg.Good").is_ok());

        let bad = provider.load("pkg.Bad").unwrap_err();
        assert!(matches!(bad, MetadataError::Unloadable { .. }));
        assert!(!bad.is_fatal());

        let weird = provider.load("pkg.Weird").unwrap_err();
        assert!(weird.is_fatal(), "unknown primitive is a contract violation");

        assert!(matches!(provider.load("pkg.Nope"), Err(MetadataError::Missing(_))));
    }

    #[test]
    fn first_definition_wins() {
        let mut provider = ManifestProvider::new();
        provider
            .add_document(Path::new("a.json"), json!([{ "name": "pkg.A", "kind": "interface" }]), None)
            .unwrap();
        provider
            .add_document(Path::new("b.json"), json!([{ "name": "pkg.A" }]), None)
            .unwrap();
        assert!(provider.load("pkg.A").unwrap().is_interface());
    }

    #[test]
    fn json_pointer_selects_the_manifest() {
        let mut provider = ManifestProvider::new();
        let doc = json!({ "data": { "dump": [{ "name": "pkg.A" }] } });
        provider.add_document(Path::new("x.json"), doc.clone(), Some("/data/dump")).unwrap();
        assert_eq!(provider.len(), 1);

        let err = provider.add_document(Path::new("x.json"), doc, Some("/nope")).unwrap_err();
        assert!(matches!(err, MetadataError::Pointer { .. }));
    }

    #[test]
    fn open_reads_files_and_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"classes": [{"name": "pkg.A"}]}"#).unwrap();
        let provider = ManifestProvider::open(&[&good], None).unwrap();
        assert_eq!(provider.type_names(), vec!["pkg.A".to_string()]);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let err = ManifestProvider::open(&[&broken], None).unwrap_err();
        assert!(matches!(err, MetadataError::Document { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn archive_lists_split_on_semicolons() {
        assert_eq!(
            split_archive_list("a.json; b.json;;"),
            vec![PathBuf::from("a.json"), PathBuf::from("b.json")]
        );
    }
}
