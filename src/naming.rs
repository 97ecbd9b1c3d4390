//! JVM names → C++ names, plus the rules deciding which members get bindings.
//!
//! Every function is pure: the same descriptor maps to the same text for the
//! whole run, which the emitter relies on when it keys cached lookups by name.
use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::model::{
    binary_simple_name, package_of, ClassInfo, Constructor, Field, Member, Method, TypeRef,
    Visibility,
};
use crate::signature::overload_key;

/// Prefix used to step around keywords and self-collisions.
const ESCAPE: char = 'x';

/// Namespace holding the array wrapper and the root object type.
pub const BRIDGE_NAMESPACE: &str = "::jni";

/// Base of every generated type without a superclass.
pub const ROOT_OBJECT: &str = "jni::Object";

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // C++ keywords
        "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool",
        "break", "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class",
        "compl", "concept", "const", "consteval", "constexpr", "constinit", "const_cast",
        "continue", "co_await", "co_return", "co_yield", "decltype", "default", "delete",
        "do", "double", "dynamic_cast", "else", "enum", "explicit", "export", "extern",
        "false", "float", "for", "friend", "goto", "if", "inline", "int", "long", "mutable",
        "namespace", "new", "noexcept", "not", "not_eq", "nullptr", "operator", "or",
        "or_eq", "private", "protected", "public", "register", "reinterpret_cast",
        "requires", "return", "short", "signed", "sizeof", "static", "static_assert",
        "static_cast", "struct", "switch", "template", "this", "thread_local", "throw",
        "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
        "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
        // platform macros that break real builds
        "Assert", "NULL", "EOF", "errno", "stdin", "stdout", "stderr", "DOMAIN",
    ]
    .into_iter()
    .collect()
});

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(name)
}

pub fn escape_keyword(name: &str) -> String {
    let mut out = name.to_string();
    while is_reserved(&out) {
        out.insert(0, ESCAPE);
    }
    out
}

/// Collision rule for members: a member named like its class would read as a
/// constructor, so it gets the escape prefix before the keyword pass.
fn safe_member(name: String, declaring_class: &str) -> String {
    let name = if name == class_simple_name(declaring_class) {
        format!("{ESCAPE}{name}")
    } else {
        name
    };
    escape_keyword(&name)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ------------------------------- Types ----------------------------------- //

/// `java.util.Map$Entry` → `Map_Entry`.
pub fn class_simple_name(name: &str) -> String {
    escape_keyword(&binary_simple_name(name).replace('$', "_"))
}

/// `java.util.Map$Entry` → `::java::util`.
pub fn class_namespace(name: &str) -> String {
    package_of(name)
        .split('.')
        .filter(|seg| !seg.is_empty())
        .map(|seg| format!("::{}", escape_keyword(seg)))
        .collect()
}

/// `java.util.Map$Entry` → `::java::util::Map_Entry`. Patterns match this form.
pub fn class_full_name(name: &str) -> String {
    format!("{}::{}", class_namespace(name), class_simple_name(name))
}

pub fn simple_name(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive(p) => format!("j{}", p.name()),
        TypeRef::Array(elem) => format!("Array< {} >", full_name(elem)),
        TypeRef::Class(name) => class_simple_name(name),
    }
}

pub fn namespace(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive(_) => String::new(),
        TypeRef::Array(_) => BRIDGE_NAMESPACE.to_string(),
        TypeRef::Class(name) => class_namespace(name),
    }
}

pub fn full_name(ty: &TypeRef) -> String {
    format!("{}::{}", namespace(ty), simple_name(ty))
}

/// Full name in return position; void is the bridge's `jvoid`.
pub fn return_name(ty: Option<&TypeRef>) -> String {
    ty.map(full_name).unwrap_or_else(|| "::jvoid".to_string())
}

/// Raw JNI type the typed call primitives are instantiated with.
pub fn bridge_type(ty: Option<&TypeRef>) -> String {
    match ty {
        None => "jvoid".to_string(),
        Some(TypeRef::Primitive(p)) => format!("j{}", p.name()),
        Some(TypeRef::Array(_)) => "jarray".to_string(),
        Some(TypeRef::Class(_)) => "jobject".to_string(),
    }
}

/// Slash-separated binary name handed to `FindClass`.
pub fn wire_name(name: &str) -> String {
    name.replace('.', "/")
}

/// Implementation unit file name: canonical name plus `.cpp`.
pub fn unit_file_name(name: &str) -> String {
    format!("{}.cpp", name.replace('$', "."))
}

// ------------------------------ Members ---------------------------------- //

pub fn method_name(method: &Method, declaring_class: &str) -> String {
    method_identifier(&method.name, declaring_class)
}

/// Mapped name for a JVM method name, e.g. `valueOf` on a boxed wrapper.
pub fn method_identifier(name: &str, declaring_class: &str) -> String {
    safe_member(capitalize(&name.replace('$', "_")), declaring_class)
}

pub fn field_name(field: &Field, declaring_class: &str) -> String {
    safe_member(
        format!("f{}", capitalize(&field.name.replace('$', "_"))),
        declaring_class,
    )
}

fn visible(member: &Member<'_>) -> bool {
    let m = member.modifiers();
    matches!(m.visibility, Visibility::Public | Visibility::Protected) && !m.is_synthetic
}

pub fn is_valid_field(field: &Field) -> bool {
    visible(&Member::Field(field))
}

pub fn is_valid_method(method: &Method) -> bool {
    visible(&Member::Method(method)) && !method.is_bridge
}

/// The single-argument copy-from-self constructor is reserved for the
/// generated copy constructor.
pub fn is_valid_constructor(ctor: &Constructor, class: &ClassInfo) -> bool {
    let copy_from_self = matches!(
        ctor.params.as_slice(),
        [TypeRef::Class(name)] if *name == class.name
    );
    visible(&Member::Constructor(ctor)) && !copy_from_self
}

/// Emission-valid declared members, each kind sorted by (name, signature).
#[derive(Debug, Clone)]
pub struct ValidMembers<'a> {
    pub fields: Vec<&'a Field>,
    pub methods: Vec<&'a Method>,
    pub constructors: Vec<&'a Constructor>,
}

impl<'a> ValidMembers<'a> {
    pub fn of(class: &'a ClassInfo) -> Self {
        let mut fields: Vec<&Field> = class.fields.iter().filter(|f| is_valid_field(f)).collect();
        let mut methods: Vec<&Method> =
            class.methods.iter().filter(|m| is_valid_method(m)).collect();
        let mut constructors: Vec<&Constructor> = class
            .constructors
            .iter()
            .filter(|c| is_valid_constructor(c, class))
            .collect();
        fields.sort_by_cached_key(|f| overload_key(&Member::Field(*f)));
        methods.sort_by_cached_key(|m| overload_key(&Member::Method(*m)));
        constructors.sort_by_cached_key(|c| overload_key(&Member::Constructor(*c)));
        Self { fields, methods, constructors }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Member<'a>) -> bool) {
        self.fields.retain(|f| keep(&Member::Field(*f)));
        self.methods.retain(|m| keep(&Member::Method(*m)));
        self.constructors.retain(|c| keep(&Member::Constructor(*c)));
    }

    /// Members in traversal order: fields, methods, constructors.
    pub fn iter(&self) -> impl Iterator<Item = Member<'a>> + '_ {
        self.fields
            .iter()
            .map(|f| Member::Field(*f))
            .chain(self.methods.iter().map(|m| Member::Method(*m)))
            .chain(self.constructors.iter().map(|c| Member::Constructor(*c)))
    }

    /// Methods a native proxy must implement.
    pub fn instance_methods(&self) -> Vec<&'a Method> {
        self.methods
            .iter()
            .copied()
            .filter(|m| !m.modifiers.is_static)
            .collect()
    }
}
