// Typed view of JVM class metadata. No serde_json::Value here.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ];

    /// Java source name (`int`, `boolean`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Binary name of the boxed wrapper class.
    pub fn boxed(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Char => "java.lang.Character",
            Primitive::Short => "java.lang.Short",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
        }
    }

    /// Name of the wrapper's unboxing accessor (`intValue`, ...).
    pub fn unbox_method(self) -> String {
        format!("{}Value", self.name())
    }
}

/// Reference to a type as it appears in a member signature.
/// `void` is not a type here: an absent return type means void.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Primitive(Primitive),
    Array(Box<TypeRef>),
    /// Binary name, e.g. `java.util.Map$Entry`.
    Class(String),
}

impl TypeRef {
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class(name.into())
    }

    pub fn array_of(elem: TypeRef) -> Self {
        TypeRef::Array(Box::new(elem))
    }

    /// Innermost element type after unwrapping every array level.
    pub fn innermost(&self) -> &TypeRef {
        let mut ty = self;
        while let TypeRef::Array(elem) = ty {
            ty = elem;
        }
        ty
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// The class name this reference resolves to once arrays are unwrapped.
    pub fn class_name(&self) -> Option<&str> {
        match self.innermost() {
            TypeRef::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.name()),
            TypeRef::Array(elem) => write!(f, "{elem}[]"),
            TypeRef::Class(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_synthetic: bool,
}

impl Modifiers {
    pub fn is_static_final(&self) -> bool {
        self.is_static && self.is_final
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub params: Vec<TypeRef>,
    /// `None` is void.
    pub ret: Option<TypeRef>,
    pub modifiers: Modifiers,
    /// Compiler-generated covariant-return forwarder.
    pub is_bridge: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub params: Vec<TypeRef>,
    pub modifiers: Modifiers,
}

/// A loaded class or interface. Members are the declared ones only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassInfo {
    pub name: String,
    pub kind: ClassKind,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub anonymous: bool,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub constructors: Vec<Constructor>,
}

impl ClassInfo {
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Dotted package path; empty for the default package.
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    /// `package-info`/`module-info` and anonymous classes never get bindings.
    pub fn is_bindable(&self) -> bool {
        !self.anonymous && !is_anonymous_name(&self.name) && !is_platform_internal(&self.name)
    }
}

/// Closed set of member kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'a> {
    Field(&'a Field),
    Method(&'a Method),
    Constructor(&'a Constructor),
}

impl<'a> Member<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Member::Field(f) => &f.name,
            Member::Method(m) => &m.name,
            Member::Constructor(_) => "<init>",
        }
    }

    pub fn modifiers(&self) -> &'a Modifiers {
        match self {
            Member::Field(f) => &f.modifiers,
            Member::Method(m) => &m.modifiers,
            Member::Constructor(c) => &c.modifiers,
        }
    }

    /// Types mentioned by the member, in signature order (params, then return).
    pub fn referenced_types(&self) -> Vec<&'a TypeRef> {
        match self {
            Member::Field(f) => vec![&f.ty],
            Member::Method(m) => m.params.iter().chain(m.ret.as_ref()).collect(),
            Member::Constructor(c) => c.params.iter().collect(),
        }
    }
}

pub fn package_of(name: &str) -> &str {
    name.rfind('.').map(|i| &name[..i]).unwrap_or("")
}

/// Last dotted segment, nested separators untouched (`Outer$Inner`).
pub fn binary_simple_name(name: &str) -> &str {
    name.rfind('.').map(|i| &name[i + 1..]).unwrap_or(name)
}

/// `Outer$1` and `Outer$1Local` style names are anonymous or local classes.
pub fn is_anonymous_name(name: &str) -> bool {
    binary_simple_name(name)
        .split('$')
        .skip(1)
        .any(|seg| seg.starts_with(|c: char| c.is_ascii_digit()))
}

pub fn is_platform_internal(name: &str) -> bool {
    matches!(binary_simple_name(name), "package-info" | "module-info")
}
