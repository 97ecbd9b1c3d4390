//! Wire-level descriptor grammar (`I`, `[Ljava/lang/String;`, `(IZ)V`).
//!
//! Encoding is total over `TypeRef`. Decoding is used when reading metadata
//! manifests and rejects anything that is not a well-formed descriptor.
use crate::error::SignatureError;
use crate::model::{Member, Primitive, TypeRef};

pub fn primitive_code(p: Primitive) -> char {
    match p {
        Primitive::Boolean => 'Z',
        Primitive::Byte => 'B',
        Primitive::Char => 'C',
        Primitive::Short => 'S',
        Primitive::Int => 'I',
        Primitive::Long => 'J',
        Primitive::Float => 'F',
        Primitive::Double => 'D',
    }
}

fn primitive_from_code(c: char) -> Option<Primitive> {
    Primitive::ALL.into_iter().find(|p| primitive_code(*p) == c)
}

pub fn signature(ty: &TypeRef) -> String {
    let mut out = String::new();
    write_signature(&mut out, ty);
    out
}

fn write_signature(out: &mut String, ty: &TypeRef) {
    match ty {
        TypeRef::Primitive(p) => out.push(primitive_code(*p)),
        TypeRef::Array(elem) => {
            out.push('[');
            write_signature(out, elem);
        }
        TypeRef::Class(name) => {
            out.push('L');
            out.push_str(&name.replace('.', "/"));
            out.push(';');
        }
    }
}

/// Return-position signature: `V` for void.
pub fn return_signature(ty: Option<&TypeRef>) -> String {
    ty.map(signature).unwrap_or_else(|| "V".to_string())
}

pub fn method_signature(params: &[TypeRef], ret: Option<&TypeRef>) -> String {
    let mut out = String::from("(");
    for p in params {
        write_signature(&mut out, p);
    }
    out.push(')');
    out.push_str(&return_signature(ret));
    out
}

pub fn constructor_signature(params: &[TypeRef]) -> String {
    method_signature(params, None)
}

pub fn member_signature(member: &Member<'_>) -> String {
    match member {
        Member::Field(f) => signature(&f.ty),
        Member::Method(m) => method_signature(&m.params, m.ret.as_ref()),
        Member::Constructor(c) => constructor_signature(&c.params),
    }
}

/// Overload identity, also the stable sort key for members.
pub fn overload_key(member: &Member<'_>) -> (String, String) {
    (member.name().to_string(), member_signature(member))
}

// ------------------------------- Decoding -------------------------------- //

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn malformed(&self) -> SignatureError {
        SignatureError::Malformed {
            descriptor: self.src.to_string(),
            offset: self.pos,
        }
    }

    fn field_type(&mut self) -> Result<TypeRef, SignatureError> {
        let c = self
            .bump()
            .ok_or_else(|| SignatureError::Truncated(self.src.to_string()))?;
        match c {
            '[' => Ok(TypeRef::array_of(self.field_type()?)),
            'L' => {
                let rest = &self.src[self.pos..];
                let end = rest
                    .find(';')
                    .ok_or_else(|| SignatureError::Truncated(self.src.to_string()))?;
                if end == 0 {
                    return Err(self.malformed());
                }
                let name = rest[..end].replace('/', ".");
                self.pos += end + 1;
                Ok(TypeRef::Class(name))
            }
            'V' => Err(SignatureError::MisplacedVoid(self.src.to_string())),
            c if c.is_ascii_uppercase() => primitive_from_code(c)
                .map(TypeRef::Primitive)
                .ok_or_else(|| SignatureError::UnknownPrimitive(c, self.src.to_string())),
            _ => {
                self.pos -= c.len_utf8();
                Err(self.malformed())
            }
        }
    }
}

/// Decode a field descriptor such as `[Ljava/lang/String;`.
pub fn parse_field(descriptor: &str) -> Result<TypeRef, SignatureError> {
    let mut cur = Cursor::new(descriptor);
    let ty = cur.field_type()?;
    if !cur.at_end() {
        return Err(cur.malformed());
    }
    Ok(ty)
}

/// Decode a method descriptor such as `(ILjava/lang/Object;)V`.
pub fn parse_method(descriptor: &str) -> Result<(Vec<TypeRef>, Option<TypeRef>), SignatureError> {
    let mut cur = Cursor::new(descriptor);
    if cur.bump() != Some('(') {
        return Err(SignatureError::Malformed {
            descriptor: descriptor.to_string(),
            offset: 0,
        });
    }
    let mut params = Vec::new();
    loop {
        match cur.peek() {
            None => return Err(SignatureError::Truncated(descriptor.to_string())),
            Some(')') => {
                cur.bump();
                break;
            }
            Some(_) => params.push(cur.field_type()?),
        }
    }
    let ret = match cur.peek() {
        None => return Err(SignatureError::Truncated(descriptor.to_string())),
        Some('V') => {
            cur.bump();
            None
        }
        Some(_) => Some(cur.field_type()?),
    };
    if !cur.at_end() {
        return Err(cur.malformed());
    }
    Ok((params, ret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constructor, Method, Modifiers};

    #[test]
    fn encodes_every_primitive_with_its_reserved_letter() {
        let letters: String = Primitive::ALL
            .iter()
            .map(|p| signature(&TypeRef::Primitive(*p)))
            .collect();
        assert_eq!(letters, "ZBCSIJFD");
    }

    #[test]
    fn encodes_arrays_and_references() {
        let ty = TypeRef::array_of(TypeRef::array_of(TypeRef::class("java.util.Map$Entry")));
        assert_eq!(signature(&ty), "[[Ljava/util/Map$Entry;");
        assert_eq!(return_signature(None), "V");
    }

    #[test]
    fn method_and_constructor_signatures() {
        let m = Method {
            name: "put".into(),
            params: vec![TypeRef::Primitive(Primitive::Int), TypeRef::class("java.lang.String")],
            ret: Some(TypeRef::Primitive(Primitive::Boolean)),
            modifiers: Modifiers::default(),
            is_bridge: false,
        };
        assert_eq!(member_signature(&Member::Method(&m)), "(ILjava/lang/String;)Z");

        let c = Constructor {
            params: vec![TypeRef::array_of(TypeRef::Primitive(Primitive::Byte))],
            modifiers: Modifiers::default(),
        };
        assert_eq!(member_signature(&Member::Constructor(&c)), "([B)V");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let desc = "(I[JLjava/lang/String;[[Lpkg/A$B;)[Ljava/lang/Object;";
        let (params, ret) = parse_method(desc).unwrap();
        assert_eq!(params.len(), 4);
        assert_eq!(params[3], TypeRef::array_of(TypeRef::array_of(TypeRef::class("pkg.A$B"))));
        assert_eq!(method_signature(&params, ret.as_ref()), desc);
    }

    #[test]
    fn void_return_decodes_to_none() {
        let (params, ret) = parse_method("()V").unwrap();
        assert!(params.is_empty());
        assert!(ret.is_none());
    }

    #[test]
    fn unknown_primitive_is_reported() {
        let err = parse_field("Q").unwrap_err();
        assert_eq!(err, SignatureError::UnknownPrimitive('Q', "Q".into()));
        let err = parse_method("(IQ)V").unwrap_err();
        assert!(matches!(err, SignatureError::UnknownPrimitive('Q', _)));
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        assert!(matches!(parse_field("Ljava/lang/String"), Err(SignatureError::Truncated(_))));
        assert!(matches!(parse_field("II"), Err(SignatureError::Malformed { .. })));
        assert!(matches!(parse_field("V"), Err(SignatureError::MisplacedVoid(_))));
        assert!(matches!(parse_method("I)V"), Err(SignatureError::Malformed { .. })));
        assert!(matches!(parse_method("(I"), Err(SignatureError::Truncated(_))));
        assert!(matches!(parse_field("L;"), Err(SignatureError::Malformed { .. })));
    }
}
