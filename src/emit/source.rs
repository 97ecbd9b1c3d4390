//! Implementation units, one per visited type.
use std::fmt::Write as _;

use super::proxy;
use super::scope::NamespaceScope;
use super::{const_suffix, jni_args, jni_value, param_list, EmitOptions, TypeView};
use crate::model::{Constructor, Field, Method};
use crate::naming;
use crate::signature;

pub(crate) fn render(view: &TypeView<'_>, options: &EmitOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#include \"{}\"", options.header_name);
    if view.class.is_interface() {
        out.push_str("#include <atomic>\n#include <mutex>\n");
    }

    let mut scope = NamespaceScope::new();
    scope.enter(&mut out, &view.namespace);

    let _ = write!(
        out,
        "jni::Class {}::__CLASS(\"{}\");\n\n",
        view.simple,
        naming::wire_name(&view.class.name)
    );
    for iface in &view.interfaces {
        let full = naming::class_full_name(iface);
        let _ = writeln!(out, "{}::operator {full}() {{ return {full}((jobject)*this); }}", view.simple);
    }

    for field in &view.members.fields {
        implement_getter(&mut out, view, field);
        if !field.modifiers.is_final {
            implement_setter(&mut out, view, field);
        }
    }
    for method in &view.members.methods {
        implement_method(&mut out, view, method);
    }
    for ctor in &view.members.constructors {
        implement_constructor(&mut out, view, ctor);
    }
    proxy::implement(&mut out, view);

    if let Some(definition) = &view.overlay.definition {
        let _ = writeln!(out, "{definition}");
    }
    scope.close(&mut out);
    out
}

// ————————————————————————————————————————————————————————————————————————————
// MEMBERS
// ————————————————————————————————————————————————————————————————————————————

fn field_id(out: &mut String, field: &Field) {
    let _ = writeln!(
        out,
        "\tstatic jfieldID fieldID = jni::Get{}FieldID(__CLASS, \"{}\", \"{}\");",
        if field.modifiers.is_static { "Static" } else { "" },
        field.name,
        signature::signature(&field.ty),
    );
}

/// Receiver handed to the bridge: the class for statics, the wrapped handle otherwise.
fn target(is_static: bool) -> &'static str {
    if is_static { "__CLASS" } else { "m_Object" }
}

fn static_infix(is_static: bool) -> &'static str {
    if is_static { "Static" } else { "" }
}

fn implement_getter(out: &mut String, view: &TypeView<'_>, field: &Field) {
    let m = &field.modifiers;
    let ty = naming::full_name(&field.ty);
    let _ = write!(
        out,
        "{}{} {}::{}(){}\n{{\n",
        ty,
        if m.is_static_final() { "&" } else { "" },
        view.simple,
        naming::field_name(field, &view.class.name),
        const_suffix(m.is_static),
    );
    field_id(out, field);
    // static finals are read once and handed out by reference
    let _ = writeln!(
        out,
        "\t{}{ty} val = {ty}(jni::Op<{}>::Get{}Field({}, fieldID));",
        if m.is_static_final() { "static " } else { "" },
        naming::bridge_type(Some(&field.ty)),
        static_infix(m.is_static),
        target(m.is_static),
    );
    out.push_str("\treturn val;\n}\n");
}

fn implement_setter(out: &mut String, view: &TypeView<'_>, field: &Field) {
    let m = &field.modifiers;
    let bridge = if field.ty.is_primitive() {
        naming::bridge_type(Some(&field.ty))
    } else {
        "jobject".to_string()
    };
    let _ = write!(
        out,
        "void {}::{}(const {}& arg0){}\n{{\n",
        view.simple,
        naming::field_name(field, &view.class.name),
        naming::full_name(&field.ty),
        const_suffix(m.is_static),
    );
    field_id(out, field);
    let _ = writeln!(
        out,
        "\tjni::Op<{bridge}>::Set{}Field({}, fieldID, {});",
        static_infix(m.is_static),
        target(m.is_static),
        jni_value(&field.ty, "arg0"),
    );
    out.push_str("}\n");
}

fn implement_method(out: &mut String, view: &TypeView<'_>, method: &Method) {
    let m = &method.modifiers;
    let ret = naming::return_name(method.ret.as_ref());
    let _ = write!(
        out,
        "{ret} {}::{}({}){}\n{{\n",
        view.simple,
        naming::method_name(method, &view.class.name),
        param_list(&method.params),
        const_suffix(m.is_static),
    );
    let _ = writeln!(
        out,
        "\tstatic jmethodID methodID = jni::Get{}MethodID(__CLASS, \"{}\", \"{}\");",
        static_infix(m.is_static),
        method.name,
        signature::method_signature(&method.params, method.ret.as_ref()),
    );
    let _ = writeln!(
        out,
        "\treturn {ret}(jni::Op<{}>::Call{}Method({}, methodID{}));",
        naming::bridge_type(method.ret.as_ref()),
        static_infix(m.is_static),
        target(m.is_static),
        jni_args(&method.params),
    );
    out.push_str("}\n");
}

fn implement_constructor(out: &mut String, view: &TypeView<'_>, ctor: &Constructor) {
    let _ = write!(
        out,
        "jobject {}::__Constructor({})\n{{\n",
        view.simple,
        param_list(&ctor.params)
    );
    let _ = writeln!(
        out,
        "\tstatic jmethodID constructorID = jni::GetMethodID(__CLASS, \"<init>\", \"{}\");",
        signature::constructor_signature(&ctor.params),
    );
    let _ = writeln!(out, "\treturn jni::NewObject(__CLASS, constructorID{});", jni_args(&ctor.params));
    out.push_str("}\n");
}
