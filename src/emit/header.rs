//! The declaration document.
use std::fmt::Write as _;
use std::sync::Arc;

use super::proxy;
use super::scope::NamespaceScope;
use super::{arg_names, const_suffix, param_list, static_prefix, EmitOptions, TypeView};
use crate::model::ClassInfo;
use crate::naming;

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

/// Forward declarations for `forward` (visited order), then one struct per
/// `chain` entry (chain order), all through one namespace state machine.
pub(crate) fn render(forward: &[&Arc<ClassInfo>], chain: &[TypeView<'_>], options: &EmitOptions) -> String {
    let mut out = String::new();
    out.push_str("#pragma once\n");
    let _ = writeln!(out, "#include \"{}\"", options.helper_include);

    let mut scope = NamespaceScope::new();
    for class in forward {
        scope.enter(&mut out, &naming::class_namespace(&class.name));
        let _ = writeln!(out, "struct {};", naming::class_simple_name(&class.name));
    }
    for view in chain {
        scope.enter(&mut out, &view.namespace);
        declare_class(&mut out, view);
    }
    scope.close(&mut out);
    out
}

fn declare_class(out: &mut String, view: &TypeView<'_>) {
    let _ = write!(out, "struct {} : {}\n{{\n", view.simple, view.super_name);
    out.push_str("\tstatic jni::Class __CLASS;\n\n");

    // conversion operators instead of multiple inheritance
    for iface in &view.interfaces {
        let _ = writeln!(out, "\toperator {}();", naming::class_full_name(iface));
    }

    declare_members(out, view);
    proxy::declare(out, view);

    if let Some(declaration) = &view.overlay.declaration {
        let _ = writeln!(out, "{declaration}");
        out.push_str("private:\n");
        out.push_str("\tvoid __Initialize();\n");
    }
    out.push('\n');
    out.push_str("};\n\n");
}

fn declare_members(out: &mut String, view: &TypeView<'_>) {
    let owner = &view.class.name;
    let hook = view.init_hook();

    for field in &view.members.fields {
        let m = &field.modifiers;
        let ty = naming::full_name(&field.ty);
        let name = naming::field_name(field, owner);
        let _ = writeln!(
            out,
            "\t{}{}{} {}(){};",
            static_prefix(m.is_static),
            ty,
            if m.is_static_final() { "&" } else { "" },
            name,
            const_suffix(m.is_static),
        );
        if !m.is_final {
            let _ = writeln!(
                out,
                "\t{}void {}(const {}& arg0){};",
                static_prefix(m.is_static),
                name,
                ty,
                const_suffix(m.is_static),
            );
        }
    }

    for method in &view.members.methods {
        let m = &method.modifiers;
        let _ = writeln!(
            out,
            "\t{}{} {}({}){};",
            static_prefix(m.is_static),
            naming::return_name(method.ret.as_ref()),
            naming::method_name(method, owner),
            param_list(&method.params),
            const_suffix(m.is_static),
        );
    }

    for ctor in &view.members.constructors {
        let params = param_list(&ctor.params);
        let _ = writeln!(out, "\tstatic jobject __Constructor({params});");
        let _ = writeln!(
            out,
            "\t{}({}) : {}(__Constructor({})) {{{}}}",
            view.simple,
            params,
            view.super_name,
            arg_names(ctor.params.len()),
            hook,
        );
    }

    let _ = writeln!(out, "\texplicit {}(jobject o) : {}(o) {{{}}}", view.simple, view.super_name, hook);
    let _ = writeln!(
        out,
        "\t{}(const {}& o) : {}(o) {{{}}}",
        view.simple, view.simple, view.super_name, hook
    );
}
