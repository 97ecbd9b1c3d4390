//! Native implementations of managed interfaces.
//!
//! Each interface gets a nested `__Proxy` with one pure virtual per valid
//! instance method, and a `__TryInvoke` that the bridge runtime calls for every
//! managed-side invocation. Dispatch goes through a method-id table filled
//! exactly once; `__TryInvoke` declines (returns false) for other interfaces so
//! several proxies can be chained on one object.
use std::fmt::Write as _;

use super::{param_list, TypeView};
use crate::model::{Method, TypeRef};
use crate::naming;
use crate::signature;

const TRY_INVOKE_PARAMS: &str =
    "jclass clazz, jmethodID methodID, jobjectArray args, bool* success, jobject* result";

pub(crate) fn declare(out: &mut String, view: &TypeView<'_>) {
    if !view.class.is_interface() {
        return;
    }
    out.push_str("\tstruct __Proxy : public virtual ::jni::ProxyInvoker\n\t{\n");
    let _ = writeln!(out, "\t\tbool __TryInvoke({TRY_INVOKE_PARAMS});");
    for method in view.members.instance_methods() {
        let _ = writeln!(
            out,
            "\t\tvirtual {} {}({}) = 0;",
            naming::return_name(method.ret.as_ref()),
            naming::method_name(method, &view.class.name),
            param_list(&method.params),
        );
    }
    out.push_str("\t};\n");
}

pub(crate) fn implement(out: &mut String, view: &TypeView<'_>) {
    if !view.class.is_interface() {
        return;
    }
    let owner = &view.simple;
    let methods = view.members.instance_methods();

    let _ = write!(out, "bool {owner}::__Proxy::__TryInvoke({TRY_INVOKE_PARAMS})\n{{\n");
    out.push_str("\tif (*success)\n\t\treturn false;\n\n");
    let _ = write!(out, "\tif (!jni::IsSameObject(clazz, {owner}::__CLASS))\n\t\treturn false;\n\n");

    if methods.is_empty() {
        out.push_str("\treturn false;\n}\n");
        return;
    }

    let _ = writeln!(out, "\tstatic jmethodID methodIDs[{}];", methods.len());
    out.push_str("\tstatic std::atomic<bool> methodIDsReady(false);\n");
    out.push_str("\tstatic std::once_flag methodIDsOnce;\n");
    out.push_str("\tif (!methodIDsReady.load(std::memory_order_acquire))\n\t{\n");
    out.push_str("\t\tstd::call_once(methodIDsOnce, []\n\t\t{\n");
    for (i, method) in methods.iter().enumerate() {
        let _ = writeln!(
            out,
            "\t\t\tmethodIDs[{i}] = jni::GetMethodID({owner}::__CLASS, \"{}\", \"{}\");",
            method.name,
            signature::method_signature(&method.params, method.ret.as_ref()),
        );
    }
    out.push_str("\t\t\tstd::atomic_thread_fence(std::memory_order_release);\n");
    out.push_str("\t\t\tmethodIDsReady.store(true, std::memory_order_release);\n");
    out.push_str("\t\t});\n\t}\n");

    for (i, method) in methods.iter().enumerate() {
        let _ = write!(out, "\tif (methodIDs[{i}] == methodID)\n\t{{\n");
        dispatch(out, view, method);
        out.push_str("\t\t*success = true;\n\t\treturn true;\n\t}\n");
    }
    out.push_str("\treturn false;\n}\n");
}

fn dispatch(out: &mut String, view: &TypeView<'_>, method: &Method) {
    let args = method
        .params
        .iter()
        .enumerate()
        .map(|(k, ty)| unbox(ty, k))
        .collect::<Vec<_>>()
        .join(", ");
    let call = format!("{}({args})", naming::method_name(method, &view.class.name));

    match &method.ret {
        None => {
            let _ = writeln!(out, "\t\t{call};");
            out.push_str("\t\t*result = NULL;\n");
        }
        Some(TypeRef::Primitive(p)) => {
            let _ = writeln!(
                out,
                "\t\t*result = jni::NewLocalRef(static_cast<jobject>({}::{}({call})));",
                naming::class_full_name(p.boxed()),
                naming::method_identifier("valueOf", p.boxed()),
            );
        }
        Some(_) => {
            let _ = writeln!(out, "\t\t*result = jni::NewLocalRef(static_cast<jobject>({call}));");
        }
    }
}

/// Argument `k` of the managed call, converted to the native parameter type.
fn unbox(ty: &TypeRef, k: usize) -> String {
    let element = format!("jni::GetObjectArrayElement(args, {k})");
    match ty {
        TypeRef::Primitive(p) => format!(
            "{}({element}).{}()",
            naming::class_full_name(p.boxed()),
            naming::method_identifier(&p.unbox_method(), p.boxed()),
        ),
        other => format!("{}({element})", naming::full_name(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::bindings;
    use crate::model::Primitive;
    use crate::template::NoTemplates;
    use serde_json::{json, Value};

    fn listener() -> Value {
        json!([
            { "name": "pkg.Listener", "kind": "interface",
              "methods": [
                { "name": "onEvent", "descriptor": "(ILjava/lang/String;)V", "access": ["public", "abstract"] },
                { "name": "count", "descriptor": "()I", "access": ["public", "abstract"] },
                { "name": "name", "descriptor": "()Ljava/lang/String;", "access": ["public", "abstract"] },
                { "name": "create", "descriptor": "()Lpkg/Listener;", "access": ["public", "static"] }
              ] },
            { "name": "java.lang.String" }
        ])
    }

    #[test]
    fn one_pure_virtual_per_table_slot() {
        let b = bindings(listener(), &["::pkg::Listener"], &NoTemplates);
        let h = &b.header.contents;
        assert!(h.contains("\tstruct __Proxy : public virtual ::jni::ProxyInvoker\n\t{\n"));
        let virtuals = h.matches(") = 0;").count();
        assert_eq!(virtuals, 3, "the static factory is not part of the proxy");
        assert!(h.contains("\t\tvirtual ::jint Count() = 0;\n"));
        assert!(h.contains("\t\tvirtual ::jvoid OnEvent(const ::jint& arg0, const ::java::lang::String& arg1) = 0;\n"));

        let unit = &b.unit("pkg.Listener.cpp").unwrap().contents;
        assert!(unit.contains("static jmethodID methodIDs[3];"));
        assert_eq!(unit.matches("methodIDs[").count() - 1, 2 * virtuals);
    }

    #[test]
    fn dispatch_table_is_filled_once_and_published() {
        let b = bindings(listener(), &["::pkg::Listener"], &NoTemplates);
        let unit = &b.unit("pkg.Listener.cpp").unwrap().contents;
        assert!(unit.starts_with("#include \"API.h\"\n#include <atomic>\n#include <mutex>\n"));
        assert!(unit.contains(
            "bool Listener::__Proxy::__TryInvoke(jclass clazz, jmethodID methodID, jobjectArray args, bool* success, jobject* result)\n{\n\tif (*success)\n\t\treturn false;\n"
        ));
        assert!(unit.contains("\tif (!jni::IsSameObject(clazz, Listener::__CLASS))\n\t\treturn false;\n"));
        let acquire = unit.find("methodIDsReady.load(std::memory_order_acquire)").unwrap();
        let fill = unit.find("methodIDs[0] = jni::GetMethodID(Listener::__CLASS, \"count\", \"()I\");").unwrap();
        let fence = unit.find("std::atomic_thread_fence(std::memory_order_release);").unwrap();
        let publish = unit.find("methodIDsReady.store(true, std::memory_order_release);").unwrap();
        assert!(acquire < fill && fill < fence && fence < publish);
        assert!(unit.contains("std::call_once(methodIDsOnce, []"));
    }

    #[test]
    fn arguments_are_unboxed_and_results_boxed() {
        let b = bindings(listener(), &["::pkg::Listener"], &NoTemplates);
        let unit = &b.unit("pkg.Listener.cpp").unwrap().contents;
        assert!(unit.contains(
            "\t\tOnEvent(::java::lang::Integer(jni::GetObjectArrayElement(args, 0)).IntValue(), ::java::lang::String(jni::GetObjectArrayElement(args, 1)));\n\t\t*result = NULL;\n"
        ));
        assert!(unit.contains(
            "\t\t*result = jni::NewLocalRef(static_cast<jobject>(::java::lang::Integer::ValueOf(Count())));\n"
        ));
        assert!(unit.contains("\t\t*result = jni::NewLocalRef(static_cast<jobject>(Name()));\n"));
    }

    #[test]
    fn empty_interface_declines_everything() {
        let b = bindings(json!([{ "name": "pkg.Marker", "kind": "interface" }]), &["::pkg::Marker"], &NoTemplates);
        let unit = &b.unit("pkg.Marker.cpp").unwrap().contents;
        assert!(!unit.contains("methodIDs"));
        assert!(unit.contains("\t\treturn false;\n\n\treturn false;\n}\n"));
    }

    #[test]
    fn classes_get_no_proxy() {
        let b = bindings(json!([{ "name": "pkg.Plain" }]), &["::pkg::Plain"], &NoTemplates);
        assert!(!b.header.contents.contains("__Proxy"));
        assert!(!b.unit("pkg.Plain.cpp").unwrap().contents.contains("__TryInvoke"));
    }

    #[test]
    fn unbox_uses_the_wrapper_accessor() {
        assert_eq!(
            unbox(&TypeRef::Primitive(Primitive::Boolean), 2),
            "::java::lang::Boolean(jni::GetObjectArrayElement(args, 2)).BooleanValue()"
        );
        assert_eq!(
            unbox(&TypeRef::array_of(TypeRef::Primitive(Primitive::Int)), 0),
            "::jni::Array< ::jint >(jni::GetObjectArrayElement(args, 0))"
        );
    }
}
