//! Generate C++ JNI bindings for a closure of JVM classes.
//!
//! Pipeline: metadata manifests → closure (chain + visited) → declaration
//! document and per-class implementation units → files.
pub mod error;
pub mod model;
pub mod signature;
pub mod naming;
pub mod metadata;
pub mod path_de;
pub mod closure;
pub mod template;
pub mod emit;
pub mod output;
pub mod report;
pub mod cli;

pub use error::Error;
