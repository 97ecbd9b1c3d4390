//! Type closure over class metadata.
//!
//! Two mutually recursive walks share one explicit context (`Closure`):
//! - `place` (structural): puts a type in the dependency chain after its
//!   superclass chain. Idempotent.
//! - `expand` (full): places the type, marks it expanded, then expands its
//!   superclass, interfaces and every type its valid members mention.
//!
//! Each node is marked twice (`Placed`, then `Expanded`), which is what stops
//! mutually referencing types from recursing forever: a type already placed
//! but still being expanded is not expanded again.
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, MetadataError};
use crate::metadata::MetadataProvider;
use crate::model::{is_anonymous_name, is_platform_internal, ClassInfo, TypeRef};
use crate::naming::{class_full_name, ValidMembers};

/// Types the proxy runtime boxes arguments through or throws; always bound.
pub const BOOTSTRAP_PATTERNS: &[&str] = &[
    "::java::lang::Boolean",
    "::java::lang::Byte",
    "::java::lang::Character",
    "::java::lang::Short",
    "::java::lang::Integer",
    "::java::lang::Long",
    "::java::lang::Float",
    "::java::lang::Double",
    "::java::lang::Class",
    "::java::lang::NoSuchMethodError",
    "::java::lang::System",
];

// ------------------------------ State ------------------------------------ //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// In the chain as a structural placeholder.
    Placed,
    /// Members expanded; the payload is the expansion ordinal.
    Expanded(usize),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub class: Arc<ClassInfo>,
    pub mark: Mark,
}

/// Traversal context: dependency chain (insertion order = chain order) with a
/// per-node mark standing in for the visited set.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    nodes: IndexMap<String, Node>,
    expanded: usize,
    unresolved: BTreeSet<String>,
    placing: HashSet<String>,
}

impl Closure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every placed type, superclasses first.
    pub fn chain(&self) -> impl Iterator<Item = &Arc<ClassInfo>> {
        self.nodes.values().map(|n| &n.class)
    }

    /// Expanded types in the order their expansion started.
    pub fn visited(&self) -> Vec<&Arc<ClassInfo>> {
        let mut out: Vec<(usize, &Arc<ClassInfo>)> = self
            .nodes
            .values()
            .filter_map(|n| match n.mark {
                Mark::Expanded(ordinal) => Some((ordinal, &n.class)),
                Mark::Placed => None,
            })
            .collect();
        out.sort_by_key(|(ordinal, _)| *ordinal);
        out.into_iter().map(|(_, class)| class).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ClassInfo>> {
        self.nodes.get(name).map(|n| &n.class)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.nodes.get_index_of(name)
    }

    pub fn is_visited(&self, name: &str) -> bool {
        matches!(self.nodes.get(name), Some(Node { mark: Mark::Expanded(_), .. }))
    }

    /// Names that were referenced but could not be loaded.
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether every class a reference mentions made it into the chain.
    pub fn is_resolved(&self, ty: &TypeRef) -> bool {
        ty.class_name().is_none_or(|name| self.contains(name))
    }

    /// Valid members of `class` whose types are all bound. Members mentioning
    /// an unavailable type are neither traversed nor emitted.
    pub fn members_of<'c>(&self, class: &'c ClassInfo) -> ValidMembers<'c> {
        let mut members = ValidMembers::of(class);
        members.retain(|member| member.referenced_types().into_iter().all(|ty| self.is_resolved(ty)));
        members
    }

    /// Declared interfaces that made it into the chain.
    pub fn interfaces_of<'c>(&self, class: &'c ClassInfo) -> Vec<&'c str> {
        class
            .interfaces
            .iter()
            .map(String::as_str)
            .filter(|name| self.contains(name))
            .collect()
    }

    pub fn visited_len(&self) -> usize {
        self.expanded
    }

    fn mark_expanded(&mut self, name: &str) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.mark = Mark::Expanded(self.expanded);
            self.expanded += 1;
        }
    }
}

// ----------------------------- Collector --------------------------------- //

pub struct Collector<'p> {
    provider: &'p dyn MetadataProvider,
}

impl<'p> Collector<'p> {
    pub fn new(provider: &'p dyn MetadataProvider) -> Self {
        Self { provider }
    }

    /// Load a class, isolating non-fatal failures to this one name.
    fn resolve(&self, ctx: &mut Closure, name: &str) -> Result<Option<Arc<ClassInfo>>, MetadataError> {
        match self.provider.load(name) {
            Ok(class) => Ok(Some(class)),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                if ctx.unresolved.insert(name.to_string()) {
                    log::warn!("skipping `{name}`: {err}");
                }
                Ok(None)
            }
        }
    }

    /// Structural insert. Returns the placed class, or `None` when the type
    /// contributes no dependency (primitive, anonymous, internal, unloadable).
    pub fn place(&self, ctx: &mut Closure, ty: &TypeRef) -> Result<Option<Arc<ClassInfo>>, MetadataError> {
        match ty.innermost() {
            TypeRef::Class(name) => self.place_class(ctx, name),
            _ => Ok(None),
        }
    }

    pub fn place_class(&self, ctx: &mut Closure, name: &str) -> Result<Option<Arc<ClassInfo>>, MetadataError> {
        if let Some(node) = ctx.nodes.get(name) {
            return Ok(Some(node.class.clone()));
        }
        if is_anonymous_name(name) || is_platform_internal(name) {
            return Ok(None);
        }
        if !ctx.placing.insert(name.to_string()) {
            log::warn!("superclass cycle through `{name}`, chain left incomplete");
            return Ok(None);
        }
        let placed = self.place_resolved(ctx, name);
        ctx.placing.remove(name);
        placed
    }

    fn place_resolved(&self, ctx: &mut Closure, name: &str) -> Result<Option<Arc<ClassInfo>>, MetadataError> {
        let Some(class) = self.resolve(ctx, name)? else {
            return Ok(None);
        };
        if !class.is_bindable() {
            return Ok(None);
        }
        if let Some(superclass) = &class.superclass {
            if self.place_class(ctx, superclass)?.is_none() {
                // a class cannot be linked without its superclass
                if ctx.unresolved.insert(name.to_string()) {
                    log::warn!("skipping `{name}`: superclass `{superclass}` is unavailable");
                }
                return Ok(None);
            }
        }
        let node = ctx
            .nodes
            .entry(name.to_string())
            .or_insert(Node { class, mark: Mark::Placed });
        Ok(Some(node.class.clone()))
    }

    /// Full expansion of the type a reference resolves to.
    pub fn expand(&self, ctx: &mut Closure, ty: &TypeRef) -> Result<(), MetadataError> {
        match ty.innermost() {
            TypeRef::Class(name) => self.expand_class(ctx, name),
            _ => Ok(()),
        }
    }

    pub fn expand_class(&self, ctx: &mut Closure, name: &str) -> Result<(), MetadataError> {
        let Some(class) = self.place_class(ctx, name)? else {
            return Ok(());
        };
        if ctx.is_visited(name) {
            return Ok(());
        }
        ctx.mark_expanded(name);

        if let Some(superclass) = &class.superclass {
            self.expand_class(ctx, superclass)?;
        }
        for interface in &class.interfaces {
            self.expand_class(ctx, interface)?;
        }
        let members = ValidMembers::of(&class);
        for member in members.iter() {
            let types = member.referenced_types();
            let mut bound = true;
            for ty in &types {
                if ty.class_name().is_some() && self.place(ctx, ty)?.is_none() {
                    bound = false;
                }
            }
            if !bound {
                log::debug!("`{name}`: dropping `{}`, it mentions an unavailable type", member.name());
                continue;
            }
            for ty in types {
                self.expand(ctx, ty)?;
            }
        }
        Ok(())
    }
}

// ----------------------------- Selection --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Each pattern expands the first candidate it matches.
    #[default]
    First,
    /// Every candidate matching any pattern is expanded.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    pub mode: MatchMode,
    /// Append `BOOTSTRAP_PATTERNS` to the user patterns.
    pub bootstrap: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self { mode: MatchMode::First, bootstrap: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern: String,
    /// Binary names of the candidates this pattern expanded.
    pub matched: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub closure: Closure,
    pub matches: Vec<PatternMatch>,
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| Error::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Pick entry points by pattern and build their closure.
pub fn select(
    provider: &dyn MetadataProvider,
    patterns: &[String],
    options: SelectOptions,
) -> Result<Selection, Error> {
    let mut all_patterns: Vec<String> = patterns.to_vec();
    if options.bootstrap {
        all_patterns.extend(BOOTSTRAP_PATTERNS.iter().map(|p| p.to_string()));
    }
    let compiled = all_patterns
        .iter()
        .map(|p| compile(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut names = provider.type_names();
    names.sort();
    let candidates: Vec<(String, String)> = names
        .into_iter()
        .map(|name| (class_full_name(&name), name))
        .collect();

    let collector = Collector::new(provider);
    let mut closure = Closure::new();
    let mut matches: Vec<PatternMatch> = all_patterns
        .iter()
        .map(|p| PatternMatch { pattern: p.clone(), matched: Vec::new() })
        .collect();

    // true when the candidate could be bound and was expanded
    let run = |closure: &mut Closure, foreign: &str, name: &str| -> Result<bool, Error> {
        let before = closure.len();
        collector.expand_class(closure, name)?;
        if !closure.is_visited(name) {
            return Ok(false);
        }
        log::info!("[{}][{}]\t{}", closure.len(), closure.len() - before, foreign);
        Ok(true)
    };

    match options.mode {
        MatchMode::First => {
            for (regex, record) in compiled.iter().zip(matches.iter_mut()) {
                if let Some((foreign, name)) = candidates.iter().find(|(f, _)| regex.is_match(f)) {
                    if run(&mut closure, foreign, name)? {
                        record.matched.push(name.clone());
                    }
                }
            }
        }
        MatchMode::All => {
            for (foreign, name) in &candidates {
                if let Some(i) = compiled.iter().position(|r| r.is_match(foreign)) {
                    if run(&mut closure, foreign, name)? {
                        matches[i].matched.push(name.clone());
                    }
                }
            }
        }
    }

    for record in &matches {
        if record.matched.is_empty() {
            log::info!("pattern `{}` matched no types", record.pattern);
        }
    }

    Ok(Selection { closure, matches })
}
