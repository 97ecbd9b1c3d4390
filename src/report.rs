//! JSON view of a selection, for inspecting a closure without generating code.
use serde::Serialize;

use crate::closure::Selection;
use crate::naming;

#[derive(Debug, Clone, Serialize)]
pub struct ClosureReport {
    pub patterns: Vec<PatternReport>,
    /// Chain order: every supertype precedes its subtypes.
    pub dependency_chain: Vec<TypeEntry>,
    /// Expansion order.
    pub visited: Vec<String>,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternReport {
    pub pattern: String,
    pub matched: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeEntry {
    pub name: String,
    pub foreign_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    pub interface: bool,
    pub expanded: bool,
}

impl ClosureReport {
    pub fn new(selection: &Selection) -> Self {
        let closure = &selection.closure;
        Self {
            patterns: selection
                .matches
                .iter()
                .map(|m| PatternReport { pattern: m.pattern.clone(), matched: m.matched.clone() })
                .collect(),
            dependency_chain: closure
                .chain()
                .map(|class| TypeEntry {
                    name: class.name.clone(),
                    foreign_name: naming::class_full_name(&class.name),
                    superclass: class.superclass.clone(),
                    interface: class.is_interface(),
                    expanded: closure.is_visited(&class.name),
                })
                .collect(),
            visited: closure.visited().iter().map(|c| c.name.clone()).collect(),
            unresolved: closure.unresolved().iter().cloned().collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::{select, MatchMode, SelectOptions};
    use crate::metadata::ManifestProvider;
    use serde_json::json;

    #[test]
    fn report_lists_chain_visited_and_unresolved() {
        let provider = ManifestProvider::from_value(json!([
            { "name": "pkg.A", "super": "pkg.B",
              "fields": [{ "name": "gone", "descriptor": "Lpkg/Gone;", "access": ["public"] }] },
            { "name": "pkg.B" },
            { "name": "pkg.Orphan", "super": "pkg.Absent" }
        ]))
        .unwrap();
        let options = SelectOptions { mode: MatchMode::First, bootstrap: false };
        let patterns = ["::pkg::A", "::nothing", "::pkg::Orphan"].map(String::from);
        let selection = select(&provider, &patterns, options).unwrap();
        let report = ClosureReport::new(&selection);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["dependency_chain"][0]["name"], "pkg.B");
        assert_eq!(value["dependency_chain"][1]["foreign_name"], "::pkg::A");
        assert_eq!(value["dependency_chain"][1]["superclass"], "pkg.B");
        assert!(value["dependency_chain"][0].get("superclass").is_none());
        assert_eq!(value["visited"], json!(["pkg.A", "pkg.B"]));
        // a missing base takes its subclass with it
        assert_eq!(value["unresolved"], json!(["pkg.Absent", "pkg.Gone", "pkg.Orphan"]));
        assert_eq!(value["patterns"][0]["matched"], json!(["pkg.A"]));
        assert_eq!(value["patterns"][1]["matched"], json!([]));
        assert_eq!(value["patterns"][2]["matched"], json!([]));
        assert_eq!(value["dependency_chain"].as_array().unwrap().len(), 2);
        assert!(report.to_json_pretty().unwrap().starts_with("{\n  \"patterns\""));
    }
}
