//! Lint Engine
//!
//! A rule file selects [`LintRule`]s; [`run`] applies them to a model in
//! file order and gathers every diagnostic. Rules never stop each other.

mod loader;
pub mod rules;

use tracing::debug;

use crate::ast::Idl;
use crate::diagnostic::Diagnostic;

pub use loader::load_rules;
pub use rules::{
    builtin_rule, ClusterRef, ClusterRejectionRule, ClusterRequirementRule, DefinedClustersRule,
    MandatoryElementsRule, RequiredGlobalAttributeRule, UniqueCodesRule, UnusedTypesRule,
    BUILTIN_RULES,
};

/// A self-contained check over the model
pub trait LintRule: std::fmt::Debug {
    fn name(&self) -> &str;

    fn check(&self, idl: &Idl) -> Vec<Diagnostic>;
}

/// Run every rule against `idl`
pub fn run(idl: &Idl, rules: &[Box<dyn LintRule>]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for rule in rules {
        let found = rule.check(idl);
        debug!(rule = rule.name(), diagnostics = found.len(), "lint rule finished");
        diagnostics.extend(found);
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CountClusters;

    impl LintRule for CountClusters {
        fn name(&self) -> &str {
            "count-clusters"
        }

        fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
            idl.clusters
                .iter()
                .map(|c| Diagnostic::note(format!("saw {}", c.name)))
                .collect()
        }
    }

    #[test]
    fn test_rules_run_in_order() {
        let idl = crate::parser::parse(
            "server cluster A = 1 { } server cluster B = 2 { }",
            "order.matter",
        )
        .unwrap();
        let rules: Vec<Box<dyn LintRule>> = vec![Box::new(CountClusters), Box::new(UniqueCodesRule)];
        let diagnostics = run(&idl, &rules);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["saw A", "saw B"]);
    }
}
