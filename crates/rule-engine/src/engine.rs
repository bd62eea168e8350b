//! Sequential rule dispatcher: applies each enabled rule to the graph in
//! declared order, with no rollback between rules (§4.5, §5, §9).

use lpg_core::Graph;
use lpg_expr_lang::Clock;
use lpg_metadata_loader::{RuleKind, TransformationsDoc};
use tracing::{info, warn};

use crate::cancellation::CancellationToken;
use crate::error::{ApplyError, RuleEngineError, RuleEngineResult};
use crate::{aggregation, cross_link, derived_node, enrich_properties};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub state: RuleState,
    pub affected: usize,
}

pub struct RuleEngine<'c> {
    clock: &'c dyn Clock,
}

impl<'c> RuleEngine<'c> {
    pub fn new(clock: &'c dyn Clock) -> Self {
        Self { clock }
    }

    /// Applies every enabled rule in the document's declared order (O1).
    /// Stops at the first failing rule: the graph keeps whatever state
    /// prior rules (and the failing rule's partial work) left behind.
    pub fn apply_all(
        &self,
        graph: &mut Graph,
        doc: &TransformationsDoc,
        cancellation: &dyn CancellationToken,
    ) -> RuleEngineResult<Vec<RuleOutcome>> {
        let mut outcomes = Vec::new();

        for rule in doc.enabled_rules() {
            if cancellation.is_cancelled() {
                warn!(completed = outcomes.len(), "cancellation observed between rules");
                return Err(RuleEngineError::CancelledError);
            }

            info!(rule_id = rule.id.as_str(), "applying rule");
            match self.apply_one(graph, &rule.kind) {
                Ok(affected) => {
                    info!(rule_id = rule.id.as_str(), affected, "rule succeeded");
                    outcomes.push(RuleOutcome { rule_id: rule.id.clone(), state: RuleState::Succeeded, affected });
                }
                Err(source) => {
                    return Err(RuleEngineError::RuleFailed { rule_id: rule.id.clone(), source });
                }
            }
        }

        Ok(outcomes)
    }

    fn apply_one(&self, graph: &mut Graph, kind: &RuleKind) -> Result<usize, ApplyError> {
        match kind {
            RuleKind::CrossLink(rule) => cross_link::apply(graph, rule, self.clock),
            RuleKind::DerivedNode(rule) => derived_node::apply(graph, rule, self.clock),
            RuleKind::EnrichProperties(rule) => enrich_properties::apply(graph, rule, self.clock),
            RuleKind::Aggregation(rule) => aggregation::apply(graph, rule, self.clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::NeverCancelled;
    use lpg_core::{PropertyMap, Value};
    use lpg_expr_lang::FixedClock;
    use serde_json::json;

    #[test]
    fn applies_rules_in_declared_order() {
        let mut graph = Graph::new();
        graph.add_node("a1", "A", PropertyMap::new()).unwrap();
        graph.add_node("a2", "A", PropertyMap::new()).unwrap();

        let doc = TransformationsDoc::from_json(&json!({
            "version": "1.0",
            "transformations": [{
                "id": "tag_all",
                "type": "enrich_properties",
                "target_entity": "A",
                "enrichments": [{"property": "tagged", "value": true}]
            }]
        }))
        .unwrap();

        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let engine = RuleEngine::new(&clock);
        let outcomes = engine.apply_all(&mut graph, &doc, &NeverCancelled).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].state, RuleState::Succeeded);
        assert_eq!(graph.get_node("a1").unwrap().properties.get("tagged"), Some(&Value::Bool(true)));
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let mut graph = Graph::new();
        graph.add_node("a1", "A", PropertyMap::new()).unwrap();

        let doc = TransformationsDoc::from_json(&json!({
            "version": "1.0",
            "transformations": [{
                "id": "skip_me",
                "type": "enrich_properties",
                "enabled": false,
                "target_entity": "A",
                "enrichments": [{"property": "tagged", "value": true}]
            }]
        }))
        .unwrap();

        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let engine = RuleEngine::new(&clock);
        let outcomes = engine.apply_all(&mut graph, &doc, &NeverCancelled).unwrap();

        assert!(outcomes.is_empty());
        assert_eq!(graph.get_node("a1").unwrap().properties.get("tagged"), None);
    }
}
