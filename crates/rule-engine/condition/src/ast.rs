//! Recursive join-condition AST (§4.2).
//!
//! `FieldMatch` compares context key `"from"` against `"to"` — the two
//! sides a relationship's, or a cross_link rule's, condition is always
//! evaluated against. A `derived_node` rule with aliases other than
//! `from`/`to` compares them with the `Expression` variant instead, e.g.
//! `{type: "expression", expression: "a.aid == b.aid"}`; `FieldMatch` does
//! not generalize to arbitrary alias names (see DESIGN.md, Q3).

#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    Field(String),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    FieldMatch { from: FieldRef, to: FieldRef },
    Expression(String),
    And(Vec<JoinCondition>),
    Or(Vec<JoinCondition>),
    Not(Box<JoinCondition>),
}
