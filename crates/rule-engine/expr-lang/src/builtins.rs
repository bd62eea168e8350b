//! Names of the aggregation functions recognized by the evaluator. Kept as
//! a flat list rather than a closure table: each function has bespoke
//! argument handling in [`crate::evaluator::Evaluator`], so the list exists
//! only to classify a call as an aggregation for the `enrich_properties`
//! precomputation pass (§4.5). Intrinsic functions (`now`/`round`/`abs`/
//! `len`) and unknown-name rejection are handled directly by `eval_call`'s
//! match arms.

pub const AGGREGATION_FUNCTIONS: &[&str] = &["avg", "sum", "max", "min", "stddev", "count"];

pub fn is_aggregation(name: &str) -> bool {
    AGGREGATION_FUNCTIONS.contains(&name)
}
