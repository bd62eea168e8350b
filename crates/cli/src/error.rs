//! Top-level error taxonomy mapped to the exit codes in SPEC_FULL.md §10.3.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Metadata(#[from] lpg_metadata_loader::MetadataError),

    #[error(transparent)]
    Build(#[from] lpg_builder::BuildError),

    #[error(transparent)]
    RuleEngine(#[from] lpg_rule_engine::RuleEngineError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        use lpg_metadata_loader::MetadataError;
        match self {
            CliError::Metadata(MetadataError::Io { .. } | MetadataError::Json { .. }) => 2,
            CliError::Metadata(_) => 1,
            CliError::Build(_) => 2,
            CliError::RuleEngine(lpg_rule_engine::RuleEngineError::CancelledError) => 4,
            CliError::RuleEngine(lpg_rule_engine::RuleEngineError::RuleFailed { .. }) => 3,
        }
    }
}
