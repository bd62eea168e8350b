//! Turns a validated schema plus its tabular sources into a populated
//! [`lpg_core::Graph`] (§6).

pub mod builder;
pub mod convert;
pub mod error;
pub mod id_template;
pub mod tabular;

pub use builder::GraphBuilder;
pub use error::{BuildError, BuildResult};
pub use tabular::{CsvRow, CsvSource, Row, TabularSource};
