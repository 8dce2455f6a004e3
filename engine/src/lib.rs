//! UCI analysis engine driver.
//!
//! Manages one engine subprocess over its line-oriented stdin/stdout
//! protocol and runs depth-bounded searches under a soft time budget.

pub mod driver;
pub mod parse;

pub use driver::{AnalysisReport, EngineConfig, EngineDriver, EngineError};
pub use parse::{parse_bestmove_line, parse_info_line, Score, SearchInfo, NO_MOVE};
