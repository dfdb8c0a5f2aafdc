pub mod normalizer;
pub mod parser;
pub mod processor;

pub use normalizer::normalize;
pub use parser::{parse_log, parse_logs, LogMeta, ParseResult, ParsedLog, RawLog};
pub use processor::{EventOutcome, EventProcessor};
