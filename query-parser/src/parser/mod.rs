//! The parser core: a shared mutable cursor ([`ParseContext`]) extended by
//! per-grammar-area modules (`expression.rs`, `dispatcher.rs`) via `impl`
//! blocks, plus the standalone range grammar in `numeric_range.rs`.

mod context;
mod dispatcher;
mod expression;
mod numeric_range;

pub use context::{LastToken, ParseContext, ValueParsers};
pub use expression::parse_expression;

use query_errors::Handler;

use crate::filter::Filter;
use crate::flags::QueryFlags;
use crate::node::QueryNode;
use crate::tokenizer::StrLexer;
use crate::value_parsers::{date_interval_parser, integer_parser, size_parser};

/// Convenience entry point: parses `query_text` against `macro_filters` using
/// the crate's own [`StrLexer`] and value parsers.
///
/// `now_epoch_secs` is the instant `today`/`thisweek`/... are resolved
/// against; the parser never reads the system clock itself, so callers pass
/// it explicitly.
pub fn parse_query(
    query_text: &str,
    macro_filters: &[Filter],
    flags: QueryFlags,
    now_epoch_secs: i64,
) -> (Vec<QueryNode>, Handler) {
    let handler = Handler::new();
    let value_parsers =
        ValueParsers { integer: integer_parser(), size: size_parser(), date_modified: date_interval_parser(now_epoch_secs) };
    let lexer = StrLexer::new(query_text);
    let mut ctx = ParseContext::new(Box::new(lexer), macro_filters, &value_parsers, &handler);
    let nodes = parse_expression(&mut ctx, false, flags);
    (nodes, handler)
}
