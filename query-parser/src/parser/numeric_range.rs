//! Numeric range parser.
//!
//! Splits a raw word on the first literal `..` and resolves it against a
//! value parser and a per-field node constructor: `A` is an exact match,
//! `A..B` an inclusive range, `..B` an open lower bound, `A..` an open upper
//! bound.

use query_errors::{Handler, ParserWarning};

use crate::flags::QueryFlags;
use crate::node::{Comparison, QueryNode, INT32_MAX};
use crate::value_parsers::ValueParser;

pub(super) fn parse_numeric_range(
    word: &str,
    field_name: &str,
    value_parser: &ValueParser,
    make_node: &dyn Fn(QueryFlags, i64, i64, Comparison) -> QueryNode,
    flags: QueryFlags,
    handler: &Handler,
) -> QueryNode {
    let fail = |handler: &Handler| {
        handler.emit_warning(ParserWarning::MalformedRange { field: field_name.to_string(), text: word.to_string() });
        QueryNode::match_nothing()
    };

    match word.find("..") {
        None => match value_parser(word) {
            Some((a, b)) => {
                let comparison = if a == b { Comparison::Equal } else { Comparison::Range };
                make_node(flags, a, b, comparison)
            }
            None => fail(handler),
        },
        Some(idx) => {
            let left = &word[..idx];
            let right = &word[idx + 2..];
            match (left.is_empty(), right.is_empty()) {
                (true, true) => fail(handler),
                (true, false) => match value_parser(right) {
                    Some((_, end)) => make_node(flags, 0, end, Comparison::Range),
                    None => fail(handler),
                },
                (false, true) => match value_parser(left) {
                    Some((start, _)) => make_node(flags, start, INT32_MAX, Comparison::GreaterEq),
                    None => fail(handler),
                },
                (false, false) => match (value_parser(left), value_parser(right)) {
                    (Some((start, _)), Some((_, end))) => {
                        let comparison = if start == end { Comparison::Equal } else { Comparison::Range };
                        make_node(flags, start, end, comparison)
                    }
                    _ => fail(handler),
                },
            }
        }
    }
}
