//! Parser core for a file-search query language.
//!
//! Turns a query string into a flat postfix sequence of [`node::QueryNode`]
//! values an external evaluator can walk with a single stack. The parser
//! never fails outright: malformed fragments are localized to a
//! [`node::QueryNode::MatchNothing`] leaf and reported through a
//! [`query_errors::Handler`] instead (see [`parser::parse_query`]).

pub mod filter;
pub mod flags;
pub mod node;
mod parser;
pub mod tokenizer;
pub mod value_parsers;

pub use filter::Filter;
pub use flags::QueryFlags;
pub use node::{Comparison, QueryNode};
pub use parser::{parse_expression, parse_query, LastToken, ParseContext, ValueParsers};
pub use tokenizer::{Lexer, StrLexer, Token};
