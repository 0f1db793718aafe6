//! Field/function dispatcher.
//!
//! Resolves a field name to a macro expansion, a modifier's flag mutation, a
//! numeric or string function, or falls through to a single `MatchNothing`.

use query_errors::{Handler, ParserWarning};
use tracing::debug;

use crate::filter::Filter;
use crate::flags::QueryFlags;
use crate::node::{Comparison, QueryNode};
use crate::tokenizer::{Lexer, StrLexer, Token};
use crate::value_parsers::ValueParser;

use super::context::ParseContext;
use super::expression::{parse_expression, push_bracket_open};
use super::numeric_range::parse_numeric_range;

#[derive(Clone, Copy)]
enum FlagOp {
    Add,
    Remove,
}

struct Modifier {
    name: &'static str,
    flag: QueryFlags,
    op: FlagOp,
}

/// Recognized field modifiers: each sets or clears a flag before parsing the
/// word (or sub-expression) that follows it.
const MODIFIERS: &[Modifier] = &[
    Modifier { name: "case", flag: QueryFlags::MATCH_CASE, op: FlagOp::Add },
    Modifier { name: "nocase", flag: QueryFlags::MATCH_CASE, op: FlagOp::Remove },
    Modifier { name: "exact", flag: QueryFlags::EXACT_MATCH, op: FlagOp::Add },
    Modifier { name: "file", flag: QueryFlags::FILES_ONLY, op: FlagOp::Add },
    Modifier { name: "files", flag: QueryFlags::FILES_ONLY, op: FlagOp::Add },
    Modifier { name: "nofileonly", flag: QueryFlags::FILES_ONLY, op: FlagOp::Remove },
    Modifier { name: "nofilesonly", flag: QueryFlags::FILES_ONLY, op: FlagOp::Remove },
    Modifier { name: "folder", flag: QueryFlags::FOLDERS_ONLY, op: FlagOp::Add },
    Modifier { name: "folders", flag: QueryFlags::FOLDERS_ONLY, op: FlagOp::Add },
    Modifier { name: "nofolderonly", flag: QueryFlags::FOLDERS_ONLY, op: FlagOp::Remove },
    Modifier { name: "nofoldersonly", flag: QueryFlags::FOLDERS_ONLY, op: FlagOp::Remove },
    Modifier { name: "path", flag: QueryFlags::SEARCH_IN_PATH, op: FlagOp::Add },
    Modifier { name: "nopath", flag: QueryFlags::SEARCH_IN_PATH, op: FlagOp::Remove },
    Modifier { name: "regex", flag: QueryFlags::REGEX, op: FlagOp::Add },
    Modifier { name: "noregex", flag: QueryFlags::REGEX, op: FlagOp::Remove },
];

#[derive(Clone, Copy)]
enum NumericFn {
    Size,
    Depth,
    ChildCount,
    ChildFileCount,
    ChildFolderCount,
    DateModified,
}

enum FunctionKind {
    Numeric(NumericFn),
    Extension,
    ContentType,
    Parent,
    Empty,
}

/// `parents` is an alias of `depth`, `dm` of `datemodified`.
fn lookup_function(name: &str) -> Option<FunctionKind> {
    match name {
        "size" => Some(FunctionKind::Numeric(NumericFn::Size)),
        "depth" | "parents" => Some(FunctionKind::Numeric(NumericFn::Depth)),
        "childcount" => Some(FunctionKind::Numeric(NumericFn::ChildCount)),
        "childfilecount" => Some(FunctionKind::Numeric(NumericFn::ChildFileCount)),
        "childfoldercount" => Some(FunctionKind::Numeric(NumericFn::ChildFolderCount)),
        "dm" | "datemodified" => Some(FunctionKind::Numeric(NumericFn::DateModified)),
        "ext" => Some(FunctionKind::Extension),
        "contenttype" => Some(FunctionKind::ContentType),
        "parent" => Some(FunctionKind::Parent),
        "empty" => Some(FunctionKind::Empty),
        _ => None,
    }
}

fn numeric_constructor(num_fn: NumericFn) -> fn(QueryFlags, i64, i64, Comparison) -> QueryNode {
    match num_fn {
        NumericFn::Size => QueryNode::size,
        NumericFn::Depth => QueryNode::depth,
        NumericFn::ChildCount => QueryNode::child_count,
        NumericFn::ChildFileCount => QueryNode::child_file_count,
        NumericFn::ChildFolderCount => QueryNode::child_folder_count,
        NumericFn::DateModified => QueryNode::date_modified,
    }
}

impl<'a> ParseContext<'a> {
    /// Called from the expression parser whenever it reads a
    /// `Field`/`EmptyField` token.
    pub(super) fn dispatch_field(&mut self, name: &str, is_empty_field: bool, flags: QueryFlags) -> Vec<QueryNode> {
        if let Some(idx) = self.macro_filters.iter().position(|f| f.name == name) {
            let expanded = self.expand_macro(idx, flags);
            if !expanded.is_empty() {
                return expanded;
            }
            // Cycle or empty body: fall through to the modifier/function
            // tables rather than resolving to `MatchNothing` here, in case
            // the name also aliases a builtin.
        }

        if let Some(modifier) = MODIFIERS.iter().find(|m| m.name == name) {
            let new_flags = match modifier.op {
                FlagOp::Add => flags | modifier.flag,
                FlagOp::Remove => flags & !modifier.flag,
            };
            return self.parse_modifier(is_empty_field, new_flags);
        }

        if let Some(kind) = lookup_function(name) {
            return self.dispatch_function(kind, name, is_empty_field, flags);
        }

        self.handler.emit_warning(ParserWarning::UnknownField { name: name.to_string() });
        vec![QueryNode::match_nothing()]
    }

    /// The word, bracketed sub-expression, or nested field following a
    /// modifier, parsed with the modifier's flag change already applied.
    fn parse_modifier(&mut self, is_empty_field: bool, flags: QueryFlags) -> Vec<QueryNode> {
        if is_empty_field {
            return vec![QueryNode::match_everything(flags)];
        }

        match self.next_token() {
            Token::Word(w) => vec![QueryNode::word(w, flags)],
            Token::BracketOpen => {
                let mut nodes = Vec::new();
                push_bracket_open(&mut nodes, self);
                nodes.extend(parse_expression(self, true, flags));
                nodes
            }
            Token::Field(n) => self.dispatch_field(&n, false, flags),
            Token::EmptyField(n) => self.dispatch_field(&n, true, flags),
            _ => vec![QueryNode::match_nothing()],
        }
    }

    fn dispatch_function(&mut self, kind: FunctionKind, field_name: &str, is_empty_field: bool, flags: QueryFlags) -> Vec<QueryNode> {
        let node = match kind {
            FunctionKind::Numeric(num_fn) => self.parse_numeric_function(num_fn, field_name, is_empty_field, flags),
            FunctionKind::Extension => self.parse_extension(is_empty_field, flags),
            FunctionKind::ContentType => self.parse_content_type(is_empty_field, flags),
            FunctionKind::Parent => self.parse_parent(is_empty_field, flags),
            // Arguments, if any, are ignored: this never consumes a token.
            FunctionKind::Empty => QueryNode::child_count(flags, 0, 0, Comparison::Equal),
        };
        vec![node]
    }

    /// Parses a comparison-operator value (`>=1024`) or a bare range
    /// (`10..20`) following a numeric field.
    fn parse_numeric_function(&mut self, num_fn: NumericFn, field_name: &str, is_empty_field: bool, flags: QueryFlags) -> QueryNode {
        if is_empty_field {
            return QueryNode::match_everything(flags);
        }

        let value_parsers = self.value_parsers;
        let handler = self.handler;
        let value_parser: &ValueParser = match num_fn {
            NumericFn::Size => &value_parsers.size,
            NumericFn::DateModified => &value_parsers.date_modified,
            _ => &value_parsers.integer,
        };
        let make_node = numeric_constructor(num_fn);

        match self.next_token() {
            comparison_token @ (Token::Equal | Token::Smaller | Token::SmallerEq | Token::Greater | Token::GreaterEq) => {
                let comparison = match comparison_token {
                    Token::Equal => Comparison::Equal,
                    Token::Smaller => Comparison::Smaller,
                    Token::SmallerEq => Comparison::SmallerEq,
                    Token::Greater => Comparison::Greater,
                    Token::GreaterEq => Comparison::GreaterEq,
                    _ => unreachable!(),
                };
                match self.next_token() {
                    Token::Word(v) => match value_parser(&v) {
                        Some((a, b)) => make_node(flags, a, b, comparison),
                        None => {
                            handler.emit_warning(ParserWarning::InvalidNumericValue { field: field_name.to_string(), value: v });
                            QueryNode::match_nothing()
                        }
                    },
                    _ => {
                        handler.emit_warning(ParserWarning::MissingWordArgument { field: field_name.to_string() });
                        QueryNode::match_nothing()
                    }
                }
            }
            Token::Word(v) => parse_numeric_range(&v, field_name, value_parser, &make_node, flags, handler),
            _ => QueryNode::match_nothing(),
        }
    }

    /// Parses a single word following `ext:`.
    fn parse_extension(&mut self, is_empty_field: bool, flags: QueryFlags) -> QueryNode {
        if is_empty_field {
            return QueryNode::extension(None, flags);
        }
        match self.next_token() {
            Token::Word(w) => QueryNode::extension(Some(w), flags),
            _ => {
                self.handler.emit_warning(ParserWarning::MissingWordArgument { field: "ext".to_string() });
                QueryNode::match_nothing()
            }
        }
    }

    fn parse_content_type(&mut self, is_empty_field: bool, flags: QueryFlags) -> QueryNode {
        if is_empty_field {
            return QueryNode::match_everything(flags);
        }
        match self.next_token() {
            Token::Word(w) => QueryNode::content_type(w, flags),
            _ => {
                self.handler.emit_warning(ParserWarning::MissingWordArgument { field: "contenttype".to_string() });
                QueryNode::match_nothing()
            }
        }
    }

    fn parse_parent(&mut self, is_empty_field: bool, flags: QueryFlags) -> QueryNode {
        let flags = flags | QueryFlags::EXACT_MATCH;
        if is_empty_field {
            return QueryNode::parent("", flags);
        }
        match self.next_token() {
            Token::Word(w) => QueryNode::parent(w, flags),
            _ => {
                self.handler.emit_warning(ParserWarning::MissingWordArgument { field: "parent".to_string() });
                QueryNode::match_nothing()
            }
        }
    }

    /// Re-lexes and re-parses a macro's stored query text in place of the
    /// field reference, with cycle detection over the filter's index.
    fn expand_macro(&mut self, idx: usize, flags: QueryFlags) -> Vec<QueryNode> {
        let macro_filters: &'a [Filter] = self.macro_filters;
        let filter: &'a Filter = &macro_filters[idx];
        let handler: &'a Handler = self.handler;

        if self.macro_stack.contains(&idx) {
            handler.emit_warning(ParserWarning::MacroCycle { name: filter.name.clone() });
            return Vec::new();
        }
        if filter.query_text.is_empty() {
            handler.emit_warning(ParserWarning::EmptyMacroBody { name: filter.name.clone() });
            return Vec::new();
        }

        // Only these three bits propagate into the expansion.
        let propagated = filter.flags & (QueryFlags::SEARCH_IN_PATH | QueryFlags::MATCH_CASE | QueryFlags::REGEX);
        let derived_flags = flags | propagated;

        self.macro_stack.push(idx);
        debug!(name = %filter.name, depth = self.macro_stack.len(), "expanding macro");
        let new_lexer: Box<dyn Lexer + 'a> = Box::new(StrLexer::new(&filter.query_text));
        let (saved_lexer, saved_stack) = self.enter_macro(new_lexer);

        let result = parse_expression(self, false, derived_flags);

        if !self.operator_stack.is_empty() {
            handler.emit_warning(ParserWarning::MacroLeftOperatorStackNonEmpty {
                name: filter.name.clone(),
                count: self.operator_stack.len(),
            });
        }

        self.leave_macro(saved_lexer, saved_stack);
        self.macro_stack.pop();
        debug!(name = %filter.name, "leaving macro expansion");

        result
    }
}
