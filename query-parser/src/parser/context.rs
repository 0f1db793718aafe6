//! Parse context: one mutable value threading the lexer cursor and operator
//! stack through every recursive call, instead of process-wide state.

use std::mem;

use query_errors::Handler;
use smallvec::SmallVec;

use crate::filter::Filter;
use crate::node::OperatorToken;
use crate::tokenizer::{Lexer, Token};
use crate::value_parsers::ValueParser;

/// The operator stack rarely holds more than a handful of pending operators
/// and bracket markers per nesting level, so it lives inline rather than
/// allocating.
pub(super) type OperatorStack = SmallVec<[OperatorToken; 8]>;

/// The three pluggable numeric value parsers.
pub struct ValueParsers {
    pub integer: ValueParser,
    pub size: ValueParser,
    pub date_modified: ValueParser,
}

/// Coarse category of the last token whose result was appended to the
/// output, driving implicit-AND decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LastToken {
    None,
    Operand,
    BracketClose,
    Other,
}

/// Shared mutable state threaded through the expression parser and field
/// dispatcher.
pub struct ParseContext<'a> {
    pub(super) lexer: Box<dyn Lexer + 'a>,
    pub(super) operator_stack: OperatorStack,
    /// Indices into `macro_filters` of filters currently being expanded;
    /// cycle detection keys on this stable identity, not on the macro's
    /// name, since a malformed registry may alias two filters to one name.
    pub(super) macro_stack: Vec<usize>,
    pub(super) macro_filters: &'a [Filter],
    pub(super) last_token: LastToken,
    pub(super) value_parsers: &'a ValueParsers,
    pub(super) handler: &'a Handler,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        lexer: Box<dyn Lexer + 'a>,
        macro_filters: &'a [Filter],
        value_parsers: &'a ValueParsers,
        handler: &'a Handler,
    ) -> Self {
        Self {
            lexer,
            operator_stack: OperatorStack::new(),
            macro_stack: Vec::new(),
            macro_filters,
            last_token: LastToken::None,
            value_parsers,
            handler,
        }
    }

    /// Swaps in a fresh lexer and operator stack for a macro expansion's
    /// recursive parse, returning what was there before so the caller can
    /// restore it.
    pub(super) fn enter_macro(&mut self, lexer: Box<dyn Lexer + 'a>) -> (Box<dyn Lexer + 'a>, OperatorStack) {
        let saved_lexer = mem::replace(&mut self.lexer, lexer);
        let saved_stack = mem::replace(&mut self.operator_stack, OperatorStack::new());
        (saved_lexer, saved_stack)
    }

    pub(super) fn leave_macro(&mut self, lexer: Box<dyn Lexer + 'a>, operator_stack: OperatorStack) {
        self.lexer = lexer;
        self.operator_stack = operator_stack;
    }

    pub(super) fn next_token(&mut self) -> Token {
        self.lexer.next().0
    }

    pub(super) fn peek_token(&mut self) -> Token {
        self.lexer.peek()
    }
}
