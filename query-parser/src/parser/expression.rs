//! Expression parser: the shunting-yard driver. Consumes the token stream,
//! handles operator precedence, parentheses, implicit AND, and NOT
//! normalization, and emits the postfix node list.

use query_errors::ParserWarning;
use tracing::{debug, trace};

use crate::flags::QueryFlags;
use crate::node::{OperatorToken, QueryNode};
use crate::tokenizer::Token;

use super::context::{LastToken, OperatorStack, ParseContext};

/// Pops operators with precedence `>= op` off `stack` into `output`, then
/// pushes `op`. `BracketOpen` has the lowest precedence and is never popped
/// this way.
pub(super) fn push_operator(output: &mut Vec<QueryNode>, stack: &mut OperatorStack, op: OperatorToken) {
    while let Some(&top) = stack.last() {
        if top.precedence() >= op.precedence() {
            stack.pop();
            if top != OperatorToken::BracketOpen {
                output.push(QueryNode::new_operator(top));
            }
        } else {
            break;
        }
    }
    stack.push(op);
}

/// Inserts an implicit `And` ahead of an upcoming operand/`(`/`Not` when the
/// last emitted token was an operand or `)`.
pub(super) fn maybe_insert_implicit_and(output: &mut Vec<QueryNode>, stack: &mut OperatorStack, last: LastToken) {
    if matches!(last, LastToken::Operand | LastToken::BracketClose) {
        push_operator(output, stack, OperatorToken::And);
    }
}

/// The `BracketOpen` half of the main loop's handling, factored out so the
/// field dispatcher's modifier sub-parser can reuse it verbatim before its
/// own recursive [`parse_expression`] call.
pub(super) fn push_bracket_open(output: &mut Vec<QueryNode>, ctx: &mut ParseContext<'_>) {
    maybe_insert_implicit_and(output, &mut ctx.operator_stack, ctx.last_token);
    ctx.operator_stack.push(OperatorToken::BracketOpen);
    ctx.last_token = LastToken::Other;

    while matches!(ctx.peek_token(), Token::And | Token::Or) {
        ctx.next_token();
        ctx.handler.emit_warning(ParserWarning::StrayOperatorAfterOpenBracket);
    }
}

/// The shunting-yard driver. Reads tokens until `Eos` or, when
/// `in_open_bracket`, its own matching `)`.
pub fn parse_expression(ctx: &mut ParseContext<'_>, in_open_bracket: bool, flags: QueryFlags) -> Vec<QueryNode> {
    debug!(in_open_bracket, ?flags, "entering parse_expression");
    let mut output = Vec::new();
    let mut num_open_brackets: u32 = if in_open_bracket { 1 } else { 0 };
    let mut num_close_brackets: u32 = 0;

    loop {
        let token = ctx.next_token();
        trace!(?token, "read token");
        match token {
            Token::Eos => break,

            Token::Not => {
                let mut parity_odd = true;
                while matches!(ctx.peek_token(), Token::Not) {
                    ctx.next_token();
                    parity_odd = !parity_odd;
                }
                let next = ctx.peek_token();
                let next_is_operand_like = next.is_operand() || next == Token::BracketOpen;
                if parity_odd && next_is_operand_like {
                    maybe_insert_implicit_and(&mut output, &mut ctx.operator_stack, ctx.last_token);
                    push_operator(&mut output, &mut ctx.operator_stack, OperatorToken::Not);
                    ctx.last_token = LastToken::Other;
                }
                // Parity-even, or the next non-`Not` token isn't an operand/`(`:
                // every `Not` in the run is silently dropped. This also means
                // a lone `Not` directly followed by `And`/`Or` vanishes rather
                // than negating the connective's right-hand side.
            }

            Token::And | Token::Or => {
                let next = ctx.peek_token();
                let next_is_operand_like = next.is_operand() || next == Token::BracketOpen || next == Token::Not;
                if next_is_operand_like {
                    let op = if token == Token::And { OperatorToken::And } else { OperatorToken::Or };
                    push_operator(&mut output, &mut ctx.operator_stack, op);
                    ctx.last_token = LastToken::Other;
                }
                // Otherwise the connective has no right operand and is dropped.
            }

            Token::BracketOpen => {
                push_bracket_open(&mut output, ctx);
                num_open_brackets += 1;
            }

            Token::BracketClose => {
                if num_close_brackets == num_open_brackets {
                    // No open bracket at this level to match: abort this
                    // parse frame entirely.
                    ctx.handler.emit_warning(ParserWarning::UnbalancedClosingBracket);
                    debug!("aborting parse: unbalanced closing bracket");
                    return vec![QueryNode::match_nothing()];
                }

                while let Some(top) = ctx.operator_stack.pop() {
                    if top == OperatorToken::BracketOpen {
                        break;
                    }
                    output.push(QueryNode::new_operator(top));
                }
                num_close_brackets += 1;
                ctx.last_token = LastToken::BracketClose;

                if in_open_bracket && num_close_brackets == num_open_brackets {
                    return output;
                }
            }

            Token::Word(word) => {
                maybe_insert_implicit_and(&mut output, &mut ctx.operator_stack, ctx.last_token);
                output.push(QueryNode::word(word, flags));
                ctx.last_token = LastToken::Operand;
            }

            Token::Field(name) => {
                maybe_insert_implicit_and(&mut output, &mut ctx.operator_stack, ctx.last_token);
                output.extend(ctx.dispatch_field(&name, false, flags));
                ctx.last_token = LastToken::Operand;
            }

            Token::EmptyField(name) => {
                maybe_insert_implicit_and(&mut output, &mut ctx.operator_stack, ctx.last_token);
                output.extend(ctx.dispatch_field(&name, true, flags));
                ctx.last_token = LastToken::Operand;
            }

            Token::Equal | Token::Smaller | Token::SmallerEq | Token::Greater | Token::GreaterEq | Token::None => {
                ctx.handler.emit_warning(ParserWarning::UnrecognizedToken);
            }
        }
    }

    // Flush: pop whatever operators remain onto the output, in pop order. A
    // stray `BracketOpen` (an input with more `(` than `)`) is discarded
    // rather than ever reaching `QueryNode::new_operator`.
    while let Some(top) = ctx.operator_stack.pop() {
        if top != OperatorToken::BracketOpen {
            output.push(QueryNode::new_operator(top));
        }
    }

    debug!(node_count = output.len(), "leaving parse_expression");
    output
}

#[cfg(test)]
mod tests {
    use query_errors::Handler;

    use super::*;
    use crate::filter::Filter;
    use crate::parser::context::ValueParsers;
    use crate::tokenizer::StrLexer;
    use crate::value_parsers::{date_interval_parser, integer_parser, size_parser};

    fn value_parsers() -> ValueParsers {
        ValueParsers { integer: integer_parser(), size: size_parser(), date_modified: date_interval_parser(0) }
    }

    /// After a complete parse the operator stack is empty, even for inputs
    /// with several nesting levels.
    #[test]
    fn operator_stack_is_empty_after_a_complete_parse() {
        let filters: Vec<Filter> = Vec::new();
        let value_parsers = value_parsers();
        let handler = Handler::new();
        let lexer = StrLexer::new("((a AND b) OR NOT c) AND d");
        let mut ctx = ParseContext::new(Box::new(lexer), &filters, &value_parsers, &handler);

        let _ = parse_expression(&mut ctx, false, QueryFlags::empty());

        assert!(ctx.operator_stack.is_empty());
    }
}
