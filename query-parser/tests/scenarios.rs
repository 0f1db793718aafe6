//! End-to-end scenarios and cross-cutting properties, exercised through the
//! public [`query_parser::parse_query`] entry point only.

use std::sync::Once;

use query_parser::{parse_query, Comparison, Filter, QueryFlags, QueryNode};

const NOW: i64 = 1_700_000_000; // 2023-11-14T22:13:20Z; arbitrary, fixed so date tests are reproducible.

static INIT_LOGGING: Once = Once::new();

/// So `cargo test -- --nocapture` surfaces the `tracing::debug!`/`trace!`
/// instrumentation in `parse_expression`, instead of the crate logging to
/// nowhere during tests.
fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn parse(input: &str) -> Vec<QueryNode> {
    init_logging();
    parse_query(input, &[], QueryFlags::empty(), NOW).0
}

fn word(text: &str) -> QueryNode {
    QueryNode::word(text, QueryFlags::empty())
}

/// A stack evaluator: leaves push one value, `And`/`Or` pop two and push
/// one, `Not` pops one and pushes one. A well-formed postfix stream leaves
/// exactly one value on the stack.
fn postfix_stack_depth(nodes: &[QueryNode]) -> Option<usize> {
    let mut depth: i64 = 0;
    for node in nodes {
        match node {
            QueryNode::And | QueryNode::Or => {
                if depth < 2 {
                    return None;
                }
                depth -= 1;
            }
            QueryNode::Not => {
                if depth < 1 {
                    return None;
                }
            }
            _ => depth += 1,
        }
    }
    usize::try_from(depth).ok()
}

fn assert_valid_postfix(nodes: &[QueryNode]) {
    assert_eq!(postfix_stack_depth(nodes), Some(1), "not a single well-formed postfix expression: {nodes:?}");
}

#[test]
fn s1_implicit_and_between_bare_words() {
    let nodes = parse("foo bar");
    assert_eq!(nodes, vec![word("foo"), word("bar"), QueryNode::And]);
    assert_valid_postfix(&nodes);
}

#[test]
fn s2_explicit_and_then_or() {
    let nodes = parse("foo AND bar OR baz");
    assert_eq!(nodes, vec![word("foo"), word("bar"), QueryNode::And, word("baz"), QueryNode::Or]);
    assert_valid_postfix(&nodes);
}

#[test]
fn s3_double_not_cancels() {
    assert_eq!(parse("NOT NOT foo"), vec![word("foo")]);
}

#[test]
fn s4_bracketed_or_then_implicit_and() {
    let nodes = parse("(a OR b) c");
    assert_eq!(nodes, vec![word("a"), word("b"), QueryNode::Or, word("c"), QueryNode::And]);
    assert_valid_postfix(&nodes);
}

#[test]
fn s5_size_with_comparison_operator() {
    let nodes = parse("size:>=1024");
    assert_eq!(nodes, vec![QueryNode::size(QueryFlags::empty(), 1024, 1024, Comparison::GreaterEq)]);
}

#[test]
fn s6_date_modified_open_ended_range() {
    // This crate's date parser accepts `YYYY-MM`, not month names, but
    // exercises the identical open-ended-range path through the numeric
    // range parser.
    let nodes = parse("dm:..2024-01");
    let month_end = match &nodes[..] {
        [QueryNode::DateModified { start: 0, end, comparison: Comparison::Range, .. }] => *end,
        other => panic!("unexpected shape: {other:?}"),
    };
    assert_eq!(nodes, vec![QueryNode::date_modified(QueryFlags::empty(), 0, month_end, Comparison::Range)]);
}

#[test]
fn s7_leading_unbalanced_close_bracket_aborts() {
    assert_eq!(parse(")abc"), vec![QueryNode::match_nothing()]);
}

#[test]
fn s8_empty_ext_field() {
    assert_eq!(parse("ext:"), vec![QueryNode::extension(None, QueryFlags::empty())]);
}

#[test]
fn s9_modifiers_scope_to_their_own_word() {
    let nodes = parse("case:Foo nocase:bar");
    assert_eq!(
        nodes,
        vec![QueryNode::word("Foo", QueryFlags::MATCH_CASE), QueryNode::word("bar", QueryFlags::empty()), QueryNode::And]
    );
}

#[test]
fn property_1_postfix_validity_holds_across_a_varied_corpus() {
    for input in [
        "foo",
        "foo bar baz",
        "foo AND (bar OR baz)",
        "NOT foo AND bar",
        "((a))",
        "case:x path:y:z",
        "size:10..20 AND dm:2024",
        "ext:rs OR contenttype:text",
    ] {
        assert_valid_postfix(&parse(input));
    }
}

#[test]
fn property_3_flag_isolation_across_brackets() {
    let nodes = parse("(case:Foo) bar");
    assert_eq!(
        nodes,
        vec![QueryNode::word("Foo", QueryFlags::MATCH_CASE), QueryNode::word("bar", QueryFlags::empty()), QueryNode::And]
    );
}

#[test]
fn property_4_self_referencing_macro_terminates() {
    let filters = vec![Filter::new("A", "A:", QueryFlags::empty())];
    let (nodes, handler) = parse_query("A:", &filters, QueryFlags::empty(), NOW);
    assert_eq!(nodes, vec![QueryNode::match_nothing()]);
    assert!(handler.has_warnings());
}

#[test]
fn property_4_mutually_recursive_macros_terminate() {
    let filters = vec![Filter::new("A", "B:", QueryFlags::empty()), Filter::new("B", "A:", QueryFlags::empty())];
    let (nodes, handler) = parse_query("A:", &filters, QueryFlags::empty(), NOW);
    assert_eq!(nodes, vec![QueryNode::match_nothing()]);
    assert!(handler.has_warnings());
}

#[test]
fn self_referencing_macro_aliasing_a_builtin_falls_through_to_it() {
    // A malformed registry can alias a macro's name to a builtin function
    // name. The cycle hit on the body's own re-reference to `size` must not
    // resolve that inner field to `MatchNothing` outright: it falls through
    // to the function table first, same as an unregistered name would, and
    // resolves to `size`'s own empty-field behavior.
    let filters = vec![Filter::new("size", "size:", QueryFlags::empty())];
    let (nodes, handler) = parse_query("size:", &filters, QueryFlags::empty(), NOW);
    assert_eq!(nodes, vec![QueryNode::match_everything(QueryFlags::empty())]);
    assert!(handler.has_warnings());
}

#[test]
fn property_5_bracket_drop_mid_stream() {
    // The unmatched `)` need not be the first token: any prefix with more
    // `)` than `(` discards everything parsed so far in this frame.
    assert_eq!(parse("a)b"), vec![QueryNode::match_nothing()]);
}

#[test]
fn property_6_not_parity() {
    let not_foo = parse("NOT foo");
    assert_eq!(parse("NOT NOT NOT foo"), not_foo);
    assert_eq!(parse("NOT NOT foo"), parse("foo"));
}

#[test]
fn property_7_implicit_and_idempotence() {
    assert_eq!(parse("foo bar"), parse("foo AND bar"));
}

#[test]
fn property_8_numeric_range_symmetry() {
    assert_eq!(parse("size:100..100"), parse("size:100"));
}

#[test]
fn stray_operator_after_open_bracket_is_discarded() {
    let nodes = parse("(OR a OR b)");
    assert_eq!(nodes, vec![word("a"), word("b"), QueryNode::Or]);
}

#[test]
fn unknown_field_becomes_match_nothing() {
    let (nodes, handler) = parse_query("frobnicate:x", &[], QueryFlags::empty(), NOW);
    assert_eq!(nodes, vec![QueryNode::match_nothing()]);
    assert!(handler.has_warnings());
}

#[test]
fn empty_function_ignores_its_argument() {
    // `empty` never consumes a following token: a trailing word is left for
    // the main loop and picked up via implicit AND, it is not swallowed as
    // this function's argument.
    assert_eq!(parse("empty:"), vec![QueryNode::child_count(QueryFlags::empty(), 0, 0, Comparison::Equal)]);
    assert_eq!(
        parse("empty:whatever"),
        vec![QueryNode::child_count(QueryFlags::empty(), 0, 0, Comparison::Equal), word("whatever"), QueryNode::And]
    );
}

#[test]
fn parent_forces_exact_match() {
    assert_eq!(parse("parent:/home"), vec![QueryNode::parent("/home", QueryFlags::EXACT_MATCH)]);
}

#[test]
fn depth_and_parents_are_aliases() {
    assert_eq!(parse("depth:3"), parse("parents:3"));
}
