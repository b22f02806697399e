//! Lexical helpers for the fixed eta-hsm source convention
//!
//! The extraction passes classify lines with cheap substring checks and then
//! pull names out of them with the delimiter tokenizer below. This is
//! deliberately not a C++ grammar: the inputs are produced by one narrow
//! code-generation convention, and a token stream is all the structure the
//! markers need.

use chumsky::prelude::*;

/// Non-whitespace characters that separate tokens in convention lines.
///
/// Matches the separators found in both the template form
/// (`using Sober = eta_hsm::LeafState<Traits<State::eSober>, Awake>;`)
/// and the macro form (`ETA_HSM_LEAF_STATE(Machine, Sober, Awake);`).
const DELIMITERS: &[char] = &[',', ':', ';', '<', '>', '(', ')', '|'];

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || DELIMITERS.contains(&c)
}

/// Parse a single token (a run of non-delimiter characters)
fn token<'src>() -> impl Parser<'src, &'src str, String, extra::Err<Rich<'src, char>>> + Clone {
    any()
        .filter(|c: &char| !is_delimiter(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
}

/// Parse a whole line into its tokens, discarding delimiters
fn line_tokens<'src>() -> impl Parser<'src, &'src str, Vec<String>, extra::Err<Rich<'src, char>>> {
    let leading = any().filter(|c: &char| is_delimiter(*c)).repeated();
    let trailing = any().filter(|c: &char| is_delimiter(*c)).repeated();

    leading
        .ignore_then(
            token()
                .then_ignore(trailing)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
}

/// Split a line into typed tokens on the convention's delimiter set.
///
/// Every character is either part of a token or a delimiter, so this cannot
/// fail on real input; an unparseable line yields no tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line_tokens().parse(line).into_result().unwrap_or_default()
}

/// True for `//` comment lines, which every pass skips
pub fn is_comment(line: &str) -> bool {
    line.trim().starts_with("//")
}

/// The first whitespace-separated word of a line, if any
pub fn first_word(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// The `n`-th `::`-separated segment of a line.
///
/// Convention lines qualify names with namespaces
/// (`example_control::Alive::handleEvent(...)`), so segment 1 is usually the
/// state name. Callers skip an interposed `detail` segment themselves.
pub fn scope_segment(line: &str, n: usize) -> Option<&str> {
    line.split("::").nth(n)
}

/// Extract a guard expression from an `if` line.
///
/// Takes the remainder of the line after the `if` keyword and trims one
/// layer of outer parentheses plus any trailing open brace, so
/// `if (getBac() >= 0.08) {` yields `getBac() >= 0.08`.
pub fn guard_expression(line: &str) -> String {
    let rest = match line.find("if") {
        Some(pos) => line[pos + 2..].trim(),
        None => line.trim(),
    };
    let rest = rest.strip_suffix('{').map(str::trim).unwrap_or(rest);
    strip_outer_parens(rest).to_string()
}

/// Strip one outermost balanced parenthesis pair, if the whole expression
/// is wrapped in it
fn strip_outer_parens(expr: &str) -> &str {
    let inner = match expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) {
        Some(inner) => inner,
        None => return expr,
    };
    // Only strip when the first '(' matches the last ')'
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return expr;
                }
            }
            _ => {}
        }
    }
    if depth == 0 {
        inner.trim()
    } else {
        expr
    }
}

/// Strip the `e` prefix the convention puts on state enumerators
/// (`eAlive` names the state `Alive`)
pub fn strip_enum_prefix(name: &str) -> &str {
    name.strip_prefix('e').unwrap_or(name)
}
