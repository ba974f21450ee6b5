//! Pulls chemical formulas out of free-form LLM replies.
//!
//! Replies are expected to contain a list literal such as `['TiO2', "ZnO"]`,
//! possibly wrapped in a markdown code fence and surrounded by prose. Only the
//! first list is considered; nothing is guessed from the surrounding text.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:python|text)?\n|```").expect("valid fence pattern"));
static FIRST_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("valid list pattern"));
static FORMULA_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9()]+$").expect("valid token pattern"));
/// Python int, float and imaginary literals, with an optional sign.
static NUMBER_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[+-]?(?:",
        r"0[xX](?:_?[0-9a-fA-F])+|0[oO](?:_?[0-7])+|0[bB](?:_?[01])+",
        r"|(?:[0-9](?:_?[0-9])*\.?(?:[0-9](?:_?[0-9])*)?|\.[0-9](?:_?[0-9])*)",
        r"(?:[eE][+-]?[0-9](?:_?[0-9])*)?[jJ]?",
        r")$"
    ))
    .expect("valid number pattern")
});

/// An element of a parsed list literal.
#[derive(Debug, Clone, PartialEq)]
enum ListItem {
    Text(String),
    Other,
}

/// Returns the formulas found in `text`, in reply order, without duplicates.
pub fn extract_formulas(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let cleaned = CODE_FENCE.replace_all(text, "");
    let Some(candidate) = FIRST_LIST.find(&cleaned) else {
        tracing::debug!("No list literal found in reply");
        return Vec::new();
    };

    let items = match parse_python_list(candidate.as_str()).or_else(|| parse_json_list(candidate.as_str())) {
        Some(items) => items,
        None => {
            tracing::warn!("⚠️ Could not parse list from reply: {}", candidate.as_str());
            return Vec::new();
        }
    };

    let valid = items.into_iter().filter_map(|item| match item {
        ListItem::Text(s) => {
            let s = s.trim().to_string();
            FORMULA_TOKEN.is_match(&s).then_some(s)
        }
        ListItem::Other => None,
    });

    dedup_preserving_order(valid)
}

pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Renders formulas the way a Python list prints: `['TiO2', 'ZnO']`.
pub fn python_list_repr(formulas: &[String]) -> String {
    let quoted: Vec<String> = formulas
        .iter()
        .map(|f| format!("'{}'", f.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn parse_json_list(candidate: &str) -> Option<Vec<ListItem>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(candidate).ok()?;
    Some(
        values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => ListItem::Text(s),
                _ => ListItem::Other,
            })
            .collect(),
    )
}

/// Parses a flat Python list literal of strings and scalar constants.
fn parse_python_list(candidate: &str) -> Option<Vec<ListItem>> {
    let mut chars = candidate.chars().peekable();
    if chars.next()? != '[' {
        return None;
    }

    let mut items = Vec::new();
    loop {
        skip_whitespace(&mut chars);
        match chars.peek()? {
            ']' => {
                chars.next();
                break;
            }
            '\'' | '"' => {
                let quote = chars.next()?;
                items.push(ListItem::Text(read_quoted(&mut chars, quote)?));
            }
            _ => {
                let token = read_bare(&mut chars);
                if !is_scalar_constant(&token) {
                    return None;
                }
                items.push(ListItem::Other);
            }
        }

        skip_whitespace(&mut chars);
        match chars.next()? {
            ',' => continue,
            ']' => break,
            _ => return None,
        }
    }

    skip_whitespace(&mut chars);
    chars.peek().is_none().then_some(items)
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn skip_whitespace(chars: &mut Chars<'_>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn read_quoted(chars: &mut Chars<'_>, quote: char) -> Option<String> {
    let mut out = String::new();
    loop {
        match chars.next()? {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                c @ ('\\' | '\'' | '"') => out.push(c),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            '\n' => return None,
            c if c == quote => return Some(out),
            c => out.push(c),
        }
    }
}

fn read_bare(chars: &mut Chars<'_>) -> String {
    let mut token = String::new();
    while let Some(&c) = chars.peek() {
        if c == ',' || c == ']' || c.is_whitespace() {
            break;
        }
        token.push(c);
        chars.next();
    }
    token
}

fn is_scalar_constant(token: &str) -> bool {
    matches!(token, "True" | "False" | "None") || NUMBER_LITERAL.is_match(token)
}
