//! `CREATE TABLE` statement extraction from free-text schema output.
//!
//! This is a lexical scan, not a SQL parser. A statement starts at a
//! `CREATE TABLE` keyword pair. Its column list is closed by a
//! parenthesis-balancing scan that skips quoted literals and SQL comments
//! (`--` and `/* */`). The statement then extends to
//! the next `CREATE TABLE` after that point (or the end of the text). The
//! text between is kept verbatim, so trailing semicolons, table options and
//! prose the model wrote after a statement stay attached to it.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::TableStatement;

fn create_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bCREATE\s+TABLE\b").expect("valid regex"))
}

/// Header up to and including the opening parenthesis of the column list.
fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?\S+?\s*\(")
            .expect("valid regex")
    })
}

fn table_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?`?(\w+)`?").expect("valid regex")
    })
}

/// Extract every `CREATE TABLE` statement in source order.
///
/// Returns an empty vector when the text contains none.
pub fn extract_statements(schema: &str) -> Vec<TableStatement> {
    let mut statements = Vec::new();
    let mut pos = 0;

    while let Some(m) = create_table_re().find_at(schema, pos) {
        let start = m.start();
        let Some(header) = header_re().find(&schema[start..]) else {
            pos = m.end();
            continue;
        };

        // Index just past the opening parenthesis
        let open = start + header.end();
        let Some(close) = find_closing_paren(schema, open) else {
            pos = m.end();
            continue;
        };

        let end = create_table_re()
            .find_at(schema, close)
            .map(|next| next.start())
            .unwrap_or(schema.len());

        let sql = &schema[start..end];
        statements.push(TableStatement {
            name: table_name(sql),
            offset: start,
            sql: sql.to_string(),
        });
        pos = end;
    }

    statements
}

/// Parse the table name out of a statement's own text.
pub fn table_name(statement: &str) -> Option<String> {
    table_name_re()
        .captures(statement)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Scan from just inside an opening parenthesis to the index after its match.
fn find_closing_paren(text: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut chars = text[from..].char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) if c == q => {
                // A doubled quote is an escaped quote
                if chars.peek().map(|&(_, n)| n) == Some(q) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                // Comments may hold unbalanced quotes or parentheses
                '-' if chars.peek().map(|&(_, n)| n) == Some('-') => {
                    for (_, n) in chars.by_ref() {
                        if n == '\n' {
                            break;
                        }
                    }
                }
                '/' if chars.peek().map(|&(_, n)| n) == Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for (_, n) in chars.by_ref() {
                        if prev == '*' && n == '/' {
                            break;
                        }
                        prev = n;
                    }
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(from + i + 1);
                    }
                }
                _ => {}
            },
        }
    }

    None
}
