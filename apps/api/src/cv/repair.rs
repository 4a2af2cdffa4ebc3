//! Forgiving text repair for model output that was meant to be JSON.
//!
//! Models asked for "JSON only" still wrap answers in code fences, prepend a
//! sentence of prose, leave `// comments` in, or end arrays with a trailing
//! comma. Each rule below is a pure `&str → String` pass; `repair_json_text`
//! runs them in order. Rules that touch punctuation track string literals, so
//! `"https://example.com"` or `"a, ]"` inside a value is never altered.
//!
//! ## Rule Order
//!
//! Fences first (they may contain the only braces), then the brace span (drops
//! prose around the object), then comments, then trailing commas (a comment
//! can sit between a comma and its closing bracket).

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all repair rules to raw model output.
pub fn repair_json_text(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = slice_object_span(&s);
    let s = strip_comments(&s);
    let s = strip_trailing_commas(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip markdown code fences ──────────────────────────────────────

static RE_CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)\r?\n?[ \t]*```").unwrap());

fn strip_code_fences(input: &str) -> String {
    match RE_CODE_FENCE.captures(input) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Keep only the first `{` … last `}` span ─────────────────────────

fn slice_object_span(input: &str) -> String {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if start < end => input[start..=end].to_string(),
        _ => input.to_string(),
    }
}

// ── Rule 3: Remove `//` and `/* */` comments outside strings ────────────────

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                // Line comment: drop through end of line, keep the newline.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

// ── Rule 4: Remove commas directly before `]` or `}` outside strings ────────

fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}
