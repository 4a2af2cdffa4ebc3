//! The WinAnsi (CP-1252) repertoire of the standard PDF fonts.
//!
//! Layout folds every line into this repertoire before positioning it, so the
//! preview and the export draw the same characters. Accented Latin letters
//! outside the code page lose their accent; anything else becomes `?`.

const REPLACEMENT: char = '?';

/// Base letters for U+0100..=U+017F (Latin Extended-A), in code point order.
/// Entries that are themselves WinAnsi (Œ, Š, Ÿ, Ž and lower cases) are kept.
const LATIN_EXTENDED_A: &str = concat!(
    "AaAaAaCcCcCcCcDd",
    "DdEeEeEeEeEeGgGg",
    "GgGgHhHhIiIiIiIi",
    "IiIiJjKkkLlLlLlL",
    "lLlNnNnNnnNnOoOo",
    "OoŒœRrRrRrSsSsSs",
    "ŠšTtTtTtUuUuUuUu",
    "UuUuWwYyŸZzZzŽžs",
);

/// CP-1252 byte for `c`, or `None` when the code page cannot show it.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => return None,
    };
    Some(byte)
}

fn fold_char(c: char) -> char {
    if win_ansi_byte(c).is_some() {
        return c;
    }
    match c {
        '\u{0100}'..='\u{017f}' => LATIN_EXTENDED_A
            .chars()
            .nth(c as usize - 0x100)
            .unwrap_or(REPLACEMENT),
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2212}' => '-',
        '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' => ' ',
        _ => REPLACEMENT,
    }
}

/// Folds `text` into characters every document sink can draw.
pub fn fold_to_win_ansi(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Encodes text for a WinAnsi-encoded PDF string. Expects folded input;
/// stray characters are written as `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| win_ansi_byte(c).unwrap_or(b'?'))
        .collect()
}
