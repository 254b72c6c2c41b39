//! Symbol folding and whitespace cleanup for OCR text, plus the
//! normalization used for answer equality.
//!
//! All functions here are pure and total: unknown characters pass
//! through unchanged and nothing ever fails.

/// Fixed table of math / typographic symbols folded to ASCII.
///
/// Two glyphs folding to the same ASCII form (e.g. `×` and `∗`) compare
/// equal downstream; that is the contract, not an accident.
fn fold_symbol(c: char) -> Option<&'static str> {
    Some(match c {
        '×' | '∙' | '•' | '·' | '∗' => "*",
        '÷' | '∕' => "/",
        '−' | '—' | '–' => "-",
        '“' | '”' => "\"",
        '‘' | '’' => "'",
        '√' => "sqrt",
        '∞' => "infinity",
        'π' => "pi",
        'θ' => "theta",
        '≈' => "approximately equal to",
        '≠' => "!=",
        '≤' => "<=",
        '≥' => ">=",
        '∫' => "integrate ",
        '∑' => "sum ",
        '∂' => "partial ",
        '±' => "+/-",
        '°' => " degrees",
        _ => return None,
    })
}

fn fold_superscript(c: char) -> Option<&'static str> {
    Some(match c {
        '⁰' => "^0",
        '¹' => "^1",
        '²' => "^2",
        '³' => "^3",
        '⁴' => "^4",
        '⁵' => "^5",
        '⁶' => "^6",
        '⁷' => "^7",
        '⁸' => "^8",
        '⁹' => "^9",
        _ => return None,
    })
}

fn fold_subscript(c: char) -> Option<&'static str> {
    Some(match c {
        '₀' => "_0",
        '₁' => "_1",
        '₂' => "_2",
        '₃' => "_3",
        '₄' => "_4",
        '₅' => "_5",
        '₆' => "_6",
        '₇' => "_7",
        '₈' => "_8",
        '₉' => "_9",
        _ => return None,
    })
}

/// Clean up common OCR issues and math symbols.
///
/// Strips zero-width characters, folds the symbol table, replaces
/// control characters with spaces, collapses whitespace runs, trims.
/// Idempotent: cleaning cleaned text is a no-op.
pub fn clean_extracted_text(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());

    for c in raw.chars() {
        if matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}') {
            continue;
        }
        if let Some(ascii) = fold_symbol(c)
            .or_else(|| fold_superscript(c))
            .or_else(|| fold_subscript(c))
        {
            folded.push_str(ascii);
        } else if c.is_control() {
            folded.push(' ');
        } else {
            folded.push(c);
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form used for answer equality.
///
/// Removes all whitespace, folds superscript 2–10 to caret notation,
/// lowercases. This is lenient *string* equality, not math: `"4"` and
/// `"4.0"` stay different.
pub fn normalize_answer(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        match c {
            '¹' if chars.peek() == Some(&'⁰') => {
                chars.next();
                out.push_str("^10");
            }
            '²' => out.push_str("^2"),
            '³' => out.push_str("^3"),
            '⁴' => out.push_str("^4"),
            '⁵' => out.push_str("^5"),
            '⁶' => out.push_str("^6"),
            '⁷' => out.push_str("^7"),
            '⁸' => out.push_str("^8"),
            '⁹' => out.push_str("^9"),
            _ => out.extend(c.to_lowercase()),
        }
    }

    out
}

/// Remove elements equal to their immediate predecessor.
///
/// Non-adjacent repeats survive.
pub fn dedupe_consecutive<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if out.last() != Some(&item) {
            out.push(item);
        }
    }
    out
}
