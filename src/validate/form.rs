//! Line-oriented form grammar.
//!
//! A bulk submission is a sequence of `<n>. <Label>: <value>` lines. This
//! module parses the layout only; mapping a label to a field key happens
//! in the intake layer via [`canonical_label`]. Parenthetical hints in a
//! label, as in `Order number (9 digits)`, are ignored both when locating
//! the separating colon and when canonicalizing, so the template can carry
//! format reminders without breaking round-trips.

/// One parsed form line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLine {
    /// Leading line number, when present.
    pub index: Option<u32>,
    /// Raw label text (hints included), colon excluded.
    pub label: String,
    /// Everything after the separating colon, trimmed.
    pub value: String,
}

/// Parses a multi-line submission into its labeled lines. Lines without a
/// top-level colon are skipped; the conversational layer decides whether
/// that is an error.
#[must_use]
pub fn parse_form(text: &str) -> Vec<FormLine> {
    text.lines().filter_map(parse_line).collect()
}

/// Parses a single `<n>. <Label>: <value>` line.
#[must_use]
pub fn parse_line(line: &str) -> Option<FormLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (index, rest) = strip_index(trimmed);
    let (label, value) = split_at_top_level_colon(rest)?;
    Some(FormLine {
        index,
        label: label.trim().to_string(),
        value: value.trim().to_string(),
    })
}

/// Canonicalizes a label for key lookup: parenthetical hints removed
/// (ASCII and full-width parentheses), whitespace collapsed, ASCII
/// lowercased.
#[must_use]
pub fn canonical_label(raw: &str) -> String {
    let mut depth: u32 = 0;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '(' | '（' => depth = depth.saturating_add(1),
            ')' | '）' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips an optional leading `<digits>.` / `<digits>)` index.
fn strip_index(line: &str) -> (Option<u32>, &str) {
    let digits: String = line.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return (None, line);
    }
    let Some(rest) = line.get(digits.len()..) else {
        return (None, line);
    };
    let rest = rest.trim_start();
    let Some(after_mark) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) else {
        return (None, line);
    };
    (digits.parse().ok(), after_mark.trim_start())
}

/// Splits at the first colon outside any parenthetical span. Accepts both
/// the ASCII and the full-width colon.
fn split_at_top_level_colon(text: &str) -> Option<(&str, &str)> {
    let mut depth: u32 = 0;
    for (pos, c) in text.char_indices() {
        match c {
            '(' | '（' => depth = depth.saturating_add(1),
            ')' | '）' => depth = depth.saturating_sub(1),
            ':' | '：' if depth == 0 => {
                let label = text.get(..pos)?;
                let value = text.get(pos + c.len_utf8()..)?;
                return Some((label, value));
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_label_value_lines() {
        let lines = parse_form("1. Contact name: Alice\n2. Order number (9 digits): 123456789\n");
        assert_eq!(
            lines,
            vec![
                FormLine {
                    index: Some(1),
                    label: "Contact name".to_string(),
                    value: "Alice".to_string(),
                },
                FormLine {
                    index: Some(2),
                    label: "Order number (9 digits)".to_string(),
                    value: "123456789".to_string(),
                },
            ]
        );
    }

    #[test]
    fn hint_colons_do_not_split_the_label() {
        let line = parse_line("6. Current time slot (HH:MM~HH:MM): 14:00~15:00");
        assert_eq!(
            line,
            Some(FormLine {
                index: Some(6),
                label: "Current time slot (HH:MM~HH:MM)".to_string(),
                value: "14:00~15:00".to_string(),
            })
        );
    }

    #[test]
    fn full_width_colon_is_a_separator() {
        let line = parse_line("3. Phone：555-0100");
        assert_eq!(
            line,
            Some(FormLine {
                index: Some(3),
                label: "Phone".to_string(),
                value: "555-0100".to_string(),
            })
        );
    }

    #[test]
    fn unnumbered_lines_still_parse() {
        let line = parse_line("Email: a@example.com");
        assert_eq!(
            line,
            Some(FormLine {
                index: None,
                label: "Email".to_string(),
                value: "a@example.com".to_string(),
            })
        );
    }

    #[test]
    fn lines_without_a_colon_are_skipped() {
        assert_eq!(parse_line("hello there"), None);
        assert!(parse_form("just chatting\nno form here\n").is_empty());
    }

    #[test]
    fn bare_values_with_inner_colons_are_not_labels() {
        // "14" is not a label the intake layer knows, so this line will be
        // treated as a bare value there; the grammar still reports the split.
        let line = parse_line("14:00~15:00");
        assert_eq!(
            line.map(|l| l.label),
            Some("14".to_string())
        );
    }

    #[test]
    fn canonical_label_strips_hints_and_case() {
        assert_eq!(canonical_label("Order number (9 digits)"), "order number");
        assert_eq!(canonical_label("Current time slot (HH:MM~HH:MM)"), "current time slot");
        assert_eq!(canonical_label("Desired venue（name, number, or \"any\"）"), "desired venue");
        assert_eq!(canonical_label("  Contact   Name "), "contact name");
    }
}
