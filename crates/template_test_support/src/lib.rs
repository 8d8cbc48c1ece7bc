pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_text`]. Returns `None` on a malformed escape.
pub fn unescape_text(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let mut hex = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        c => hex.push(c),
                    }
                }
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    use std::fmt::Write;
    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map(String::as_str).unwrap_or("<missing>")
    }
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(
                &mut out,
                "{marker} {:>4}  expected: {}",
                line_idx + 1,
                line(expected, line_idx)
            );
            let _ = writeln!(
                &mut out,
                "{marker} {:>4}    actual: {}",
                line_idx + 1,
                line(actual, line_idx)
            );
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Line diff of two rendered documents.
pub fn diff_text(expected: &str, actual: &str) -> String {
    let split = |s: &str| s.split('\n').map(escape_text).collect::<Vec<_>>();
    diff_lines(&split(expected), &split(actual))
}

pub mod fixtures;

#[cfg(feature = "outline")]
pub mod outline;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_round_trips() {
        let text = "a \"b\"\n\tc\\ \u{1}";
        let escaped = escape_text(text);
        assert_eq!(escaped, "a \\\"b\\\"\\n\\tc\\\\ \\u{01}");
        assert_eq!(unescape_text(&escaped).as_deref(), Some(text));
        assert_eq!(unescape_text("bad \\q"), None);
    }

    #[test]
    fn diff_points_at_first_mismatch() {
        let diff = diff_text("<a>\n<b>\n", "<a>\n<c>\n");
        assert!(diff.starts_with("first mismatch at line 2"));
        assert!(diff.contains(">    2    actual: <c>"));
    }

    #[test]
    fn diff_marks_lines_missing_on_one_side() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let actual = vec!["a".to_string()];
        let diff = diff_lines(&expected, &actual);
        assert!(diff.contains(">    2  expected: b"));
        assert!(diff.contains("actual: <missing>"));
        assert!(diff.ends_with("expected 2 lines, actual 1 lines\n"));
    }
}
