//! Extraction of tagged debug breadcrumbs from pasted application logs.

use std::sync::LazyLock;

/// Marker the instrumented application prints in front of each breadcrumb.
pub const DEBUG_LOG_TAG: &str = "PYTHAGORA_DEBUGGING_LOG";

static TAGGED_LINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"PYTHAGORA_DEBUGGING_LOG:\s*(.*)").expect("tagged line regex should be valid")
});

/// Keep only the text after the debug tag, one breadcrumb per line.
///
/// Lines without the tag are dropped, as are tagged lines with nothing after
/// the colon. Output order follows input order.
pub fn extract_debug_lines(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    raw.lines()
        .filter(|line| line.contains(DEBUG_LOG_TAG))
        .filter_map(|line| TAGGED_LINE_RE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tagged_lines_in_order() {
        let raw = "noise\nPYTHAGORA_DEBUGGING_LOG: x=1\nmore noise\nPYTHAGORA_DEBUGGING_LOG:y=2";
        assert_eq!(extract_debug_lines(raw), "x=1\ny=2");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(extract_debug_lines(""), "");
    }

    #[test]
    fn input_without_tags_yields_empty_output() {
        let raw = "GET /api/users 200\nserver listening on 3000\n";
        assert_eq!(extract_debug_lines(raw), "");
    }

    #[test]
    fn keeps_exactly_the_tagged_lines_among_noise() {
        let tagged = ["user id is 7", "cart total=0", "  padded   value"];
        let mut raw = String::new();
        for (i, text) in tagged.iter().enumerate() {
            raw.push_str(&format!("noise line {i}\n"));
            raw.push_str(&format!("[web] PYTHAGORA_DEBUGGING_LOG:{text}\n"));
            raw.push_str("another noise line\n");
        }

        let out = extract_debug_lines(&raw);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["user id is 7", "cart total=0", "padded   value"]);
    }

    #[test]
    fn tag_without_colon_or_text_is_skipped() {
        let raw = "PYTHAGORA_DEBUGGING_LOG\nPYTHAGORA_DEBUGGING_LOG:\nPYTHAGORA_DEBUGGING_LOG:   \nPYTHAGORA_DEBUGGING_LOG: kept";
        assert_eq!(extract_debug_lines(raw), "kept");
    }

    #[test]
    fn text_before_the_tag_is_discarded() {
        let raw = "2024-01-01T00:00:00Z INFO PYTHAGORA_DEBUGGING_LOG: order=42 status=paid";
        assert_eq!(extract_debug_lines(raw), "order=42 status=paid");
    }
}
