use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static RE_DOTTED_MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^a-z])([ap])\.\s?m\.").expect("invalid regex: dotted meridiem")
});

static RE_LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li)\s*>").expect("invalid regex: line break")
});

/// Collapses every run of whitespace (NBSP included) to one space and trims.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes `text` and rewrites dotted `a.m.`/`p.m.` as `AM`/`PM`.
pub fn canonicalize_clock(text: &str) -> String {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return normalized;
    }
    RE_DOTTED_MERIDIEM
        .replace_all(&normalized, |caps: &regex::Captures| {
            format!("{}{}M", &caps[1], caps[2].to_uppercase())
        })
        .into_owned()
}

/// Visible text of an HTML fragment with entities decoded and whitespace
/// normalized.
pub fn html_fragment_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    normalize(&fragment.root_element().text().collect::<String>())
}

/// Splits a table cell's inner HTML on `<br>` and block-closing tags, returning
/// the non-empty normalized lines in order.
pub fn cell_to_lines(html: &str) -> Vec<String> {
    RE_LINE_BREAK
        .split(html)
        .map(html_fragment_to_text)
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Committee\u{a0}on \n\tFinance  "), "Committee on Finance");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \u{a0} "), "");
    }

    #[test]
    fn test_canonicalize_clock() {
        assert_eq!(canonicalize_clock("10:00 a.m."), "10:00 AM");
        assert_eq!(canonicalize_clock(" 1:30\u{a0}P.M. "), "1:30 PM");
        assert_eq!(canonicalize_clock("9:30 a. m."), "9:30 AM");
        assert_eq!(canonicalize_clock("9:30a.m."), "9:30AM");
        assert_eq!(canonicalize_clock("01:30 PM"), "01:30 PM");
        assert_eq!(canonicalize_clock("upon adjournment"), "upon adjournment");
        assert_eq!(canonicalize_clock(""), "");
    }

    #[test]
    fn test_canonicalize_clock_is_idempotent() {
        for input in ["10:00 a.m.", "2 p.m. onwards", "noon", " 11:15\u{a0}a.m. ", ""] {
            let once = canonicalize_clock(input);
            assert_eq!(canonicalize_clock(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_html_fragment_to_text_decodes_entities() {
        assert_eq!(
            html_fragment_to_text("<b>Ways &amp; Means</b>&nbsp;<i>Room 1</i>"),
            "Ways & Means Room 1"
        );
        assert_eq!(html_fragment_to_text("   "), "");
    }

    #[test]
    fn test_cell_to_lines() {
        let lines = cell_to_lines("10:00 a.m.<br>Plenary Hall<BR/> <br />Senate Building");
        assert_eq!(lines, vec!["10:00 a.m.", "Plenary Hall", "Senate Building"]);

        let lines = cell_to_lines("<p>Item one</p><p> Item&nbsp;two </p>");
        assert_eq!(lines, vec!["Item one", "Item two"]);

        assert!(cell_to_lines("<br><br>").is_empty());
    }
}
