//! Text cleanup shared by the processor and the collectors.

/// Strips HTML tags from a string, returning plain text.
pub(crate) fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
}

/// Cleans an HTML fragment pulled out of an API payload: tags removed,
/// `&nbsp;` entities turned into spaces, surrounding whitespace trimmed.
pub(crate) fn clean_html_fragment(html: &str) -> String {
    strip_html(html).replace("&nbsp;", " ").trim().to_string()
}

/// Full cleanup applied to question titles and bodies: HTML tags and
/// control characters removed, whitespace runs collapsed to single spaces,
/// leading/trailing whitespace trimmed.
pub(crate) fn clean_text(text: &str) -> String {
    let stripped: String = strip_html(text)
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_tags() {
        assert_eq!(strip_html("<p>hello <b>world</b></p>"), "hello world");
    }

    #[test]
    fn clean_fragment_handles_nbsp() {
        assert_eq!(clean_html_fragment("<span>a&nbsp;b</span> "), "a b");
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  股票\t怎么 \n 入门  "), "股票 怎么 入门");
    }

    #[test]
    fn clean_text_strips_control_characters() {
        assert_eq!(clean_text("a\u{0001}b\u{009f}c"), "abc");
    }

    #[test]
    fn clean_text_is_idempotent() {
        let once = clean_text("<div> what  is\tthis </div>");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(strip_html(""), "");
    }
}
