/// Escape text for interpolation into a Telegram HTML message.
///
/// Telegram's HTML mode only requires `&`, `<` and `>` to be escaped; an
/// unescaped `<` in a chat title makes the whole send fail with
/// "can't parse entities".
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("Zone 1", "Zone 1")]
    #[case("R&D <team>", "R&amp;D &lt;team&gt;")]
    #[case("a > b && c", "a &gt; b &amp;&amp; c")]
    #[case("émoji 📬", "émoji 📬")]
    fn escapes_special_characters(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_html(input), expected);
    }
}
