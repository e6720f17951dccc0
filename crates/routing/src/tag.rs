/// Marker that flags a message as a request.
pub const DEFAULT_TAG: &str = "#req";

/// Case-insensitive tag matcher.
#[derive(Debug, Clone)]
pub struct TagMarker {
    tag: String,
}

impl Default for TagMarker {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

impl TagMarker {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// Byte range of the first occurrence of the tag in `text`.
    fn find(&self, text: &str) -> Option<(usize, usize)> {
        if self.tag.is_empty() {
            return None;
        }
        text.char_indices().find_map(|(start, _)| {
            let mut rest = text[start..].char_indices();
            for needle in self.tag.chars() {
                let (_, hay) = rest.next()?;
                if !hay.to_lowercase().eq(needle.to_lowercase()) {
                    return None;
                }
            }
            let end = rest.next().map_or(text.len(), |(offset, _)| start + offset);
            Some((start, end))
        })
    }

    #[must_use]
    pub fn is_in(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Request body of a tagged text, or `None` when the tag is absent.
    ///
    /// The body is what follows the first tag; when nothing follows it, the
    /// text before the tag is used instead. Later tags in the body are
    /// removed too.
    #[must_use]
    pub fn strip(&self, text: &str) -> Option<String> {
        let (start, end) = self.find(text)?;
        let after = text[end..].trim();
        let body = if after.is_empty() {
            &text[..start]
        } else {
            after
        };
        Some(self.remove_all(body))
    }

    /// `text` without any tag, the remaining pieces joined by single spaces.
    fn remove_all(&self, text: &str) -> String {
        let mut pieces = Vec::new();
        let mut rest = text;
        while let Some((start, end)) = self.find(rest) {
            pieces.push(rest[..start].trim());
            rest = &rest[end..];
        }
        pieces.push(rest.trim());
        pieces.retain(|piece| !piece.is_empty());
        pieces.join(" ")
    }
}

/// The text sent to the collection chat.
#[must_use]
pub fn format_request(sender: &str, request_title: &str, body: &str) -> String {
    format!("📬 {sender} [{request_title}] : {body}")
}
