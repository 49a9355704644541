//! Composes the final post text for an item

/// Join caption, item link, and tag line with blank-line separators,
/// skipping the parts that are absent.
pub fn compose_post(caption: Option<&str>, item: &str, tags: &[String]) -> String {
    let tag_line = tags.join(" ");

    let mut sections: Vec<&str> = Vec::with_capacity(3);
    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        sections.push(caption);
    }
    sections.push(item);
    if !tag_line.is_empty() {
        sections.push(&tag_line);
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_link_and_tags_are_blank_line_separated() {
        let tags = vec!["#one".to_string(), "#two".to_string()];
        let text = compose_post(Some("A caption"), "https://example.com/a", &tags);
        assert_eq!(text, "A caption\n\nhttps://example.com/a\n\n#one #two");
    }

    #[test]
    fn without_caption_the_link_leads() {
        let tags = vec!["#one".to_string()];
        let text = compose_post(None, "https://example.com/a", &tags);
        assert_eq!(text, "https://example.com/a\n\n#one");
    }

    #[test]
    fn without_tags_the_post_ends_with_the_link() {
        let text = compose_post(Some("A caption"), "https://example.com/a", &[]);
        assert_eq!(text, "A caption\n\nhttps://example.com/a");
    }

    #[test]
    fn bare_link_composes_to_itself() {
        let text = compose_post(None, "https://example.com/a", &[]);
        assert_eq!(text, "https://example.com/a");
    }
}
