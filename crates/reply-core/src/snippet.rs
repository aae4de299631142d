//! Embed snippet for the Reply.sh chat widget.

/// Script the snippet loads
pub const WIDGET_SCRIPT_URL: &str = "https://cdn.reply.sh/widget.js";

/// HTML to paste before the closing `</body>` tag of the website with `website_id`.
pub fn embed_snippet(website_id: &str) -> String {
    format!(
        r#"<!-- Reply.sh Chatbot -->
<script>
  (function() {{
    window.replyConfig = {{ websiteId: '{id}' }};
    var script = document.createElement('script');
    script.src = '{src}';
    script.async = true;
    document.body.appendChild(script);
  }})();
</script>"#,
        id = escape_js_single_quoted(website_id),
        src = WIDGET_SCRIPT_URL,
    )
}

/// Keep an id from breaking out of the single-quoted JS string or the script tag
fn escape_js_single_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '<' => out.push_str("\\x3C"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_snippet_exact() {
        let expected = "<!-- Reply.sh Chatbot -->\n<script>\n  (function() {\n    window.replyConfig = { websiteId: 'w-123' };\n    var script = document.createElement('script');\n    script.src = 'https://cdn.reply.sh/widget.js';\n    script.async = true;\n    document.body.appendChild(script);\n  })();\n</script>";
        assert_eq!(embed_snippet("w-123"), expected);
    }

    #[test]
    fn test_embed_snippet_escapes_id() {
        let snippet = embed_snippet("x'</script>");
        assert!(snippet.contains(r"websiteId: 'x\'\x3C/script>'"));
        assert_eq!(snippet.matches("</script>").count(), 1);
    }
}
