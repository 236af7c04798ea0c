//! Converts Markdown bodies to HTML and scans raw Markdown for images and
//! block quotes.

use crate::htmlrenderer::push_html;
use pulldown_cmark::{Options, Parser};
use regex::Regex;
use std::io;
use std::sync::LazyLock;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("image pattern is valid")
});

/// Converts markdown to HTML. Supports the CommonMark basics plus tables,
/// strikethrough, task lists and footnotes. See [`crate::htmlrenderer`] for
/// how code blocks, images and headings are rendered.
pub fn to_html(markdown: &str) -> io::Result<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut html = String::with_capacity(markdown.len() + markdown.len() / 2);
    push_html(&mut html, Parser::new_ext(markdown, options))?;
    Ok(html)
}

/// Returns the target of every `![alt](url)` image in `markdown`, in
/// document order.
pub fn extract_images(markdown: &str) -> Vec<String> {
    IMAGE
        .captures_iter(markdown)
        .map(|caps| caps[2].to_owned())
        .collect()
}

/// Returns the text of every block quote line (`> text`) in `markdown`, in
/// document order, with the marker and surrounding whitespace stripped.
pub fn extract_quotes(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .filter_map(|line| line.strip_prefix('>'))
        .map(str::trim)
        .filter(|quote| !quote.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_ids() -> io::Result<()> {
        assert_eq!(
            to_html("# Hello World")?,
            "<h1 id=\"hello-world\">Hello World</h1>\n"
        );
        assert_eq!(
            to_html("## Using `cargo`  *well*")?,
            "<h2 id=\"using-cargo-well\">Using <code>cargo</code>  <em>well</em></h2>\n"
        );
        Ok(())
    }

    #[test]
    fn test_multiline_heading_id() -> io::Result<()> {
        assert_eq!(
            to_html("Hello\nWorld\n=====\n")?,
            "<h1 id=\"hello-world\">Hello<br />\nWorld</h1>\n"
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_headings_share_ids() -> io::Result<()> {
        let html = to_html("# Notes\n\n# Notes\n")?;
        assert_eq!(html.matches("id=\"notes\"").count(), 2);
        Ok(())
    }

    #[test]
    fn test_code_blocks() -> io::Result<()> {
        assert_eq!(
            to_html("```rust\nlet x = a < b;\n```")?,
            "<pre><code class=\"language-rust\">let x = a &lt; b;\n</code></pre>\n"
        );
        assert_eq!(
            to_html("```\nplain\n```")?,
            "<pre><code class=\"language-text\">plain\n</code></pre>\n"
        );
        assert_eq!(
            to_html("    indented\n")?,
            "<pre><code class=\"language-text\">indented\n</code></pre>\n"
        );
        Ok(())
    }

    #[test]
    fn test_images() -> io::Result<()> {
        assert_eq!(
            to_html("![A cat](/img/cat.jpg \"Sleepy\")")?,
            "<p><img src=\"/img/cat.jpg\" alt=\"A cat\" title=\"Sleepy\"></p>\n"
        );
        assert_eq!(
            to_html("![](/img/dog.jpg)")?,
            "<p><img src=\"/img/dog.jpg\" alt=\"\" title=\"\"></p>\n"
        );
        Ok(())
    }

    #[test]
    fn test_blocks() -> io::Result<()> {
        assert_eq!(
            to_html("> quoted *text*\n\n- one\n- [two](/two)\n")?,
            "<blockquote>\n<p>quoted <em>text</em></p>\n</blockquote>\n\
             <ul>\n<li>one</li>\n<li><a href=\"/two\" title=\"\">two</a></li>\n</ul>\n"
        );
        assert_eq!(to_html("line one\nline two")?, "<p>line one<br />\nline two</p>\n");
        Ok(())
    }

    #[test]
    fn test_extract_images() {
        let md = "![first](a.png) text ![](b.jpg)\n\n![third](https://x.org/c.gif)";
        assert_eq!(extract_images(md), vec!["a.png", "b.jpg", "https://x.org/c.gif"]);
    }

    #[test]
    fn test_extract_quotes() {
        let md = "> Be curious.\nnot a quote\n>   Stay foolish.  \n>\n  > indented";
        assert_eq!(extract_quotes(md), vec!["Be curious.", "Stay foolish."]);
    }
}
