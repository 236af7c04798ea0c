//! Implements a custom [`push_html`] with the rendering rules the site's
//! templates and scripts depend on:
//!
//! * code blocks always carry a `language-*` class (`language-text` when the
//!   fence has no info string) and are never highlighted at build time;
//! * images carry their alt text and an always-present `title` attribute;
//! * headings carry an `id` derived from their text, so that `# Hello World`
//!   can be linked as `#hello-world`.
//!
//! [`pulldown_cmark::html::push_html`] has no hooks for any of these.

use crate::util::hyphenate;
use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, LinkType, Tag};
use std::fmt::{self, Display};
use std::io;

/// The code block language used when a fence doesn't name one.
pub const DEFAULT_CODE_LANGUAGE: &str = "text";

struct Adaptor<'a, T> {
    formatter: &'a mut T,
    result: fmt::Result,
}

impl<T> Adaptor<'_, T> {
    fn handle_result(&mut self, result: fmt::Result) -> io::Result<()> {
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.result = result;
                Err(io::Error::new(io::ErrorKind::Other, e))
            }
        }
    }
}

impl<T: fmt::Write> StrWrite for Adaptor<'_, T> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        let result = self.formatter.write_str(s);
        self.handle_result(result)
    }

    fn write_fmt(&mut self, args: fmt::Arguments) -> io::Result<()> {
        let result = self.formatter.write_fmt(args);
        self.handle_result(result)
    }
}

struct EscapeHref<'a>(&'a str);

impl Display for EscapeHref<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adaptor = Adaptor {
            formatter: f,
            result: Ok(()),
        };
        let _ = escape_href(&mut adaptor, self.0);
        adaptor.result
    }
}

struct EscapeHtml<'a>(&'a str);

impl Display for EscapeHtml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adaptor = Adaptor {
            formatter: f,
            result: Ok(()),
        };
        let _ = escape_html(&mut adaptor, self.0);
        adaptor.result
    }
}

enum TableState {
    Head,
    Body,
}

/// Renders markdown [`Event`]s into HTML. This is largely modeled after
/// [`pulldown_cmark`]'s private `HtmlWriter` struct.
struct HtmlRenderer {
    table_alignments: Vec<Alignment>,
    table_state: TableState,
    table_cell_index: usize,
}

impl HtmlRenderer {
    fn new() -> Self {
        HtmlRenderer {
            table_alignments: Vec::default(),
            table_state: TableState::Head,
            table_cell_index: usize::default(),
        }
    }

    /// Renders every event in `events`. Headings and images need their inner
    /// text before their opening tag can be written, so their events are
    /// consumed here rather than in [`HtmlRenderer::on_event`].
    fn run<'a, W, I>(&mut self, w: &mut W, mut events: I) -> io::Result<()>
    where
        W: StrWrite,
        I: Iterator<Item = Event<'a>>,
    {
        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::Heading(level)) => {
                    self.on_heading(w, level, &mut events)?
                }
                Event::Start(Tag::Image(_link_type, dest, title)) => {
                    self.on_image(w, dest, title, &mut events)?
                }
                event => self.on_event(w, event)?,
            }
        }
        Ok(())
    }

    fn on_heading<'a, W, I>(
        &mut self,
        w: &mut W,
        level: u32,
        events: &mut I,
    ) -> io::Result<()>
    where
        W: StrWrite,
        I: Iterator<Item = Event<'a>>,
    {
        let mut inner = Vec::new();
        let mut text = String::new();
        for event in events.by_ref() {
            match &event {
                Event::End(Tag::Heading(_)) => break,
                Event::Text(s) | Event::Code(s) => text.push_str(s),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                _ => {}
            }
            inner.push(event);
        }

        let mut contents = String::new();
        self.run(&mut contents, inner.into_iter())?;
        write!(
            w,
            "<h{} id=\"{}\">{}</h{}>\n",
            level,
            EscapeHtml(&hyphenate(&text)),
            contents,
            level,
        )
    }

    fn on_image<'a, W, I>(
        &mut self,
        w: &mut W,
        dest: CowStr<'a>,
        title: CowStr<'a>,
        events: &mut I,
    ) -> io::Result<()>
    where
        W: StrWrite,
        I: Iterator<Item = Event<'a>>,
    {
        let mut alt = String::new();
        for event in events.by_ref() {
            match event {
                Event::End(Tag::Image(..)) => break,
                Event::Text(s) | Event::Code(s) => alt.push_str(&s),
                _ => {}
            }
        }
        write!(
            w,
            r#"<img src="{}" alt="{}" title="{}">"#,
            EscapeHref(&dest),
            EscapeHtml(&alt),
            EscapeHtml(&title),
        )
    }

    fn on_event<'a, W: StrWrite>(
        &mut self,
        w: &mut W,
        event: Event<'a>,
    ) -> io::Result<()> {
        match event {
            Event::Start(tag) => self.on_start(w, tag),
            Event::End(tag) => self.on_end(w, tag),
            Event::Code(code) => self.on_code(w, code),
            Event::FootnoteReference(name) => write!(
                w,
                r##"<sup class="footnote-reference"><a href="#{}">{}</a></sup>"##,
                EscapeHtml(&name),
                EscapeHtml(&name),
            ),
            Event::HardBreak => w.write_str("<br />\n"),
            Event::Html(html) => w.write_str(&html),
            Event::Rule => w.write_str("<hr />\n"),
            // Single newlines inside a paragraph are kept as line breaks.
            Event::SoftBreak => w.write_str("<br />\n"),
            Event::TaskListMarker(checked) => write!(
                w,
                r#"<input disabled="" type="checkbox" {}/>"#,
                match checked {
                    true => r#"checked="" "#,
                    false => "",
                }
            ),
            Event::Text(text) => escape_html(w, &text),
        }
    }

    fn on_start<'a, W: StrWrite>(
        &mut self,
        w: &mut W,
        tag: Tag<'a>,
    ) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("<blockquote>\n"),
            Tag::CodeBlock(kind) => {
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or(DEFAULT_CODE_LANGUAGE),
                    CodeBlockKind::Indented => DEFAULT_CODE_LANGUAGE,
                };
                write!(w, r#"<pre><code class="language-{}">"#, EscapeHtml(lang))
            }
            Tag::Emphasis => w.write_str("<em>"),
            Tag::FootnoteDefinition(name) => {
                let name = EscapeHtml(&name);
                write!(
                    w,
                    r#"<div class="footnote-definition" id="{}">{}. &nbsp;"#,
                    &name, &name,
                )
            }
            // Consumed by `run`.
            Tag::Heading(_) | Tag::Image(..) => Ok(()),
            Tag::Item => w.write_str("<li>"),
            Tag::Link(LinkType::Email, dest, title) => write!(
                w,
                r#"<a href="mailto:{}" title="{}">"#,
                EscapeHref(&dest),
                EscapeHtml(&title),
            ),
            Tag::Link(_link_type, dest, title) => write!(
                w,
                r#"<a href="{}" title="{}">"#,
                EscapeHref(&dest),
                EscapeHtml(&title),
            ),
            Tag::List(None) => w.write_str("<ul>\n"),
            Tag::List(Some(1)) => w.write_str("<ol>\n"),
            Tag::List(Some(start)) => write!(w, "<ol start=\"{}\">\n", start),
            Tag::Paragraph => w.write_str("<p>"),
            Tag::Strikethrough => w.write_str("<del>"),
            Tag::Strong => w.write_str("<strong>"),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                w.write_str("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                w.write_str("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                w.write_str("<tr>")
            }
            Tag::TableCell => write!(
                w,
                "<{}{}>",
                match self.table_state {
                    TableState::Head => "th",
                    TableState::Body => "td",
                },
                match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => r#" align="left""#,
                    Some(Alignment::Right) => r#" align="right""#,
                    Some(Alignment::Center) => r#" align="center""#,
                    _ => "",
                }
            ),
        }
    }

    fn on_end<W: StrWrite>(&mut self, w: &mut W, tag: Tag) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("</blockquote>\n"),
            Tag::CodeBlock(_) => w.write_str("</code></pre>\n"),
            Tag::Emphasis => w.write_str("</em>"),
            Tag::FootnoteDefinition(_) => w.write_str("</div>\n"),
            // Consumed by `run`.
            Tag::Heading(_) | Tag::Image(..) => Ok(()),
            Tag::Item => w.write_str("</li>\n"),
            Tag::Link(..) => w.write_str("</a>"),
            Tag::List(Some(_)) => w.write_str("</ol>\n"),
            Tag::List(None) => w.write_str("</ul>\n"),
            Tag::Paragraph => w.write_str("</p>\n"),
            Tag::Strikethrough => w.write_str("</del>"),
            Tag::Strong => w.write_str("</strong>"),
            Tag::Table(_) => w.write_str("</tbody></table>\n"),
            Tag::TableHead => {
                self.table_state = TableState::Body;
                w.write_str("</tr></thead><tbody>")
            }
            Tag::TableRow => w.write_str("</tr>"),
            Tag::TableCell => {
                self.table_cell_index += 1;
                w.write_str(match self.table_state {
                    TableState::Head => "</th>",
                    TableState::Body => "</td>",
                })
            }
        }
    }

    fn on_code<W: StrWrite>(&mut self, w: &mut W, s: CowStr) -> io::Result<()> {
        write!(w, "<code>{}</code>", EscapeHtml(&s))
    }
}

/// Converts [`Event`]s into an HTML string much like
/// `pulldown_cmark::html::push_html`, but with the rendering rules described
/// in the module documentation.
pub fn push_html<'a, I>(out: &mut String, events: I) -> io::Result<()>
where
    I: Iterator<Item = Event<'a>>,
{
    HtmlRenderer::new().run(out, events)
}
