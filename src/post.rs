//! Defines the content model: [`ContentDocument`] (a parsed source file),
//! [`PageMetadata`] (what the site knows about a post), [`RenderedPage`] (a
//! post ready to be templated), [`PostSummary`] (a post's entry in listings and
//! in the client data file) and [`StandalonePage`]. See
//! [`RenderedPage::to_context`] and [`PostSummary::to_context`] for the values
//! exposed to templates.

use crate::frontmatter::{self, Frontmatter, ParseError};
use crate::markdown;
use crate::util::hyphenate;
use crate::value::{Context, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

/// Words per minute used for reading time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// The URL path under which post pages live.
pub const POSTS_PATH: &str = "blog";

/// A source file split into front matter and Markdown body.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    pub raw_path: PathBuf,
    pub front_matter: Frontmatter,
    pub body_markdown: String,
}

impl ContentDocument {
    /// Parses the contents of the file at `raw_path`.
    pub fn parse(raw_path: &Path, input: &str) -> Result<ContentDocument, ParseError> {
        let (front_matter, body) = frontmatter::parse(input)?;
        Ok(ContentDocument {
            raw_path: raw_path.to_owned(),
            front_matter,
            body_markdown: body.to_owned(),
        })
    }

    /// The front matter value for `key` as a string, if it's present and
    /// truthy.
    fn field(&self, key: &str) -> Option<String> {
        self.front_matter
            .get(key)
            .filter(|value| value.is_truthy())
            .map(Value::to_string)
    }

    fn required(&self, key: &'static str) -> Result<String, ValidationError> {
        self.field(key).ok_or(ValidationError::MissingField(key))
    }

    /// The explicit `slug`, or the file's base name lowercased with
    /// whitespace runs replaced by hyphens. Slugs become file names, so an
    /// empty slug or one containing a path separator or `..` is rejected.
    pub fn slug(&self) -> Result<String, ValidationError> {
        let slug = match self.field("slug") {
            Some(slug) => slug,
            None => hyphenate(
                &self
                    .raw_path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy())
                    .unwrap_or_default(),
            ),
        };
        match slug.is_empty() || slug.contains(['/', '\\']) || slug.contains("..") {
            true => Err(ValidationError::InvalidSlug(slug)),
            false => Ok(slug),
        }
    }
}

/// Values that fill in optional front matter fields.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub author: String,
    pub cover_image: String,
}

/// Everything the site knows about a post apart from its body.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMetadata {
    pub title: String,
    pub date: NaiveDate,
    pub description: String,
    pub author: String,
    pub cover_image: String,
    pub slug: String,
    pub reading_time_minutes: usize,
    pub excerpt: String,
    pub category: Option<String>,
}

impl PageMetadata {
    /// Derives a post's metadata from its document. Fails if `title`, `date`
    /// or `description` is missing, or if `date` doesn't parse.
    pub fn derive(
        doc: &ContentDocument,
        defaults: &Defaults,
    ) -> Result<PageMetadata, ValidationError> {
        let title = doc.required("title")?;
        let raw_date = doc.required("date")?;
        let description = doc.required("description")?;
        let date = parse_date(&raw_date).ok_or(ValidationError::InvalidDate(raw_date))?;

        Ok(PageMetadata {
            title,
            date,
            author: doc.field("author").unwrap_or_else(|| defaults.author.clone()),
            cover_image: doc
                .field("coverImage")
                .unwrap_or_else(|| defaults.cover_image.clone()),
            slug: doc.slug()?,
            reading_time_minutes: reading_time(&doc.body_markdown),
            excerpt: doc.field("excerpt").unwrap_or_else(|| description.clone()),
            category: doc.field("category"),
            description,
        })
    }

    /// The date as readers see it, e.g. `January 5, 2024`.
    pub fn human_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    /// The site-relative URL of the post's page.
    pub fn url(&self) -> String {
        format!("/{}/{}.html", POSTS_PATH, self.slug)
    }
}

/// Estimated minutes to read `markdown`: one minute per
/// [`WORDS_PER_MINUTE`] words, rounded up.
pub fn reading_time(markdown: &str) -> usize {
    let words = markdown.split_whitespace().count();
    (words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE
}

/// Parses `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DD HH:MM[:SS]`, keeping only the
/// calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
                .ok()
                .map(|d| d.date())
        })
}

/// A post ready to be templated.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub metadata: PageMetadata,
    pub body_html: String,
    pub extracted_images: Vec<String>,
    pub extracted_quotes: Vec<String>,

    /// The file the post was parsed from.
    pub source: PathBuf,
}

impl RenderedPage {
    /// Validates and renders a post.
    pub fn render(doc: &ContentDocument, defaults: &Defaults) -> Result<RenderedPage, Error> {
        let metadata = PageMetadata::derive(doc, defaults)?;
        Ok(RenderedPage {
            metadata,
            body_html: markdown::to_html(&doc.body_markdown)?,
            extracted_images: markdown::extract_images(&doc.body_markdown),
            extracted_quotes: markdown::extract_quotes(&doc.body_markdown),
            source: doc.raw_path.clone(),
        })
    }

    /// Converts the post into template values: `title`, `date` (human
    /// readable), `isoDate`, `description`, `author`, `coverImage`, `slug`,
    /// `url`, `readingTime`, `excerpt`, `category`, `content` (the body HTML),
    /// `images` and `quotes`.
    pub fn to_context(&self) -> Context {
        let m = &self.metadata;
        let mut context = Context::new();
        context.insert("title".to_owned(), (&m.title).into());
        context.insert("date".to_owned(), m.human_date().into());
        context.insert("isoDate".to_owned(), m.date.format("%Y-%m-%d").to_string().into());
        context.insert("description".to_owned(), (&m.description).into());
        context.insert("author".to_owned(), (&m.author).into());
        context.insert("coverImage".to_owned(), (&m.cover_image).into());
        context.insert("slug".to_owned(), (&m.slug).into());
        context.insert("url".to_owned(), m.url().into());
        context.insert("readingTime".to_owned(), m.reading_time_minutes.into());
        context.insert("excerpt".to_owned(), (&m.excerpt).into());
        context.insert("category".to_owned(), m.category.as_ref().into());
        context.insert("content".to_owned(), (&self.body_html).into());
        context.insert("images".to_owned(), self.extracted_images.as_slice().into());
        context.insert("quotes".to_owned(), self.extracted_quotes.as_slice().into());
        context
    }
}

/// A post's entry in listings and in the client data file. Field names are
/// serialized in the camel case that browser scripts expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub title: String,
    pub date: String,
    pub excerpt: String,
    pub cover_image: String,
    pub slug: String,
    pub reading_time: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&RenderedPage> for PostSummary {
    fn from(page: &RenderedPage) -> PostSummary {
        let m = &page.metadata;
        PostSummary {
            title: m.title.clone(),
            date: m.human_date(),
            excerpt: m.excerpt.clone(),
            cover_image: m.cover_image.clone(),
            slug: m.slug.clone(),
            reading_time: m.reading_time_minutes,
            category: m.category.clone(),
        }
    }
}

impl PostSummary {
    /// Converts the summary into values for the post card layout. Includes
    /// `url` in addition to the serialized fields.
    pub fn to_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("title".to_owned(), (&self.title).into());
        context.insert("date".to_owned(), (&self.date).into());
        context.insert("excerpt".to_owned(), (&self.excerpt).into());
        context.insert("coverImage".to_owned(), (&self.cover_image).into());
        context.insert("slug".to_owned(), (&self.slug).into());
        context.insert(
            "url".to_owned(),
            format!("/{}/{}.html", POSTS_PATH, self.slug).into(),
        );
        context.insert("readingTime".to_owned(), self.reading_time.into());
        context.insert("category".to_owned(), self.category.as_ref().into());
        context
    }
}

/// A page outside the blog (e.g. "about"). Only `title` is required; every
/// other front matter field is passed through to the page layout as-is.
#[derive(Debug, Clone)]
pub struct StandalonePage {
    pub title: String,
    pub slug: String,
    pub body_html: String,
    pub front_matter: Frontmatter,
    pub source: PathBuf,
}

impl StandalonePage {
    pub fn render(doc: &ContentDocument) -> Result<StandalonePage, Error> {
        Ok(StandalonePage {
            title: doc.required("title")?,
            slug: doc.slug()?,
            body_html: markdown::to_html(&doc.body_markdown)?,
            front_matter: doc.front_matter.clone(),
            source: doc.raw_path.clone(),
        })
    }

    /// Converts the page into template values: its front matter plus `title`,
    /// `slug` and `content`.
    pub fn to_context(&self) -> Context {
        let mut context = self.front_matter.clone();
        context.insert("title".to_owned(), (&self.title).into());
        context.insert("slug".to_owned(), (&self.slug).into());
        context.insert("content".to_owned(), (&self.body_html).into());
        context
    }
}

/// The optional home page document: an introduction shown above the newest
/// posts. Its front matter is passed through to the listing layout, and its
/// body is available as `intro`.
#[derive(Debug, Clone)]
pub struct HomePage {
    pub body_html: String,
    pub front_matter: Frontmatter,
    pub source: PathBuf,
}

impl HomePage {
    pub fn render(doc: &ContentDocument) -> Result<HomePage, Error> {
        Ok(HomePage {
            body_html: markdown::to_html(&doc.body_markdown)?,
            front_matter: doc.front_matter.clone(),
            source: doc.raw_path.clone(),
        })
    }

    /// Converts the home page into template values: its front matter plus
    /// `intro`.
    pub fn to_context(&self) -> Context {
        let mut context = self.front_matter.clone();
        context.insert("intro".to_owned(), (&self.body_html).into());
        context
    }
}

/// Returned when a document lacks what a post needs.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required front matter field `{0}`")]
    MissingField(&'static str),

    #[error("invalid date `{0}`")]
    InvalidDate(String),

    #[error("invalid slug `{0}`")]
    InvalidSlug(String),
}

/// Represents an error turning a [`ContentDocument`] into a page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("rendering markdown: {0}")]
    Io(#[from] io::Error),
}
