//! A minimal substitution engine for HTML layouts, plus [`Theme`], the set of
//! layouts a site is rendered with.
//!
//! [`render`] resolves three constructs, each as one complete pass over the
//! output of the previous pass:
//!
//! 1. `{{#if FIELD}}...{{/if}}` keeps its contents if `FIELD` is truthy (see
//!    [`Value::is_truthy`]) and drops them otherwise.
//! 2. `{{#each FIELD}}...{{/each}}` repeats its contents once per element of
//!    the list `FIELD`, replacing `{{this}}` with the element. A missing or
//!    non-list `FIELD` yields nothing.
//! 3. `{{FIELD}}` is replaced with `FIELD`'s string form, or nothing if it's
//!    missing.
//!
//! Blocks don't nest. Each block ends at the first closing tag of its kind,
//! so an `{{#if}}` inside another `{{#if}}` (or an `{{#each}}` inside an
//! `{{#each}}`) will not do what it looks like. Layouts rely on the fixed
//! if/each/interpolate order, so the engine stays flat.
//!
//! Values are inserted verbatim, without HTML escaping.

use crate::value::{Context, Value};
use regex::{Captures, Regex};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static IF_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{#if (\w+)\}\}(.*?)\{\{/if\}\}").expect("if pattern is valid")
});

static EACH_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{#each (\w+)\}\}(.*?)\{\{/each\}\}").expect("each pattern is valid")
});

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("variable pattern is valid"));

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%\s*include\s+'([^']+)'\s*%\}").expect("include pattern is valid")
});

const THIS: &str = "{{this}}";

/// Renders `template` against `context`. See the module documentation for the
/// supported constructs.
pub fn render(template: &str, context: &Context) -> String {
    let conditionals = IF_BLOCK.replace_all(template, |caps: &Captures| {
        match context.get(&caps[1]) {
            Some(value) if value.is_truthy() => caps[2].to_owned(),
            _ => String::new(),
        }
    });

    let iterations = EACH_BLOCK.replace_all(&conditionals, |caps: &Captures| {
        match context.get(&caps[1]) {
            Some(Value::List(items)) => items
                .iter()
                .map(|item| caps[2].replace(THIS, &item.to_string()))
                .collect::<String>(),
            _ => String::new(),
        }
    });

    VARIABLE
        .replace_all(&iterations, |caps: &Captures| {
            context
                .get(&caps[1])
                .map(Value::to_string)
                .unwrap_or_default()
        })
        .into_owned()
}

/// The directory inside a theme that holds include files.
pub const INCLUDES_DIRECTORY: &str = "_includes";

/// The layouts a site is rendered with. Every `{% include 'name' %}` in a
/// layout has been replaced by `_includes/name.html` at load time. Includes
/// are expanded once, so an include inside an include stays as written.
#[derive(Debug, Clone)]
pub struct Theme {
    /// The layout for a single post (`post.html`).
    pub post: String,

    /// The layout for listing pages (`index.html`), used for the main listing
    /// and for each category listing.
    pub index: String,

    /// The layout for one entry on a listing page
    /// (`_includes/post-card.html`).
    pub post_card: String,

    /// The layout for standalone pages (`page.html`). Only required when the
    /// site has standalone pages.
    pub page: Option<String>,
}

impl Theme {
    /// Loads a theme from `dir`.
    pub fn load(dir: &Path) -> Result<Theme> {
        let includes = dir.join(INCLUDES_DIRECTORY);
        let layout = |name: &str| -> Result<String> {
            resolve_includes(&read(&dir.join(name))?, &includes)
        };

        let page_path = dir.join("page.html");
        Ok(Theme {
            post: layout("post.html")?,
            index: layout("index.html")?,
            post_card: resolve_includes(&read(&includes.join("post-card.html"))?, &includes)?,
            page: match page_path.is_file() {
                true => Some(layout("page.html")?),
                false => None,
            },
        })
    }

    /// The standalone page layout, or an error if the theme has none.
    pub fn page_layout(&self) -> Result<&str> {
        self.page.as_deref().ok_or(Error::MissingPageLayout)
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| Error::Read {
        path: path.to_owned(),
        err,
    })
}

// Replaces each include directive in `template` with the named include file.
fn resolve_includes(template: &str, includes: &Path) -> Result<String> {
    let mut resolved = String::with_capacity(template.len());
    let mut last = 0;
    for caps in INCLUDE.captures_iter(template) {
        let Some(directive) = caps.get(0) else {
            continue;
        };
        resolved.push_str(&template[last..directive.start()]);
        resolved.push_str(&read(&includes.join(format!("{}.html", &caps[1])))?);
        last = directive.end();
    }
    resolved.push_str(&template[last..]);
    Ok(resolved)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returned when a layout or include can't be loaded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading template `{}`: {}", .path.display(), .err)]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("standalone pages need a `page.html` layout")]
    MissingPageLayout,
}
