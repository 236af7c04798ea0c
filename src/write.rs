use crate::post::{HomePage, PostSummary, RenderedPage, StandalonePage, POSTS_PATH};
use crate::template::{self, Theme};
use crate::util::write_file;
use crate::value::{Context, Value};
use log::debug;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// The file name of listing pages.
pub const INDEX_FILE: &str = "index.html";

/// The file name of the full listing when the site has a home page.
pub const ALL_POSTS_FILE: &str = "blogs.html";

/// How many of the newest posts the home page shows.
pub const FEATURED_POSTS: usize = 6;

/// Slugs standalone pages can't have, because `{slug}.html` would collide
/// with a listing page.
pub const RESERVED_PAGE_SLUGS: [&str; 2] = ["index", "blogs"];

/// The directory under the output root that holds category listings.
pub const CATEGORY_PATH: &str = "category";

/// Where the client data file is written, relative to the output root.
pub const DATA_FILE: &str = "assets/js/blog-data.js";

/// The name of the variable the data file declares.
pub const DATA_VARIABLE: &str = "blogPosts";

/// Responsible for indexing, templating, and writing HTML pages to disk from
/// [`RenderedPage`] and [`StandalonePage`] sources.
pub struct Writer<'a> {
    /// The layouts to render pages with.
    pub theme: &'a Theme,

    /// The root of the output tree. Post pages are written to
    /// `{output_directory}/blog/{slug}.html`, standalone pages to
    /// `{output_directory}/{slug}.html`, the main listing to
    /// `{output_directory}/index.html` (or `blogs.html` when there's a home
    /// page) and category listings to
    /// `{output_directory}/category/{category}/index.html`.
    pub output_directory: &'a Path,

    /// The site's title. This is made available to every template as
    /// `siteTitle`, and as `title` for pages that have no title of their own
    /// (e.g. the main listing).
    pub site_title: &'a str,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: Page) -> Result<()> {
        let mut context = page.context;
        context.insert("siteTitle".to_owned(), self.site_title.into());
        context
            .entry("title".to_owned())
            .or_insert_with(|| self.site_title.into());
        let html = template::render(page.template, &context);
        debug!("writing {}", page.file_path.display());
        write(&page.file_path, html.as_bytes())
    }

    /// Writes a page for every post plus the main listing page and one listing
    /// page per category. With a `home` page, `index.html` becomes the home
    /// page (its introduction above the newest [`FEATURED_POSTS`] posts) and
    /// the main listing moves to [`ALL_POSTS_FILE`]. `posts` must be sorted
    /// newest first.
    pub fn write_posts(&self, posts: &[RenderedPage], home: Option<&HomePage>) -> Result<()> {
        let listing_file = match home {
            Some(_) => ALL_POSTS_FILE,
            None => INDEX_FILE,
        };
        let home = home.map(|home| home_page(home, posts, self.output_directory, self.theme));
        post_pages(posts, self.output_directory, &self.theme.post)
            .chain(index_pages(posts, self.output_directory, listing_file, self.theme))
            .chain(home)
            .try_for_each(|page| self.write_page(page))
    }

    /// Writes each standalone page to `{output_directory}/{slug}.html`.
    pub fn write_pages(&self, pages: &[StandalonePage]) -> Result<()> {
        if pages.is_empty() {
            return Ok(());
        }
        let template = self.theme.page_layout()?;
        pages.iter().try_for_each(|page| {
            self.write_page(Page {
                context: page.to_context(),
                file_path: self.output_directory.join(format!("{}.html", page.slug)),
                template,
            })
        })
    }

    /// Writes the client data file: a script declaring `blogPosts` as an array
    /// with one [`PostSummary`] per post, in the order given.
    pub fn write_data_file(&self, posts: &[RenderedPage]) -> Result<PathBuf> {
        let path = self.output_directory.join(DATA_FILE);
        write(&path, data_file(posts)?.as_bytes())?;
        Ok(path)
    }

    /// Writes the `CNAME` file that pins the site to `domain`.
    pub fn write_cname(&self, domain: &str) -> Result<()> {
        write(&self.output_directory.join("CNAME"), domain.trim().as_bytes())
    }
}

/// Renders the contents of the client data file.
pub fn data_file(posts: &[RenderedPage]) -> Result<String> {
    let summaries: Vec<PostSummary> = posts.iter().map(PostSummary::from).collect();
    Ok(format!(
        "const {} = {};\n",
        DATA_VARIABLE,
        serde_json::to_string_pretty(&summaries)?
    ))
}

fn write(path: &Path, contents: &[u8]) -> Result<()> {
    write_file(path, contents).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// An output HTML file: a template, the values to render it with, and where
/// the result goes.
struct Page<'a> {
    /// The values for the page's template.
    context: Context,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The template with which the page will be rendered.
    template: &'a str,
}

/// Creates the [`Page`] for each post. Besides the post's own values, each
/// page gets `newerUrl`/`newerTitle` and `olderUrl`/`olderTitle` for its
/// neighbours, which are empty at either end.
fn post_pages<'a>(
    posts: &'a [RenderedPage],
    output_directory: &'a Path,
    template: &'a str,
) -> impl Iterator<Item = Page<'a>> {
    posts.iter().enumerate().map(move |(i, post)| {
        let mut context = post.to_context();
        let newer = i.checked_sub(1).and_then(|j| posts.get(j));
        let older = posts.get(i + 1);
        for (prefix, neighbour) in [("newer", newer), ("older", older)] {
            context.insert(
                format!("{}Url", prefix),
                neighbour.map(|p| p.metadata.url()).into(),
            );
            context.insert(
                format!("{}Title", prefix),
                neighbour.map(|p| p.metadata.title.clone()).into(),
            );
        }

        Page {
            context,
            file_path: output_directory
                .join(POSTS_PATH)
                .join(format!("{}.html", post.metadata.slug)),
            template,
        }
    })
}

/// Creates the main listing [`Page`], written to `listing_file`, and one
/// listing page per category.
fn index_pages<'a>(
    posts: &'a [RenderedPage],
    output_directory: &Path,
    listing_file: &str,
    theme: &'a Theme,
) -> impl Iterator<Item = Page<'a>> {
    index_posts(output_directory, listing_file, posts)
        .into_iter()
        .map(move |index| index.to_page(theme))
}

/// Creates the home [`Page`]: the home document's values plus the newest
/// [`FEATURED_POSTS`] cards as `posts` and the full listing's URL as
/// `allPostsUrl`.
fn home_page<'a>(
    home: &HomePage,
    posts: &[RenderedPage],
    output_directory: &Path,
    theme: &'a Theme,
) -> Page<'a> {
    let featured = &posts[..posts.len().min(FEATURED_POSTS)];
    let mut context = home.to_context();
    context.insert("posts".to_owned(), cards(featured.iter(), theme).into());
    context.insert("postCount".to_owned(), featured.len().into());
    context.insert("allPostsUrl".to_owned(), format!("/{}", ALL_POSTS_FILE).into());

    Page {
        context,
        file_path: output_directory.join(INDEX_FILE),
        template: &theme.index,
    }
}

/// Renders the post card layout once per post and concatenates the results.
fn cards<'p>(posts: impl Iterator<Item = &'p RenderedPage>, theme: &Theme) -> String {
    posts
        .map(|post| template::render(&theme.post_card, &PostSummary::from(post).to_context()))
        .collect()
}

/// `Index` represents a collection of posts that share a listing page: every
/// post for the main listing, or the posts of one category.
struct Index<'a> {
    /// The category's name, or `None` for the main listing.
    category: Option<String>,

    /// Where the listing page is written.
    file_path: PathBuf,

    /// The posts associated with the index, newest first.
    posts: Vec<&'a RenderedPage>,
}

impl<'a> Index<'a> {
    /// Converts the index into its listing page. The page's `posts` value is
    /// the post card layout rendered once per post and concatenated.
    fn to_page(&self, theme: &'a Theme) -> Page<'a> {
        let mut context = Context::new();
        context.insert("posts".to_owned(), cards(self.posts.iter().copied(), theme).into());
        context.insert("postCount".to_owned(), self.posts.len().into());
        context.insert("category".to_owned(), Value::from(self.category.as_ref()));
        if let Some(category) = &self.category {
            context.insert("title".to_owned(), category.into());
        }

        Page {
            context,
            file_path: self.file_path.clone(),
            template: &theme.index,
        }
    }
}

/// Indexes a list of posts by category. The first index is always the main
/// listing, written to `listing_file`; category indices follow in the order
/// of their slugs. Categories whose names slugify to the same path share an
/// index named after the first spelling seen.
fn index_posts<'a>(
    base_directory: &Path,
    listing_file: &str,
    posts: &'a [RenderedPage],
) -> Vec<Index<'a>> {
    let mut categories: BTreeMap<String, Index> = BTreeMap::new();
    for post in posts {
        if let Some(category) = &post.metadata.category {
            let slug = slug::slugify(category);
            categories
                .entry(slug.clone())
                .or_insert_with(|| Index {
                    category: Some(category.clone()),
                    file_path: base_directory
                        .join(CATEGORY_PATH)
                        .join(&slug)
                        .join(INDEX_FILE),
                    posts: Vec::new(),
                })
                .posts
                .push(post);
        }
    }

    let mut indices = vec![Index {
        category: None,
        file_path: base_directory.join(listing_file),
        posts: posts.iter().collect(),
    }];
    indices.extend(categories.into_values());
    indices
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("writing `{}`: {}", .path.display(), .err)]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("serializing the site index: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] template::Error),
}
