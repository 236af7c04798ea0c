//! Defines the [`Parser`], which discovers content files and turns them into
//! [`RenderedPage`]s and [`StandalonePage`]s. A document that can't be read,
//! has malformed front matter, or lacks required fields is logged and
//! skipped; only failing to list a content directory is an error.

use crate::frontmatter::ParseError;
use crate::post::{self, ContentDocument, Defaults, HomePage, RenderedPage, StandalonePage};
use crate::write::RESERVED_PAGE_SLUGS;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::{self, read_dir};
use std::io;
use std::path::{Path, PathBuf};

const MARKDOWN_EXTENSION: &str = "md";

/// Parses posts and standalone pages from source files.
pub struct Parser<'a> {
    /// Fills in optional post fields.
    defaults: &'a Defaults,
}

impl<'a> Parser<'a> {
    pub fn new(defaults: &'a Defaults) -> Parser<'a> {
        Parser { defaults }
    }

    /// Searches `source_directory` (non-recursively) for post files
    /// (extension `.md`) and returns the posts sorted by date, most recent
    /// first. Each post file looks like this:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2024-04-16
    /// description: The first post.
    /// category: greetings
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// Files are read in file-name order and posts with equal dates keep that
    /// order. If two posts resolve to the same slug, the one read last wins.
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<RenderedPage>> {
        let mut posts: Vec<RenderedPage> = Vec::new();
        let mut slugs: HashMap<String, usize> = HashMap::new();

        for path in markdown_files(source_directory)? {
            let post = match self.parse_post(&path) {
                Ok(post) => post,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            debug!("parsed post `{}` from {}", post.metadata.slug, path.display());

            match slugs.get(&post.metadata.slug) {
                Some(&i) => {
                    warn!(
                        "{} and {} both have the slug `{}`; using {}",
                        posts[i].source.display(),
                        path.display(),
                        post.metadata.slug,
                        path.display(),
                    );
                    posts[i] = post;
                }
                None => {
                    slugs.insert(post.metadata.slug.clone(), posts.len());
                    posts.push(post);
                }
            }
        }

        posts.sort_by(|a, b| b.metadata.date.cmp(&a.metadata.date));
        Ok(posts)
    }

    /// Searches `source_directory` (non-recursively) for standalone page
    /// files. Only `title` is required in their front matter. Pages whose
    /// slug would overwrite a listing page (see [`RESERVED_PAGE_SLUGS`]) are
    /// skipped, and slug collisions are resolved like they are for posts.
    pub fn parse_pages(&self, source_directory: &Path) -> Result<Vec<StandalonePage>> {
        let mut pages: Vec<StandalonePage> = Vec::new();
        let mut slugs: HashMap<String, usize> = HashMap::new();

        for path in markdown_files(source_directory)? {
            let page = read_document(&path)
                .and_then(|doc| StandalonePage::render(&doc).map_err(DocumentError::from));
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if RESERVED_PAGE_SLUGS.contains(&page.slug.as_str()) {
                warn!(
                    "skipping {}: the slug `{}` belongs to a listing page",
                    path.display(),
                    page.slug
                );
                continue;
            }

            match slugs.get(&page.slug) {
                Some(&i) => {
                    warn!(
                        "{} and {} both have the slug `{}`; using {}",
                        pages[i].source.display(),
                        path.display(),
                        page.slug,
                        path.display(),
                    );
                    pages[i] = page;
                }
                None => {
                    slugs.insert(page.slug.clone(), pages.len());
                    pages.push(page);
                }
            }
        }
        Ok(pages)
    }

    /// Reads the home page document at `path`. A missing file means the site
    /// has no home page; a document that can't be read or parsed is logged
    /// and ignored.
    pub fn parse_home(&self, path: &Path) -> Option<HomePage> {
        if !path.is_file() {
            debug!("no home page at {}", path.display());
            return None;
        }
        let home = read_document(path)
            .and_then(|doc| HomePage::render(&doc).map_err(DocumentError::from));
        match home {
            Ok(home) => Some(home),
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                None
            }
        }
    }

    fn parse_post(&self, path: &Path) -> std::result::Result<RenderedPage, DocumentError> {
        let doc = read_document(path)?;
        Ok(RenderedPage::render(&doc, self.defaults)?)
    }
}

fn read_document(path: &Path) -> std::result::Result<ContentDocument, DocumentError> {
    let input = fs::read_to_string(path)?;
    Ok(ContentDocument::parse(path, &input)?)
}

// Lists the markdown files directly inside `dir`, sorted by file name. A
// missing directory has no files.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("content directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(Error::ReadDir {
                path: dir.to_owned(),
                err,
            })
        }
    };

    let mut files = Vec::new();
    for result in entries {
        let entry = result.map_err(|err| Error::ReadDir {
            path: dir.to_owned(),
            err,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Why a single document was skipped.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("reading file: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Post(#[from] post::Error),
}

/// Represents the result of a parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Returned when a content directory can't be listed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading content directory `{}`: {}", .path.display(), .err)]
    ReadDir {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn defaults() -> Defaults {
        Defaults {
            author: String::from("The Fool"),
            cover_image: String::from("/assets/images/default-blog-cover.jpg"),
        }
    }

    fn post(dir: &Path, file_name: &str, date: &str) {
        fs::write(
            dir.join(file_name),
            format!(
                "---\ntitle: {}\ndate: {}\ndescription: About {}.\n---\nBody.\n",
                file_name, date, file_name
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_parse_posts() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        post(dir, "January.md", "2024-01-01");
        post(dir, "March.md", "2024-03-01");
        post(dir, "February.md", "2024-02-01");
        fs::write(dir.join("notes.txt"), "not markdown").unwrap();
        fs::create_dir(dir.join("nested.md")).unwrap();

        let defaults = defaults();
        let posts = Parser::new(&defaults).parse_posts(dir)?;
        let dates: Vec<NaiveDate> = posts.iter().map(|p| p.metadata.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ]
        );
        let slugs: Vec<&str> = posts.iter().map(|p| p.metadata.slug.as_str()).collect();
        assert_eq!(slugs, vec!["march", "february", "january"]);
        Ok(())
    }

    #[test]
    fn test_invalid_posts_are_skipped() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        post(dir, "good.md", "2024-01-01");
        let no_description = "---\ntitle: T\ndate: 2024-01-01\n---\n";
        fs::write(dir.join("no-description.md"), no_description).unwrap();
        fs::write(dir.join("unterminated.md"), "---\ntitle: T\n").unwrap();
        let bad_date = "---\ntitle: T\ndate: never\ndescription: D\n---\n";
        fs::write(dir.join("bad-date.md"), bad_date).unwrap();
        let escaping = "---\ntitle: T\ndate: 2024-01-01\ndescription: D\nslug: ../../x\n---\n";
        fs::write(dir.join("escaping.md"), escaping).unwrap();
        fs::write(dir.join("not-utf8.md"), [0xff, 0xfe, 0x00]).unwrap();

        let defaults = defaults();
        let posts = Parser::new(&defaults).parse_posts(dir)?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].metadata.slug, "good");
        Ok(())
    }

    #[test]
    fn test_slug_collision_last_wins() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        for (file_name, title, date) in [("a.md", "A", "2024-01-01"), ("b.md", "B", "2024-01-02")] {
            let input = format!(
                "---\ntitle: {}\ndate: {}\ndescription: D\nslug: same\n---\n",
                title, date
            );
            fs::write(dir.join(file_name), input).unwrap();
        }

        let defaults = defaults();
        let posts = Parser::new(&defaults).parse_posts(dir)?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].metadata.title, "B");
        Ok(())
    }

    #[test]
    fn test_missing_directory() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let defaults = defaults();
        let parser = Parser::new(&defaults);
        assert!(parser.parse_posts(&temp.path().join("missing"))?.is_empty());
        assert!(parser.parse_pages(&temp.path().join("missing"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_pages() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        fs::write(dir.join("About.md"), "---\ntitle: About\n---\nWho I am.").unwrap();
        fs::write(dir.join("untitled.md"), "No front matter.").unwrap();

        let defaults = defaults();
        let pages = Parser::new(&defaults).parse_pages(dir)?;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].slug, "about");
        Ok(())
    }

    #[test]
    fn test_page_slug_collisions() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        fs::write(dir.join("a.md"), "---\ntitle: First\nslug: about\n---\n").unwrap();
        fs::write(dir.join("b.md"), "---\ntitle: Second\nslug: about\n---\n").unwrap();
        fs::write(dir.join("index.md"), "---\ntitle: Home?\n---\n").unwrap();
        fs::write(dir.join("c.md"), "---\ntitle: All\nslug: blogs\n---\n").unwrap();

        let defaults = defaults();
        let pages = Parser::new(&defaults).parse_pages(dir)?;
        let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Second"]);
        Ok(())
    }

    #[test]
    fn test_parse_home() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("index.md");
        let defaults = defaults();
        let parser = Parser::new(&defaults);
        assert!(parser.parse_home(&path).is_none());

        fs::write(&path, "---\ntitle: Welcome\n---\nHello.").unwrap();
        let home = parser.parse_home(&path).unwrap();
        assert_eq!(home.body_html, "<p>Hello.</p>\n");

        fs::write(&path, "---\ntitle: [broken\n---\n").unwrap();
        assert!(parser.parse_home(&path).is_none());
    }
}
