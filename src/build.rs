//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading the theme
//! ([`crate::template`]), parsing posts and pages ([`crate::parser`]),
//! cleaning the output directory, copying the static assets into it, and
//! rendering every page plus the client data file ([`crate::write`]).
//!
//! A build is a straight line through the [`Stage`]s. Documents that fail to
//! parse are skipped by the parser; every error that reaches this module ends
//! the build.

use crate::config::Config;
use crate::parser::{Error as ParseError, Parser as PostParser};
use crate::template::{Error as TemplateError, Theme};
use crate::util::rmdir;
use crate::write::{Error as WriteError, Writer};
use log::{info, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The name of the assets directory inside the output directory.
pub const ASSETS_PATH: &str = "assets";

/// The steps of a build, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The output directory has been emptied and recreated.
    Clean,

    /// Static assets have been mirrored into the output directory.
    AssetsCopied,

    /// Every page, the data file and the `CNAME` file have been written.
    PagesGenerated,

    /// The build finished.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Stage::Clean => "clean",
            Stage::AssetsCopied => "assets copied",
            Stage::PagesGenerated => "pages generated",
            Stage::Done => "done",
        })
    }
}

/// What a finished build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub posts: usize,
    pub pages: usize,
    pub assets: usize,
}

/// Builds the site from a [`Config`] object. This calls into
/// [`PostParser::parse_posts`] and [`Writer::write_posts`], which do the
/// heavy-lifting. The theme and the content are read, and the theme checked
/// against the content, before the output directory is touched, so a missing
/// layout leaves the previous build in place.
pub fn build_site(config: &Config) -> Result<Summary> {
    let theme = Theme::load(&config.theme_directory)?;

    let defaults = config.defaults();
    let parser = PostParser::new(&defaults);
    let posts = parser.parse_posts(&config.posts_directory)?;
    let pages = parser.parse_pages(&config.pages_directory)?;
    let home = parser.parse_home(&config.home_document);
    if !pages.is_empty() {
        theme.page_layout()?;
    }

    // Blow away the old output directory so nothing from a previous build
    // survives.
    let output = &config.output_directory;
    rmdir(output).map_err(|err| Error::Clean {
        path: output.clone(),
        err,
    })?;
    fs::create_dir_all(output).map_err(|err| Error::CreateOutput {
        path: output.clone(),
        err,
    })?;
    enter(Stage::Clean);

    let assets = match config.assets_directory.is_dir() {
        true => copy_dir(&config.assets_directory, &output.join(ASSETS_PATH))?,
        false => {
            warn!(
                "assets directory {} does not exist; no assets copied",
                config.assets_directory.display()
            );
            0
        }
    };
    enter(Stage::AssetsCopied);

    let writer = Writer {
        theme: &theme,
        output_directory: output,
        site_title: &config.title,
    };
    writer.write_pages(&pages)?;
    writer.write_posts(&posts, home.as_ref())?;
    let data_file = writer.write_data_file(&posts)?;
    info!("site index written to {}", data_file.display());
    if let Some(domain) = &config.domain {
        writer.write_cname(domain)?;
    }
    enter(Stage::PagesGenerated);

    let summary = Summary {
        posts: posts.len(),
        pages: pages.len(),
        assets,
    };
    info!(
        "built {} posts, {} pages and {} assets into {}",
        summary.posts,
        summary.pages,
        summary.assets,
        output.display()
    );
    enter(Stage::Done);
    Ok(summary)
}

fn enter(stage: Stage) {
    info!("build stage: {}", stage);
}

/// Mirrors `src` into `dst`, recursing into subdirectories. Returns the number
/// of files copied.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for result in WalkDir::new(src).sort_by_file_name() {
        let entry = result.map_err(|e| Error::CopyAssets {
            path: e.path().unwrap_or(src).to_owned(),
            err: e.into(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        let copy = match entry.file_type().is_dir() {
            true => fs::create_dir_all(&target),
            false => fs::copy(entry.path(), &target).map(|_| copied += 1),
        };
        copy.map_err(|err| Error::CopyAssets {
            path: entry.path().to_owned(),
            err,
        })?;
    }
    Ok(copied)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Every variant is fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for errors loading the theme.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Returned when a content directory can't be listed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Returned for I/O problems while cleaning the output directory.
    #[error("cleaning directory `{}`: {}", .path.display(), .err)]
    Clean {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the output directory can't be created.
    #[error("creating output directory `{}`: {}", .path.display(), .err)]
    CreateOutput {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when a static asset can't be read or copied.
    #[error("copying asset `{}`: {}", .path.display(), .err)]
    CopyAssets {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned for errors writing pages to disk.
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::write::DATA_FILE;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn site() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/site")
    }

    fn config(output: &Path) -> Config {
        Config::from_directory(&site(), Some(output)).unwrap()
    }

    // Reads every file under `dir` into a map keyed by relative path.
    fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(dir)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(dir).unwrap().to_owned(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("public");
        let summary = build_site(&config(&out))?;
        assert_eq!(
            summary,
            Summary {
                posts: 3,
                pages: 1,
                assets: 3,
            }
        );

        let files: Vec<PathBuf> = snapshot(&out).into_keys().collect();
        let expected: Vec<PathBuf> = [
            "CNAME",
            "about.html",
            "assets/css/style.css",
            "assets/images/default-blog-cover.jpg",
            "assets/js/blog-data.js",
            "assets/js/main.js",
            "blog/css-grid-vs-flexbox.html",
            "blog/getting-started.html",
            "blog/my-first-post.html",
            "blogs.html",
            "category/css/index.html",
            "category/web-development/index.html",
            "index.html",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(files, expected);

        let post = fs::read_to_string(out.join("blog/my-first-post.html")).unwrap();
        assert!(post.contains("<title>My First Post - The Fool's Blog</title>"));
        assert!(post.contains("<h2 id=\"hello-world\">Hello World</h2>"));
        assert!(post.contains("<span>3 min read</span>"));
        assert!(post.contains("<time datetime=\"2024-03-01\">March 1, 2024</time>"));

        let home = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(home.contains("<p>Notes on building for the web"));
        assert!(home.contains("<a class=\"show-all\" href=\"/blogs.html\">View All Posts</a>"));
        let listing = fs::read_to_string(out.join("blogs.html")).unwrap();
        assert!(listing.contains("<a href=\"/blog/getting-started.html\">Getting Started</a>"));
        assert!(!listing.contains("View All Posts"));

        let data = fs::read_to_string(out.join(DATA_FILE)).unwrap();
        let titles: Vec<&str> = data
            .lines()
            .filter_map(|l| l.trim().strip_prefix("\"title\": "))
            .collect();
        assert_eq!(
            titles,
            vec![
                "\"My First Post\",",
                "\"CSS Grid vs Flexbox\",",
                "\"Getting Started\","
            ]
        );
        assert!(!data.contains("Missing Description"));

        assert_eq!(
            fs::read_to_string(out.join("CNAME")).unwrap(),
            "fool.example.com"
        );
        Ok(())
    }

    #[test]
    fn test_rebuild_is_byte_identical() -> Result<()> {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("public");
        let config = config(&out);

        build_site(&config)?;
        let first = snapshot(&out);
        fs::write(out.join("stale.html"), "left over").unwrap();
        build_site(&config)?;
        assert_eq!(snapshot(&out), first);
        Ok(())
    }

    #[test]
    fn test_missing_theme_leaves_output_alone() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("public");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("index.html"), "previous build").unwrap();

        let mut config = config(&out);
        config.theme_directory = temp.path().join("no-theme");
        assert!(matches!(build_site(&config), Err(Error::Template(_))));
        assert_eq!(
            fs::read_to_string(out.join("index.html")).unwrap(),
            "previous build"
        );
    }

    #[test]
    fn test_missing_page_layout_leaves_output_alone() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("public");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("index.html"), "previous build").unwrap();

        // The fixture theme minus `page.html`, while the site has an about page.
        let theme = temp.path().join("layouts");
        fs::create_dir_all(theme.join("_includes")).unwrap();
        for layout in [
            "post.html",
            "index.html",
            "_includes/head.html",
            "_includes/post-card.html",
        ] {
            fs::copy(site().join("layouts").join(layout), theme.join(layout)).unwrap();
        }

        let mut config = config(&out);
        config.theme_directory = theme;
        assert!(matches!(
            build_site(&config),
            Err(Error::Template(TemplateError::MissingPageLayout))
        ));
        assert_eq!(
            fs::read_to_string(out.join("index.html")).unwrap(),
            "previous build"
        );
    }

    #[test]
    fn test_output_under_a_file_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        // A file where the output directory's parent should be.
        fs::write(temp.path().join("file"), "").unwrap();
        let config = config(&temp.path().join("file/public"));
        assert!(matches!(
            build_site(&config),
            Err(Error::Clean { .. } | Error::CreateOutput { .. })
        ));
    }
}
