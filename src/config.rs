//! Loads the site [`Config`] from a `foolscap.yaml` project file. Every
//! field is optional:
//!
//! ```yaml
//! title: The Fool's Blog
//! author: The Fool
//! default_cover_image: /assets/images/default-blog-cover.jpg
//! domain: blog.example.com   # writes a CNAME file when set
//! posts_directory: content/blog
//! pages_directory: content/pages
//! home_document: content/index.md   # optional home page introduction
//! theme_directory: layouts
//! assets_directory: assets
//! output_directory: public
//! ```
//!
//! Directories are relative to the project file.

use crate::post::Defaults;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "foolscap.yaml";

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Project {
    title: String,
    author: String,
    default_cover_image: String,
    domain: Option<String>,
    posts_directory: PathBuf,
    pages_directory: PathBuf,
    home_document: PathBuf,
    theme_directory: PathBuf,
    assets_directory: PathBuf,
    output_directory: PathBuf,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            title: String::from("The Fool's Blog"),
            author: String::from("The Fool"),
            default_cover_image: String::from("/assets/images/default-blog-cover.jpg"),
            domain: None,
            posts_directory: PathBuf::from("content/blog"),
            pages_directory: PathBuf::from("content/pages"),
            home_document: PathBuf::from("content/index.md"),
            theme_directory: PathBuf::from("layouts"),
            assets_directory: PathBuf::from("assets"),
            output_directory: PathBuf::from("public"),
        }
    }
}

/// Everything a build needs to know, with directories resolved against the
/// project root.
#[derive(Debug, Clone)]
pub struct Config {
    pub title: String,
    pub author: String,
    pub default_cover_image: String,

    /// The domain written to the `CNAME` file, if any.
    pub domain: Option<String>,

    pub posts_directory: PathBuf,
    pub pages_directory: PathBuf,

    /// The home page document. The site has no home page if it's missing.
    pub home_document: PathBuf,

    pub theme_directory: PathBuf,
    pub assets_directory: PathBuf,
    pub output_directory: PathBuf,
}

impl Config {
    /// Looks for `foolscap.yaml` in `dir` and then in each of its ancestors,
    /// and loads the first one found. `output_directory` overrides the
    /// project's output directory.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            return Config::from_project_file(&path, output_directory)
                .with_context(|| format!("Loading configuration from `{}`", path.display()));
        }
        match dir.parent() {
            Some(parent) => Config::from_directory(parent, output_directory),
            None => Err(anyhow!(
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            )),
        }
    }

    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = match contents.trim().is_empty() {
            true => Project::default(),
            false => serde_yaml::from_str(&contents)?,
        };
        let root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        Ok(Config::from_project(project, root, output_directory))
    }

    fn from_project(project: Project, root: &Path, output_directory: Option<&Path>) -> Config {
        Config {
            title: project.title,
            author: project.author,
            default_cover_image: project.default_cover_image,
            domain: project.domain.filter(|d| !d.trim().is_empty()),
            posts_directory: root.join(project.posts_directory),
            pages_directory: root.join(project.pages_directory),
            home_document: root.join(project.home_document),
            theme_directory: root.join(project.theme_directory),
            assets_directory: root.join(project.assets_directory),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => root.join(project.output_directory),
            },
        }
    }

    /// The values that fill in optional post fields.
    pub fn defaults(&self) -> Defaults {
        Defaults {
            author: self.author.clone(),
            cover_image: self.default_cover_image.clone(),
        }
    }
}
