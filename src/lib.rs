//! The library code for the `foolscap` static site generator. The architecture
//! can be generally broken down into two distinct steps:
//!
//! 1. Parsing posts and pages from source files on disk ([`crate::parser`],
//!    [`crate::post`])
//! 2. Converting them into output files on disk ([`crate::write`])
//!
//! Parsing a source file is itself three steps: splitting off the YAML front
//! matter ([`crate::frontmatter`]), validating the fields a post needs, and
//! rendering the Markdown body to HTML ([`crate::markdown`]).
//!
//! Writing is straight-forward: for each page, apply a layout from the theme
//! ([`crate::template`]) and write the result to disk. Besides a page per post
//! there's a main listing, a listing per category, and a JavaScript data file
//! describing every post for client-side scripts.
//!
//! [`crate::build`] ties the steps together along with cleaning the output
//! directory and copying static assets, and [`crate::serve`] previews the
//! result over HTTP.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod frontmatter;
pub mod htmlrenderer;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod serve;
pub mod template;
pub mod util;
pub mod value;
pub mod write;
