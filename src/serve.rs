//! A small HTTP server for previewing a built site locally.
//!
//! The site is built once, then the output directory is served as-is on
//! `127.0.0.1`, one request at a time. The port comes from the `PORT`
//! environment variable and falls back to [`DEFAULT_PORT`]. Paths that
//! don't name a file (or a directory holding an `index.html`) get the site's
//! root `index.html`, so client-side routes keep working.

use crate::build::build_site;
use crate::config::Config;
use crate::write::INDEX_FILE;
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::io::Cursor;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// The port used when `PORT` is unset or not a number.
pub const DEFAULT_PORT: u16 = 3000;

/// Builds the site described by `config`, then serves its output directory
/// until the process is killed.
pub fn serve_site(config: &Config) -> Result<()> {
    build_site(config)?;

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port(std::env::var("PORT").ok())));
    let server = Server::http(addr).map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("serving {} at http://{}", config.output_directory.display(), addr);

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &config.output_directory) {
            warn!("request error: {:#}", e);
        }
    }
    Ok(())
}

/// Picks the port from the value of `PORT`, if it holds one.
fn port(var: Option<String>) -> u16 {
    var.and_then(|v| v.trim().parse().ok()).unwrap_or(DEFAULT_PORT)
}

fn handle_request(request: Request, root: &Path) -> Result<()> {
    let path = resolve(root, request.url());
    debug!("{} {} -> {}", request.method(), request.url(), path.display());

    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("reading {}: {}", path.display(), e);
            return serve_not_found(request);
        }
    };
    let response = Response::from_data(content).with_header(content_type_header(&path)?);
    request.respond(response)?;
    Ok(())
}

/// Maps a request URL onto the file to serve. Resolution order:
///
/// 1. an existing file at the URL's path;
/// 2. `index.html` inside an existing directory at the URL's path;
/// 3. the root `index.html` for everything else, including paths that try to
///    climb out of `root`.
fn resolve(root: &Path, url: &str) -> PathBuf {
    let fallback = root.join(INDEX_FILE);

    // Drop any query string or fragment, then decode URL-encoded characters
    // (e.g., %20 → space). An encoded `?` or `#` is part of the path.
    let raw = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return fallback;
    }

    let local = root.join(relative);
    if local.is_file() {
        return local;
    }
    let index = local.join(INDEX_FILE);
    if local.is_dir() && index.is_file() {
        return index;
    }
    fallback
}

fn content_type_header(path: &Path) -> Result<Header> {
    Header::from_bytes(&b"Content-Type"[..], guess_content_type(path).as_bytes())
        .map_err(|_| anyhow!("invalid Content-Type header"))
}

/// Serve 404 Not Found response. Only reached when the site has no root
/// `index.html` to fall back to.
fn serve_not_found(request: Request) -> Result<()> {
    let body = "404 Not Found";
    let response = Response::new(
        StatusCode(404),
        vec![Header::from_bytes(&b"Content-Type"[..], &b"text/plain"[..])
            .map_err(|_| anyhow!("invalid Content-Type header"))?],
        Cursor::new(body),
        Some(body.len()),
        None,
    );
    request.respond(response).context("responding with 404")?;
    Ok(())
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_port() {
        assert_eq!(port(None), DEFAULT_PORT);
        assert_eq!(port(Some(String::from("8080"))), 8080);
        assert_eq!(port(Some(String::from("eighty"))), DEFAULT_PORT);
    }

    #[test]
    fn test_resolve() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("blog")).unwrap();
        fs::create_dir_all(root.join("category/web-dev")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("blog/my post.html"), "post").unwrap();
        fs::write(root.join("blog/what?.html"), "question").unwrap();
        fs::write(root.join("category/web-dev/index.html"), "cat").unwrap();

        assert_eq!(resolve(root, "/"), root.join("index.html"));
        assert_eq!(
            resolve(root, "/blog/my%20post.html?t=1"),
            root.join("blog/my post.html")
        );
        assert_eq!(
            resolve(root, "/blog/what%3F.html#top"),
            root.join("blog/what?.html")
        );
        assert_eq!(
            resolve(root, "/category/web-dev/"),
            root.join("category/web-dev/index.html")
        );
        assert_eq!(resolve(root, "/empty"), root.join("index.html"));
        assert_eq!(resolve(root, "/no/such/route"), root.join("index.html"));
        assert_eq!(resolve(root, "/../secret"), root.join("index.html"));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/b.html")), "text/html; charset=utf-8");
        assert_eq!(
            guess_content_type(Path::new("blog-data.js")),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(guess_content_type(Path::new("CNAME")), "application/octet-stream");
    }
}
