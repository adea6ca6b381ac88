//! Static asset pipeline.
//!
//! Serves files from the configured root for every path the route table did
//! not claim. Supports an index file for directory requests and an optional
//! SPA fallback: extension-less misses get the index file so client-side
//! routes resolve during development.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::StaticConfig;
use crate::http::mime;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub struct StaticFiles {
    root: PathBuf,
    index: String,
    spa_fallback: bool,
}

impl StaticFiles {
    pub fn new(cfg: &StaticConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            index: cfg.index.clone(),
            spa_fallback: cfg.spa_fallback,
        }
    }

    pub async fn serve(&self, request: &Request) -> Response {
        if request.method != Method::GET && request.method != Method::HEAD {
            return Response::method_not_allowed();
        }

        let path = request.path_only();
        let Some(relative) = sanitize(path) else {
            // Traversal attempt; indistinguishable from a miss on purpose
            return Response::not_found();
        };

        let mut file_path = self.root.join(&relative);
        let is_dir = fs::metadata(&file_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if relative.is_empty() || is_dir {
            file_path = file_path.join(&self.index);
        }

        match fs::read(&file_path).await {
            Ok(content) => self.file_response(&file_path, content, request),
            Err(_) if self.spa_fallback && !has_extension(path) => {
                let index_path = self.root.join(&self.index);
                match fs::read(&index_path).await {
                    Ok(content) => self.file_response(&index_path, content, request),
                    Err(_) => Response::not_found(),
                }
            }
            Err(_) => Response::not_found(),
        }
    }

    fn file_response(&self, path: &Path, content: Vec<u8>, request: &Request) -> Response {
        let content_type =
            mime::from_extension(path.extension().and_then(|e| e.to_str()));

        let mut response = ResponseBuilder::new(StatusCode::OK)
            .header("Content-Type", content_type)
            .body(content)
            .build();

        if request.method == Method::HEAD {
            response.body.clear();
        }

        response
    }
}

/// Normalize a request path into a root-relative file path.
///
/// Empty and `.` segments are dropped; any `..` segment rejects the path, so
/// a lookup can never escape the root.
pub fn sanitize(path: &str) -> Option<String> {
    let mut segments = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\0') => return None,
            s => segments.push(s),
        }
    }

    Some(segments.join("/"))
}

fn has_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .map(|name| name.contains('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_traversal() {
        assert_eq!(sanitize("/../etc/passwd"), None);
        assert_eq!(sanitize("/assets/../../secret"), None);
        assert_eq!(sanitize("/assets/app.js"), Some("assets/app.js".to_string()));
        assert_eq!(sanitize("/"), Some(String::new()));
        assert_eq!(sanitize("/./assets//app.js"), Some("assets/app.js".to_string()));
    }
}
