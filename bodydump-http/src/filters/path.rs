//! Path pattern filter.
//!
//! Patterns use [actix-router](https://docs.rs/actix-router) syntax:
//!
//! - `{name}` - matches a path segment
//! - `{name:regex}` - matches with a regex constraint
//! - `{tail}*` - matches the remaining path segments

use actix_router::ResourceDef;
use bodydump_core::Filter;
use http::request::Parts;
use regex::Regex;

use crate::error::ConfigError;

const MAX_DYNAMIC_SEGMENTS: usize = 16;

/// Skips requests whose path matches any of the configured patterns.
///
/// ```
/// use bodydump_core::Filter;
/// use bodydump_http::filters::Path;
///
/// let skip = Path::new("/users/{id}");
/// let (parts, _) = http::Request::get("/users/42").body(()).unwrap().into_parts();
/// assert!(skip.skip(&parts));
/// ```
#[derive(Debug)]
pub struct Path {
    resources: Vec<ResourceDef>,
}

impl Path {
    /// Matches a single pattern.
    ///
    /// # Panics
    ///
    /// Panics on a malformed pattern. Use [`Path::try_new`] for patterns that
    /// come from configuration.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            resources: vec![ResourceDef::new(pattern.into())],
        }
    }

    /// Matches any of several patterns.
    pub fn any_of<I, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            resources: patterns
                .into_iter()
                .map(|pattern| ResourceDef::new(pattern.into()))
                .collect(),
        }
    }
}

impl Path {
    /// Matches a single pattern, rejecting a malformed one.
    pub fn try_new(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        Self::try_any_of([pattern.into()])
    }

    /// Matches any of several patterns, rejecting malformed ones.
    pub fn try_any_of<I, P>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let resources = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.into();
                match validate(&pattern) {
                    Ok(()) => Ok(ResourceDef::new(pattern)),
                    Err(reason) => Err(ConfigError::InvalidPath { pattern, reason }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { resources })
    }
}

/// Checks the pattern rules `ResourceDef::new` enforces by panicking.
fn validate(pattern: &str) -> Result<(), String> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = closing_brace(after)
            .ok_or_else(|| format!("unclosed `{{` at `{}`", &rest[open..]))?;
        let segment = &after[..close];
        rest = &after[close + 1..];

        let (name, custom) = match segment.split_once(':') {
            Some((name, regex)) => (name, Some(regex)),
            None => (segment, None),
        };
        if name.is_empty() {
            return Err(format!("unnamed segment `{{{segment}}}`"));
        }
        if names.contains(&name) {
            return Err(format!("duplicate segment name `{name}`"));
        }
        names.push(name);
        if let Some(regex) = custom {
            Regex::new(regex).map_err(|error| format!("segment `{name}`: {error}"))?;
        }

        if let Some(tail) = rest.strip_prefix('*') {
            if !tail.is_empty() {
                return Err(format!("tail segment `{name}` must be last"));
            }
            if custom.is_some() {
                return Err(format!("tail segment `{name}` cannot have a custom regex"));
            }
        }
    }

    if names.len() > MAX_DYNAMIC_SEGMENTS {
        return Err(format!(
            "{} dynamic segments, at most {MAX_DYNAMIC_SEGMENTS} are allowed",
            names.len()
        ));
    }
    Ok(())
}

/// Index of the `}` closing a segment whose `{` was just consumed.
fn closing_brace(segment: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in segment.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(idx),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

impl Filter<Parts> for Path {
    fn skip(&self, parts: &Parts) -> bool {
        let path = parts.uri.path();
        self.resources.iter().any(|resource| resource.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn parts(uri: &str) -> Parts {
        Request::get(uri).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_exact_path() {
        let filter = Path::new("/foo");
        assert!(filter.skip(&parts("/foo")));
        assert!(filter.skip(&parts("/foo?query=1")));
        assert!(!filter.skip(&parts("/foo/bar")));
    }

    #[test]
    fn test_tail_pattern() {
        let filter = Path::new("/static/{tail}*");
        assert!(filter.skip(&parts("/static/css/app.css")));
        assert!(!filter.skip(&parts("/api/static")));
    }

    #[test]
    fn test_try_new_accepts_valid_patterns() {
        let filter = Path::try_new(r"/users/{id:\d{1,6}}/files/{tail}*").unwrap();
        assert!(filter.skip(&parts("/users/42/files/a/b.txt")));
        assert!(!filter.skip(&parts("/users/abc/files/a")));
    }

    #[test]
    fn test_try_new_rejects_malformed_patterns() {
        for pattern in [
            "/users/{id",
            "/users/{}",
            "/users/{id:[a-}",
            "/{a}/{a}",
            "/static/{tail}*/more",
            "/static/{tail:.*}*",
        ] {
            let error = Path::try_new(pattern).unwrap_err();
            assert!(
                matches!(&error, ConfigError::InvalidPath { pattern: rejected, .. } if rejected == pattern),
                "{pattern}: {error}"
            );
        }
    }

    #[test]
    fn test_too_many_segments_rejected() {
        let pattern: String = (0..17).map(|i| format!("/{{s{i}}}")).collect();
        assert!(Path::try_new(pattern).is_err());
    }

    #[test]
    fn test_any_of() {
        let filter = Path::any_of(["/health", "/ready"]);
        assert!(filter.skip(&parts("/health")));
        assert!(filter.skip(&parts("/ready")));
        assert!(!filter.skip(&parts("/live")));
    }
}
