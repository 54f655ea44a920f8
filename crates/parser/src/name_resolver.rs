//! Operation naming
//!
//! Operations keep the identifier the schema gives them. Operations without
//! one get a name derived from the method and the path:
//! - GET → `get`, PUT/PATCH → `update`, DELETE → `delete`
//! - POST → `create`, unless the last segment is an action (`/users/login`,
//!   `/movies:batchGet`), in which case the action is the verb
//! - every path segment is title-cased and appended, braces dropped
//!
//! `GET /movies/{id}/quotes` becomes `getMoviesIdQuotes`.

use clientgen_common::naming::{camel_case, pascal_case, split_words};
use clientgen_common::{HttpMethod, NameError};
use std::collections::BTreeMap;

/// First words that mark a POST segment as an action rather than a resource
const ACTION_VERBS: &[&str] = &[
    "activate", "approve", "archive", "assign", "authenticate", "authorize", "batch", "cancel",
    "check", "clone", "close", "complete", "confirm", "copy", "deactivate", "disable", "download",
    "enable", "execute", "export", "generate", "import", "invite", "lock", "login", "logout",
    "merge", "move", "open", "preview", "publish", "query", "refresh", "register", "reject",
    "reset", "restore", "resume", "retry", "revoke", "run", "search", "send", "start", "stop",
    "submit", "subscribe", "suspend", "sync", "test", "trigger", "unarchive", "unlock",
    "unpublish", "unsubscribe", "upload", "validate", "verify",
];

/// Input to name resolution: one per operation, in operation order
#[derive(Debug, Clone, Copy)]
pub struct NameCandidate<'a> {
    /// Identifier declared by the schema
    pub explicit: Option<&'a str>,
    pub method: HttpMethod,
    pub path: &'a str,
}

/// Derives unique operation identifiers
pub struct NameResolver;

impl NameResolver {
    /// Verb prefix used for a method
    pub fn verb(method: HttpMethod) -> &'static str {
        match method {
            HttpMethod::Get => "get",
            HttpMethod::Post => "create",
            HttpMethod::Put | HttpMethod::Patch => "update",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    /// Derive a name from method and path
    ///
    /// # Examples
    /// ```
    /// use clientgen_common::HttpMethod;
    /// use clientgen_parser::NameResolver;
    ///
    /// assert_eq!(NameResolver::derive(HttpMethod::Get, "/movies/{id}"), "getMoviesId");
    /// assert_eq!(NameResolver::derive(HttpMethod::Post, "/movies"), "createMovies");
    /// assert_eq!(NameResolver::derive(HttpMethod::Post, "/users/login"), "loginUsers");
    /// ```
    pub fn derive(method: HttpMethod, path: &str) -> String {
        let mut segments = segments(path);
        let mut name = Self::verb(method).to_string();
        if method == HttpMethod::Post {
            if let Some(action) = take_action(&mut segments) {
                name = action;
            }
        }

        if segments.is_empty() {
            name.push_str("Root");
        }
        for segment in segments {
            name.push_str(&pascal_case(segment));
        }
        name
    }

    /// Assign an identifier to every candidate.
    ///
    /// Derived names that collide get a suffix from the first path segment
    /// where the colliding operations differ. Explicit identifiers are never
    /// changed. Any name still shared afterwards is an error.
    pub fn resolve(candidates: &[NameCandidate<'_>]) -> Result<Vec<String>, NameError> {
        let mut names: Vec<String> = candidates
            .iter()
            .map(|c| match c.explicit {
                Some(id) => id.to_string(),
                None => Self::derive(c.method, c.path),
            })
            .collect();

        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, name) in names.iter().enumerate() {
            groups.entry(name.clone()).or_default().push(i);
        }

        for members in groups.values().filter(|m| m.len() > 1) {
            let paths: Vec<Vec<&str>> = members
                .iter()
                .map(|&i| segments(candidates[i].path))
                .collect();
            let Some(index) = first_difference(&paths) else {
                continue;
            };
            for (member, path) in members.iter().zip(&paths) {
                if candidates[*member].explicit.is_some() {
                    continue;
                }
                if let Some(segment) = path.get(index) {
                    names[*member].push_str(&suffix(segment));
                }
            }
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for name in &names {
            *counts.entry(name.as_str()).or_default() += 1;
        }
        let duplicates: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(NameError::Unresolvable { names: duplicates });
        }

        Ok(names)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn is_template(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

/// Pop the action of a POST path, if it has one
fn take_action(segments: &mut Vec<&str>) -> Option<String> {
    let last = *segments.last()?;

    // `resource:action` custom methods
    if let Some((resource, action)) = last.rsplit_once(':') {
        if !action.is_empty() && !action.contains('}') {
            if resource.is_empty() {
                segments.pop();
            } else if let Some(slot) = segments.last_mut() {
                *slot = resource;
            }
            return Some(camel_case(action));
        }
    }

    if is_template(last) {
        return None;
    }
    let first_word = split_words(last).into_iter().next()?.to_lowercase();
    if ACTION_VERBS.contains(&first_word.as_str()) {
        segments.pop();
        return Some(camel_case(last));
    }
    None
}

/// Index of the first segment that is not shared by every path
fn first_difference(paths: &[Vec<&str>]) -> Option<usize> {
    let longest = paths.iter().map(Vec::len).max()?;
    (0..longest).find(|&i| {
        let first = paths[0].get(i);
        paths.iter().any(|p| p.get(i) != first)
    })
}

fn suffix(segment: &str) -> String {
    if is_template(segment) {
        format!("By{}", pascal_case(segment))
    } else {
        pascal_case(segment)
    }
}
