//! Identifier helpers.
//!
//! Identifiers are backend-relative, slash separated paths:
//! - the root folder is `/`
//! - folders start and end with `/` (`/photos/2024/`)
//! - files start with `/` and never end with one (`/photos/2024/a.jpg`)

pub const ROOT: &str = "/";

/// Identifier of the folder `name` inside `parent`.
pub fn folder_in(parent: &str, name: &str) -> String {
    format!("{}{}/", as_folder(parent), name)
}

/// Identifier of the file `name` inside `parent`.
pub fn file_in(parent: &str, name: &str) -> String {
    format!("{}{}", as_folder(parent), name)
}

/// Normalize a folder identifier so it starts and ends with `/`.
pub fn as_folder(id: &str) -> String {
    let trimmed = id.trim_matches('/');
    if trimmed.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Normalize a file identifier so it starts with `/` and has no trailing `/`.
pub fn as_file(id: &str) -> String {
    format!("/{}", id.trim_matches('/'))
}

pub fn is_folder(id: &str) -> bool {
    id.ends_with('/')
}

/// Last path segment; empty for the root folder.
pub fn name_of(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Identifier of the folder that contains `id`. The root is its own parent.
pub fn parent_of(id: &str) -> String {
    let trimmed = id.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => as_folder(&trimmed[..idx]),
        None => ROOT.to_string(),
    }
}

/// True when `id` is `folder` itself or lies anywhere below it.
pub fn is_within(id: &str, folder: &str) -> bool {
    let folder = as_folder(folder);
    let id = if is_folder(id) { as_folder(id) } else { as_file(id) };
    id.starts_with(&folder)
}

/// Rewrite the `old_prefix` folder portion of `id` to `new_prefix`.
pub fn rebase(id: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let old_prefix = as_folder(old_prefix);
    let new_prefix = as_folder(new_prefix);
    id.strip_prefix(&old_prefix)
        .map(|rest| format!("{new_prefix}{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_child_identifiers() {
        assert_eq!(folder_in("/", "a"), "/a/");
        assert_eq!(folder_in("/a/", "b"), "/a/b/");
        assert_eq!(file_in("/a", "x.txt"), "/a/x.txt");
    }

    #[test]
    fn names_and_parents() {
        assert_eq!(name_of("/a/b/"), "b");
        assert_eq!(name_of("/a/b/c.txt"), "c.txt");
        assert_eq!(name_of("/"), "");
        assert_eq!(parent_of("/a/b/c.txt"), "/a/b/");
        assert_eq!(parent_of("/a/"), "/");
        assert_eq!(parent_of("/"), "/");
    }

    #[test]
    fn containment() {
        assert!(is_within("/a/b/", "/a/"));
        assert!(is_within("/a/", "/a/"));
        assert!(is_within("/a/x.txt", "/a/"));
        assert!(!is_within("/ab/", "/a/"));
        assert!(is_within("/anything/", "/"));
    }

    #[test]
    fn rebase_swaps_prefix() {
        assert_eq!(rebase("/a/b/c.txt", "/a/", "/z/"), Some("/z/b/c.txt".to_string()));
        assert_eq!(rebase("/a/", "/a/", "/z/"), Some("/z/".to_string()));
        assert_eq!(rebase("/q/c.txt", "/a/", "/z/"), None);
    }
}
