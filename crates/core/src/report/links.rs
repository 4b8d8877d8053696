use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};

/// `path` made absolute against the working directory, with `.` and `..` folded lexically.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    Ok(normalize(&std::path::absolute(path)?))
}

/// Drop `.` and fold `..` into the preceding component where there is one.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            c => parts.push(c),
        }
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Path from `base_dir` to `target`, computed lexically.
///
/// Both paths must share a root (both absolute, or both relative to the same
/// directory). When no relative path exists (different roots, or `base_dir`
/// climbs above the common prefix) the normalized target is returned.
pub fn relative_path(target: &Path, base_dir: &Path) -> PathBuf {
    let target = normalize(target);
    let base = normalize(base_dir);
    if target.is_absolute() != base.is_absolute() {
        return target;
    }

    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if base[common..]
        .iter()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return target.iter().map(|c| c.as_os_str()).collect();
    }

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Render a path as a `/`-separated link. Rooted paths become `file:` URLs.
pub fn link_string(path: &Path) -> String {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::RootDir => {}
            c => segments.push(c.as_os_str().to_string_lossy().into_owned()),
        }
    }
    let joined = segments.join("/");
    if path.has_root() {
        format!("file:///{joined}")
    } else {
        joined
    }
}

/// Link from the directory containing `document` to `target`.
pub fn link_from(document: &Path, target: &Path) -> String {
    let base = document.parent().unwrap_or_else(|| Path::new(""));
    link_string(&relative_path(target, base))
}

/// Hands out file-safe names, suffixing `_2`, `_3`, ... when two tags map to the same name.
#[derive(Debug, Default)]
pub struct FileNames {
    claimed: HashSet<String>,
}

impl FileNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, tag: &str) -> String {
        let base = safe_file_name(tag);
        let mut name = base.clone();
        let mut n = 2;
        while self.claimed.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        if name != base {
            tracing::warn!(tag, file = %name, "file name already used by another tag");
        }
        self.claimed.insert(name.clone());
        name
    }
}

/// Tag name usable as part of a file name.
pub fn safe_file_name(tag: &str) -> String {
    tag.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_sibling() {
        let p = relative_path(Path::new("/out/index/tags.html"), Path::new("/out/index"));
        assert_eq!(p, PathBuf::from("tags.html"));
    }

    #[test]
    fn test_relative_child_and_parent() {
        let down = relative_path(
            Path::new("/out/index/index_cat/index_0_3.html"),
            Path::new("/out/index"),
        );
        assert_eq!(link_string(&down), "index_cat/index_0_3.html");

        let up = relative_path(
            Path::new("/corpus/images/1.jpg"),
            Path::new("/out/index/index_cat"),
        );
        assert_eq!(link_string(&up), "../../../corpus/images/1.jpg");
    }

    #[test]
    fn test_relative_same_dir_is_dot() {
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b")), PathBuf::from("."));
    }

    #[test]
    fn test_relative_ignores_cur_dir() {
        let p = relative_path(Path::new("./out/x.html"), Path::new("out"));
        assert_eq!(p, PathBuf::from("x.html"));
    }

    #[test]
    fn test_relative_mixed_roots_unchanged() {
        let p = relative_path(Path::new("rel/x.html"), Path::new("/abs"));
        assert_eq!(p, PathBuf::from("rel/x.html"));
    }

    #[test]
    fn test_rooted_link_is_never_protocol_relative() {
        let link = link_from(Path::new("out/index/index_cat.html"), Path::new("/data/images/1.jpg"));
        assert_eq!(link, "file:///data/images/1.jpg");
        assert!(!link.starts_with("//"));
    }

    #[test]
    fn test_base_above_common_prefix_has_no_relative_link() {
        let p = relative_path(Path::new("data/images/1.jpg"), Path::new("../out/index"));
        assert_eq!(p, PathBuf::from("data/images/1.jpg"));
    }

    #[test]
    fn test_relative_folds_parent_dirs() {
        let p = relative_path(
            Path::new("/work/data/../data/images/1.jpg"),
            Path::new("/work/run/../out/index"),
        );
        assert_eq!(link_string(&p), "../../data/images/1.jpg");
    }

    #[test]
    fn test_absolute_path_resolves_parent_of_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let out = absolute_path(Path::new("../out")).unwrap();
        assert!(out.is_absolute());
        assert_eq!(out, cwd.parent().unwrap_or(&cwd).join("out"));

        let image = absolute_path(Path::new("data/images/1.jpg")).unwrap();
        let link = link_from(&out.join("index/index_cat.html"), &image);
        let expected = match cwd.file_name() {
            Some(name) => format!("../../{}/data/images/1.jpg", name.to_string_lossy()),
            None => "../../data/images/1.jpg".to_string(),
        };
        assert_eq!(link, expected);
    }

    #[test]
    fn test_empty_path_is_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_path(Path::new("")).unwrap(), cwd);
    }

    #[test]
    fn test_link_is_relocatable() {
        let a = link_from(Path::new("/tmp/a/index/tags.html"), Path::new("/tmp/a/index/index_cat.html"));
        let b = link_from(Path::new("/srv/b/c/index/tags.html"), Path::new("/srv/b/c/index/index_cat.html"));
        assert_eq!(a, b);
        assert_eq!(a, "index_cat.html");
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("computer keyboard"), "computer_keyboard");
        assert_eq!(safe_file_name("a/b"), "a_b");
    }

    #[test]
    fn test_file_names_disambiguate_collisions() {
        let mut names = FileNames::new();
        assert_eq!(names.claim("a b"), "a_b");
        assert_eq!(names.claim("a/b"), "a_b_2");
        assert_eq!(names.claim("a_b"), "a_b_3");
        assert_eq!(names.claim("cat"), "cat");
    }
}
