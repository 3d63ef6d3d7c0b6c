//! Virtual path helpers

/// Comparison form of a virtual path: lowercase, forward slashes, no leading slash
pub fn normalize_path(path: &str) -> String {
    let path = path.to_lowercase().replace('\\', "/");
    match path.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

/// Split at the last `/` into (folder, file name).
///
/// Files without a folder get an empty one; `/a.bin` keeps `/` as its folder.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Inverse of [`split_path`]
pub(crate) fn join_path(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else if folder.ends_with('/') {
        format!("{}{}", folder, name)
    } else {
        format!("{}/{}", folder, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_path("Characters\\Mickey.NIF"), "characters/mickey.nif");
        assert_eq!(normalize_path("/levels/a.bin"), "levels/a.bin");
        assert_eq!(normalize_path("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_split() {
        assert_eq!(split_path("models/props/a.nif"), ("models/props", "a.nif"));
        assert_eq!(split_path("test.bin"), ("", "test.bin"));
        assert_eq!(split_path("dir/"), ("dir", ""));
        assert_eq!(split_path("/a.bin"), ("/", "a.bin"));
        assert_eq!(split_path("/levels/a.bin"), ("/levels", "a.bin"));
    }

    #[test]
    fn test_join_inverts_split() {
        for path in ["test.bin", "models/a.nif", "a/b/c", "/a.bin", "/models/a.nif"] {
            let (folder, name) = split_path(path);
            assert_eq!(join_path(folder, name), path);
        }
    }
}
