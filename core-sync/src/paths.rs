//! Share path helpers
//!
//! Share paths are `/`-separated and relative to the share root; `""` is the
//! root itself.

/// Join a directory and a child name
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Parent directory, `""` for top-level entries
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last path segment
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Whether `name` ends with one of `extensions` (`.ext`, lowercase)
pub fn has_extension(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("", "Artist"), "Artist");
        assert_eq!(join("Artist", "Album"), "Artist/Album");
        assert_eq!(join("Artist/", "Album"), "Artist/Album");
    }

    #[test]
    fn test_parent_and_file_name() {
        assert_eq!(parent("Artist/Album/01.flac"), "Artist/Album");
        assert_eq!(parent("top.flac"), "");
        assert_eq!(file_name("Artist/Album/01.flac"), "01.flac");
        assert_eq!(file_name("top.flac"), "top.flac");
    }

    #[test]
    fn test_has_extension() {
        let exts = vec![".flac".to_string(), ".mp3".to_string()];
        assert!(has_extension("Song.FLAC", &exts));
        assert!(has_extension("a.mp3", &exts));
        assert!(!has_extension("cover.jpg", &exts));
        assert!(!has_extension("flac", &exts));
    }
}
