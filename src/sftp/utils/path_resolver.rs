use std::path::{Component, Path, PathBuf};

/// Maps client-supplied paths into a fixed local root directory.
///
/// Resolution is purely lexical: the client path is cleaned up and re-anchored
/// under the root before any `..` segment is applied, so traversal can never
/// rise above the root. A path that does not exist is not a resolver error;
/// that surfaces later as a filesystem error on the actual operation.
pub struct PathResolver {
    root_dir: PathBuf,
}

impl PathResolver {
    pub fn new(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }

    /// Resolves a client path to a local path inside the root directory.
    ///
    /// Accepts anything: backslash separators, a Windows drive prefix and
    /// leading slashes are all stripped, turning the input into a path
    /// relative to the root. `""` and `.` denote the root itself.
    pub fn resolve(&self, client_path: &str) -> PathBuf {
        let normalized = client_path.replace('\\', "/");

        // Strip a drive letter prefix like "C:".
        let without_drive = match normalized.as_bytes() {
            [letter, b':', ..] if letter.is_ascii_alphabetic() => &normalized[2..],
            _ => normalized.as_str(),
        };

        // Absolute-looking client paths are relative to the root.
        let relative = without_drive.trim_start_matches('/');

        let mut resolved = self.root_dir.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                // Never pop past the anchor.
                Component::ParentDir => {
                    if resolved != self.root_dir {
                        resolved.pop();
                    }
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        resolved
    }

    /// Renders a resolved local path back in client terms: root-relative,
    /// forward slashes, the root itself as `/`.
    pub fn client_view(&self, local: &Path) -> String {
        match local.strip_prefix(&self.root_dir) {
            Ok(rel) if rel.as_os_str().is_empty() => "/".to_string(),
            Ok(rel) => format!("/{}", rel.to_string_lossy().replace('\\', "/")),
            Err(_) => "/".to_string(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new(PathBuf::from("/srv/sftp_data"))
    }

    #[test]
    fn relative_path_joins_onto_root() {
        let r = resolver();
        assert_eq!(r.resolve("a/b.txt"), PathBuf::from("/srv/sftp_data/a/b.txt"));
    }

    #[test]
    fn absolute_path_is_reanchored() {
        let r = resolver();
        assert_eq!(r.resolve("/a/b.txt"), PathBuf::from("/srv/sftp_data/a/b.txt"));
        assert_eq!(r.resolve("////x"), PathBuf::from("/srv/sftp_data/x"));
    }

    #[test]
    fn parent_traversal_cannot_escape_root() {
        let r = resolver();
        for input in [
            "../../etc/passwd",
            "/../../../etc/passwd",
            "a/../../../../etc/passwd",
            "..",
            "../",
        ] {
            let resolved = r.resolve(input);
            assert!(
                resolved.starts_with(r.root_dir()),
                "{input:?} escaped to {resolved:?}"
            );
        }
        assert_eq!(
            r.resolve("../../etc/passwd"),
            PathBuf::from("/srv/sftp_data/etc/passwd")
        );
    }

    #[test]
    fn drive_letter_prefix_is_stripped() {
        let r = resolver();
        assert_eq!(
            r.resolve("C:\\..\\..\\x"),
            PathBuf::from("/srv/sftp_data/x")
        );
        assert_eq!(r.resolve("d:/y"), PathBuf::from("/srv/sftp_data/y"));
    }

    #[test]
    fn empty_and_dot_denote_root() {
        let r = resolver();
        assert_eq!(r.resolve(""), PathBuf::from("/srv/sftp_data"));
        assert_eq!(r.resolve("."), PathBuf::from("/srv/sftp_data"));
        assert_eq!(r.resolve("./"), PathBuf::from("/srv/sftp_data"));
    }

    #[test]
    fn client_view_renders_root_as_slash() {
        let r = resolver();
        assert_eq!(r.client_view(Path::new("/srv/sftp_data")), "/");
        assert_eq!(r.client_view(Path::new("/srv/sftp_data/a/b")), "/a/b");
        // Paths outside the root never leak; they render as the root.
        assert_eq!(r.client_view(Path::new("/etc/passwd")), "/");
    }

    #[test]
    fn resolve_then_view_round_trips() {
        let r = resolver();
        let local = r.resolve("/folder/sub");
        assert_eq!(r.client_view(&local), "/folder/sub");
    }
}
