// Icon catalog: lists icon assets a bookmark can reference.
// The organizer only stores the reference string; icon bytes are never read.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconAsset {
    pub file_name: String,
    pub display_name: String,
    /// Value stored in `Bookmark::icon`.
    pub reference: String,
}

impl IconAsset {
    pub fn new(file_name: &str, reference_prefix: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            display_name: display_name(file_name),
            reference: format!("{}/{}", reference_prefix.trim_end_matches('/'), file_name),
        }
    }
}

/// "github-dark_mode.png" -> "github dark mode"
pub fn display_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };
    stem.replace(['-', '_'], " ").trim().to_string()
}

pub trait IconCatalog: Send + Sync {
    /// Available icons, ordered by file name.
    fn icons(&self) -> Result<Vec<IconAsset>>;
}

/// Image files in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryIcons {
    dir: PathBuf,
    reference_prefix: String,
}

impl DirectoryIcons {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let reference_prefix = dir.to_string_lossy().replace('\\', "/");
        Self { dir, reference_prefix }
    }

    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = prefix.into();
        self
    }
}

impl IconCatalog for DirectoryIcons {
    fn icons(&self) -> Result<Vec<IconAsset>> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(|entry| {
                mime_guess::from_path(entry.path())
                    .first()
                    .map(|m| m.type_() == mime_guess::mime::IMAGE)
                    .unwrap_or(false)
            })
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        Ok(names
            .iter()
            .map(|name| IconAsset::new(name, &self.reference_prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    #[case("github.png", "github")]
    #[case("dark-mode_icon.svg", "dark mode icon")]
    #[case(".hidden", ".hidden")]
    #[case("noext", "noext")]
    fn test_display_name(#[case] file: &str, #[case] expected: &str) {
        assert_eq!(display_name(file), expected);
    }

    #[test]
    fn test_lists_images_sorted_by_name() {
        let dir = tempdir().unwrap();
        for file in ["zulip.png", "apple.png", "notes.txt", "logo.svg"] {
            fs::write(dir.path().join(file), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let icons = DirectoryIcons::new(dir.path())
            .with_reference_prefix("data/icons/")
            .icons()
            .unwrap();

        let files: Vec<&str> = icons.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(files, ["apple.png", "logo.svg", "zulip.png"]);
        assert_eq!(icons[0].reference, "data/icons/apple.png");
        assert_eq!(icons[0].display_name, "apple");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(DirectoryIcons::new(dir.path().join("absent")).icons().is_err());
    }
}
