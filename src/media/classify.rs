use std::path::Path;

/// Supported image extensions (lower-case)
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// Check if a path is a supported image by its extension.
///
/// The comparison is case-insensitive and never touches the filesystem.
/// A name made only of a dot and an extension (`.jpg`) counts as that
/// extension.
pub fn is_image(path: &Path) -> bool {
    extension(path)
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    if let Some(ext) = path.extension() {
        return Some(ext.to_string_lossy().into_owned());
    }
    // `Path::extension` treats `.jpg` as a stem without extension
    path.file_name()?
        .to_string_lossy()
        .strip_prefix('.')
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        for name in ["a.jpg", "a.jpeg", "a.png", "a.bmp", "a.gif"] {
            assert!(is_image(Path::new(name)), "{name} should be an image");
        }
    }

    #[test]
    fn test_mixed_case_extensions() {
        assert!(is_image(Path::new("/photos/IMG_0001.JPG")));
        assert!(is_image(Path::new("/photos/holiday.JpEg")));
        assert!(is_image(Path::new("scan.PNG")));
    }

    #[test]
    fn test_bare_extension_name_is_an_image() {
        assert!(is_image(Path::new(".jpg")));
        assert!(is_image(Path::new("/photos/.PNG")));
        assert!(is_image(Path::new("/photos/.hidden.gif")));
        assert!(!is_image(Path::new("/photos/.profile")));
    }

    #[test]
    fn test_rejects_other_files() {
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("DSC_0001.NEF")));
        assert!(!is_image(Path::new("photo.webp")));
        assert!(!is_image(Path::new("jpg")));
        assert!(!is_image(Path::new("/photos/.jpg/readme")));
        assert!(!is_image(Path::new("archive.jpg.zip")));
    }
}
