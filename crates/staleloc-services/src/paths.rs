use staleloc_core::FreshnessError;

/// Maps content paths between the canonical locale and target locales by
/// swapping the locale path segment, e.g. `src/content/tutorials/en/intro.mdx`
/// <-> `src/content/tutorials/hi/intro.mdx`.
#[derive(Debug, Clone)]
pub struct PathMapper {
    source_locale: String,
}

impl PathMapper {
    pub fn new(source_locale: impl Into<String>) -> Self {
        Self {
            source_locale: source_locale.into(),
        }
    }

    pub fn source_locale(&self) -> &str {
        &self.source_locale
    }

    /// True when some component of `path` is exactly the source locale code.
    pub fn is_source_path(&self, path: &str) -> bool {
        locale_segment(&normalize(path), &self.source_locale).is_some()
    }

    /// Replace the first source-locale segment of `source_path` with `language`.
    pub fn derive_translation_path(
        &self,
        source_path: &str,
        language: &str,
    ) -> Result<String, FreshnessError> {
        swap_segment(source_path, &self.source_locale, language).ok_or_else(|| {
            FreshnessError::InvalidPath {
                path: source_path.to_string(),
                locale: self.source_locale.clone(),
            }
        })
    }

    /// Inverse of [`derive_translation_path`](Self::derive_translation_path):
    /// replace the first `language` segment with the source locale.
    pub fn derive_source_path(
        &self,
        translated_path: &str,
        language: &str,
    ) -> Result<String, FreshnessError> {
        swap_segment(translated_path, language, &self.source_locale).ok_or_else(|| {
            FreshnessError::InvalidPath {
                path: translated_path.to_string(),
                locale: language.to_string(),
            }
        })
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn locale_segment(path: &str, locale: &str) -> Option<usize> {
    path.split('/').position(|seg| seg == locale)
}

fn swap_segment(path: &str, from: &str, to: &str) -> Option<String> {
    let path = normalize(path);
    let idx = locale_segment(&path, from)?;
    let parts: Vec<&str> = path
        .split('/')
        .enumerate()
        .map(|(i, seg)| if i == idx { to } else { seg })
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_locale_segment() {
        let m = PathMapper::new("en");
        assert_eq!(
            m.derive_translation_path("src/content/tutorials/en/intro.mdx", "hi").unwrap(),
            "src/content/tutorials/hi/intro.mdx"
        );
        assert_eq!(
            m.derive_translation_path("en/reference/setup.yaml", "zh-Hans").unwrap(),
            "zh-Hans/reference/setup.yaml"
        );
    }

    #[test]
    fn only_exact_segments_match() {
        let m = PathMapper::new("en");
        assert!(!m.is_source_path("src/content/english/intro.mdx"));
        assert!(!m.is_source_path("src/content/tutorials/intro-en.mdx"));
        assert!(m.is_source_path("src/content/en/intro.mdx"));
        let err = m.derive_translation_path("src/content/es/intro.mdx", "hi").unwrap_err();
        assert!(matches!(err, FreshnessError::InvalidPath { .. }));
    }

    #[test]
    fn first_segment_wins() {
        let m = PathMapper::new("en");
        assert_eq!(
            m.derive_translation_path("en/docs/en/a.md", "ko").unwrap(),
            "ko/docs/en/a.md"
        );
    }

    #[test]
    fn backslashes_are_normalized() {
        let m = PathMapper::new("en");
        assert_eq!(
            m.derive_translation_path("content\\en\\a.md", "es").unwrap(),
            "content/es/a.md"
        );
    }

    #[test]
    fn round_trip_restores_source() {
        let m = PathMapper::new("en");
        let paths = [
            "src/content/tutorials/en/intro.mdx",
            "en/a.md",
            "docs/en/deep/nested/file.yaml",
            "a/en",
        ];
        for lang in ["es", "hi", "ko", "zh-Hans"] {
            for p in paths {
                let t = m.derive_translation_path(p, lang).unwrap();
                assert!(!m.is_source_path(&t));
                assert_eq!(m.derive_source_path(&t, lang).unwrap(), p);
            }
        }
    }
}
