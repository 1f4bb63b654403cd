use staleloc_core::{FreshnessError, LanguageStatus, RevisionRecord};

/// Classify one translation against its source file.
///
/// Rules apply in order: a translation that does not exist, or exists
/// without retrievable history, is `Missing`; without a source revision no
/// comparison is possible and `AmbiguousSource` tells the caller to skip the
/// language; otherwise a strictly newer source makes the translation
/// `Outdated` and anything else is `UpToDate`.
pub fn classify(
    source_path: &str,
    source_revision: Option<&RevisionRecord>,
    translation_exists: bool,
    translation_revision: Option<&RevisionRecord>,
    expected_path: &str,
) -> Result<LanguageStatus, FreshnessError> {
    if !translation_exists {
        return Ok(LanguageStatus::Missing {
            expected_path: expected_path.to_string(),
        });
    }
    let Some(translation) = translation_revision else {
        return Ok(LanguageStatus::Missing {
            expected_path: expected_path.to_string(),
        });
    };
    let Some(source) = source_revision else {
        return Err(FreshnessError::AmbiguousSource {
            path: source_path.to_string(),
        });
    };
    if source.timestamp > translation.timestamp {
        Ok(LanguageStatus::Outdated {
            source_revision: source.clone(),
            translation_revision: translation.clone(),
        })
    } else {
        Ok(LanguageStatus::UpToDate {
            translation_revision: translation.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn rev_at(id: &str, secs: i64) -> RevisionRecord {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        RevisionRecord::new(id, base + Duration::seconds(secs), "dev", "msg", "url")
    }

    #[test]
    fn strictly_newer_source_is_outdated() {
        let offsets = [-86_400, -1, 0, 1, 86_400 * 9];
        for s in offsets {
            for t in offsets {
                let src = rev_at("s", s);
                let trg = rev_at("t", t);
                let status = classify("en/a.md", Some(&src), true, Some(&trg), "hi/a.md").unwrap();
                if s > t {
                    assert!(matches!(status, LanguageStatus::Outdated { .. }), "{s} vs {t}");
                } else {
                    assert!(matches!(status, LanguageStatus::UpToDate { .. }), "{s} vs {t}");
                }
            }
        }
    }

    #[test]
    fn equal_timestamps_are_current() {
        let src = rev_at("s", 0);
        let trg = rev_at("t", 0);
        let status = classify("en/a.md", Some(&src), true, Some(&trg), "hi/a.md").unwrap();
        assert_eq!(
            status,
            LanguageStatus::UpToDate {
                translation_revision: trg
            }
        );
    }

    #[test]
    fn absent_translation_is_missing_regardless_of_revisions() {
        let src = rev_at("s", 10);
        let trg = rev_at("t", 0);
        let cases: [(Option<&RevisionRecord>, Option<&RevisionRecord>); 4] = [
            (None, None),
            (Some(&src), None),
            (None, Some(&trg)),
            (Some(&src), Some(&trg)),
        ];
        for (s, t) in cases {
            let status = classify("en/a.md", s, false, t, "hi/a.md").unwrap();
            assert_eq!(
                status,
                LanguageStatus::Missing {
                    expected_path: "hi/a.md".into()
                }
            );
        }
    }

    #[test]
    fn existing_translation_without_history_is_missing() {
        let src = rev_at("s", 10);
        let status = classify("en/a.md", Some(&src), true, None, "hi/a.md").unwrap();
        assert!(matches!(status, LanguageStatus::Missing { .. }));
        // holds even when the source is unresolved
        let status = classify("en/a.md", None, true, None, "hi/a.md").unwrap();
        assert!(matches!(status, LanguageStatus::Missing { .. }));
    }

    #[test]
    fn unresolved_source_is_ambiguous() {
        let trg = rev_at("t", 0);
        let err = classify("en/a.md", None, true, Some(&trg), "hi/a.md").unwrap_err();
        assert!(matches!(&err, FreshnessError::AmbiguousSource { path } if path == "en/a.md"));
        assert!(err.to_string().contains("`en/a.md`"));
    }
}
