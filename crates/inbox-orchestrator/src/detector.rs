//! Change detection over fetched comments
//!
//! A comment counts as new activity when all of these hold:
//! - it was written by the configured author
//! - it was created after the stored watermark
//! - its id has not been seen before
//!
//! Comments missing an id, creation time or author are skipped. The detector
//! only answers "was there anything new?"; matched ids go straight into the
//! state's seen list, so they stay recorded even if a later fetch fails.

use inbox_client::CommentSource;
use inbox_core::{parse_timestamp, Comment, Result, WatchState};
use std::collections::HashSet;

/// Boolean accumulator over a run's comments
#[derive(Debug)]
pub struct ChangeDetector<'a> {
    author_id: String,
    watermark: f64,
    seen: HashSet<String>,
    seen_ids: &'a mut Vec<String>,
    found: bool,
}

impl<'a> ChangeDetector<'a> {
    /// Detector for `author_id` against the watermark and ids in `state`
    pub fn new(author_id: &str, state: &'a mut WatchState) -> Self {
        let watermark = state.last_seen_timestamp;
        let seen = state.seen_comment_ids.iter().cloned().collect();
        Self {
            author_id: author_id.to_string(),
            watermark,
            seen,
            seen_ids: &mut state.seen_comment_ids,
            found: false,
        }
    }

    /// Feed one comment; returns whether it matched
    ///
    /// Fails only when a comment by the author has an unparseable timestamp.
    pub fn observe(&mut self, comment: &Comment) -> Result<bool> {
        let Some((id, created_time, author_id)) = comment.required_fields() else {
            return Ok(false);
        };

        if author_id != self.author_id {
            return Ok(false);
        }
        if parse_timestamp(created_time)? <= self.watermark {
            return Ok(false);
        }
        if !self.seen.insert(id.to_string()) {
            return Ok(false);
        }

        self.seen_ids.push(id.to_string());
        self.found = true;
        Ok(true)
    }

    /// Whether any comment matched so far
    pub fn found(&self) -> bool {
        self.found
    }
}

/// Walk every record of `collection_id` and feed its comments to `detector`
///
/// Records come from one query; comments are fetched record by record, in
/// order. The first error stops the scan.
pub async fn scan_for_new_comments<S>(
    source: &S,
    collection_id: &str,
    detector: &mut ChangeDetector<'_>,
) -> Result<bool>
where
    S: CommentSource + ?Sized,
{
    let records = source.list_records(collection_id).await?;

    for record in &records {
        let Some(record_id) = record.id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };

        for comment in source.list_comments(record_id).await? {
            if detector.observe(&comment)? {
                tracing::debug!("New comment {:?} on record {}", comment.id, record_id);
            }
        }
    }

    Ok(detector.found())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inbox_core::{CommentAuthor, Record, WatchError};
    use std::collections::HashMap;

    const AUTHOR: &str = "author-1";
    const T0: f64 = 1_709_294_400.0; // 2024-03-01T12:00:00Z

    fn comment(id: &str, created_time: &str, author: &str) -> Comment {
        Comment {
            id: Some(id.to_string()),
            created_time: Some(created_time.to_string()),
            created_by: Some(CommentAuthor {
                id: Some(author.to_string()),
            }),
        }
    }

    fn state(seen: &[&str]) -> WatchState {
        WatchState {
            last_seen_timestamp: T0,
            seen_comment_ids: seen.iter().map(|s| s.to_string()).collect(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_new_comment_by_author_matches() {
        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);

        assert!(detector
            .observe(&comment("c1", "2024-03-01T12:00:10.000Z", AUTHOR))
            .unwrap());
        assert!(detector.found());
        assert_eq!(state.seen_comment_ids, vec!["c1"]);
    }

    #[test]
    fn test_other_author_never_matches() {
        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);

        assert!(!detector
            .observe(&comment("c1", "2030-01-01T00:00:00.000Z", "someone-else"))
            .unwrap());
        assert!(!detector.found());
    }

    #[test]
    fn test_comment_at_or_before_watermark_never_matches() {
        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);

        assert!(!detector
            .observe(&comment("c1", "2024-03-01T12:00:00.000Z", AUTHOR))
            .unwrap());
        assert!(!detector
            .observe(&comment("c2", "2024-03-01T11:59:00.000Z", AUTHOR))
            .unwrap());
        assert!(!detector.found());
        assert!(state.seen_comment_ids.is_empty());
    }

    #[test]
    fn test_seen_id_never_matches() {
        let mut state = state(&["c1"]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);

        assert!(!detector
            .observe(&comment("c1", "2024-03-01T12:00:10.000Z", AUTHOR))
            .unwrap());
        assert!(!detector.found());
        assert_eq!(state.seen_comment_ids, vec!["c1"]);
    }

    #[test]
    fn test_duplicate_within_run_is_recorded_once() {
        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);
        let c = comment("c1", "2024-03-01T12:00:10.000Z", AUTHOR);

        assert!(detector.observe(&c).unwrap());
        assert!(!detector.observe(&c).unwrap());
        assert_eq!(state.seen_comment_ids, vec!["c1"]);
    }

    #[test]
    fn test_incomplete_comments_are_skipped() {
        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);

        let mut no_id = comment("c1", "2024-03-01T12:00:10.000Z", AUTHOR);
        no_id.id = None;
        let mut no_time = comment("c2", "2024-03-01T12:00:10.000Z", AUTHOR);
        no_time.created_time = None;
        let mut no_author = comment("c3", "2024-03-01T12:00:10.000Z", AUTHOR);
        no_author.created_by = None;

        for c in [no_id, no_time, no_author] {
            assert!(!detector.observe(&c).unwrap());
        }
        assert!(!detector.found());
    }

    #[test]
    fn test_bad_timestamp_fails_only_for_author() {
        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);

        assert!(!detector
            .observe(&comment("c1", "not-a-date", "someone-else"))
            .unwrap());

        let err = detector
            .observe(&comment("c2", "not-a-date", AUTHOR))
            .unwrap_err();
        assert!(matches!(err, WatchError::Timestamp(_)));
    }

    #[derive(Default)]
    struct FakeSource {
        records: Vec<Record>,
        comments: HashMap<String, Vec<Comment>>,
    }

    #[async_trait]
    impl CommentSource for FakeSource {
        async fn list_records(&self, _collection_id: &str) -> Result<Vec<Record>> {
            Ok(self.records.clone())
        }

        async fn list_comments(&self, record_id: &str) -> Result<Vec<Comment>> {
            self.comments
                .get(record_id)
                .cloned()
                .ok_or_else(|| WatchError::Other(format!("unexpected record {}", record_id)))
        }
    }

    #[tokio::test]
    async fn test_scan_skips_records_without_id() {
        let mut source = FakeSource::default();
        source.records = vec![
            Record { id: None },
            Record {
                id: Some("page-a".to_string()),
            },
        ];
        source.comments.insert(
            "page-a".to_string(),
            vec![
                comment("c1", "2024-03-01T11:00:00.000Z", AUTHOR),
                comment("c2", "2024-03-01T12:05:00.000Z", AUTHOR),
            ],
        );

        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);
        let found = scan_for_new_comments(&source, "db", &mut detector)
            .await
            .unwrap();

        assert!(found);
        assert_eq!(state.seen_comment_ids, vec!["c2"]);
    }

    #[tokio::test]
    async fn test_scan_keeps_ids_seen_before_failure() {
        let mut source = FakeSource::default();
        source.records = vec![
            Record {
                id: Some("page-a".to_string()),
            },
            Record {
                id: Some("page-missing".to_string()),
            },
        ];
        source.comments.insert(
            "page-a".to_string(),
            vec![comment("c1", "2024-03-01T12:05:00.000Z", AUTHOR)],
        );

        let mut state = state(&[]);
        let mut detector = ChangeDetector::new(AUTHOR, &mut state);
        let result = scan_for_new_comments(&source, "db", &mut detector).await;

        assert!(result.is_err());
        assert_eq!(state.seen_comment_ids, vec!["c1"]);
    }
}
