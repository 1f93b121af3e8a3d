/// Timestamp formatting and chapter lookup
use super::VideoChapter;

/// Format a seconds count as `M:SS` for display.
///
/// Fractional input is floored. Minutes are unpadded and roll past 59
/// (there is no hour component), seconds are always two digits.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.floor().max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Find the chapter whose time range contains `timestamp`.
///
/// Bounds are inclusive on both ends and the scan takes the first match, so
/// a timestamp sitting exactly on a shared boundary is attributed to the
/// earlier chapter. A timestamp past the final chapter's end clamps to the
/// last chapter rather than returning nothing.
pub fn find_chapter_at_timestamp(chapters: &[VideoChapter], timestamp: f64) -> Option<&VideoChapter> {
    if chapters.is_empty() {
        return None;
    }

    for chapter in chapters {
        if timestamp >= chapter.start as f64 && timestamp <= chapter.end as f64 {
            return Some(chapter);
        }
    }

    chapters.last()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chapters() -> Vec<VideoChapter> {
        vec![
            VideoChapter::new(0, 60, "A"),
            VideoChapter::new(60, 120, "B"),
            VideoChapter::new(120, 180, "C"),
        ]
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.0), "0:09");
        assert_eq!(format_time(90.0), "1:30");
        assert_eq!(format_time(90.7), "1:30");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3661.0), "61:01");
    }

    #[test]
    fn test_format_time_round_trips() {
        for s in 0..=3600u64 {
            let formatted = format_time(s as f64);
            let (m, sec) = formatted.split_once(':').unwrap();
            let recomposed = m.parse::<u64>().unwrap() * 60 + sec.parse::<u64>().unwrap();
            assert_eq!(recomposed, s);
            assert_eq!(sec.len(), 2);
        }
    }

    #[test]
    fn test_empty_chapters_returns_none() {
        assert!(find_chapter_at_timestamp(&[], 0.0).is_none());
        assert!(find_chapter_at_timestamp(&[], 500.0).is_none());
    }

    #[test]
    fn test_locates_containing_chapter() {
        let chapters = sample_chapters();

        assert_eq!(find_chapter_at_timestamp(&chapters, 30.0).unwrap().title, "A");
        assert_eq!(find_chapter_at_timestamp(&chapters, 61.0).unwrap().title, "B");
        assert_eq!(find_chapter_at_timestamp(&chapters, 121.0).unwrap().title, "C");
    }

    #[test]
    fn test_shared_boundary_belongs_to_earlier_chapter() {
        let chapters = sample_chapters();

        assert_eq!(find_chapter_at_timestamp(&chapters, 60.0).unwrap().title, "A");
        assert_eq!(find_chapter_at_timestamp(&chapters, 120.0).unwrap().title, "B");
    }

    #[test]
    fn test_past_the_end_clamps_to_last() {
        let chapters = sample_chapters();

        assert_eq!(find_chapter_at_timestamp(&chapters, 200.0).unwrap().title, "C");
        assert_eq!(find_chapter_at_timestamp(&chapters, 99999.0).unwrap().title, "C");
    }

    #[test]
    fn test_zero_matches_first_chapter_start() {
        let chapters = sample_chapters();

        assert_eq!(find_chapter_at_timestamp(&chapters, 0.0).unwrap().title, "A");
    }
}
