/// Parser for the "## Video Chapters" section of an agent context blob
use super::VideoChapter;
use regex::Regex;

/// Parse chapter entries out of an agent context string.
///
/// The context may contain a `## Video Chapters` section whose entries look
/// like `1. [0:00 - 1:30] Introduction and Overview`. Everything before the
/// header is skipped; lines inside the section that do not match the
/// numbered-bracket pattern are ignored. Returns an empty list when the
/// header is absent or the input is empty - missing chapters must never
/// block playback or the conversation.
pub fn parse_chapters_from_context(text: &str) -> Vec<VideoChapter> {
    let mut chapters = Vec::new();

    let Some(section_start) = text.find("## Video Chapters") else {
        return chapters;
    };

    // Numbered entry with an inclusive time range: "N. [m:ss - m:ss] Title"
    let entry_re = match Regex::new(r"^\s*\d+\.\s*\[(\d+):(\d{2})\s*-\s*(\d+):(\d{2})\]\s*(.+)$") {
        Ok(re) => re,
        Err(_) => return chapters,
    };

    for line in text[section_start..].lines() {
        if let Some(cap) = entry_re.captures(line) {
            let (Ok(start_min), Ok(start_sec), Ok(end_min), Ok(end_sec)) = (
                cap[1].parse::<u32>(),
                cap[2].parse::<u32>(),
                cap[3].parse::<u32>(),
                cap[4].parse::<u32>(),
            ) else {
                continue;
            };

            chapters.push(VideoChapter {
                start: start_min * 60 + start_sec,
                end: end_min * 60 + end_sec,
                title: cap[5].trim().to_string(),
            });
        }
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = "\
You are a product demo assistant.

## Video Chapters
1. [0:00 - 1:30] Introduction and Overview
2. [1:30 - 3:45] Dashboard Walkthrough
3. [3:45 - 6:00] Reporting and Exports

Answer questions about the product.";

    #[test]
    fn test_parses_well_formed_section() {
        let chapters = parse_chapters_from_context(CONTEXT);

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0], VideoChapter::new(0, 90, "Introduction and Overview"));
        assert_eq!(chapters[1], VideoChapter::new(90, 225, "Dashboard Walkthrough"));
        assert_eq!(chapters[2], VideoChapter::new(225, 360, "Reporting and Exports"));
    }

    #[test]
    fn test_preserves_source_order() {
        let text = "## Video Chapters\n1. [5:00 - 6:00] Later\n2. [0:00 - 1:00] Earlier";
        let chapters = parse_chapters_from_context(text);

        assert_eq!(chapters[0].title, "Later");
        assert_eq!(chapters[1].title, "Earlier");
    }

    #[test]
    fn test_missing_header_yields_empty() {
        assert!(parse_chapters_from_context("1. [0:00 - 1:30] No header above").is_empty());
        assert!(parse_chapters_from_context("").is_empty());
        assert!(parse_chapters_from_context("plain prose with no chapters at all").is_empty());
    }

    #[test]
    fn test_ignores_non_matching_lines() {
        let text = "## Video Chapters\nnot an entry\n1. [0:00 - 1:30] Valid\n- [0:10] bullet style";
        let chapters = parse_chapters_from_context(text);

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Valid");
    }

    #[test]
    fn test_multi_digit_minutes() {
        let text = "## Video Chapters\n1. [61:01 - 75:30] Long Tail";
        let chapters = parse_chapters_from_context(text);

        assert_eq!(chapters[0].start, 61 * 60 + 1);
        assert_eq!(chapters[0].end, 75 * 60 + 30);
    }

    #[test]
    fn test_title_is_trimmed() {
        let text = "## Video Chapters\n1. [0:00 - 0:30]   Padded Title   ";
        let chapters = parse_chapters_from_context(text);

        assert_eq!(chapters[0].title, "Padded Title");
    }
}
