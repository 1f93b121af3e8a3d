/// Video chapter parsing and lookup
///
/// Chapters give the conversational agent situational awareness of what the
/// viewer is currently watching. The chapter list travels inside the agent
/// context as a markdown-like text block; this module turns that block into
/// structured records and answers "which chapter contains this instant".

pub mod locator;
pub mod parser;

pub use locator::{find_chapter_at_timestamp, format_time};
pub use parser::parse_chapters_from_context;

use serde::{Deserialize, Serialize};

/// A named, time-bounded segment of a demo video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoChapter {
    /// Start of the chapter, in seconds from the start of the video
    pub start: u32,
    /// End of the chapter, in seconds from the start of the video
    pub end: u32,
    /// Chapter title
    pub title: String,
}

impl VideoChapter {
    pub fn new(start: u32, end: u32, title: impl Into<String>) -> Self {
        Self {
            start,
            end,
            title: title.into(),
        }
    }
}
