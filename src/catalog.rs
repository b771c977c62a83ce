//! View logic shared by catalog consumers: duration labels, in-memory search
//! and pagination over the fully materialized `/api/videos` list, and the
//! player route used by the detail screen.

use serde::{Deserialize, Serialize};

use crate::youtube::EnrichedVideo;

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Renders an ISO 8601 duration (`PT1H2M10S`) as a clock label.
///
/// With hours the result is `h:mm:ss`, otherwise `m:ss`. Components that are
/// missing count as zero, and anything that is not a `PT..` duration renders
/// as `0:00`. Parsing stops at the first unit that is not `H`, `M` or `S`;
/// whatever was read before it is kept.
pub fn format_duration(iso: &str) -> String {
    let (hours, minutes, seconds) = parse_duration(iso).unwrap_or((0, 0, 0));
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

fn parse_duration(iso: &str) -> Option<(u64, u64, u64)> {
    let rest = iso.trim().strip_prefix("PT")?;
    let (mut hours, mut minutes, mut seconds) = (0, 0, 0);
    let mut digits = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let Ok(value) = digits.parse::<u64>() else {
            break;
        };
        digits.clear();
        match ch {
            'H' => hours = value,
            'M' => minutes = value,
            'S' => seconds = value,
            _ => break,
        }
    }
    Some((hours, minutes, seconds))
}

/// Case-insensitive substring match on title or channel name. A blank query
/// matches everything; otherwise the query is matched as typed, padding
/// included.
pub fn matches_query(video: &EnrichedVideo, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    video.title.to_lowercase().contains(&needle)
        || video.channel_title.to_lowercase().contains(&needle)
}

/// Search and pagination state for the list screen.
#[derive(Debug, Clone)]
pub struct CatalogBrowser {
    videos: Vec<EnrichedVideo>,
    filtered: Vec<usize>,
    query: String,
    current_page: usize,
    page_size: usize,
}

impl CatalogBrowser {
    pub fn new(videos: Vec<EnrichedVideo>) -> Self {
        Self::with_page_size(videos, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(videos: Vec<EnrichedVideo>, page_size: usize) -> Self {
        let filtered = (0..videos.len()).collect();
        Self {
            videos,
            filtered,
            query: String::new(),
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Swaps in a freshly fetched list and starts over on page 1.
    pub fn replace_videos(&mut self, videos: Vec<EnrichedVideo>) {
        self.videos = videos;
        self.apply_query();
    }

    pub fn search(&mut self, query: &str) {
        self.query = query.to_string();
        self.apply_query();
    }

    pub fn clear_search(&mut self) {
        self.search("");
    }

    fn apply_query(&mut self) {
        self.filtered = self
            .videos
            .iter()
            .enumerate()
            .filter(|(_, video)| matches_query(video, &self.query))
            .map(|(index, _)| index)
            .collect();
        self.current_page = 1;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filtered(&self) -> Vec<&EnrichedVideo> {
        self.filtered.iter().map(|&index| &self.videos[index]).collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size)
    }

    /// Pagination controls are only shown when there is more than one page.
    pub fn needs_pagination(&self) -> bool {
        self.filtered.len() > self.page_size
    }

    pub fn page_items(&self) -> Vec<&EnrichedVideo> {
        let start = (self.current_page - 1) * self.page_size;
        self.filtered
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&index| &self.videos[index])
            .collect()
    }

    /// Jumps to `page` if it exists; otherwise leaves the current page alone.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= 1 && page <= self.total_pages() {
            self.current_page = page;
            true
        } else {
            false
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.current_page > 1 && self.go_to_page(self.current_page - 1)
    }
}

/// Parameters passed to the player screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoute {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
}

impl From<&EnrichedVideo> for PlayerRoute {
    fn from(video: &EnrichedVideo) -> Self {
        Self {
            video_id: video.video_id.clone(),
            title: video.title.clone(),
            channel_title: video.channel_title.clone(),
        }
    }
}

impl PlayerRoute {
    pub fn embed_url(&self) -> String {
        embed_url(&self.video_id)
    }

    pub fn watch_url(&self) -> String {
        watch_url(&self.video_id)
    }
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}?autoplay=1")
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Everything in the catalog except the video currently playing.
pub fn related_videos<'a>(videos: &'a [EnrichedVideo], current_id: &str) -> Vec<&'a EnrichedVideo> {
    videos
        .iter()
        .filter(|video| video.video_id != current_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, title: &str, channel: &str) -> EnrichedVideo {
        EnrichedVideo {
            video_id: id.to_string(),
            title: title.to_string(),
            description: None,
            channel_title: channel.to_string(),
            published_at: "2024-05-01T00:00:00Z".to_string(),
            thumbnail: format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"),
            duration: "PT1M".to_string(),
        }
    }

    fn numbered(count: usize) -> Vec<EnrichedVideo> {
        (1..=count)
            .map(|n| video(&format!("v{n}"), &format!("Video {n}"), "Channel"))
            .collect()
    }

    #[test]
    fn format_duration_examples() {
        assert_eq!(format_duration("PT1H2M10S"), "1:02:10");
        assert_eq!(format_duration("PT5M9S"), "5:09");
        assert_eq!(format_duration("PT45S"), "0:45");
        assert_eq!(format_duration("PT2H"), "2:00:00");
        assert_eq!(format_duration("PT12M"), "12:00");
    }

    #[test]
    fn format_duration_tolerates_garbage() {
        assert_eq!(format_duration(""), "0:00");
        assert_eq!(format_duration("P1D"), "0:00");
        assert_eq!(format_duration("PT5X"), "0:00");
        assert_eq!(format_duration("PTM"), "0:00");
    }

    #[test]
    fn format_duration_keeps_prefix_before_unknown_unit() {
        assert_eq!(format_duration("PT1H5X"), "1:00:00");
        assert_eq!(format_duration("PT3M7S12"), "3:07");
        assert_eq!(format_duration("PT2M4D9S"), "2:00");
    }

    #[test]
    fn search_matches_channel_case_insensitively() {
        let mut browser = CatalogBrowser::new(vec![
            video("1", "Intro to X", "Acme"),
            video("2", "Advanced Y", "Beta"),
        ]);

        browser.search("acme");
        let titles: Vec<_> = browser.filtered().into_iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro to X"]);

        browser.search("ADVANCED");
        assert_eq!(browser.filtered()[0].video_id, "2");
    }

    #[test]
    fn search_keeps_padding_in_query() {
        let mut browser = CatalogBrowser::new(vec![
            video("1", "Intro to X", "Acme"),
            video("2", "Advanced Y", "Beta"),
        ]);

        browser.search("X ");
        assert_eq!(browser.filtered_len(), 0);

        browser.search(" to x");
        assert_eq!(browser.filtered()[0].video_id, "1");

        browser.search("   ");
        assert_eq!(browser.filtered_len(), 2);
    }

    #[test]
    fn empty_query_restores_everything_and_resets_page() {
        let mut browser = CatalogBrowser::new(numbered(12));
        assert!(browser.go_to_page(3));
        browser.search("");
        assert_eq!(browser.filtered_len(), 12);
        assert_eq!(browser.current_page(), 1);

        browser.search("Video 1");
        assert!(browser.filtered_len() < 12);
        browser.clear_search();
        assert_eq!(browser.filtered_len(), 12);
        assert_eq!(browser.query(), "");
    }

    #[test]
    fn pagination_bounds() {
        let mut browser = CatalogBrowser::new(numbered(12));
        assert_eq!(browser.total_pages(), 3);
        assert!(browser.needs_pagination());

        assert!(browser.go_to_page(3));
        let ids: Vec<_> = browser.page_items().into_iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v11", "v12"]);

        assert!(!browser.go_to_page(0));
        assert_eq!(browser.current_page(), 3);
        assert!(!browser.go_to_page(4));
        assert_eq!(browser.current_page(), 3);
        assert!(!browser.next_page());

        assert!(browser.prev_page());
        assert_eq!(browser.page_items().len(), 5);
    }

    #[test]
    fn empty_catalog_has_no_pages() {
        let mut browser = CatalogBrowser::new(Vec::new());
        assert_eq!(browser.total_pages(), 0);
        assert!(browser.page_items().is_empty());
        assert!(!browser.go_to_page(1));
        assert!(!browser.prev_page());
        assert!(!browser.needs_pagination());
    }

    #[test]
    fn replace_videos_reapplies_query() {
        let mut browser = CatalogBrowser::new(numbered(3));
        browser.search("acme");
        assert_eq!(browser.filtered_len(), 0);
        browser.replace_videos(vec![video("9", "Something", "Acme Corp")]);
        assert_eq!(browser.filtered_len(), 1);
    }

    #[test]
    fn player_route_links_and_related() {
        let videos = numbered(3);
        let route = PlayerRoute::from(&videos[1]);
        assert_eq!(route.video_id, "v2");
        assert_eq!(route.embed_url(), "https://www.youtube.com/embed/v2?autoplay=1");
        assert_eq!(route.watch_url(), "https://www.youtube.com/watch?v=v2");

        let related: Vec<_> = related_videos(&videos, &route.video_id)
            .into_iter()
            .map(|v| v.video_id.as_str())
            .collect();
        assert_eq!(related, vec!["v1", "v3"]);
    }
}
