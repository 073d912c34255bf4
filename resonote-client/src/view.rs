//! Read-only projection of a session and its terminal rendering
//!
//! [`SessionView`] is built by [`crate::session::Session::view`]. The render
//! functions are pure: the same view and width always give the same text.

use resonote_common::{Facet, Track};
use std::fmt::Write;

use crate::session::{Notice, NoticeLevel, Phase};

/// One tag chip as displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub tag: String,
    pub selected: bool,
}

/// A facet's displayed chips and search state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetView {
    pub facet: Facet,
    pub query: String,
    pub chips: Vec<Chip>,
    /// Selected tags in this facet, including ones filtered out of view
    pub selected: usize,
    /// Vocabulary size
    pub available: usize,
}

/// Everything a renderer needs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub session_id: String,
    pub phase: Phase,
    pub track: Option<Track>,
    pub facets: Vec<FacetView>,
    pub total_selections: usize,
    /// Successful saves
    pub progress: usize,
    /// 1-based queue position of the current track
    pub position: usize,
    /// Queue length plus pending tracks
    pub total: usize,
    pub remaining: usize,
    pub percent: u32,
    pub on_second_pass: bool,
}

impl SessionView {
    pub fn can_save(&self) -> bool {
        matches!(self.phase, Phase::Reviewing) && self.total_selections > 0
    }

    pub fn can_export(&self) -> bool {
        self.phase == Phase::Completed
    }
}

/// Queue percentage, capped at 100
pub fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let pct = (done as f64 / total as f64 * 100.0).round() as u32;
    pct.min(100)
}

/// Full screen for the current state
pub fn render(view: &SessionView, width: usize) -> String {
    let width = width.max(20);
    let mut out = String::new();
    let rule = "─".repeat(width);

    let _ = writeln!(
        out,
        "Saved {}  │  Queue {}/{}  │  {} left  │  {}%",
        view.progress,
        view.position.min(view.total),
        view.total,
        view.remaining,
        view.percent
    );
    let _ = writeln!(out, "{}", rule);

    match view.phase {
        Phase::Loading => {
            let _ = writeln!(out, "Loading...");
            return out;
        }
        Phase::Completed => {
            let _ = writeln!(out, "All tracks completed!");
            let _ = writeln!(
                out,
                "{} annotations saved this session. Type x to export.",
                view.progress
            );
            return out;
        }
        _ => {}
    }

    if let Some(track) = &view.track {
        let _ = writeln!(out, "{}", track.display_title());
        let subtitle = track.display_subtitle();
        if !subtitle.is_empty() {
            let _ = writeln!(out, "{}", subtitle);
        }
        if view.on_second_pass {
            let _ = writeln!(out, "(skipped earlier)");
        }
        let _ = writeln!(out);
        for line in wrap_lyrics(&track.lyrics, width) {
            let _ = writeln!(out, "  {}", line);
        }
        let _ = writeln!(out, "{}", rule);
    }

    for (i, facet) in view.facets.iter().enumerate() {
        out.push_str(&render_facet(i + 1, facet, width));
    }

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{} tags selected", view.total_selections);
    if view.phase == Phase::Saving {
        let _ = writeln!(out, "Saving...");
    }
    out
}

fn render_facet(number: usize, facet: &FacetView, width: usize) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "[{}] {} ({} selected)",
        number, facet.facet, facet.selected
    );
    if !facet.query.trim().is_empty() {
        let _ = write!(
            out,
            "  filter \"{}\": {}/{}",
            facet.query,
            facet.chips.len(),
            facet.available
        );
    }
    out.push('\n');

    if facet.chips.is_empty() {
        out.push_str("    (no matching tags)\n");
        return out;
    }

    let mut line = String::from("   ");
    for (i, chip) in facet.chips.iter().enumerate() {
        let marker = if chip.selected { "*" } else { "" };
        let cell = format!(" {}.{}{}", i + 1, chip.tag, marker);
        if line.chars().count() + cell.chars().count() > width && !line.trim().is_empty() {
            out.push_str(&line);
            out.push('\n');
            line = String::from("   ");
        }
        line.push_str(&cell);
    }
    out.push_str(&line);
    out.push('\n');
    out
}

/// Word-wrap lyrics, keeping the original line breaks and blank stanza lines
pub fn wrap_lyrics(lyrics: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for source in lyrics.lines() {
        let mut current = String::new();
        for word in source.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// One-line notice with a level prefix
pub fn render_notice(notice: &Notice) -> String {
    let prefix = match notice.level {
        NoticeLevel::Info => "·",
        NoticeLevel::Success => "✓",
        NoticeLevel::Warning => "!",
        NoticeLevel::Error => "✗",
    };
    format!("{} {}", prefix, notice.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(phase: Phase) -> SessionView {
        SessionView {
            session_id: "session-1-abc".to_string(),
            phase,
            track: Some(Track {
                track_id: "t42".to_string(),
                track_name: Some("Night Drive".to_string()),
                artist_name: Some("The Examples".to_string()),
                lyrics: "city lights blur past the window\n\nwe keep driving".to_string(),
            }),
            facets: vec![FacetView {
                facet: Facet::EmotionalTone,
                query: String::new(),
                chips: vec![
                    Chip { tag: "wistful".to_string(), selected: true },
                    Chip { tag: "joyful".to_string(), selected: false },
                ],
                selected: 1,
                available: 2,
            }],
            total_selections: 1,
            progress: 3,
            position: 4,
            total: 50,
            remaining: 47,
            percent: 6,
            on_second_pass: false,
        }
    }

    #[test]
    fn test_render_shows_track_and_chips() {
        let text = render(&view(Phase::Reviewing), 60);
        assert!(text.contains("Saved 3  │  Queue 4/50  │  47 left  │  6%"));
        assert!(text.contains("Night Drive"));
        assert!(text.contains("The Examples • t42"));
        assert!(text.contains("[1] Tone (1 selected)"));
        assert!(text.contains(" 1.wistful*"));
        assert!(text.contains(" 2.joyful"));
        assert!(!text.contains("joyful*"));
        assert!(text.contains("1 tags selected"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let v = view(Phase::Ready);
        assert_eq!(render(&v, 40), render(&v, 40));
    }

    #[test]
    fn test_render_completed_hides_track() {
        let text = render(&view(Phase::Completed), 60);
        assert!(text.contains("All tracks completed!"));
        assert!(!text.contains("Night Drive"));
    }

    #[test]
    fn test_filtered_facet_shows_match_count() {
        let mut v = view(Phase::Ready);
        v.facets[0].query = "wist".to_string();
        v.facets[0].chips.truncate(1);
        let text = render(&v, 60);
        assert!(text.contains("filter \"wist\": 1/2"));

        v.facets[0].chips.clear();
        assert!(render(&v, 60).contains("(no matching tags)"));
    }

    #[test]
    fn test_wrap_lyrics() {
        let lines = wrap_lyrics("one two three four\n\nfive", 9);
        assert_eq!(lines, ["one two", "three", "four", "", "five"]);

        // A single word longer than the width stays whole
        assert_eq!(wrap_lyrics("extraordinarily", 5), ["extraordinarily"]);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(5, 4), 100);
    }

    #[test]
    fn test_render_notice() {
        assert_eq!(render_notice(&Notice::warning("Please select at least one tag")), "! Please select at least one tag");
        assert_eq!(render_notice(&Notice::success("Saved")), "✓ Saved");
    }
}
