//! Track queue with a deferred second pass for skipped tracks
//!
//! The queue is walked once by an integer cursor. Skipped first-pass tracks
//! collect in a pending list that is appended to the tail when the cursor
//! runs off the end. A requeued track that is skipped again is dropped, so
//! every track is shown at most twice and the walk always terminates.

use rand::seq::SliceRandom;
use rand::Rng;
use resonote_common::Track;

/// Default number of tracks assigned to a session
pub const DEFAULT_QUEUE_SIZE: usize = 50;

/// Corpus entries that can be annotated, in corpus order
pub fn eligible_tracks(corpus: Vec<Track>) -> Vec<Track> {
    corpus.into_iter().filter(Track::is_eligible).collect()
}

/// Uniformly shuffle (Fisher-Yates) and keep the first `size` tracks
pub fn assign_tracks<R: Rng + ?Sized>(mut eligible: Vec<Track>, size: usize, rng: &mut R) -> Vec<Track> {
    eligible.shuffle(rng);
    eligible.truncate(size);
    eligible
}

/// What happened when the cursor moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Cursor points at the next queued track
    Next,
    /// First pass finished; this many skipped tracks were appended
    Requeued(usize),
    /// Nothing left to show
    Exhausted,
}

/// Assigned tracks plus skip bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackQueue {
    tracks: Vec<Track>,
    pending: Vec<Track>,
    dropped: Vec<Track>,
    cursor: usize,
    /// Length of the first pass; tracks at or past this index are requeued ones
    first_pass_len: usize,
}

impl TrackQueue {
    pub fn new(tracks: Vec<Track>) -> Self {
        let first_pass_len = tracks.len();
        Self {
            tracks,
            pending: Vec::new(),
            dropped: Vec::new(),
            cursor: 0,
            first_pass_len,
        }
    }

    /// Rebuild a queue from persisted parts
    ///
    /// `first_pass_len` is clamped to the number of tracks. The cursor may sit
    /// at the end; call [`TrackQueue::settle`] afterwards.
    pub fn from_parts(
        tracks: Vec<Track>,
        pending: Vec<Track>,
        cursor: usize,
        first_pass_len: usize,
    ) -> Self {
        let first_pass_len = first_pass_len.min(tracks.len());
        let cursor = cursor.min(tracks.len());
        Self {
            tracks,
            pending,
            dropped: Vec::new(),
            cursor,
            first_pass_len,
        }
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    /// True while the cursor is on a requeued (second exposure) track
    pub fn on_second_pass(&self) -> bool {
        self.current().is_some() && self.cursor >= self.first_pass_len
    }

    /// Move past the current track
    pub fn advance(&mut self) -> Advance {
        if self.cursor < self.tracks.len() {
            self.cursor += 1;
        }
        self.settle()
    }

    /// Defer the current track and move on
    ///
    /// Returns `None` when there is no current track.
    pub fn skip(&mut self) -> Option<Advance> {
        let track = self.current()?.clone();
        if self.on_second_pass() {
            tracing::debug!(track_id = %track.track_id, "Dropping track skipped twice");
            self.dropped.push(track);
        } else {
            self.pending.push(track);
        }
        Some(self.advance())
    }

    /// Requeue pending tracks if the cursor is at the end of the queue
    pub fn settle(&mut self) -> Advance {
        if self.cursor < self.tracks.len() {
            return Advance::Next;
        }
        if self.pending.is_empty() {
            return Advance::Exhausted;
        }

        let count = self.pending.len();
        self.tracks.append(&mut self.pending);
        Advance::Requeued(count)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn pending(&self) -> &[Track] {
        &self.pending
    }

    /// Tracks skipped on both passes
    pub fn dropped(&self) -> &[Track] {
        &self.dropped
    }

    pub fn first_pass_len(&self) -> usize {
        self.first_pass_len
    }

    /// Tracks still to be shown, counting pending ones
    pub fn remaining(&self) -> usize {
        (self.tracks.len() + self.pending.len()).saturating_sub(self.cursor)
    }

    /// Queue length plus pending tracks
    pub fn total(&self) -> usize {
        self.tracks.len() + self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(id: &str) -> Track {
        Track {
            track_id: id.to_string(),
            track_name: Some(format!("Song {}", id)),
            artist_name: None,
            lyrics: format!("lyrics of {}", id),
        }
    }

    fn ids(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|t| t.track_id.as_str()).collect()
    }

    fn current_id(queue: &TrackQueue) -> Option<&str> {
        queue.current().map(|t| t.track_id.as_str())
    }

    #[test]
    fn test_eligible_tracks_need_id_and_lyrics() {
        let mut no_lyrics = track("b");
        no_lyrics.lyrics.clear();
        let mut no_id = track("c");
        no_id.track_id.clear();

        let eligible = eligible_tracks(vec![track("a"), no_lyrics, no_id, track("d")]);
        assert_eq!(ids(&eligible), ["a", "d"]);
    }

    #[test]
    fn test_assign_is_truncated_permutation() {
        let corpus: Vec<Track> = (0..120).map(|i| track(&i.to_string())).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let assigned = assign_tracks(corpus.clone(), DEFAULT_QUEUE_SIZE, &mut rng);
        assert_eq!(assigned.len(), DEFAULT_QUEUE_SIZE);

        let mut unique = ids(&assigned);
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), DEFAULT_QUEUE_SIZE);
        assert!(assigned.iter().all(|t| corpus.contains(t)));
    }

    #[test]
    fn test_assign_small_corpus_keeps_everything() {
        let corpus: Vec<Track> = (0..5).map(|i| track(&i.to_string())).collect();
        let mut rng = StdRng::seed_from_u64(1);

        let mut assigned = ids(&assign_tracks(corpus.clone(), 50, &mut rng))
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        assigned.sort();
        assert_eq!(assigned, ["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_assign_same_seed_same_order() {
        let corpus: Vec<Track> = (0..30).map(|i| track(&i.to_string())).collect();
        let a = assign_tracks(corpus.clone(), 10, &mut StdRng::seed_from_u64(99));
        let b = assign_tracks(corpus, 10, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_advance_to_exhaustion() {
        let mut queue = TrackQueue::new(vec![track("a"), track("b")]);
        assert_eq!(current_id(&queue), Some("a"));
        assert_eq!(queue.advance(), Advance::Next);
        assert_eq!(current_id(&queue), Some("b"));
        assert_eq!(queue.advance(), Advance::Exhausted);
        assert_eq!(current_id(&queue), None);
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn test_skipped_track_returns_after_queue_once() {
        let mut queue = TrackQueue::new(vec![track("a"), track("b"), track("c")]);

        assert_eq!(queue.skip(), Some(Advance::Next));
        assert_eq!(ids(queue.pending()), ["a"]);
        assert_eq!(current_id(&queue), Some("b"));
        assert!(!queue.on_second_pass());

        assert_eq!(queue.advance(), Advance::Next);
        assert_eq!(current_id(&queue), Some("c"));

        assert_eq!(queue.advance(), Advance::Requeued(1));
        assert_eq!(current_id(&queue), Some("a"));
        assert!(queue.on_second_pass());
        assert!(queue.pending().is_empty());

        assert_eq!(queue.advance(), Advance::Exhausted);
    }

    #[test]
    fn test_requeue_keeps_skip_order() {
        let mut queue = TrackQueue::new(vec![track("a"), track("b"), track("c")]);
        queue.skip();
        queue.advance();
        assert_eq!(queue.skip(), Some(Advance::Requeued(2)));
        assert_eq!(ids(queue.tracks()), ["a", "b", "c", "a", "c"]);
        assert_eq!(current_id(&queue), Some("a"));
    }

    #[test]
    fn test_second_skip_drops_track() {
        let mut queue = TrackQueue::new(vec![track("a"), track("b")]);
        queue.skip();
        queue.advance();
        assert_eq!(current_id(&queue), Some("a"));

        assert_eq!(queue.skip(), Some(Advance::Exhausted));
        assert_eq!(ids(queue.dropped()), ["a"]);
        assert!(queue.pending().is_empty());
    }

    #[test]
    fn test_remaining_counts_pending() {
        let mut queue = TrackQueue::new(vec![track("a"), track("b"), track("c")]);
        assert_eq!(queue.remaining(), 3);
        queue.skip();
        // "a" moved to pending but is still to be shown
        assert_eq!(queue.remaining(), 3);
        assert_eq!(queue.total(), 4);
        queue.advance();
        assert_eq!(queue.remaining(), 2);
    }

    #[test]
    fn test_empty_queue_is_exhausted() {
        let mut queue = TrackQueue::new(Vec::new());
        assert_eq!(queue.settle(), Advance::Exhausted);
        assert_eq!(queue.skip(), None);
    }

    #[test]
    fn test_from_parts_settles_at_end() {
        let mut queue = TrackQueue::from_parts(vec![track("a")], vec![track("z")], 5, 1);
        assert_eq!(queue.cursor(), 1);
        assert_eq!(queue.settle(), Advance::Requeued(1));
        assert_eq!(current_id(&queue), Some("z"));
        assert!(queue.on_second_pass());
    }
}
