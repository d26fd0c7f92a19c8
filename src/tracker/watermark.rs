use std::collections::HashMap;

use crate::domain::MatchGame;

/// Last reported match id per (stable id, game).
///
/// Sized by the number of tracked players, so nothing is ever evicted.
/// An absent key means the pair has not been observed since startup. A key
/// holding `None` means it was observed with an empty history.
#[derive(Debug, Default, Clone)]
pub struct WatermarkStore {
    marks: HashMap<(String, MatchGame), Option<String>>,
}

impl WatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stable_id: &str, game: MatchGame) -> Option<&str> {
        self.marks
            .get(&(stable_id.to_string(), game))
            .and_then(|mark| mark.as_deref())
    }

    /// Whether a fetch for the pair has ever succeeded
    pub fn is_observed(&self, stable_id: &str, game: MatchGame) -> bool {
        self.marks.contains_key(&(stable_id.to_string(), game))
    }

    /// Record a successful fetch that returned no history; keeps any stored id
    pub(crate) fn observe_empty(&mut self, stable_id: &str, game: MatchGame) {
        self.marks
            .entry((stable_id.to_string(), game))
            .or_insert(None);
    }

    /// Move the watermark forward, returning the id it replaced
    pub(crate) fn advance(
        &mut self,
        stable_id: &str,
        game: MatchGame,
        item_id: &str,
    ) -> Option<String> {
        self.marks
            .insert((stable_id.to_string(), game), Some(item_id.to_string()))
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_games_do_not_share_watermarks() {
        let mut store = WatermarkStore::new();
        store.advance("puuid-1", MatchGame::League, "NA1_1");

        assert_eq!(store.get("puuid-1", MatchGame::League), Some("NA1_1"));
        assert_eq!(store.get("puuid-1", MatchGame::Valorant), None);
        assert_eq!(store.get("puuid-2", MatchGame::League), None);
    }

    #[test]
    fn test_advance_returns_previous() {
        let mut store = WatermarkStore::new();
        assert_eq!(store.advance("p", MatchGame::Valorant, "m1"), None);
        assert_eq!(
            store.advance("p", MatchGame::Valorant, "m2"),
            Some("m1".to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_history_is_observed_without_id() {
        let mut store = WatermarkStore::new();
        assert!(!store.is_observed("p", MatchGame::League));

        store.observe_empty("p", MatchGame::League);
        assert!(store.is_observed("p", MatchGame::League));
        assert_eq!(store.get("p", MatchGame::League), None);
        assert!(!store.is_observed("p", MatchGame::Valorant));

        assert_eq!(store.advance("p", MatchGame::League, "m1"), None);
        store.observe_empty("p", MatchGame::League);
        assert_eq!(store.get("p", MatchGame::League), Some("m1"));
    }
}
