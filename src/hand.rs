//! The "Make Futures" hand: one random card per category and the sentence
//! composed from it.

use crate::deck::{Card, Category, Deck};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Deterministic RNG used for dealing.
#[derive(Clone, Debug)]
pub struct DeckRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl DeckRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seeded from OS entropy; the chosen seed is kept so a hand can be
    /// reproduced with `--seed`.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.inner.gen_range(0..items.len()))
        }
    }
}

/// Current selection per category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    slots: [Option<Card>; 4],
}

impl Hand {
    pub fn deal(deck: &Deck, rng: &mut DeckRng) -> Self {
        let mut hand = Hand::default();
        hand.reshuffle(deck, rng);
        hand
    }

    pub fn get(&self, category: Category) -> Option<&Card> {
        self.slots[category.index()].as_ref()
    }

    pub fn set(&mut self, card: Card) {
        let idx = card.category.index();
        self.slots[idx] = Some(card);
    }

    pub fn reshuffle(&mut self, deck: &Deck, rng: &mut DeckRng) {
        for category in Category::ALL {
            self.reshuffle_category(category, deck, rng);
        }
    }

    pub fn reshuffle_category(&mut self, category: Category, deck: &Deck, rng: &mut DeckRng) {
        self.slots[category.index()] = rng.pick(deck.cards(category)).cloned();
    }

    pub fn sentence(&self) -> ComposedSentence {
        let text = |c: Category| {
            self.get(c)
                .map(|card| card.sentence_text().to_string())
                .unwrap_or_else(|| "...".to_string())
        };
        ComposedSentence {
            arc: text(Category::Arc),
            terrain: text(Category::Terrain),
            object: text(Category::Object),
            mood: text(Category::Mood),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedSentence {
    pub arc: String,
    pub terrain: String,
    pub object: String,
    pub mood: String,
}

impl ComposedSentence {
    pub const PROMPT: &'static str = "What is it?";

    /// Highlighted fragments paired with their category, in reading order
    pub fn highlights(&self) -> [(Category, &str); 4] {
        [
            (Category::Arc, &self.arc),
            (Category::Object, &self.object),
            (Category::Terrain, &self.terrain),
            (Category::Mood, &self.mood),
        ]
    }
}

impl fmt::Display for ComposedSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In a {} future there is an {} related to {} that inspires {}.",
            self.arc, self.object, self.terrain, self.mood
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_hand() {
        let deck = Deck::builtin();
        let a = Hand::deal(&deck, &mut DeckRng::new(7));
        let b = Hand::deal(&deck, &mut DeckRng::new(7));
        assert_eq!(a, b);
        for c in Category::ALL {
            assert_eq!(a.get(c).unwrap().category, c);
        }
    }

    #[test]
    fn reshuffle_one_category_keeps_the_others() {
        let deck = Deck::builtin();
        let mut rng = DeckRng::new(1);
        let mut hand = Hand::deal(&deck, &mut rng);
        let before = hand.clone();
        for _ in 0..10 {
            hand.reshuffle_category(Category::Object, &deck, &mut rng);
        }
        assert_eq!(hand.get(Category::Arc), before.get(Category::Arc));
        assert_eq!(hand.get(Category::Mood), before.get(Category::Mood));
    }

    #[test]
    fn sentence_uses_arc_type() {
        let mut hand = Hand::default();
        hand.set(Card::arc("Growth", "In 10 years"));
        hand.set(Card::text(Category::Terrain, "the commute"));
        hand.set(Card::text(Category::Object, "app"));
        hand.set(Card::text(Category::Mood, "hope"));
        assert_eq!(
            hand.sentence().to_string(),
            "In a Growth future there is an app related to the commute that inspires hope."
        );
    }

    #[test]
    fn empty_slots_render_ellipsis() {
        let sentence = Hand::default().sentence();
        assert_eq!(sentence.arc, "...");
        assert!(sentence.to_string().starts_with("In a ... future"));
    }

    #[test]
    fn empty_category_leaves_slot_empty() {
        let deck = Deck::from_json(r#"{"Mood":[{"content":"awe"}]}"#).unwrap();
        let hand = Hand::deal(&deck, &mut DeckRng::new(3));
        assert!(hand.get(Category::Arc).is_none());
        assert_eq!(hand.get(Category::Mood).unwrap().front_text(), "awe");
    }
}
