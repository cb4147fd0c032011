//! Card data: categories, cards and decks.
//!
//! Cards are immutable values defined up front. The built-in deck is the one
//! shipped with the game; any other data set can be loaded from JSON of the
//! form `{"Arc": [{"type": "...", "time": "..."}], "Terrain": [{"content": "..."}], ...}`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One of the four fixed card groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Arc,
    Terrain,
    Object,
    Mood,
}

impl Category {
    /// All categories in their fixed order
    pub const ALL: [Category; 4] = [
        Category::Arc,
        Category::Terrain,
        Category::Object,
        Category::Mood,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Arc => "Arc",
            Category::Terrain => "Terrain",
            Category::Object => "Object",
            Category::Mood => "Mood",
        }
    }

    /// Theme colour used for both faces
    pub fn color(self) -> &'static str {
        match self {
            Category::Arc => "#E53935",
            Category::Terrain => "#43A047",
            Category::Object => "#1E88E5",
            Category::Mood => "#FB8C00",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Category::Arc => 0,
            Category::Terrain => 1,
            Category::Object => 2,
            Category::Mood => 3,
        }
    }

    /// Case-insensitive lookup by name
    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::parse(s).ok_or_else(|| Error::DeckData(format!("unknown category '{}'", s)))
    }
}

/// Category-dependent card payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardContent {
    /// Arc cards: a short label ("type") and a longer time frame
    Arc { kind: String, time: String },
    /// Terrain, Object and Mood cards
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub category: Category,
    pub content: CardContent,
}

impl Card {
    pub fn arc(kind: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            category: Category::Arc,
            content: CardContent::Arc {
                kind: kind.into(),
                time: time.into(),
            },
        }
    }

    pub fn text(category: Category, content: impl Into<String>) -> Self {
        Self {
            category,
            content: CardContent::Text(content.into()),
        }
    }

    /// Main text printed on the front face
    pub fn front_text(&self) -> &str {
        match &self.content {
            CardContent::Arc { time, .. } => time,
            CardContent::Text(t) => t,
        }
    }

    /// Smaller label printed above the main text (Arc cards only)
    pub fn subtext(&self) -> Option<&str> {
        match &self.content {
            CardContent::Arc { kind, .. } => Some(kind),
            CardContent::Text(_) => None,
        }
    }

    /// Arc cards carry Arc content; every other category carries text
    pub fn is_consistent(&self) -> bool {
        matches!(
            (self.category, &self.content),
            (Category::Arc, CardContent::Arc { .. })
                | (Category::Terrain | Category::Object | Category::Mood, CardContent::Text(_))
        )
    }

    /// The words used when composing a sentence from a hand
    pub fn sentence_text(&self) -> &str {
        match &self.content {
            CardContent::Arc { kind, .. } => kind,
            CardContent::Text(t) => t,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArcEntry {
    #[serde(rename = "type")]
    kind: String,
    time: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextEntry {
    content: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DeckFile {
    #[serde(rename = "Arc", default)]
    arc: Vec<ArcEntry>,
    #[serde(rename = "Terrain", default)]
    terrain: Vec<TextEntry>,
    #[serde(rename = "Object", default)]
    object: Vec<TextEntry>,
    #[serde(rename = "Mood", default)]
    mood: Vec<TextEntry>,
}

/// Ordered card lists, one per category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: [Vec<Card>; 4],
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) -> Result<()> {
        if !card.is_consistent() {
            return Err(Error::DeckData(format!(
                "{} card cannot hold {:?}",
                card.category, card.content
            )));
        }
        self.insert(card);
        Ok(())
    }

    // Constructors below only build well-formed cards
    fn insert(&mut self, card: Card) {
        self.cards[card.category.index()].push(card);
    }

    pub fn cards(&self, category: Category) -> &[Card] {
        &self.cards[category.index()]
    }

    pub fn count(&self, category: Category) -> usize {
        self.cards[category.index()].len()
    }

    pub fn total(&self) -> usize {
        self.cards.iter().map(Vec::len).sum()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: DeckFile = serde_json::from_str(json)?;
        let mut deck = Deck::new();
        for e in file.arc {
            deck.insert(Card::arc(e.kind, e.time));
        }
        for (category, entries) in [
            (Category::Terrain, file.terrain),
            (Category::Object, file.object),
            (Category::Mood, file.mood),
        ] {
            for e in entries {
                deck.insert(Card::text(category, e.content));
            }
        }
        Ok(deck)
    }

    pub fn to_json(&self) -> Result<String> {
        let text = |c: Category| {
            self.cards(c)
                .iter()
                .map(|card| TextEntry {
                    content: card.front_text().to_string(),
                })
                .collect::<Vec<_>>()
        };
        let file = DeckFile {
            arc: self
                .cards(Category::Arc)
                .iter()
                .filter_map(|card| match &card.content {
                    CardContent::Arc { kind, time } => Some(ArcEntry {
                        kind: kind.clone(),
                        time: time.clone(),
                    }),
                    CardContent::Text(_) => None,
                })
                .collect(),
            terrain: text(Category::Terrain),
            object: text(Category::Object),
            mood: text(Category::Mood),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::DeckData(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// The deck shipped with the game
    pub fn builtin() -> Self {
        let mut deck = Deck::new();
        for (kind, time) in [
            ("Growth", "In 10 years, when everything has grown"),
            ("Growth", "In 20 years, after a long boom"),
            ("Collapse", "In 10 years, after the systems we rely on have failed"),
            ("Collapse", "In 30 years, once the old order is gone"),
            ("Discipline", "In 15 years, when rules keep everything in check"),
            ("Discipline", "In 5 years, under tight new regulation"),
            ("Transformation", "In 25 years, after a radical shift"),
            ("Transformation", "In 50 years, in a world we barely recognise"),
        ] {
            deck.insert(Card::arc(kind, time));
        }
        for content in [
            "the home office",
            "the factory floor",
            "the hospital",
            "the classroom",
            "the commute",
            "the gig platform",
        ] {
            deck.insert(Card::text(Category::Terrain, content));
        }
        for content in [
            "artifact",
            "badge",
            "contract",
            "uniform",
            "dashboard",
            "ritual",
            "tool",
            "game",
            "app",
            "sign",
        ] {
            deck.insert(Card::text(Category::Object, content));
        }
        for content in ["hope", "anxiety", "pride", "nostalgia", "curiosity"] {
            deck.insert(Card::text(Category::Mood, content));
        }
        deck
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_deck_sizes() {
        let deck = Deck::builtin();
        assert_eq!(deck.count(Category::Arc), 8);
        assert_eq!(deck.count(Category::Terrain), 6);
        assert_eq!(deck.count(Category::Object), 10);
        assert_eq!(deck.count(Category::Mood), 5);
        assert_eq!(deck.total(), 29);
    }

    #[test]
    fn push_rejects_mismatched_content() {
        let mut deck = Deck::new();
        let bad = Card {
            category: Category::Arc,
            content: CardContent::Text("loose".into()),
        };
        assert!(matches!(deck.push(bad), Err(Error::DeckData(_))));
        assert!(deck.push(Card::arc("Growth", "In 10 years")).is_ok());
        assert!(deck.push(Card::text(Category::Mood, "hope")).is_ok());
        assert!(deck
            .push(Card {
                category: Category::Mood,
                content: CardContent::Arc { kind: "a".into(), time: "b".into() },
            })
            .is_err());
        assert_eq!(deck.total(), 2);

        let json = deck.to_json().unwrap();
        assert_eq!(Deck::from_json(&json).unwrap(), deck);
    }

    #[test]
    fn arc_cards_split_label_and_time() {
        let card = Card::arc("Growth", "In 10 years");
        assert_eq!(card.front_text(), "In 10 years");
        assert_eq!(card.subtext(), Some("Growth"));
        assert_eq!(card.sentence_text(), "Growth");

        let mood = Card::text(Category::Mood, "hope");
        assert_eq!(mood.subtext(), None);
        assert_eq!(mood.sentence_text(), "hope");
    }

    #[test]
    fn json_missing_category_is_empty() {
        let deck = Deck::from_json(r#"{"Arc":[{"type":"Growth","time":"Soon"}],"Mood":[{"content":"awe"}]}"#)
            .expect("parse");
        assert_eq!(deck.count(Category::Arc), 1);
        assert_eq!(deck.count(Category::Terrain), 0);
        assert_eq!(deck.cards(Category::Mood)[0].front_text(), "awe");
    }

    #[test]
    fn json_rejects_arc_without_time() {
        let err = Deck::from_json(r#"{"Arc":[{"type":"Growth"}]}"#).unwrap_err();
        assert!(matches!(err, Error::DeckData(_)));
    }

    #[test]
    fn json_export_reloads_to_same_deck() {
        let deck = Deck::builtin();
        let again = Deck::from_json(&deck.to_json().unwrap()).unwrap();
        assert_eq!(deck, again);
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(Category::parse("terrain"), Some(Category::Terrain));
        assert_eq!("MOOD".parse::<Category>().unwrap(), Category::Mood);
        assert!(Category::parse("Weather").is_none());
    }
}
