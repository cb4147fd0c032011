//! Per-card flip flags and the triggers that drive them.
//!
//! A card is "flipped" when it shows its back. Category grids start flipped,
//! the dealt hand starts face up.

use crate::deck::{Category, Deck};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipTarget {
    All,
    Category(Category),
}

impl FlipTarget {
    pub fn matches(self, category: Category) -> bool {
        match self {
            FlipTarget::All => true,
            FlipTarget::Category(c) => c == category,
        }
    }
}

/// Request to turn every matching card to one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipTrigger {
    pub action: Face,
    pub target: FlipTarget,
}

#[derive(Debug, Clone)]
pub struct FlipBoard {
    grid: [Vec<bool>; 4],
    hand: [bool; 4],
    last: Option<FlipTrigger>,
}

impl FlipBoard {
    pub fn new(deck: &Deck) -> Self {
        Self {
            grid: Category::ALL.map(|c| vec![true; deck.count(c)]),
            hand: [false; 4],
            last: None,
        }
    }

    pub fn last_trigger(&self) -> Option<FlipTrigger> {
        self.last
    }

    pub fn is_flipped(&self, category: Category, index: usize) -> bool {
        self.grid[category.index()]
            .get(index)
            .copied()
            .unwrap_or(true)
    }

    pub fn is_hand_flipped(&self, category: Category) -> bool {
        self.hand[category.index()]
    }

    pub fn apply(&mut self, trigger: FlipTrigger) {
        let flipped = trigger.action == Face::Back;
        for category in Category::ALL {
            if trigger.target.matches(category) {
                self.grid[category.index()].iter_mut().for_each(|f| *f = flipped);
                self.hand[category.index()] = flipped;
            }
        }
        self.last = Some(trigger);
    }

    /// Master card click: turn the category to the front, or back again if
    /// the previous trigger already turned it to the front.
    pub fn master_toggle(&mut self, category: Category) -> FlipTrigger {
        let same = self
            .last
            .map(|t| t.target.matches(category))
            .unwrap_or(false);
        let action = match self.last {
            Some(t) if same && t.action == Face::Front => Face::Back,
            _ => Face::Front,
        };
        let trigger = FlipTrigger {
            action,
            target: FlipTarget::Category(category),
        };
        self.apply(trigger);
        trigger
    }

    /// A plain card click toggles only that card
    pub fn toggle_card(&mut self, category: Category, index: usize) -> bool {
        match self.grid[category.index()].get_mut(index) {
            Some(f) => {
                *f = !*f;
                *f
            }
            None => false,
        }
    }
}
