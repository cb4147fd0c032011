//! Interactive deck state: the card data, the dealt hand, flip flags and the
//! RNG that drives reshuffles.

use crate::deck::{Category, Deck};
use crate::flip::{Face, FlipBoard, FlipTarget, FlipTrigger};
use crate::hand::{ComposedSentence, DeckRng, Hand};
use crate::html::HtmlSurface;
use crate::{markup, ShuffleTiming};
use log::{debug, info};
use std::time::Duration;

/// One step of an animated shuffle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShuffleStep {
    /// Every card of the target turned to this face
    Turned(Face),
    /// The targeted slots were redrawn
    Redrawn(Vec<Category>),
}

pub struct Session {
    deck: Deck,
    hand: Hand,
    board: FlipBoard,
    rng: DeckRng,
    timing: ShuffleTiming,
}

impl Session {
    /// New session with a fresh hand dealt from `seed`
    pub fn new(deck: Deck, seed: u64) -> Self {
        Self::with_rng(deck, DeckRng::new(seed))
    }

    pub fn with_rng(deck: Deck, mut rng: DeckRng) -> Self {
        let hand = Hand::deal(&deck, &mut rng);
        let board = FlipBoard::new(&deck);
        info!(
            "session: {} cards, seed {}",
            deck.total(),
            rng.seed()
        );
        Self {
            deck,
            hand,
            board,
            rng,
            timing: ShuffleTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: ShuffleTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn board(&self) -> &FlipBoard {
        &self.board
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn sentence(&self) -> ComposedSentence {
        self.hand.sentence()
    }

    pub fn shuffle_all(&mut self) {
        self.hand.reshuffle(&self.deck, &mut self.rng);
        debug!("reshuffled hand: {}", self.hand.sentence());
    }

    pub fn shuffle_category(&mut self, category: Category) {
        self.hand.reshuffle_category(category, &self.deck, &mut self.rng);
        debug!("reshuffled {}: {}", category, self.hand.sentence());
    }

    /// Shuffle with the card animation: turn the targeted hand cards to
    /// their backs, wait for the flip, redraw, let the new cards land, then
    /// turn them face up again. `observe` sees every step as it happens.
    pub fn shuffle_animated<F>(&mut self, target: FlipTarget, mut observe: F)
    where
        F: FnMut(&ShuffleStep, &Session),
    {
        let categories: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| target.matches(*c))
            .collect();

        self.board.apply(FlipTrigger { action: Face::Back, target });
        observe(&ShuffleStep::Turned(Face::Back), self);
        pause(self.timing.flip_ms);

        for &category in &categories {
            self.hand.reshuffle_category(category, &self.deck, &mut self.rng);
        }
        observe(&ShuffleStep::Redrawn(categories), self);
        pause(self.timing.settle_ms);

        self.board.apply(FlipTrigger { action: Face::Front, target });
        observe(&ShuffleStep::Turned(Face::Front), self);
    }

    pub fn flip(&mut self, trigger: FlipTrigger) {
        self.board.apply(trigger);
    }

    pub fn master_toggle(&mut self, category: Category) -> FlipTrigger {
        self.board.master_toggle(category)
    }

    pub fn toggle_card(&mut self, category: Category, index: usize) -> bool {
        self.board.toggle_card(category, index)
    }

    pub fn render_markup(&self) -> String {
        markup::render_page(&self.deck, &self.hand, &self.board)
    }

    /// A surface over the session's current markup
    pub fn surface(&self) -> HtmlSurface {
        HtmlSurface::parse(&self.render_markup())
    }
}

fn pause(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
