//! Adaptive discrete selectors.
//!
//! A selector picks one of `count` choices. Each choice is replicated in
//! several shuffled choice vectors ("slots"); draws are biased toward the
//! front of a vector and toward the first slots. Rewarding a choice moves it
//! toward the front, penalising it moves it one step back, so choices that
//! keep producing accepted trials get drawn more often.

use crate::rng::AttemptRng;

const SLOT_COUNT: usize = 5;
const REPLICAS: usize = 5;

#[derive(Debug, Clone)]
pub struct Selector {
    count: usize,
    power: f64,
    slots: Vec<Vec<usize>>,
    slot: usize,
    pos: usize,
    choice: usize,
    is_selected: bool,
}

impl Selector {
    /// Create a selector over `count` choices (`count >= 2`).
    pub fn new(count: usize, rng: &mut AttemptRng) -> Self {
        let mut selector = Self {
            count,
            power: 1.5,
            slots: Vec::with_capacity(SLOT_COUNT),
            slot: 0,
            pos: 0,
            choice: 0,
            is_selected: false,
        };
        selector.reset(rng);
        selector
    }

    /// Refill and reshuffle all choice vectors.
    pub fn reset(&mut self, rng: &mut AttemptRng) {
        let len = self.count * REPLICAS;
        self.slots.clear();

        for _ in 0..SLOT_COUNT {
            let mut slot: Vec<usize> = (0..len).map(|i| i / REPLICAS).collect();
            for _ in 0..len * 5 {
                let a = rng.index(len);
                let b = rng.index(len);
                slot.swap(a, b);
            }
            self.slots.push(slot);
        }

        self.slot = 0;
        self.pos = 0;
        self.choice = self.slots[0][0];
        self.is_selected = false;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    /// Draw a choice in `[0, count)`.
    pub fn select(&mut self, rng: &mut AttemptRng) -> usize {
        let len = self.slots[0].len();
        self.slot = rng.pow_index(1.5, SLOT_COUNT);
        self.pos = rng.pow_index(self.power, len);
        self.choice = self.slots[self.slot][self.pos];
        self.is_selected = true;
        self.choice
    }

    /// Reward the last choice; `score` in `[0, 1]` scales the promotion.
    pub fn reward(&mut self, score: f64) {
        let jump = (self.pos as f64 * score * score) as usize;

        if jump > 0 {
            let target = self.pos - jump;
            self.slots[self.slot][target..=self.pos].rotate_right(1);
        }

        if self.slot > 0 {
            self.slots.swap(self.slot, self.slot - 1);
        }

        self.is_selected = false;
    }

    /// Penalise the last choice.
    pub fn penalise(&mut self) {
        let len = self.slots[self.slot].len();

        if self.pos + 1 < len {
            self.slots[self.slot].swap(self.pos, self.pos + 1);
        }

        if self.slot + 1 < SLOT_COUNT {
            self.slots.swap(self.slot, self.slot + 1);
        }

        self.is_selected = false;
    }
}

/// A fixed set of selectors addressed by index.
///
/// After a trial is judged, every selector that made a choice during the
/// step is rewarded or penalised together.
#[derive(Debug, Clone)]
pub struct SelectorBank {
    selectors: Vec<Selector>,
}

impl SelectorBank {
    pub fn new(counts: &[usize], rng: &mut AttemptRng) -> Self {
        Self {
            selectors: counts.iter().map(|&c| Selector::new(c, rng)).collect(),
        }
    }

    pub fn select(&mut self, id: usize, rng: &mut AttemptRng) -> usize {
        self.selectors[id].select(rng)
    }

    pub fn reward_selected(&mut self, score: f64) {
        for selector in self.selectors.iter_mut().filter(|s| s.is_selected()) {
            selector.reward(score);
        }
    }

    pub fn penalise_selected(&mut self) {
        for selector in self.selectors.iter_mut().filter(|s| s.is_selected()) {
            selector.penalise();
        }
    }

    pub fn get(&self, id: usize) -> &Selector {
        &self.selectors[id]
    }
}
