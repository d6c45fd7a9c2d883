//! # Row Banks
//!
//! Exactly two row-sized buffers decouple the retirement rate of the engine
//! pool from the commit rate of the storage channel.
//!
//! ```text
//!          scheduler claims       retired == width      controller `taking`
//!  ┌──────┐ ─────────────> ┌─────────┐ ─────────> ┌──────┐ ─────────> ┌────────────┐
//!  │ Free │                │ Filling │            │ Full │            │ Committing │
//!  └──────┘ <─────┐        └─────────┘            └──────┘            └─────┬──────┘
//!      ▲          └──── restart discards ──────────────┘                    │
//!      └──────────────────────── controller `done` ─────────────────────────┘
//! ```
//!
//! At most one bank is Committing at any time; the controller serializes
//! commits.

use tracing::debug;

use crate::scheduler::Generation;

/// Number of row banks.
pub const BANK_COUNT: usize = 2;

/// Index of a row bank (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BankId(pub usize);

/// Bank lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BankState {
    /// Unassigned.
    #[default]
    Free,
    /// Assigned to a row, receiving retirements.
    Filling,
    /// Every pixel of the row retired; waiting for the controller.
    Full,
    /// Owned by the controller's write burst.
    Committing,
}

/// Outcome of retiring one pixel into a bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetireOutcome {
    /// Stored; the row is still incomplete.
    Stored,
    /// Stored, and the row just became Full.
    Completed,
    /// Not stored: the bank is not Filling this row.
    Rejected,
}

/// One row buffer.
#[derive(Clone, Debug)]
pub struct RowBank {
    /// Lifecycle.
    state: BankState,
    /// Row this bank is assigned to (meaningless while Free).
    row: usize,
    /// Generation the row was claimed under.
    generation: Generation,
    /// Pixels retired so far.
    retired: usize,
    /// Pixel bytes, one per column.
    pixels: Box<[u8]>,
}

impl RowBank {
    /// Creates a Free bank for rows of `width` pixels.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            state: BankState::Free,
            row: 0,
            generation: Generation::default(),
            retired: 0,
            pixels: vec![0; width].into_boxed_slice(),
        }
    }

    /// Lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> BankState {
        self.state
    }

    /// Assigned row.
    #[inline]
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Generation the row was claimed under.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Pixels retired so far.
    #[inline]
    #[must_use]
    pub const fn retired(&self) -> usize {
        self.retired
    }

    /// Row width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.len()
    }

    /// Byte at `col`.
    #[inline]
    #[must_use]
    pub fn pixel(&self, col: usize) -> u8 {
        self.pixels[col]
    }

    /// The whole row buffer.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Free -> Filling for `row`.
    fn claim(&mut self, row: usize, generation: Generation) {
        self.state = BankState::Filling;
        self.row = row;
        self.generation = generation;
        self.retired = 0;
    }

    /// Stores one retired pixel.
    ///
    /// Filling -> Full exactly when the retired count reaches the width.
    pub fn retire(&mut self, row: usize, col: usize, value: u8) -> RetireOutcome {
        if self.state != BankState::Filling || self.row != row || col >= self.pixels.len() {
            return RetireOutcome::Rejected;
        }
        self.pixels[col] = value;
        self.retired += 1;
        if self.retired == self.pixels.len() {
            self.state = BankState::Full;
            RetireOutcome::Completed
        } else {
            RetireOutcome::Stored
        }
    }

    /// Full -> Committing. Returns `false` from any other state.
    pub fn take(&mut self) -> bool {
        if self.state != BankState::Full {
            return false;
        }
        self.state = BankState::Committing;
        true
    }

    /// Committing -> Free, resetting the retired count. Returns `false` from
    /// any other state.
    pub fn release(&mut self) -> bool {
        if self.state != BankState::Committing {
            return false;
        }
        self.state = BankState::Free;
        self.retired = 0;
        true
    }

    /// Filling/Full -> Free. A Committing bank is left to the controller.
    fn discard(&mut self) {
        if matches!(self.state, BankState::Filling | BankState::Full) {
            self.state = BankState::Free;
            self.retired = 0;
        }
    }
}

/// The pair of row banks.
#[derive(Clone, Debug)]
pub struct BankSet {
    banks: [RowBank; BANK_COUNT],
}

impl BankSet {
    /// Creates two Free banks for rows of `width` pixels.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            banks: [RowBank::new(width), RowBank::new(width)],
        }
    }

    /// Gets a bank.
    #[inline]
    #[must_use]
    pub fn get(&self, id: BankId) -> &RowBank {
        &self.banks[id.0]
    }

    /// Gets a bank mutably.
    #[inline]
    pub fn get_mut(&mut self, id: BankId) -> &mut RowBank {
        &mut self.banks[id.0]
    }

    /// Iterates over `(id, bank)`.
    pub fn iter(&self) -> impl Iterator<Item = (BankId, &RowBank)> {
        self.banks.iter().enumerate().map(|(i, bank)| (BankId(i), bank))
    }

    /// The bank already holding `row` for `generation`, if any.
    #[must_use]
    pub fn find_row(&self, row: usize, generation: Generation) -> Option<BankId> {
        self.iter()
            .find(|(_, bank)| {
                bank.state != BankState::Free && bank.row == row && bank.generation == generation
            })
            .map(|(id, _)| id)
    }

    /// Claims the lowest-indexed Free bank for `row`.
    pub fn claim(&mut self, row: usize, generation: Generation) -> Option<BankId> {
        let (index, bank) = self
            .banks
            .iter_mut()
            .enumerate()
            .find(|(_, bank)| bank.state == BankState::Free)?;
        bank.claim(row, generation);
        debug!(bank = index, row, "bank claimed");
        Some(BankId(index))
    }

    /// Fixed-priority commit selection: bank 0 if Full, else bank 1 if Full.
    #[must_use]
    pub fn first_full(&self) -> Option<BankId> {
        self.iter()
            .find(|(_, bank)| bank.state == BankState::Full)
            .map(|(id, _)| id)
    }

    /// Number of Committing banks (never more than one).
    #[must_use]
    pub fn committing_count(&self) -> usize {
        self.banks
            .iter()
            .filter(|bank| bank.state == BankState::Committing)
            .count()
    }

    /// True when both banks are Free.
    #[must_use]
    pub fn all_free(&self) -> bool {
        self.banks.iter().all(|bank| bank.state == BankState::Free)
    }

    /// Frees every Filling or Full bank.
    pub fn discard_uncommitted(&mut self) {
        for bank in &mut self.banks {
            bank.discard();
        }
    }
}
