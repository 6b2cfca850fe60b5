//! Pattern bank matrix.
//!
//! Four banks of sixteen slots. Each slot maps 1:1 to a program number, so
//! the matrix doubles as the candidate pool for random dispatch.

use serde::{Deserialize, Serialize};

pub const NUM_BANKS: usize = 4;
pub const SLOTS_PER_BANK: usize = 16;
pub const NUM_SLOTS: usize = NUM_BANKS * SLOTS_PER_BANK;

/// 1-based bank number (1..=4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BankIndex(u8);

impl BankIndex {
    /// Returns `None` outside 1..=4.
    pub fn new(bank: u8) -> Option<Self> {
        if (1..=NUM_BANKS as u8).contains(&bank) {
            Some(Self(bank))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn offset(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = BankIndex> {
        (1..=NUM_BANKS as u8).map(BankIndex)
    }
}

impl Default for BankIndex {
    fn default() -> Self {
        Self(1)
    }
}

impl std::fmt::Display for BankIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based slot number within a bank (1..=16).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Returns `None` outside 1..=16.
    pub fn new(slot: u8) -> Option<Self> {
        if (1..=SLOTS_PER_BANK as u8).contains(&slot) {
            Some(Self(slot))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn offset(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (1..=SLOTS_PER_BANK as u8).map(SlotIndex)
    }
}

impl std::fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One dispatchable slot. Derived from the matrix on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub bank: BankIndex,
    pub slot: SlotIndex,
    /// Program number: `(bank-1)*16 + (slot-1)`, always 0..=63.
    pub code: u8,
}

impl Candidate {
    pub fn new(bank: BankIndex, slot: SlotIndex) -> Self {
        let code = (bank.offset() * SLOTS_PER_BANK + slot.offset()) as u8;
        Self { bank, slot, code }
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bank {} - Pattern {}", self.bank, self.slot)
    }
}

/// Enable flags for every slot of every bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatrix {
    banks: [[bool; SLOTS_PER_BANK]; NUM_BANKS],
}

impl Default for PatternMatrix {
    /// Every slot enabled.
    fn default() -> Self {
        Self::filled(true)
    }
}

impl PatternMatrix {
    pub fn filled(value: bool) -> Self {
        Self {
            banks: [[value; SLOTS_PER_BANK]; NUM_BANKS],
        }
    }

    pub fn toggle(&mut self, bank: BankIndex, slot: SlotIndex) {
        let cell = &mut self.banks[bank.offset()][slot.offset()];
        *cell = !*cell;
    }

    pub fn set(&mut self, bank: BankIndex, slot: SlotIndex, value: bool) {
        self.banks[bank.offset()][slot.offset()] = value;
    }

    pub fn fill_all(&mut self, bank: BankIndex) {
        self.banks[bank.offset()] = [true; SLOTS_PER_BANK];
    }

    pub fn fill_none(&mut self, bank: BankIndex) {
        self.banks[bank.offset()] = [false; SLOTS_PER_BANK];
    }

    pub fn is_active(&self, bank: BankIndex, slot: SlotIndex) -> bool {
        self.banks[bank.offset()][slot.offset()]
    }

    pub fn bank(&self, bank: BankIndex) -> &[bool; SLOTS_PER_BANK] {
        &self.banks[bank.offset()]
    }

    pub fn has_active(&self) -> bool {
        self.banks.iter().flatten().any(|&on| on)
    }

    pub fn active_count(&self) -> usize {
        self.banks.iter().flatten().filter(|&&on| on).count()
    }

    /// All enabled slots in bank-major, slot-minor order.
    pub fn active_candidates(&self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.active_count());
        for bank in BankIndex::all() {
            for slot in SlotIndex::all() {
                if self.is_active(bank, slot) {
                    out.push(Candidate::new(bank, slot));
                }
            }
        }
        out
    }
}
