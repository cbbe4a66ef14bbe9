//! Running state carried from one projection year to the next

use crate::account::AccountState;

/// An income stream that starts at a given age and compounds its own prior amount
#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    pub start_age: u32,
    /// Current annual amount once the stream has started
    pub amount: f64,
}

impl StreamState {
    pub fn new(start_age: u32, amount: f64) -> Self {
        Self { start_age, amount }
    }

    pub fn is_paying(&self, age: u32) -> bool {
        age >= self.start_age
    }

    /// Amount paid at `age`, or zero before the stream starts
    pub fn paid_at(&self, age: u32) -> f64 {
        if self.is_paying(age) {
            self.amount
        } else {
            0.0
        }
    }
}

/// State of a scenario at the start of a projection year
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Attained age for the current row
    pub age: u32,

    /// Calendar year for the current row
    pub year: i32,

    pub pension: StreamState,

    pub social_security: StreamState,

    /// Annual CSRS Offset reduction still to be applied at 62
    pub pending_offset: f64,

    /// Account balances, mutated only by the account projector
    pub account: AccountState,
}

impl ProjectionState {
    pub fn new(
        start_age: u32,
        birth_year: u32,
        pension: StreamState,
        social_security: StreamState,
        account: AccountState,
    ) -> Self {
        Self {
            age: start_age,
            year: birth_year as i32 + start_age as i32,
            pension,
            social_security,
            pending_offset: 0.0,
            account,
        }
    }

    /// Move to the next attained age
    pub fn advance_year(&mut self) {
        self.age += 1;
        self.year += 1;
    }
}
