//! Even/odd: guess the parity of a coin-flip number, one round per command

use rand::Rng;

use super::payout;
use crate::core::{accent_embed, format_amount, ERROR_COLOR};
use crate::dispatch::reply::Reply;

/// Payout on a correct guess, in tenths of the bet
pub const WIN_RATIO_TENTHS: i64 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Option value as registered: odd is 1, even is 0
    pub fn from_option(value: i64) -> Option<Self> {
        match value {
            0 => Some(Parity::Even),
            1 => Some(Parity::Odd),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Parity::Even => "Even",
            Parity::Odd => "Odd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvenOdd {
    pub bet: i64,
    pub guess: Parity,
    pub rolled: Parity,
}

impl EvenOdd {
    pub fn play<R: Rng + ?Sized>(bet: i64, guess: Parity, rng: &mut R) -> Self {
        let rolled = if rng.random_range(0..=1) == 1 {
            Parity::Odd
        } else {
            Parity::Even
        };
        Self { bet, guess, rolled }
    }

    pub fn won(&self) -> bool {
        self.guess == self.rolled
    }

    pub fn reward(&self) -> i64 {
        if self.won() {
            payout(self.bet, WIN_RATIO_TENTHS)
        } else {
            0
        }
    }

    /// Wallet change for the whole round, applied in one adjustment
    pub fn net(&self) -> i64 {
        self.reward() - self.bet
    }

    pub fn render(&self, player_name: &str, balance: i64) -> Reply {
        let net = self.net();
        let sign = if net >= 0 { "+" } else { "" };
        let mut embed = accent_embed(format!("{player_name}'s Even/Odd"))
            .description(if self.won() {
                "You got it right!"
            } else {
                "You got it wrong."
            })
            .field("Guess", self.guess.name(), true)
            .field("Result", self.rolled.name(), true)
            .field(
                "Balance",
                format!("{} ({sign}{})", format_amount(balance), format_amount(net)),
                false,
            );
        if !self.won() {
            embed = embed.color(ERROR_COLOR);
        }
        Reply::new().embed(embed)
    }
}
