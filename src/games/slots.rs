//! Slot machine: three reels, paid by how many symbols match

use rand::Rng;

use super::payout;
use crate::core::{accent_embed, format_amount, ERROR_COLOR};
use crate::dispatch::reply::Reply;

pub const SYMBOLS: [&str; 20] = [
    "🍒", "🍋", "🍎", "🔔", "👑", "💎", "🏆", "7️⃣", "⭐", "🍇", "✨", "🍑", "🍍", "🍅", "🍉", "🍓", "🍈",
    "🍊", "🍌", "🍐",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slots {
    pub bet: i64,
    pub reels: [usize; 3],
}

impl Slots {
    pub fn spin<R: Rng + ?Sized>(bet: i64, rng: &mut R) -> Self {
        let reels = [0; 3].map(|_| rng.random_range(0..SYMBOLS.len()));
        Self { bet, reels }
    }

    /// Number of different symbols showing, 1 is a jackpot
    pub fn distinct(&self) -> usize {
        let [a, b, c] = self.reels;
        1 + usize::from(b != a) + usize::from(c != a && c != b)
    }

    /// Payout in tenths of the bet
    pub fn ratio_tenths(&self) -> i64 {
        match self.distinct() {
            1 => 1_000,
            2 => 50,
            _ => 0,
        }
    }

    /// Wallet change for the whole spin
    pub fn net(&self) -> i64 {
        payout(self.bet, self.ratio_tenths()) - self.bet
    }

    pub fn render(&self, player_name: &str, balance: i64) -> Reply {
        let reels = self
            .reels
            .iter()
            .map(|&i| SYMBOLS[i])
            .collect::<Vec<_>>()
            .join(" ");
        let description = if self.distinct() == 1 {
            format!("**JACKPOT**\n{reels}\n**JACKPOT**")
        } else {
            reels
        };
        let net = self.net();
        let sign = if net >= 0 { "+" } else { "-" };
        let mut embed = accent_embed(format!("{player_name}'s Slots"))
            .description(description)
            .field(
                "Balance",
                format!("{} ({sign}{})", format_amount(balance), format_amount(net.abs())),
                true,
            );
        if net < 0 {
            embed = embed.color(ERROR_COLOR);
        }
        Reply::new().embed(embed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn slots(reels: [usize; 3]) -> Slots {
        Slots { bet: 2_000, reels }
    }

    #[test]
    fn test_payouts_by_matches() {
        assert_eq!(slots([3, 3, 3]).distinct(), 1);
        assert_eq!(slots([3, 3, 3]).net(), 198_000);
        assert_eq!(slots([1, 2, 1]).distinct(), 2);
        assert_eq!(slots([1, 2, 1]).net(), 8_000);
        assert_eq!(slots([1, 2, 3]).net(), -2_000);
    }

    #[test]
    fn test_render_marks_jackpots_and_losses() {
        let reply = slots([0, 0, 0]).render("kim", 200_000);
        let embed = &reply.embeds[0];
        assert_eq!(embed.description.as_deref(), Some("**JACKPOT**\n🍒 🍒 🍒\n**JACKPOT**"));
        assert_eq!(embed.field_value("Balance"), Some("200,000 (+198,000)"));

        let reply = slots([0, 1, 2]).render("kim", 8_000);
        assert_eq!(reply.embeds[0].color, Some(ERROR_COLOR));
        assert_eq!(reply.embeds[0].field_value("Balance"), Some("8,000 (-2,000)"));
    }

    #[test]
    fn test_spin_uses_known_symbols() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..100 {
            let spin = Slots::spin(1_000, &mut rng);
            assert!(spin.reels.iter().all(|&i| i < SYMBOLS.len()));
        }
    }
}
