//! Blackjack against the house
//!
//! The whole hand rides on the Hit/Stand buttons:
//! `action|bet|player cards|dealer cards|turn`. Each card is one letter,
//! `A`..`Z` then `a`..`z`, indexing a 52 card deck suit by suit. A hand read
//! back from a button is still in play: no repeated cards, the dealer's two
//! cards and a player who has not bust.

use rand::Rng;
use serenity::model::application::component::ButtonStyle;

use super::{custom_id, RehydrateError};
use crate::core::{accent_embed, format_amount, ACCENT_COLOR, ERROR_COLOR};
use crate::dispatch::reply::{ActionRow, Button, Reply};
use crate::token::{CommandPath, Owner, TokenError, Value};

const RANKS: [&str; 13] = ["A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K"];
const SUITS: [&str; 4] = ["♠", "♥", "♣", "♦"];
const DECK: u8 = 52;
const PUSH_COLOR: u32 = 0x95A5A6;
const DEALER_STANDS_AT: u32 = 17;
const BLACKJACK: u32 = 21;
/// Dealer cards while the player is still deciding
const DEALER_OPENING: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card(u8);

impl Card {
    pub fn new(index: u8) -> Option<Self> {
        (index < DECK).then_some(Self(index))
    }

    pub fn rank(self) -> &'static str {
        RANKS[usize::from(self.0 % 13)]
    }

    pub fn suit(self) -> &'static str {
        SUITS[usize::from(self.0 / 13)]
    }

    /// Face value with aces counted high
    fn points(self) -> u32 {
        match self.0 % 13 {
            0 => 11,
            r @ 1..=9 => u32::from(r) + 1,
            _ => 10,
        }
    }

    fn is_ace(self) -> bool {
        self.0 % 13 == 0
    }

    pub fn code(self) -> char {
        match self.0 {
            i @ 0..=25 => char::from(b'A' + i),
            i => char::from(b'a' + (i - 26)),
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A'..='Z' => Some(Self(code as u8 - b'A')),
            'a'..='z' => Some(Self(code as u8 - b'a' + 26)),
            _ => None,
        }
    }

    pub fn label(self) -> String {
        format!("{}{}", self.rank(), self.suit())
    }
}

/// Best total not over 21 where possible, aces drop from 11 to 1 as needed
pub fn hand_value(cards: &[Card]) -> u32 {
    let mut value: u32 = cards.iter().map(|c| c.points()).sum();
    let mut aces = cards.iter().filter(|c| c.is_ace()).count();
    while value > BLACKJACK && aces > 0 {
        value -= 10;
        aces -= 1;
    }
    value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Hit,
    Stand,
}

impl Move {
    fn as_str(self) -> &'static str {
        match self {
            Move::Hit => "hit",
            Move::Stand => "stand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Win,
    Push,
    Lose,
}

impl Settlement {
    /// Payout multiplier in tenths of the bet
    pub fn ratio_tenths(self) -> i64 {
        match self {
            Settlement::Win => 19,
            Settlement::Push => 10,
            Settlement::Lose => 0,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Settlement::Win => "Win",
            Settlement::Push => "Draw",
            Settlement::Lose => "Lose",
        }
    }

    fn color(self) -> u32 {
        match self {
            Settlement::Win => ACCENT_COLOR,
            Settlement::Push => PUSH_COLOR,
            Settlement::Lose => ERROR_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blackjack {
    pub bet: i64,
    pub player: Vec<Card>,
    pub dealer: Vec<Card>,
    pub turn: u64,
}

fn encode_cards(cards: &[Card]) -> String {
    cards.iter().map(|c| c.code()).collect()
}

fn decode_cards(raw: &str) -> Option<Vec<Card>> {
    raw.chars().map(Card::from_code).collect()
}

impl Blackjack {
    /// Two cards each, dealt alternately from a fresh deck
    pub fn deal<R: Rng + ?Sized>(bet: i64, rng: &mut R) -> Self {
        let mut hand = Self {
            bet,
            player: Vec::with_capacity(4),
            dealer: Vec::with_capacity(4),
            turn: 1,
        };
        for _ in 0..2 {
            let card = hand.draw(rng);
            hand.player.extend(card);
            let card = hand.draw(rng);
            hand.dealer.extend(card);
        }
        hand
    }

    /// A card not yet on the table, `None` once the deck is exhausted
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Card> {
        let left: Vec<u8> = (0..DECK)
            .filter(|i| !self.player.iter().chain(&self.dealer).any(|c| c.0 == *i))
            .collect();
        if left.is_empty() {
            return None;
        }
        Some(Card(left[rng.random_range(0..left.len())]))
    }

    pub fn player_value(&self) -> u32 {
        hand_value(&self.player)
    }

    pub fn dealer_value(&self) -> u32 {
        hand_value(&self.dealer)
    }

    /// Draw for the player, settling on a bust or 21
    pub fn hit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Settlement> {
        let Some(card) = self.draw(rng) else {
            return Some(self.stand(rng));
        };
        self.player.push(card);
        self.turn += 1;
        match self.player_value() {
            v if v > BLACKJACK => Some(Settlement::Lose),
            BLACKJACK => Some(Settlement::Win),
            _ => None,
        }
    }

    /// Dealer draws to 17, then the hands are compared
    pub fn stand<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Settlement {
        while self.dealer_value() < DEALER_STANDS_AT {
            let Some(card) = self.draw(rng) else {
                break;
            };
            self.dealer.push(card);
            self.turn += 1;
        }
        let (player, dealer) = (self.player_value(), self.dealer_value());
        if dealer > BLACKJACK || player > dealer {
            Settlement::Win
        } else if player < dealer {
            Settlement::Lose
        } else {
            Settlement::Push
        }
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, action: Move, rng: &mut R) -> Option<Settlement> {
        match action {
            Move::Hit => self.hit(rng),
            Move::Stand => Some(self.stand(rng)),
        }
    }

    fn args(&self, action: Move) -> Vec<Value> {
        vec![
            Value::text(action.as_str()),
            Value::from(self.bet.max(0) as u64),
            Value::text(encode_cards(&self.player)),
            Value::text(encode_cards(&self.dealer)),
            Value::from(self.turn),
        ]
    }

    /// Rebuild the pressed move and the hand from button arguments
    pub fn from_args(args: &[Value]) -> Result<(Move, Self), RehydrateError> {
        let malformed = || {
            RehydrateError::MalformedCell(
                args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join("|"),
            )
        };
        let [action, bet, player, dealer, turn] = args else {
            return Err(malformed());
        };
        let action = match action.as_str() {
            Some("hit") => Move::Hit,
            Some("stand") => Move::Stand,
            _ => return Err(malformed()),
        };
        let cards = |v: &Value| decode_cards(&v.to_string()).filter(|c| c.len() >= 2);
        let hand = Self {
            bet: bet.as_int().ok_or_else(malformed)? as i64,
            player: cards(player).ok_or_else(malformed)?,
            dealer: cards(dealer).ok_or_else(malformed)?,
            turn: turn.as_int().ok_or_else(malformed)?,
        };
        if !hand.in_play() {
            return Err(malformed());
        }
        Ok((action, hand))
    }

    fn in_play(&self) -> bool {
        let mut seen = [false; DECK as usize];
        let unique = self
            .player
            .iter()
            .chain(&self.dealer)
            .all(|c| !std::mem::replace(&mut seen[usize::from(c.0)], true));
        unique && self.dealer.len() == DEALER_OPENING && self.player_value() <= BLACKJACK
    }

    /// Render the table. `settled` carries the outcome and the balance after payout.
    pub fn render(
        &self,
        path: &CommandPath,
        player_id: u64,
        player_name: &str,
        settled: Option<(Settlement, i64)>,
    ) -> Result<Reply, TokenError> {
        let cards = |hand: &[Card]| {
            hand.iter()
                .map(|c| format!("`{}`", c.label()))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut embed = accent_embed(format!("{player_name}'s Blackjack"))
            .field(format!("Player [{}]", self.player_value()), cards(&self.player), true)
            .footer(format!("A = 1 or 11, J Q K = 10 | Turn {}", self.turn));

        let Some((settlement, balance)) = settled else {
            let hidden = match self.dealer.first() {
                Some(up) => format!("`{}` `?`", up.label()),
                None => "`?`".to_string(),
            };
            embed = embed
                .field("Computer [?]", hidden, true)
                .field("Bet", format_amount(self.bet), false);
            let buttons = vec![
                Button::new(custom_id(path, Owner::User(player_id), self.args(Move::Hit))?)
                    .label("⚔️ Hit")
                    .style(ButtonStyle::Primary),
                Button::new(custom_id(path, Owner::User(player_id), self.args(Move::Stand))?)
                    .label("🛡️ Stand")
                    .style(ButtonStyle::Danger),
            ];
            return Ok(Reply::new().embed(embed).row(ActionRow::buttons(buttons)));
        };

        let payout = super::payout(self.bet, settlement.ratio_tenths());
        let change = match settlement {
            Settlement::Lose => format!("-{}", format_amount(self.bet)),
            _ => format!("+{}", format_amount(payout)),
        };
        embed = embed
            .description(format!("**{}**", settlement.text()))
            .field(format!("Computer [{}]", self.dealer_value()), cards(&self.dealer), true)
            .field("Balance", format!("{} ({change})", format_amount(balance)), false)
            .color(settlement.color());
        Ok(Reply::new().embed(embed).clear_components())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::reply::MessageSnapshot;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cards(codes: &str) -> Vec<Card> {
        decode_cards(codes).unwrap()
    }

    #[test]
    fn test_card_codes_cover_the_deck() {
        for i in 0..DECK {
            let card = Card::new(i).unwrap();
            assert_eq!(Card::from_code(card.code()), Some(card));
        }
        assert!(Card::new(52).is_none());
        assert_eq!(Card::from_code('A').unwrap().label(), "A♠");
        assert_eq!(Card::from_code('z').unwrap().label(), "K♦");
        assert_eq!(Card::from_code('J').unwrap().label(), "10♠");
    }

    #[test]
    fn test_hand_values_with_soft_aces() {
        // A♠ K♠
        assert_eq!(hand_value(&cards("AM")), 21);
        // A♠ A♥ 9♠
        assert_eq!(hand_value(&cards("ANI")), 21);
        // A♠ A♥ A♣
        assert_eq!(hand_value(&cards("ANa")), 13);
        // K♠ Q♠ 2♠
        assert_eq!(hand_value(&cards("MLB")), 22);
    }

    #[test]
    fn test_deal_never_repeats_cards() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let mut hand = Blackjack::deal(1_000, &mut rng);
            while hand.hit(&mut rng).is_none() {}
            hand.stand(&mut rng);
            let mut all: Vec<u8> = hand.player.iter().chain(&hand.dealer).map(|c| c.0).collect();
            let total = all.len();
            all.sort_unstable();
            all.dedup();
            assert_eq!(all.len(), total);
        }
    }

    #[test]
    fn test_dealer_draws_to_seventeen() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let mut hand = Blackjack::deal(1_000, &mut rng);
            let settlement = hand.stand(&mut rng);
            let (player, dealer) = (hand.player_value(), hand.dealer_value());
            assert!(dealer >= 17);
            let expected = if dealer > 21 || player > dealer {
                Settlement::Win
            } else if player < dealer {
                Settlement::Lose
            } else {
                Settlement::Push
            };
            assert_eq!(settlement, expected);
        }
    }

    #[test]
    fn test_hit_settles_on_bust_or_21() {
        let mut hand = Blackjack {
            bet: 1_000,
            // K♠ Q♠
            player: cards("ML"),
            dealer: cards("BC"),
            turn: 1,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let settlement = hand.hit(&mut rng);
        let value = hand.player_value();
        match settlement {
            Some(Settlement::Win) => assert_eq!(value, 21),
            Some(Settlement::Lose) => assert!(value > 21),
            other => panic!("20 plus any card settles, got {other:?} at {value}"),
        }
        assert_eq!(hand.turn, 2);
    }

    #[test]
    fn test_state_survives_the_buttons() {
        let mut rng = StdRng::seed_from_u64(11);
        let hand = Blackjack::deal(25_000, &mut rng);
        let path = CommandPath::with_sub("game", "gamble blackjack");
        let reply = hand.render(&path, 298_114_253_917_126_656, "kim", None).unwrap();
        let snapshot = MessageSnapshot::from_reply(&reply);

        let stand = snapshot.buttons().nth(1).unwrap();
        assert!(stand.custom_id.chars().count() <= crate::token::MAX_TOKEN_LEN);
        let token = stand.token();
        assert_eq!(token.owner, Owner::User(298_114_253_917_126_656));
        assert_eq!(token.path, path);

        let (action, restored) = Blackjack::from_args(&token.args).unwrap();
        assert_eq!(action, Move::Stand);
        assert_eq!(restored, hand);
        assert_eq!(reply.embeds[0].field_value("Computer [?]").map(|v| v.ends_with("`?`")), Some(true));
    }

    #[test]
    fn test_settled_render_clears_buttons() {
        let hand = Blackjack {
            bet: 10_000,
            player: cards("AM"),
            dealer: cards("BC"),
            turn: 2,
        };
        let path = CommandPath::with_sub("game", "gamble blackjack");
        let reply = hand.render(&path, 1, "kim", Some((Settlement::Win, 29_000))).unwrap();
        assert_eq!(reply.components, Some(vec![]));
        let embed = &reply.embeds[0];
        assert_eq!(embed.description.as_deref(), Some("**Win**"));
        assert_eq!(embed.field_value("Balance"), Some("29,000 (+19,000)"));
        assert_eq!(embed.field_value("Computer [5]"), Some("`2♠` `3♠`"));
    }

    #[test]
    fn test_from_args_rejects_garbage() {
        assert!(Blackjack::from_args(&[]).is_err());
        let args = vec![
            Value::text("peek"),
            Value::Int(1_000),
            Value::text("AB"),
            Value::text("CD"),
            Value::Int(1),
        ];
        assert!(Blackjack::from_args(&args).is_err());
        let mut args = args;
        args[0] = Value::text("hit");
        args[2] = Value::text("A!");
        assert!(Blackjack::from_args(&args).is_err());
    }

    fn hit_args(player: &str, dealer: &str) -> Vec<Value> {
        vec![
            Value::text("hit"),
            Value::Int(1_000),
            Value::text(player),
            Value::text(dealer),
            Value::Int(3),
        ]
    }

    #[test]
    fn test_from_args_rejects_tampered_hands() {
        // the whole deck on the player's side
        let deck: String = (0..DECK).map(|i| Card(i).code()).collect();
        assert!(Blackjack::from_args(&hit_args(&deck, "AB")).is_err());
        // a card dealt twice
        assert!(Blackjack::from_args(&hit_args("BC", "BD")).is_err());
        // dealer already drew
        assert!(Blackjack::from_args(&hit_args("BC", "DEF")).is_err());
        // player already bust
        assert!(Blackjack::from_args(&hit_args("MLB", "CD")).is_err());

        let (action, hand) = Blackjack::from_args(&hit_args("BC", "DE")).unwrap();
        assert_eq!(action, Move::Hit);
        assert_eq!(hand.player_value(), 5);
    }

    #[test]
    fn test_exhausted_deck_settles_instead_of_panicking() {
        let mut hand = Blackjack {
            bet: 1_000,
            player: (0..50).map(Card).collect(),
            dealer: vec![Card(50), Card(51)],
            turn: 1,
        };
        let mut rng = StdRng::seed_from_u64(5);
        assert!(hand.draw(&mut rng).is_none());
        assert!(hand.hit(&mut rng).is_some());
        assert_eq!(hand.player.len(), 50);
        assert_eq!(hand.dealer.len(), 2);
    }
}
