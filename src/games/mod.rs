//! # Games
//!
//! Turn-based state machines whose only storage is the message they render:
//! embed text and the tokens on their buttons. Every game exposes a
//! `rehydrate` that rebuilds its state from a [`MessageSnapshot`] and a
//! `render` that produces the next message. Farm and shop rules sit here too,
//! their state lives in the stores instead.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Slots, begging, item catalogue and farm rules
//! - 1.0.0: Tic-tac-toe, pirate roulette, blackjack and even/odd

pub mod blackjack;
pub mod evenodd;
pub mod farm;
pub mod items;
pub mod roulette;
pub mod slots;
pub mod tictactoe;

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::core::error_embed;
use crate::dispatch::reply::{Embed, MessageSnapshot, Reply, Response};
use crate::token::{CommandPath, Owner, Token, TokenError, Value};

/// Minimum and maximum wager for the gambling games
pub const MIN_BET: i64 = 1_000;
pub const MAX_BET: i64 = 100_000;

/// Participant mention, optionally wrapped in `__` to mark whose turn it is
const MENTION_PATTERN: &str = r"(__)?<@!?(\d+)>(__)?";

static MENTION: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RehydrateError {
    #[error("message has no embed")]
    MissingEmbed,

    #[error("embed has no `{0}` field")]
    MissingField(&'static str),

    #[error("no participants listed")]
    NoParticipants,

    #[error("more than one participant is marked")]
    AmbiguousTurn,

    #[error("turn marker disagrees with the board")]
    InconsistentTurn,

    #[error("component `{0}` is not a game cell")]
    MalformedCell(String),

    #[error("expected {expected} cells, found {found}")]
    BoardSize { expected: usize, found: usize },

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub id: u64,
    pub marked: bool,
}

fn mention_pattern() -> Result<&'static Regex, RehydrateError> {
    MENTION
        .get_or_init(|| Regex::new(MENTION_PATTERN))
        .as_ref()
        .map_err(|e| RehydrateError::Pattern(e.clone()))
}

/// Read mentions out of rendered text, in order
pub fn parse_participants(text: &str) -> Result<Vec<Participant>, RehydrateError> {
    let pattern = mention_pattern()?;
    Ok(pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let id = caps.get(2)?.as_str().parse().ok()?;
            Some(Participant {
                id,
                marked: caps.get(1).is_some() && caps.get(3).is_some(),
            })
        })
        .collect())
}

pub fn mention(id: u64) -> String {
    format!("<@{id}>")
}

/// Render mentions joined by `separator`, underlining the one at `marked`
pub fn render_participants(ids: &[u64], marked: Option<usize>, separator: &str) -> String {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            if Some(i) == marked {
                format!("__{}__", mention(*id))
            } else {
                mention(*id)
            }
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// The first embed of a snapshot and its participant field
pub fn participant_field<'a>(
    snapshot: &'a MessageSnapshot,
    field: &'static str,
) -> Result<(&'a Embed, Vec<Participant>), RehydrateError> {
    let embed = snapshot.first_embed().ok_or(RehydrateError::MissingEmbed)?;
    let value = embed
        .field_value(field)
        .ok_or(RehydrateError::MissingField(field))?;
    let participants = parse_participants(value)?;
    if participants.is_empty() {
        return Err(RehydrateError::NoParticipants);
    }
    Ok((embed, participants))
}

/// Index of the single marked participant
pub fn marked_index(participants: &[Participant]) -> Result<Option<usize>, RehydrateError> {
    let mut marked = participants
        .iter()
        .enumerate()
        .filter(|(_, p)| p.marked)
        .map(|(i, _)| i);
    let first = marked.next();
    if marked.next().is_some() {
        return Err(RehydrateError::AmbiguousTurn);
    }
    Ok(first)
}

/// Custom id for a component rendered under `path`
pub fn custom_id<I, V>(path: &CommandPath, owner: Owner, args: I) -> Result<String, TokenError>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Token::new(owner, path.clone()).with_args(args).encode()
}

/// Ephemeral rejection that leaves the game message untouched
pub fn rejection(text: &str) -> Response {
    Response::Notice(Reply::new().embed(error_embed(text)).ephemeral())
}

/// Clamp a requested bet to the wallet, `None` when below the minimum
pub fn clamp_bet(requested: i64, balance: i64) -> Option<i64> {
    let bet = requested.clamp(MIN_BET, MAX_BET).min(balance);
    (bet >= MIN_BET).then_some(bet)
}

/// Payout for a settled bet at `ratio` tenths, rounded down
pub fn payout(bet: i64, ratio_tenths: i64) -> i64 {
    bet * ratio_tenths / 10
}

/// Begging income for a roll in `0.0..1.0`, skewed towards the low end
pub fn beg_amount(roll: f64) -> i64 {
    (1.08648_f64.powf(roll * 100.0) + 999.0).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beg_amount_range() {
        assert_eq!(beg_amount(0.0), 1_000);
        assert!(beg_amount(0.5) < 1_100);
        let top = beg_amount(0.999_999);
        assert!((4_900..5_100).contains(&top), "top {top}");
    }

    #[test]
    fn test_parse_participants_with_marker() {
        let parsed = parse_participants("<@11> vs __<@22>__ <@!33>").unwrap();
        assert_eq!(
            parsed,
            vec![
                Participant { id: 11, marked: false },
                Participant { id: 22, marked: true },
                Participant { id: 33, marked: false },
            ]
        );
        assert_eq!(marked_index(&parsed).unwrap(), Some(1));
    }

    #[test]
    fn test_render_then_parse() {
        let text = render_participants(&[5, 6, 7], Some(2), " ");
        assert_eq!(text, "<@5> <@6> __<@7>__");
        let parsed = parse_participants(&text).unwrap();
        assert_eq!(marked_index(&parsed).unwrap(), Some(2));
    }

    #[test]
    fn test_two_markers_are_ambiguous() {
        let parsed = parse_participants("__<@1>__ __<@2>__").unwrap();
        assert_eq!(marked_index(&parsed), Err(RehydrateError::AmbiguousTurn));
    }

    #[test]
    fn test_missing_embed_and_field() {
        let empty = MessageSnapshot::default();
        assert_eq!(
            participant_field(&empty, "Players").unwrap_err(),
            RehydrateError::MissingEmbed
        );

        let snapshot = MessageSnapshot {
            embeds: vec![Embed::new().field("Other", "<@1>", true)],
            ..Default::default()
        };
        assert_eq!(
            participant_field(&snapshot, "Players").unwrap_err(),
            RehydrateError::MissingField("Players")
        );

        let snapshot = MessageSnapshot {
            embeds: vec![Embed::new().field("Players", "nobody", true)],
            ..Default::default()
        };
        assert_eq!(
            participant_field(&snapshot, "Players").unwrap_err(),
            RehydrateError::NoParticipants
        );
    }

    #[test]
    fn test_clamp_bet() {
        assert_eq!(clamp_bet(5_000, 100_000), Some(5_000));
        assert_eq!(clamp_bet(5_000, 3_000), Some(3_000));
        assert_eq!(clamp_bet(5_000, 999), None);
        assert_eq!(clamp_bet(500_000, 1_000_000), Some(MAX_BET));
        assert_eq!(clamp_bet(10, 50_000), Some(MIN_BET));
    }

    #[test]
    fn test_payout_rounds_down() {
        assert_eq!(payout(1_001, 19), 1_901);
        assert_eq!(payout(1_005, 19), 1_909);
        assert_eq!(payout(2_000, 10), 2_000);
        assert_eq!(payout(2_000, 0), 0);
    }
}
