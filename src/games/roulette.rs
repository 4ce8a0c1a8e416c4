//! Pirate roulette
//!
//! A lobby collects up to six players behind Join/Start buttons. Once started
//! the barrel is a 2×5 grid of slots, each with a front and a back hole. Each
//! stab fires the front hole of a slot; the rotate button flips every slot to
//! its other side. With `r` holes still unfired after a stab, the pirate jumps
//! with probability `1 / (r + 1)` and the round ends in the stabber's turn.
//!
//! Slot state rides on each knife button as `knife|index|front|back`, the turn
//! is the underlined player in the players field.

use rand::seq::SliceRandom;
use rand::Rng;
use serenity::model::application::component::ButtonStyle;
use thiserror::Error;

use super::{custom_id, marked_index, mention, parse_participants, participant_field, render_participants, RehydrateError};
use crate::core::accent_embed;
use crate::dispatch::reply::{ActionRow, Button, MessageSnapshot, Reply};
use crate::token::{CommandPath, Owner, TokenError, Value};

pub const TITLE: &str = "Pirate Roulette";
pub const PLAYERS_FIELD: &str = "Players";
pub const MAX_PLAYERS: usize = 6;
pub const SLOTS: usize = 10;
/// Front and back of every slot
pub const HOLES: usize = SLOTS * 2;

const KNIFE: &str = "knife";
const ROTATE: &str = "rotate";
pub const START: &str = "start";
pub const JOIN: &str = "join";
const ROTATE_LABEL: &str = "Turn it to the back.";
const HOLE_EMOJI: &str = "🕳️";
const FIRED_EMOJI: &str = "🗡️";

/// Whether a stab with `remaining` unfired holes ends the round
pub fn round_ends<R: Rng + ?Sized>(remaining: usize, rng: &mut R) -> bool {
    rng.random_range(0..=remaining) == 0
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RouletteRejection {
    #[error("You've already participated.")]
    AlreadyJoined,

    #[error("Game is full.")]
    Full,

    #[error("You are not a participant.")]
    NotParticipant,

    #[error("Please wait your turn.")]
    NotYourTurn,

    #[error("That slot already has a knife in it.")]
    SlotFired,

    #[error("There is no such slot.")]
    NoSuchSlot,

    #[error("This round is already over.")]
    RoundOver,
}

/// Players gathering before the first stab, host first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lobby {
    pub players: Vec<u64>,
}

impl Lobby {
    pub fn new(host: u64) -> Self {
        Self { players: vec![host] }
    }

    pub fn host(&self) -> Option<u64> {
        self.players.first().copied()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn join(&mut self, actor: u64) -> Result<(), RouletteRejection> {
        if self.players.contains(&actor) {
            return Err(RouletteRejection::AlreadyJoined);
        }
        if self.is_full() {
            return Err(RouletteRejection::Full);
        }
        self.players.push(actor);
        Ok(())
    }

    /// Shuffle the seating and open the first round
    pub fn start<R: Rng + ?Sized>(mut self, rng: &mut R) -> Round {
        self.players.shuffle(rng);
        Round {
            players: self.players,
            turn: 0,
            slots: [Slot::default(); SLOTS],
            ended_by: None,
        }
    }

    pub fn rehydrate(snapshot: &MessageSnapshot) -> Result<Self, RehydrateError> {
        let (_, participants) = participant_field(snapshot, PLAYERS_FIELD)?;
        Ok(Self {
            players: participants.iter().map(|p| p.id).collect(),
        })
    }

    pub fn render(&self, path: &CommandPath) -> Result<Reply, TokenError> {
        let mut embed = accent_embed(TITLE).field(
            PLAYERS_FIELD,
            render_participants(&self.players, None, " "),
            true,
        );
        if self.is_full() {
            embed = embed.description("Game is full.\nPlease start the game.");
        }

        let start_owner = self.host().map_or(Owner::All, Owner::User);
        let buttons = vec![
            Button::new(custom_id(path, start_owner, [START])?)
                .label("Start")
                .style(ButtonStyle::Primary),
            Button::new(custom_id(path, Owner::All, [JOIN])?)
                .label("Join")
                .style(ButtonStyle::Primary),
        ];
        Ok(Reply::new().embed(embed).row(ActionRow::buttons(buttons)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot {
    pub front: bool,
    pub back: bool,
}

impl Slot {
    fn fired(self) -> usize {
        usize::from(self.front) + usize::from(self.back)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stab {
    /// Survived, the turn moved on
    Safe,
    /// The pirate jumped
    Jumped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub players: Vec<u64>,
    turn: usize,
    pub slots: [Slot; SLOTS],
    ended_by: Option<u64>,
}

impl Round {
    pub fn current_player(&self) -> Option<u64> {
        if self.ended_by.is_some() {
            return None;
        }
        self.players.get(self.turn).copied()
    }

    pub fn ended_by(&self) -> Option<u64> {
        self.ended_by
    }

    pub fn remaining(&self) -> usize {
        HOLES - self.slots.iter().map(|s| s.fired()).sum::<usize>()
    }

    fn check_turn(&self, actor: u64) -> Result<(), RouletteRejection> {
        if self.ended_by.is_some() {
            return Err(RouletteRejection::RoundOver);
        }
        if !self.players.contains(&actor) {
            return Err(RouletteRejection::NotParticipant);
        }
        if self.current_player() != Some(actor) {
            return Err(RouletteRejection::NotYourTurn);
        }
        Ok(())
    }

    pub fn stab<R: Rng + ?Sized>(
        &mut self,
        actor: u64,
        slot: usize,
        rng: &mut R,
    ) -> Result<Stab, RouletteRejection> {
        self.check_turn(actor)?;
        let target = self.slots.get_mut(slot).ok_or(RouletteRejection::NoSuchSlot)?;
        if target.front {
            return Err(RouletteRejection::SlotFired);
        }
        target.front = true;

        if round_ends(self.remaining(), rng) {
            self.ended_by = Some(actor);
            return Ok(Stab::Jumped);
        }
        self.turn = (self.turn + 1) % self.players.len();
        Ok(Stab::Safe)
    }

    /// Flip every slot to its other side, the turn does not pass
    pub fn rotate(&mut self, actor: u64) -> Result<(), RouletteRejection> {
        self.check_turn(actor)?;
        for slot in &mut self.slots {
            std::mem::swap(&mut slot.front, &mut slot.back);
        }
        Ok(())
    }

    pub fn rehydrate(snapshot: &MessageSnapshot) -> Result<Self, RehydrateError> {
        let (embed, participants) = participant_field(snapshot, PLAYERS_FIELD)?;
        let players: Vec<u64> = participants.iter().map(|p| p.id).collect();

        let mut slots = [Slot::default(); SLOTS];
        let mut found = 0;
        for button in snapshot.buttons() {
            let token = button.token();
            match token.args.first().and_then(Value::as_str) {
                Some(KNIFE) => {}
                Some(ROTATE) => continue,
                _ => return Err(RehydrateError::MalformedCell(button.custom_id.clone())),
            }
            let bit = |i: usize| match token.args.get(i).and_then(Value::as_int) {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            };
            let parsed = token
                .args
                .get(1)
                .and_then(Value::as_int)
                .map(|i| i as usize)
                .filter(|i| *i < SLOTS)
                .zip(bit(2).zip(bit(3)));
            let Some((index, (front, back))) = parsed else {
                return Err(RehydrateError::MalformedCell(button.custom_id.clone()));
            };
            slots[index] = Slot { front, back };
            found += 1;
        }
        if found != SLOTS {
            return Err(RehydrateError::BoardSize {
                expected: SLOTS,
                found,
            });
        }

        let (turn, ended_by) = match marked_index(&participants)? {
            Some(turn) => (turn, None),
            None => {
                // no marker: the round ended, the description names who was stabbing
                let description = embed.description.as_deref().unwrap_or_default();
                let ender = parse_participants(description)?
                    .first()
                    .map(|p| p.id)
                    .filter(|id| players.contains(id))
                    .ok_or(RehydrateError::InconsistentTurn)?;
                (0, Some(ender))
            }
        };

        Ok(Self {
            players,
            turn,
            slots,
            ended_by,
        })
    }

    pub fn render(&self, path: &CommandPath) -> Result<Reply, TokenError> {
        let ended = self.ended_by.is_some();
        let remaining = self.remaining();

        let (description, footer) = match (self.ended_by, self.current_player()) {
            (Some(ender), _) => (format!("Ended in {}'s turn.", mention(ender)), "END".to_string()),
            (None, current) => (
                format!("{}'s turn.", current.map(mention).unwrap_or_default()),
                format!("{remaining} remain • {:.2}%", 100.0 / remaining.max(1) as f64),
            ),
        };
        let marked = (!ended).then_some(self.turn);
        let embed = accent_embed(TITLE)
            .description(description)
            .field(PLAYERS_FIELD, render_participants(&self.players, marked, " "), true)
            .footer(footer);

        let mut knives = Vec::with_capacity(SLOTS);
        for (index, slot) in self.slots.iter().enumerate() {
            let args = [
                Value::text(KNIFE),
                Value::from(index),
                Value::from(slot.front),
                Value::from(slot.back),
            ];
            knives.push(
                Button::new(custom_id(path, Owner::All, args)?)
                    .emoji(if slot.front { FIRED_EMOJI } else { HOLE_EMOJI })
                    .style(ButtonStyle::Primary)
                    .disabled(slot.front || ended),
            );
        }
        let second_row = knives.split_off(SLOTS / 2);
        let rotate = Button::new(custom_id(path, Owner::All, [ROTATE])?)
            .emoji("🔄")
            .label(ROTATE_LABEL)
            .style(ButtonStyle::Secondary)
            .disabled(ended);

        Ok(Reply::new().embed(embed).rows(vec![
            ActionRow::buttons(knives),
            ActionRow::buttons(second_row),
            ActionRow::buttons(vec![rotate]),
        ]))
    }
}

/// What a button press on a roulette message asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Join,
    Stab(usize),
    Rotate,
}

impl Action {
    pub fn parse(args: &[Value]) -> Option<Self> {
        match args.first()?.as_str()? {
            START => Some(Action::Start),
            JOIN => Some(Action::Join),
            ROTATE => Some(Action::Rotate),
            KNIFE => Some(Action::Stab(args.get(1)?.as_int()? as usize)),
            _ => None,
        }
    }
}
