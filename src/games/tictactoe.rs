//! Two-player tic-tac-toe
//!
//! Cell buttons carry `index` or `index|mark`, the participants field lists
//! both players with the one to move underlined. While the second seat is
//! open nobody is underlined and the first other user to press claims it.

use serenity::model::application::component::ButtonStyle;
use thiserror::Error;

use super::{custom_id, marked_index, mention, participant_field, render_participants, RehydrateError};
use crate::core::accent_embed;
use crate::dispatch::reply::{ActionRow, Button, MessageSnapshot, Reply};
use crate::token::{CommandPath, Owner, TokenError, Value};

pub const TITLE: &str = "Tic-Tac-Toe";
pub const PARTICIPANTS_FIELD: &str = "Participants";
const EMPTY_CELL: &str = "⬜";

/// Rows, columns, diagonals
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn index(self) -> usize {
        match self {
            Mark::X => 0,
            Mark::O => 1,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_int()? {
            0 => Some(Mark::X),
            1 => Some(Mark::O),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Mark::X => "❌",
            Mark::O => "⭕",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Mark>; 9],
}

impl Board {
    pub fn get(&self, cell: usize) -> Option<Mark> {
        self.cells.get(cell).copied().flatten()
    }

    pub fn set(&mut self, cell: usize, mark: Mark) {
        if let Some(slot) = self.cells.get_mut(cell) {
            *slot = Some(mark);
        }
    }

    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.filled() == self.cells.len()
    }

    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|[a, b, c]| {
            let mark = self.cells[*a]?;
            (self.cells[*b] == Some(mark) && self.cells[*c] == Some(mark)).then_some(mark)
        })
    }

    pub fn outcome(&self) -> Outcome {
        match self.winner() {
            Some(mark) => Outcome::Won(mark),
            None if self.is_full() => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won(Mark),
    Draw,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("You are not a participant.")]
    NotParticipant,

    #[error("Please wait your turn.")]
    NotYourTurn,

    #[error("That cell is already taken.")]
    CellTaken,

    #[error("This game is already over.")]
    GameOver,

    #[error("There is no such cell.")]
    NoSuchCell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToe {
    pub board: Board,
    /// Host first (❌), then the challenger (⭕) once seated
    pub players: Vec<u64>,
    turn: Mark,
}

impl TicTacToe {
    pub fn new(host: u64) -> Self {
        Self {
            board: Board::default(),
            players: vec![host],
            turn: Mark::X,
        }
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// The player due to move, `None` while the second seat is open
    pub fn current_player(&self) -> Option<u64> {
        self.players.get(self.turn.index()).copied()
    }

    pub fn outcome(&self) -> Outcome {
        self.board.outcome()
    }

    /// Apply `actor`'s move, the state is untouched on rejection
    pub fn play(&mut self, actor: u64, cell: usize) -> Result<Outcome, MoveRejection> {
        if self.outcome() != Outcome::InProgress {
            return Err(MoveRejection::GameOver);
        }
        match self.current_player() {
            Some(player) if player == actor => {}
            Some(_) if self.players.contains(&actor) => return Err(MoveRejection::NotYourTurn),
            Some(_) => return Err(MoveRejection::NotParticipant),
            None if self.players.contains(&actor) => return Err(MoveRejection::NotYourTurn),
            None => {}
        }
        if cell >= 9 {
            return Err(MoveRejection::NoSuchCell);
        }
        if self.board.get(cell).is_some() {
            return Err(MoveRejection::CellTaken);
        }

        if self.current_player().is_none() {
            self.players.push(actor);
        }
        self.board.set(cell, self.turn);
        let outcome = self.outcome();
        if outcome == Outcome::InProgress {
            self.turn = self.turn.other();
        }
        Ok(outcome)
    }

    /// Rebuild the game from the message it last rendered
    pub fn rehydrate(snapshot: &MessageSnapshot) -> Result<Self, RehydrateError> {
        let (_, participants) = participant_field(snapshot, PARTICIPANTS_FIELD)?;
        if participants.len() > 2 {
            return Err(RehydrateError::AmbiguousTurn);
        }
        let marked = marked_index(&participants)?;
        let players: Vec<u64> = participants.iter().map(|p| p.id).collect();

        let mut board = Board::default();
        let mut found = 0;
        for button in snapshot.buttons() {
            let token = button.token();
            let malformed = || RehydrateError::MalformedCell(button.custom_id.clone());
            let index = token
                .args
                .first()
                .and_then(Value::as_int)
                .filter(|i| *i < 9)
                .ok_or_else(malformed)? as usize;
            if let Some(raw) = token.args.get(1) {
                board.set(index, Mark::from_value(raw).ok_or_else(malformed)?);
            }
            found += 1;
        }
        if found != 9 {
            return Err(RehydrateError::BoardSize { expected: 9, found });
        }

        // ❌ always opens, so the board parity names whose move it is
        let parity = if board.filled() % 2 == 0 { Mark::X } else { Mark::O };
        if board.outcome() == Outcome::InProgress {
            let expected = match marked {
                Some(index) if index < 2 => Some(index),
                Some(_) => return Err(RehydrateError::InconsistentTurn),
                None if players.len() == 1 => Some(Mark::O.index()),
                None => return Err(RehydrateError::InconsistentTurn),
            };
            if expected != Some(parity.index()) {
                return Err(RehydrateError::InconsistentTurn);
            }
        }

        Ok(Self {
            board,
            players,
            turn: parity,
        })
    }

    fn describe(&self) -> String {
        match self.outcome() {
            Outcome::Won(mark) => match self.players.get(mark.index()) {
                Some(id) => format!("{}({}) won!", mention(*id), mark.symbol()),
                None => format!("{} won!", mark.symbol()),
            },
            Outcome::Draw => "Draw!".to_string(),
            Outcome::InProgress => match self.current_player() {
                Some(id) => format!("{}({})'s turn.", mention(id), self.turn.symbol()),
                None => "Waiting for opponent.".to_string(),
            },
        }
    }

    pub fn render(&self, path: &CommandPath) -> Result<Reply, TokenError> {
        let in_progress = self.outcome() == Outcome::InProgress;
        let marked = if in_progress && self.current_player().is_some() {
            Some(self.turn.index())
        } else {
            None
        };

        let embed = accent_embed(TITLE)
            .description(self.describe())
            .field(
                PARTICIPANTS_FIELD,
                render_participants(&self.players, marked, " vs "),
                true,
            );

        let mut rows = Vec::with_capacity(3);
        for row in 0..3 {
            let mut buttons = Vec::with_capacity(3);
            for col in 0..3 {
                let index = row * 3 + col;
                let mark = self.board.get(index);
                let mut args = vec![Value::from(index)];
                if let Some(mark) = mark {
                    args.push(Value::from(mark.index()));
                }
                buttons.push(
                    Button::new(custom_id(path, Owner::All, args)?)
                        .emoji(mark.map_or(EMPTY_CELL, Mark::symbol))
                        .style(ButtonStyle::Primary)
                        .disabled(mark.is_some() || !in_progress),
                );
            }
            rows.push(ActionRow::buttons(buttons));
        }

        Ok(Reply::new().embed(embed).rows(rows))
    }
}
