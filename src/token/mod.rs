//! # Interaction Tokens
//!
//! Session state for buttons, selects and modals travels inside the custom id
//! attached to each component. The grammar is
//! `owner|command[ sub]|arg|arg…`, numeric fields are digit-compressed, and the
//! whole string must fit the platform's 100 character custom id budget.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Digit text keeps its type across a round trip, owner field validation
//! - 1.1.0: Typed `Value` arguments, owner id compression
//! - 1.0.0: Initial pipe-delimited codec

pub mod numeric;

use std::fmt;
use thiserror::Error;

pub use numeric::{compress_digits, compress_number, expand_digits, expand_number, TEXT_MARKER};

/// Field separator, never allowed inside an argument
pub const DELIMITER: char = '|';
/// Owner sentinel that lets anyone act on a component
pub const ALL_SENTINEL: &str = "all";
/// Platform limit on custom id length, in characters
pub const MAX_TOKEN_LEN: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("command path `{0}` contains the reserved delimiter")]
    ReservedPath(String),

    #[error("owner field `{0}` would not decode back to itself")]
    InvalidOwner(String),

    #[error("argument {index} contains the reserved delimiter")]
    ReservedDelimiter { index: usize },

    #[error("argument {index} would be read back as a compressed number")]
    AmbiguousArgument { index: usize },

    #[error("encoded token is {length} characters, over the {MAX_TOKEN_LEN} character budget")]
    TooLong { length: usize },
}

/// Who may act on a component carrying this token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Empty owner field, no restriction
    Anyone,
    /// The `all` sentinel
    All,
    User(u64),
    /// Garbage in the owner field; matches nobody
    Unknown(String),
}

impl Owner {
    pub fn permits(&self, actor: u64) -> bool {
        match self {
            Owner::Anyone | Owner::All => true,
            Owner::User(id) => *id == actor,
            Owner::Unknown(_) => false,
        }
    }

    /// The concrete user this token is bound to, if any
    pub fn user(&self) -> Option<u64> {
        match self {
            Owner::User(id) => Some(*id),
            _ => None,
        }
    }

    fn encode(&self) -> Result<String, TokenError> {
        match self {
            Owner::Anyone => Ok(String::new()),
            Owner::All => Ok(ALL_SENTINEL.to_string()),
            Owner::User(id) => Ok(compress_number(*id)),
            Owner::Unknown(raw) => {
                if raw.contains(DELIMITER) || Owner::decode(raw) != *self {
                    return Err(TokenError::InvalidOwner(raw.clone()));
                }
                Ok(raw.clone())
            }
        }
    }

    fn decode(field: &str) -> Self {
        if field.is_empty() {
            return Owner::Anyone;
        }
        if field == ALL_SENTINEL {
            return Owner::All;
        }
        // plain digits are accepted for hand-written tokens
        let parsed = if field.bytes().all(|b| b.is_ascii_digit()) {
            field.parse().ok()
        } else {
            expand_number(field)
        };
        match parsed {
            Some(id) => Owner::User(id),
            None => Owner::Unknown(field.to_string()),
        }
    }
}

impl From<u64> for Owner {
    fn from(id: u64) -> Self {
        Owner::User(id)
    }
}

/// Command plus optional subcommand key (`"name"` or `"group name"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandPath {
    pub command: String,
    pub sub: Option<String>,
}

impl CommandPath {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            sub: None,
        }
    }

    pub fn with_sub(command: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            sub: Some(sub.into()),
        }
    }

    /// Parse the space-joined form used on the wire and in log tags
    pub fn parse(field: &str) -> Self {
        match field.trim().split_once(' ') {
            Some((command, sub)) if !sub.trim().is_empty() => Self::with_sub(command, sub.trim()),
            _ => Self::new(field.trim()),
        }
    }

    /// Subcommand group, when the key is `"group name"`
    pub fn group(&self) -> Option<&str> {
        self.sub
            .as_deref()
            .and_then(|sub| sub.split_once(' '))
            .map(|(group, _)| group)
    }

    /// Subcommand name without its group
    pub fn sub_name(&self) -> Option<&str> {
        self.sub
            .as_deref()
            .map(|sub| sub.rsplit_once(' ').map(|(_, name)| name).unwrap_or(sub))
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub {
            Some(sub) => write!(f, "{} {}", self.command, sub),
            None => write!(f, "{}", self.command),
        }
    }
}

/// A decoded token argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(u64),
    Str(String),
}

impl Value {
    /// Build a text value. Digit-only text without a leading zero becomes `Int`
    /// so that decoding yields the same value back.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        match canonical_int(&s) {
            Some(n) => Value::Int(n),
            None => Value::Str(s),
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Int(_) => None,
        }
    }

    fn encode(&self, index: usize) -> Result<String, TokenError> {
        match self {
            Value::Int(n) => Ok(compress_number(*n)),
            Value::Str(s) => {
                if s.contains(DELIMITER) {
                    return Err(TokenError::ReservedDelimiter { index });
                }
                // digit text is marked so it is not read back as a number
                if let Some(compressed) = compress_digits(s) {
                    return Ok(format!("{TEXT_MARKER}{compressed}"));
                }
                if Value::decode(s) != *self {
                    return Err(TokenError::AmbiguousArgument { index });
                }
                Ok(s.clone())
            }
        }
    }

    fn decode(segment: &str) -> Self {
        if let Some(digits) = segment.strip_prefix(TEXT_MARKER).and_then(expand_digits) {
            return Value::Str(digits);
        }
        if let Some(digits) = expand_digits(segment) {
            return Value::text(digits);
        }
        Value::text(segment)
    }
}

fn canonical_int(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(u64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as u64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(u64::from(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

/// A decoded custom id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub owner: Owner,
    pub path: CommandPath,
    pub args: Vec<Value>,
}

impl Token {
    pub fn new(owner: Owner, path: CommandPath) -> Self {
        Self {
            owner,
            path,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn encode(&self) -> Result<String, TokenError> {
        let path = self.path.to_string();
        if path.contains(DELIMITER) {
            return Err(TokenError::ReservedPath(path));
        }

        let mut fields = Vec::with_capacity(self.args.len() + 2);
        fields.push(self.owner.encode()?);
        fields.push(path);
        for (index, arg) in self.args.iter().enumerate() {
            fields.push(arg.encode(index)?);
        }

        let token = fields.join("|");
        let length = token.chars().count();
        if length > MAX_TOKEN_LEN {
            return Err(TokenError::TooLong { length });
        }
        Ok(token)
    }

    /// Decode a custom id. Never fails: missing fields decode as empty and
    /// segments that are not valid compressed numbers stay literal text.
    pub fn decode(raw: &str) -> Self {
        let mut fields = raw.split(DELIMITER);
        let owner = Owner::decode(fields.next().unwrap_or_default());
        let path = CommandPath::parse(fields.next().unwrap_or_default());
        let args = fields.map(Value::decode).collect();
        Self { owner, path, args }
    }

    /// Move the leading argument into the path as the subcommand key.
    ///
    /// Used for the pipe-separated form `owner|command|sub|…` once the caller
    /// knows the command owns subcommands.
    pub fn promote_subcommand(&mut self) -> bool {
        if self.path.sub.is_some() || self.args.is_empty() {
            return false;
        }
        let first = self.args.remove(0);
        self.path.sub = Some(first.to_string());
        true
    }
}

/// Encode owner, path and arguments into a custom id
pub fn encode(owner: Owner, path: CommandPath, args: Vec<Value>) -> Result<String, TokenError> {
    Token { owner, path, args }.encode()
}

/// Decode a custom id
pub fn decode(raw: &str) -> Token {
    Token::decode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_mixed_args() {
        let token = Token::new(Owner::User(298_114_253_917_126_656), CommandPath::with_sub("game", "gamble blackjack"))
            .arg("hit")
            .arg(25_000u64)
            .arg("AbQ")
            .arg(3u64);

        let encoded = token.encode().unwrap();
        assert_eq!(Token::decode(&encoded), token);
    }

    #[test]
    fn test_owner_sentinels() {
        let all = Token::new(Owner::All, CommandPath::new("help")).encode().unwrap();
        assert!(all.starts_with("all|help"));
        assert_eq!(Token::decode(&all).owner, Owner::All);

        let anyone = Token::new(Owner::Anyone, CommandPath::new("help")).encode().unwrap();
        assert!(anyone.starts_with("|help"));
        assert_eq!(Token::decode(&anyone).owner, Owner::Anyone);
    }

    #[test]
    fn test_plain_digit_owner_accepted() {
        let token = Token::decode("42|farm|plant|7");
        assert_eq!(token.owner, Owner::User(42));
        assert_eq!(token.path, CommandPath::new("farm"));
        assert_eq!(token.args, vec![Value::text("plant"), Value::Int(7)]);
    }

    #[test]
    fn test_promote_subcommand() {
        let mut token = Token::decode("u1|farm|plant|42");
        assert!(token.promote_subcommand());
        assert_eq!(token.path, CommandPath::with_sub("farm", "plant"));
        assert_eq!(token.args, vec![Value::Int(42)]);
        // already has a subcommand
        assert!(!token.promote_subcommand());
    }

    #[test]
    fn test_garbage_owner_matches_nobody() {
        let token = Token::decode("u1|farm|plant");
        assert_eq!(token.owner, Owner::Unknown("u1".to_string()));
        assert!(!token.owner.permits(1));
    }

    #[test]
    fn test_decode_never_panics_on_malformed_input() {
        for raw in ["", "|", "||||", "all", "\u{9999}|\u{271A}|x", "🎲|🎲 🎲|", " | | "] {
            let _ = Token::decode(raw);
        }
        let empty = Token::decode("");
        assert_eq!(empty.path.command, "");
        assert!(empty.args.is_empty());
    }

    #[test]
    fn test_malformed_numeric_segment_stays_literal() {
        // U+271A has width 1 but value 10, not a valid group
        let token = Token::decode("all|minigame tictactoe|\u{271A}");
        assert_eq!(token.args, vec![Value::Str("\u{271A}".to_string())]);
    }

    #[test]
    fn test_leading_zero_text_survives() {
        let token = Token::new(Owner::All, CommandPath::new("help")).arg("007");
        let decoded = Token::decode(&token.encode().unwrap());
        assert_eq!(decoded.args, vec![Value::Str("007".to_string())]);
    }

    #[test]
    fn test_digit_text_stays_text() {
        let args = vec![Value::Str("42".to_string()), Value::Str("007".to_string()), Value::Int(42)];
        let encoded = encode(Owner::All, CommandPath::new("x"), args.clone()).unwrap();
        assert_eq!(decode(&encoded).args, args);
        assert_eq!(decode(&encoded).args[0].as_str(), Some("42"));
        assert_eq!(decode(&encoded).args[2].as_int(), Some(42));
    }

    #[test]
    fn test_marker_without_digits_is_literal() {
        let odd = format!("{TEXT_MARKER}abc");
        let token = Token::new(Owner::All, CommandPath::new("help")).arg(Value::Str(odd.clone()));
        let decoded = Token::decode(&token.encode().unwrap());
        assert_eq!(decoded.args, vec![Value::Str(odd)]);
    }

    #[test]
    fn test_unknown_owner_must_survive_encoding() {
        let piped = Token::new(Owner::Unknown("a|b".to_string()), CommandPath::new("help"));
        assert_eq!(piped.encode(), Err(TokenError::InvalidOwner("a|b".to_string())));

        for raw in ["", "all", "42"] {
            let token = Token::new(Owner::Unknown(raw.to_string()), CommandPath::new("help"));
            assert_eq!(token.encode(), Err(TokenError::InvalidOwner(raw.to_string())));
        }

        let garbage = Token::new(Owner::Unknown("u1".to_string()), CommandPath::new("help"));
        let encoded = garbage.encode().unwrap();
        assert_eq!(Token::decode(&encoded).owner, Owner::Unknown("u1".to_string()));
    }

    #[test]
    fn test_text_is_canonicalised() {
        assert_eq!(Value::text("42"), Value::Int(42));
        assert_eq!(Value::text("042"), Value::Str("042".to_string()));
        assert_eq!(Value::text("knife"), Value::Str("knife".to_string()));
    }

    #[test]
    fn test_plain_text_is_not_rewritten() {
        let token = Token::new(Owner::Anyone, CommandPath::new("help")).arg("stand");
        assert_eq!(token.encode().unwrap(), "|help|stand");
    }

    #[test]
    fn test_rejects_delimiter_in_argument() {
        let token = Token::new(Owner::All, CommandPath::new("help")).arg("a|b");
        assert_eq!(token.encode(), Err(TokenError::ReservedDelimiter { index: 0 }));
    }

    #[test]
    fn test_rejects_ambiguous_argument() {
        // these characters would expand to digits on the way back
        let token = Token::new(Owner::All, CommandPath::new("help")).arg("\u{9C40}");
        assert_eq!(token.encode(), Err(TokenError::AmbiguousArgument { index: 0 }));
    }

    #[test]
    fn test_rejects_over_budget() {
        let token = Token::new(Owner::All, CommandPath::new("help")).arg("x".repeat(120));
        assert!(matches!(token.encode(), Err(TokenError::TooLong { .. })));
    }

    #[test]
    fn test_compression_shrinks_numeric_state() {
        let plain_len = "298114253917126656|game gamble blackjack|stand|100000|AbQ|cD|2".len();
        let token = Token::new(Owner::User(298_114_253_917_126_656), CommandPath::with_sub("game", "gamble blackjack"))
            .with_args(vec![Value::text("stand"), Value::Int(100_000), Value::text("AbQ"), Value::text("cD"), Value::Int(2)]);
        let encoded = token.encode().unwrap();
        assert!(encoded.chars().count() < plain_len);
    }

    #[test]
    fn test_path_helpers() {
        let path = CommandPath::parse("game gamble blackjack");
        assert_eq!(path.command, "game");
        assert_eq!(path.sub.as_deref(), Some("gamble blackjack"));
        assert_eq!(path.group(), Some("gamble"));
        assert_eq!(path.sub_name(), Some("blackjack"));
        assert_eq!(path.to_string(), "game gamble blackjack");

        let flat = CommandPath::parse("minigame tictactoe");
        assert_eq!(flat.group(), None);
        assert_eq!(flat.sub_name(), Some("tictactoe"));
    }
}
