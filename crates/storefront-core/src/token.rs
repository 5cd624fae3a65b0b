//! Action tokens
//!
//! Every control in a render or sort descriptor carries a compact text token
//! that the transport hands back verbatim when the control is used:
//!
//! ```text
//! m:o:<scope>:<page>      open scope at page
//! m:s:<id>                sibling folder
//! m:u:<id>                up to parent folder
//! m:i:<id>                item selected
//! m:so:<scope>            sort mode, open scope
//! m:su:<scope>:<id>       sort mode, move up
//! m:sd:<scope>:<id>       sort mode, move down
//! m:st:<scope>:<id>       sort mode, toggle hidden
//! m:sx                    sort mode, exit
//! ```
//!
//! Ids are base64url without padding; the root scope is `~`. Text without the
//! `m:` prefix belongs to some other handler.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::admin::MoveDirection;

pub const TOKEN_PREFIX: &str = "m:";
const ROOT_SCOPE: &str = "~";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a menu token")]
    Foreign,

    #[error("malformed menu token: {0}")]
    Malformed(String),

    #[error("invalid id encoding in token: {0}")]
    InvalidEncoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionToken {
    Open { scope: Option<String>, page: usize },
    Sibling { id: String },
    Up { id: String },
    Item { id: String },
    SortOpen { scope: Option<String> },
    SortMove {
        scope: Option<String>,
        id: String,
        direction: MoveDirection,
    },
    SortToggle { scope: Option<String>, id: String },
    SortExit,
}

impl ActionToken {
    pub fn open(scope: Option<&str>, page: usize) -> Self {
        Self::Open {
            scope: scope.map(str::to_string),
            page,
        }
    }

    /// Whether `raw` carries the menu prefix.
    pub fn is_ours(raw: &str) -> bool {
        raw.starts_with(TOKEN_PREFIX)
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(TOKEN_PREFIX)?;
        match self {
            Self::Open { scope, page } => write!(f, "o:{}:{}", encode_scope(scope), page),
            Self::Sibling { id } => write!(f, "s:{}", encode_id(id)),
            Self::Up { id } => write!(f, "u:{}", encode_id(id)),
            Self::Item { id } => write!(f, "i:{}", encode_id(id)),
            Self::SortOpen { scope } => write!(f, "so:{}", encode_scope(scope)),
            Self::SortMove {
                scope,
                id,
                direction,
            } => {
                let code = match direction {
                    MoveDirection::Up => "su",
                    MoveDirection::Down => "sd",
                };
                write!(f, "{}:{}:{}", code, encode_scope(scope), encode_id(id))
            }
            Self::SortToggle { scope, id } => {
                write!(f, "st:{}:{}", encode_scope(scope), encode_id(id))
            }
            Self::SortExit => f.write_str("sx"),
        }
    }
}

impl FromStr for ActionToken {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let body = raw.strip_prefix(TOKEN_PREFIX).ok_or(TokenError::Foreign)?;
        let parts: Vec<&str> = body.split(':').collect();
        let malformed = || TokenError::Malformed(raw.to_string());
        let token = match parts.as_slice() {
            ["o", scope, page] => Self::Open {
                scope: decode_scope(scope)?,
                page: page.parse().map_err(|_| malformed())?,
            },
            ["s", id] => Self::Sibling { id: decode_id(id)? },
            ["u", id] => Self::Up { id: decode_id(id)? },
            ["i", id] => Self::Item { id: decode_id(id)? },
            ["so", scope] => Self::SortOpen {
                scope: decode_scope(scope)?,
            },
            [code @ ("su" | "sd"), scope, id] => Self::SortMove {
                scope: decode_scope(scope)?,
                id: decode_id(id)?,
                direction: if *code == "su" {
                    MoveDirection::Up
                } else {
                    MoveDirection::Down
                },
            },
            ["st", scope, id] => Self::SortToggle {
                scope: decode_scope(scope)?,
                id: decode_id(id)?,
            },
            ["sx"] => Self::SortExit,
            _ => return Err(malformed()),
        };
        Ok(token)
    }
}

impl Serialize for ActionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn encode_id(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

fn encode_scope(scope: &Option<String>) -> String {
    match scope {
        None => ROOT_SCOPE.to_string(),
        Some(id) => encode_id(id),
    }
}

fn decode_id(encoded: &str) -> Result<String, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| TokenError::InvalidEncoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TokenError::InvalidEncoding(e.to_string()))
}

fn decode_scope(encoded: &str) -> Result<Option<String>, TokenError> {
    if encoded == ROOT_SCOPE {
        return Ok(None);
    }
    decode_id(encoded).map(Some)
}
