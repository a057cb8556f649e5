use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::promote::{cast_scalar, reason_supertype};
use crate::scalar::{Scalar, ScalarType};

/// Raw text recognized as a missing marker, with the reason it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingToken {
    pub token: String,
    pub reason: Scalar,
}

impl MissingToken {
    /// A token whose reason is its own text.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let reason = Scalar::Text(token.clone());
        Self { token, reason }
    }

    pub fn with_reason(token: impl Into<String>, reason: impl Into<Scalar>) -> Self {
        Self {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

/// Ordered, validated token set of one column.
///
/// All reasons share one type (the column's reason-channel type), derived
/// from the configured payloads. Lookups are exact and case-sensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingTokens {
    tokens: SmallVec<[MissingToken; 4]>,
    reason_type: ScalarType,
}

impl MissingTokens {
    /// Validates a token list for `column`.
    ///
    /// Identical duplicates are dropped. Payloads of mixed types are promoted
    /// to their common reason type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousTokens`] when one token text is configured
    /// with two different reasons.
    pub fn new(column: &str, tokens: impl IntoIterator<Item = MissingToken>) -> Result<Self> {
        let mut kept: SmallVec<[MissingToken; 4]> = SmallVec::new();
        for token in tokens {
            match kept
                .iter()
                .position(|existing| existing.token == token.token)
            {
                Some(index) if kept[index].reason == token.reason => {}
                Some(_) => {
                    return Err(Error::AmbiguousTokens {
                        column: Cow::Owned(column.to_owned()),
                        token: token.token,
                    });
                }
                None => kept.push(token),
            }
        }

        let reason_type = kept
            .iter()
            .map(|token| token.reason.scalar_type())
            .reduce(reason_supertype)
            .unwrap_or(ScalarType::Text);
        for token in &mut kept {
            if token.reason.scalar_type() != reason_type {
                token.reason = cast_scalar(&token.reason, reason_type)
                    .unwrap_or_else(|| Scalar::Text(token.reason.encode()));
            }
        }

        Ok(Self {
            tokens: kept,
            reason_type,
        })
    }

    /// Tokens that stand for their own text.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: SmallVec<[MissingToken; 4]> = SmallVec::new();
        for text in texts {
            let token = MissingToken::new(text);
            if !tokens.iter().any(|existing| existing.token == token.token) {
                tokens.push(token);
            }
        }
        Self {
            tokens,
            reason_type: ScalarType::Text,
        }
    }

    /// The conventional `""` and `"NA"` markers.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_texts(["", "NA"])
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::from_texts(std::iter::empty::<String>())
    }

    #[must_use]
    pub const fn reason_type(&self) -> ScalarType {
        self.reason_type
    }

    #[must_use]
    pub fn tokens(&self) -> &[MissingToken] {
        &self.tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reason of the first token equal to `raw`.
    #[must_use]
    pub fn match_token(&self, raw: &str) -> Option<&Scalar> {
        self.tokens
            .iter()
            .find(|token| token.token == raw)
            .map(|token| &token.reason)
    }

    /// First configured token standing for `reason`.
    #[must_use]
    pub fn canonical_token(&self, reason: &Scalar) -> Option<&str> {
        self.tokens
            .iter()
            .find(|token| &token.reason == reason)
            .map(|token| token.token.as_str())
    }
}

/// Per-column entry of a [`MissingTokenSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnTokens {
    /// Use the spec's default token set.
    Default,
    /// Do not split this column into channels.
    NoChannel,
    Tokens(MissingTokens),
}

/// Missing-token configuration of one load.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingTokenSpec {
    default: MissingTokens,
    columns: HashMap<String, ColumnTokens>,
}

impl Default for MissingTokenSpec {
    fn default() -> Self {
        Self::new(MissingTokens::standard())
    }
}

impl MissingTokenSpec {
    #[must_use]
    pub fn new(default: MissingTokens) -> Self {
        Self {
            default,
            columns: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, tokens: ColumnTokens) -> Self {
        self.columns.insert(name.into(), tokens);
        self
    }

    #[must_use]
    pub const fn default_tokens(&self) -> &MissingTokens {
        &self.default
    }

    /// Token set for `column`; `None` when the column opts out of channels.
    #[must_use]
    pub fn resolve(&self, column: &str) -> Option<&MissingTokens> {
        match self.columns.get(column) {
            None | Some(ColumnTokens::Default) => Some(&self.default),
            Some(ColumnTokens::NoChannel) => None,
            Some(ColumnTokens::Tokens(tokens)) => Some(tokens),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// Serialized form of one token: either bare text or text plus reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenConfig {
    Bare(String),
    Coded { token: String, reason: ReasonConfig },
}

/// Serialized reason payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReasonConfig {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<ReasonConfig> for Scalar {
    fn from(value: ReasonConfig) -> Self {
        match value {
            ReasonConfig::Bool(v) => Self::Bool(v),
            ReasonConfig::Int(v) => Self::Int(v),
            ReasonConfig::Float(v) => Self::Float(v),
            ReasonConfig::Text(v) => Self::Text(v),
        }
    }
}

impl From<TokenConfig> for MissingToken {
    fn from(value: TokenConfig) -> Self {
        match value {
            TokenConfig::Bare(token) => Self::new(token),
            TokenConfig::Coded { token, reason } => Self::with_reason(token, reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKeyword {
    Default,
    NoChannel,
}

/// Serialized per-column entry: `"default"`, `"no_channel"` or a token list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnTokensConfig {
    Keyword(TokenKeyword),
    List(Vec<TokenConfig>),
}

fn standard_token_configs() -> Vec<TokenConfig> {
    vec![
        TokenConfig::Bare(String::new()),
        TokenConfig::Bare("NA".to_owned()),
    ]
}

/// Serialized [`MissingTokenSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSpecConfig {
    #[serde(default = "standard_token_configs")]
    pub default: Vec<TokenConfig>,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnTokensConfig>,
}

impl Default for TokenSpecConfig {
    fn default() -> Self {
        Self {
            default: standard_token_configs(),
            columns: BTreeMap::new(),
        }
    }
}

impl TokenSpecConfig {
    /// Validates every token list and builds the spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousTokens`] for conflicting duplicates.
    pub fn build(self) -> Result<MissingTokenSpec> {
        let default = MissingTokens::new(
            "the default token set",
            self.default.into_iter().map(MissingToken::from),
        )?;
        let mut spec = MissingTokenSpec::new(default);
        for (name, entry) in self.columns {
            let tokens = match entry {
                ColumnTokensConfig::Keyword(TokenKeyword::Default) => ColumnTokens::Default,
                ColumnTokensConfig::Keyword(TokenKeyword::NoChannel) => ColumnTokens::NoChannel,
                ColumnTokensConfig::List(list) => ColumnTokens::Tokens(MissingTokens::new(
                    &format!("column '{name}'"),
                    list.into_iter().map(MissingToken::from),
                )?),
            };
            spec = spec.with_column(name, tokens);
        }
        Ok(spec)
    }
}
