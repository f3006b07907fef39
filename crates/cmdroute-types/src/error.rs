//! Error types for cmdroute.

use std::fmt;
use std::io;

/// Errors produced by the dispatch engine.
///
/// User-input failures (unknown paths, bad flags, unconvertible literals) are
/// turned into diagnostics by the dispatcher and never reach the caller of
/// `execute`. Configuration-time misuse is returned to the configuring caller.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("no handler registered at '{0}'")]
    HandlerMissing(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("flag '{0}' requires a value")]
    MissingFlagValue(String),

    #[error("expected {expected} argument(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    #[error("argument index {index} out of range (arity {arity})")]
    IndexOutOfRange { index: usize, arity: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Why a single literal could not become a typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionFailure {
    /// No conversion function is registered for the tag.
    Unregistered,
    /// The conversion function rejected the literal.
    Rejected(String),
    /// A pre-typed value carried a different type than the slot declares.
    TypeMismatch { found: &'static str },
}

/// A failed string-to-value conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct ConversionError {
    /// Display name of the target type.
    pub type_name: &'static str,
    /// The literal that was being converted (empty for typed values).
    pub literal: String,
    pub reason: ConversionFailure,
}

impl ConversionError {
    pub fn unregistered(type_name: &'static str, literal: &str) -> Self {
        Self {
            type_name,
            literal: literal.to_string(),
            reason: ConversionFailure::Unregistered,
        }
    }

    pub fn rejected(type_name: &'static str, literal: &str, message: impl Into<String>) -> Self {
        Self {
            type_name,
            literal: literal.to_string(),
            reason: ConversionFailure::Rejected(message.into()),
        }
    }

    pub fn type_mismatch(type_name: &'static str, found: &'static str) -> Self {
        Self {
            type_name,
            literal: String::new(),
            reason: ConversionFailure::TypeMismatch { found },
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            ConversionFailure::Unregistered => {
                write!(f, "no conversion registered for type {}", self.type_name)
            },
            ConversionFailure::Rejected(msg) => write!(
                f,
                "cannot convert '{}' to {}: {msg}",
                self.literal, self.type_name
            ),
            ConversionFailure::TypeMismatch { found } => {
                write!(f, "expected a {} value, found {found}", self.type_name)
            },
        }
    }
}

/// Outcome of binding for one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    /// The slot was bound and its value converted.
    Converted,
    /// Nothing bound the slot and it has no default.
    Missing,
    /// The slot was bound but conversion failed.
    Failed(ConversionError),
}

/// A binding failure that reports every slot, not just the first bad one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct ArgumentError {
    /// Number of declared slots.
    pub arity: usize,
    /// Number of positional tokens that were left over after every slot was
    /// bound (non-zero means too many arguments).
    pub excess: usize,
    /// One entry per slot, in declaration order.
    pub slots: Vec<SlotStatus>,
}

impl ArgumentError {
    /// True when more positional tokens were supplied than slots exist.
    pub fn is_arity_mismatch(&self) -> bool {
        self.excess > 0
    }

    /// Indices of slots that failed conversion or were left unbound.
    pub fn failed_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !matches!(s, SlotStatus::Converted))
            .map(|(i, _)| i)
            .collect()
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = self
            .slots
            .iter()
            .filter(|s| matches!(s, SlotStatus::Missing))
            .count();
        let failed = self
            .slots
            .iter()
            .filter(|s| matches!(s, SlotStatus::Failed(_)))
            .count();
        if !self.is_arity_mismatch() {
            return write!(
                f,
                "{missing} missing and {failed} unconvertible argument(s) out of {}",
                self.arity
            );
        }
        write!(
            f,
            "expected {} argument(s), got {}",
            self.arity,
            self.arity + self.excess
        )?;
        if failed > 0 {
            write!(f, " ({failed} unconvertible)")?;
        }
        Ok(())
    }
}
