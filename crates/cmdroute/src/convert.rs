//! String-to-value conversion registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use cmdroute_types::error::ConversionError;
use cmdroute_types::value::{TypeTag, Value};

/// A type-erased conversion function.
pub type ConvertFn = Box<dyn Fn(&str) -> Result<Value, String>>;

/// Maps a type tag to the function that turns a literal into that type.
///
/// The registry stays mutable for the dispatcher's lifetime: conversions may
/// be added or replaced after commands are registered.
pub struct ConversionRegistry {
    conversions: HashMap<TypeTag, ConvertFn>,
}

impl ConversionRegistry {
    /// Create an empty registry with no conversions at all.
    pub fn new() -> Self {
        Self {
            conversions: HashMap::new(),
        }
    }

    /// Create a registry seeded with the built-in conversions:
    /// `i32`, `f32`, `f64` and `String`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register_parse::<i32>();
        reg.register_parse::<f32>();
        reg.register_parse::<f64>();
        reg.register::<String, _, std::convert::Infallible>(|s| Ok(s.to_string()));
        reg
    }

    /// Register (or replace) the conversion for `T`.
    pub fn register<T, F, E>(&mut self, convert: F)
    where
        T: Any,
        F: Fn(&str) -> Result<T, E> + 'static,
        E: Display,
    {
        self.register_tag(
            TypeTag::of::<T>(),
            Box::new(move |s| convert(s).map(Value::new).map_err(|e| e.to_string())),
        );
    }

    /// Register `T` using its `FromStr` impl on the trimmed literal.
    pub fn register_parse<T>(&mut self)
    where
        T: Any + FromStr,
        T::Err: Display,
    {
        self.register::<T, _, T::Err>(|s| s.trim().parse::<T>());
    }

    /// Register (or replace) a raw conversion function for `tag`.
    pub fn register_tag(&mut self, tag: TypeTag, convert: ConvertFn) {
        if self.conversions.insert(tag, convert).is_some() {
            log::warn!("Replaced conversion for type {tag}");
        } else {
            log::debug!("Registered conversion for type {tag}");
        }
    }

    /// Whether a conversion exists for `tag`.
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.conversions.contains_key(&tag)
    }

    /// Convert `literal` into a value of type `tag`.
    pub fn convert(&self, tag: TypeTag, literal: &str) -> Result<Value, ConversionError> {
        let convert = self
            .conversions
            .get(&tag)
            .ok_or_else(|| ConversionError::unregistered(tag.name(), literal))?;
        let value =
            convert(literal).map_err(|msg| ConversionError::rejected(tag.name(), literal, msg))?;
        if value.tag() != tag {
            // A raw conversion produced the wrong type.
            return Err(ConversionError::type_mismatch(tag.name(), value.tag().name()));
        }
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
