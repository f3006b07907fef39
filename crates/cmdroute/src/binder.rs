//! Argument binding: trailing tokens to typed slot values.
//!
//! Binding runs four passes over the tokens that follow the command path:
//!
//! 1. Flags. A token with leading dashes is looked up (dashes stripped) in
//!    every slot's flag table. A value flag binds its slot outright; a
//!    positional flag consumes the next token as the slot's literal. A flag
//!    that no slot declares is an error; it is never treated as a positional.
//! 2. Positionals. Remaining tokens fill the still-unbound slots in order.
//! 3. Defaults. Unbound slots take their registered default.
//! 4. Conversion. Literals are converted with the slot's type tag; typed
//!    values are checked against it. Every slot is attempted so the error can
//!    report each failing one.

use cmdroute_types::error::{ArgumentError, ConversionError, DispatchError, Result, SlotStatus};
use cmdroute_types::value::{ArgValue, Value};

use crate::convert::ConversionRegistry;
use crate::tree::{ArgumentSpec, FlagAction, is_flag_token};

/// How a slot got its value before conversion.
#[derive(Debug, Clone)]
pub enum SlotBinding {
    Unbound,
    /// A positional token.
    Literal(String),
    /// Supplied by a flag, either the following token or the flag's value.
    Flag(ArgValue),
    /// The slot's registered default.
    Default(ArgValue),
}

impl SlotBinding {
    pub fn is_bound(&self) -> bool {
        !matches!(self, SlotBinding::Unbound)
    }
}

/// Result of the first three passes.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub slots: Vec<SlotBinding>,
    /// Positional tokens left over once every slot was bound.
    pub excess: Vec<String>,
}

/// Binds tokens against one handler's slot metadata.
pub struct ArgumentBinder<'a> {
    specs: &'a [ArgumentSpec],
    conversions: &'a ConversionRegistry,
}

impl<'a> ArgumentBinder<'a> {
    pub fn new(specs: &'a [ArgumentSpec], conversions: &'a ConversionRegistry) -> Self {
        Self { specs, conversions }
    }

    /// Run every pass and produce the ordered values for the handler.
    pub fn bind<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<Value>> {
        let bindings = self.assign(tokens)?;
        Ok(self.convert(&bindings)?)
    }

    /// Passes 1 to 3: flags, positionals, defaults.
    pub fn assign<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Bindings> {
        let mut slots = vec![SlotBinding::Unbound; self.specs.len()];
        let mut consumed = vec![false; tokens.len()];

        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i].as_ref();
            if !is_flag_token(token) {
                i += 1;
                continue;
            }
            let name = token.trim_start_matches('-');
            let (slot, action) = self
                .find_flag(name)
                .ok_or_else(|| DispatchError::UnknownFlag(token.to_string()))?;
            consumed[i] = true;
            match action {
                FlagAction::Supplies(value) => {
                    slots[slot] = SlotBinding::Flag(value.clone());
                    i += 1;
                },
                FlagAction::TakesValue => {
                    let value = tokens
                        .get(i + 1)
                        .ok_or_else(|| DispatchError::MissingFlagValue(token.to_string()))?;
                    consumed[i + 1] = true;
                    slots[slot] = SlotBinding::Flag(ArgValue::Literal(value.as_ref().to_string()));
                    i += 2;
                },
            }
            log::debug!("Flag '{token}' bound slot {slot}");
        }

        let mut excess = Vec::new();
        let mut next_slot = 0;
        for (token, _) in tokens.iter().zip(&consumed).filter(|(_, used)| !**used) {
            while next_slot < slots.len() && slots[next_slot].is_bound() {
                next_slot += 1;
            }
            match slots.get_mut(next_slot) {
                Some(slot) => *slot = SlotBinding::Literal(token.as_ref().to_string()),
                None => excess.push(token.as_ref().to_string()),
            }
        }

        for (slot, spec) in slots.iter_mut().zip(self.specs) {
            if slot.is_bound() {
                continue;
            }
            if let Some(default) = &spec.default {
                *slot = SlotBinding::Default(default.clone());
            }
        }

        Ok(Bindings { slots, excess })
    }

    /// Pass 4: convert every slot, collecting a status for each.
    pub fn convert(&self, bindings: &Bindings) -> std::result::Result<Vec<Value>, ArgumentError> {
        let mut values = Vec::with_capacity(self.specs.len());
        let mut statuses = Vec::with_capacity(self.specs.len());

        for (binding, spec) in bindings.slots.iter().zip(self.specs) {
            let converted = match binding {
                SlotBinding::Unbound => None,
                SlotBinding::Literal(literal) => Some(self.conversions.convert(spec.tag, literal)),
                SlotBinding::Flag(value) | SlotBinding::Default(value) => {
                    Some(self.resolve(spec, value))
                },
            };
            match converted {
                Some(Ok(value)) => {
                    values.push(value);
                    statuses.push(SlotStatus::Converted);
                },
                Some(Err(e)) => statuses.push(SlotStatus::Failed(e)),
                None => statuses.push(SlotStatus::Missing),
            }
        }

        if values.len() == self.specs.len() && bindings.excess.is_empty() {
            return Ok(values);
        }
        Err(ArgumentError {
            arity: self.specs.len(),
            excess: bindings.excess.len(),
            slots: statuses,
        })
    }

    fn resolve(&self, spec: &ArgumentSpec, value: &ArgValue) -> std::result::Result<Value, ConversionError> {
        match value {
            ArgValue::Literal(literal) => self.conversions.convert(spec.tag, literal),
            ArgValue::Typed(v) if v.tag() == spec.tag => Ok(v.clone()),
            ArgValue::Typed(v) => Err(ConversionError::type_mismatch(spec.tag.name(), v.tag().name())),
        }
    }

    fn find_flag(&self, name: &str) -> Option<(usize, &'a FlagAction)> {
        self.specs
            .iter()
            .enumerate()
            .find_map(|(idx, spec)| spec.flags.get(name).map(|action| (idx, action)))
    }
}

#[cfg(test)]
mod tests {
    use cmdroute_types::error::ConversionFailure;
    use cmdroute_types::value::TypeTag;

    use super::*;

    fn spec<T: 'static>() -> ArgumentSpec {
        ArgumentSpec::new(TypeTag::of::<T>())
    }

    fn ints(values: &[Value]) -> Vec<i32> {
        values.iter().map(|v| v.downcast::<i32>().unwrap()).collect()
    }

    #[test]
    fn positional_only() {
        let reg = ConversionRegistry::with_builtins();
        let specs = vec![spec::<i32>(), spec::<i32>()];
        let values = ArgumentBinder::new(&specs, &reg).bind(&["10", "20"]).unwrap();
        assert_eq!(ints(&values), vec![10, 20]);
    }

    #[test]
    fn mixed_types_convert_per_slot() {
        let reg = ConversionRegistry::with_builtins();
        let specs = vec![spec::<i32>(), spec::<f32>(), spec::<String>()];
        let values = ArgumentBinder::new(&specs, &reg)
            .bind(&["10", "12.3", "hello"])
            .unwrap();
        assert_eq!(values[0].downcast::<i32>(), Some(10));
        assert_eq!(values[1].downcast::<f32>(), Some(12.3));
        assert_eq!(values[2].downcast::<String>().as_deref(), Some("hello"));
    }

    #[test]
    fn positional_flag_binds_out_of_order() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>(), spec::<i32>()];
        specs[1].flags.insert("y".into(), FlagAction::TakesValue);
        let binder = ArgumentBinder::new(&specs, &reg);
        assert_eq!(ints(&binder.bind(&["-y", "20", "10"]).unwrap()), vec![10, 20]);
        assert_eq!(ints(&binder.bind(&["10", "20"]).unwrap()), vec![10, 20]);
        assert_eq!(ints(&binder.bind(&["10", "--y", "20"]).unwrap()), vec![10, 20]);
    }

    #[test]
    fn flag_value_may_look_like_a_flag() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>()];
        specs[0].flags.insert("n".into(), FlagAction::TakesValue);
        let values = ArgumentBinder::new(&specs, &reg).bind(&["-n", "-5"]).unwrap();
        assert_eq!(ints(&values), vec![-5]);
    }

    #[test]
    fn value_flag_supplies_literal() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>(), spec::<String>()];
        specs[1]
            .flags
            .insert("loud".into(), FlagAction::Supplies(ArgValue::from("LOUD")));
        let values = ArgumentBinder::new(&specs, &reg).bind(&["--loud", "3"]).unwrap();
        assert_eq!(values[0].downcast::<i32>(), Some(3));
        assert_eq!(values[1].downcast::<String>().as_deref(), Some("LOUD"));
    }

    #[test]
    fn value_flag_supplies_typed_value() {
        let reg = ConversionRegistry::new();
        let mut specs = vec![spec::<f64>()];
        specs[0]
            .flags
            .insert("half".into(), FlagAction::Supplies(ArgValue::typed(2.5f64)));
        let values = ArgumentBinder::new(&specs, &reg).bind(&["-half"]).unwrap();
        assert_eq!(values[0].downcast::<f64>(), Some(2.5));
    }

    #[test]
    fn typed_value_of_wrong_type_fails() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<f64>()];
        specs[0]
            .flags
            .insert("half".into(), FlagAction::Supplies(ArgValue::typed(3i32)));
        let err = ArgumentBinder::new(&specs, &reg).bind(&["-half"]).unwrap_err();
        match err {
            DispatchError::Arguments(e) => match &e.slots[0] {
                SlotStatus::Failed(c) => {
                    assert_eq!(c.reason, ConversionFailure::TypeMismatch { found: "i32" })
                },
                other => panic!("unexpected status {other:?}"),
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_flag_hard_fails() {
        let reg = ConversionRegistry::with_builtins();
        let specs = vec![spec::<i32>()];
        let err = ArgumentBinder::new(&specs, &reg).bind(&["-q", "1"]).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownFlag(f) if f == "-q"));
    }

    #[test]
    fn positional_flag_without_value_fails() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>()];
        specs[0].flags.insert("n".into(), FlagAction::TakesValue);
        let err = ArgumentBinder::new(&specs, &reg).bind(&["-n"]).unwrap_err();
        assert!(matches!(err, DispatchError::MissingFlagValue(f) if f == "-n"));
    }

    #[test]
    fn later_flag_overrides_earlier() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>()];
        specs[0].flags.insert("n".into(), FlagAction::TakesValue);
        let values = ArgumentBinder::new(&specs, &reg)
            .bind(&["-n", "1", "-n", "2"])
            .unwrap();
        assert_eq!(ints(&values), vec![2]);
    }

    #[test]
    fn default_fills_missing_slot() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>(), spec::<i32>()];
        specs[1].default = Some(ArgValue::from("7"));
        let binder = ArgumentBinder::new(&specs, &reg);
        assert_eq!(ints(&binder.bind(&["1"]).unwrap()), vec![1, 7]);
        assert_eq!(ints(&binder.bind(&["1", "2"]).unwrap()), vec![1, 2]);
    }

    #[test]
    fn default_on_leading_slot_with_flag_for_trailing() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>(), spec::<i32>()];
        specs[0].default = Some(ArgValue::from("5"));
        specs[1].flags.insert("b".into(), FlagAction::TakesValue);
        let values = ArgumentBinder::new(&specs, &reg).bind(&["-b", "9"]).unwrap();
        assert_eq!(ints(&values), vec![5, 9]);
    }

    #[test]
    fn missing_slot_reported() {
        let reg = ConversionRegistry::with_builtins();
        let specs = vec![spec::<i32>(), spec::<i32>()];
        let err = ArgumentBinder::new(&specs, &reg).bind(&["1"]).unwrap_err();
        match err {
            DispatchError::Arguments(e) => {
                assert_eq!(e.slots, vec![SlotStatus::Converted, SlotStatus::Missing]);
                assert!(!e.is_arity_mismatch());
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn too_many_tokens_is_arity_mismatch() {
        let reg = ConversionRegistry::with_builtins();
        let specs = vec![spec::<i32>()];
        let err = ArgumentBinder::new(&specs, &reg).bind(&["1", "2", "3"]).unwrap_err();
        match err {
            DispatchError::Arguments(e) => {
                assert!(e.is_arity_mismatch());
                assert_eq!(e.excess, 2);
                assert_eq!(e.slots, vec![SlotStatus::Converted]);
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn every_slot_is_attempted() {
        let reg = ConversionRegistry::with_builtins();
        let specs = vec![spec::<i32>(), spec::<f64>(), spec::<i32>()];
        let err = ArgumentBinder::new(&specs, &reg)
            .bind(&["abc", "1.5", "x"])
            .unwrap_err();
        match err {
            DispatchError::Arguments(e) => {
                assert_eq!(e.failed_slots(), vec![0, 2]);
                assert_eq!(e.slots[1], SlotStatus::Converted);
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unregistered_tag_surfaces_at_binding() {
        #[derive(Clone)]
        struct Celsius(#[allow(dead_code)] f64);

        let reg = ConversionRegistry::with_builtins();
        let specs = vec![spec::<Celsius>()];
        let err = ArgumentBinder::new(&specs, &reg).bind(&["21.5"]).unwrap_err();
        match err {
            DispatchError::Arguments(e) => match &e.slots[0] {
                SlotStatus::Failed(c) => assert_eq!(c.reason, ConversionFailure::Unregistered),
                other => panic!("unexpected status {other:?}"),
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn assign_records_binding_sources() {
        let reg = ConversionRegistry::with_builtins();
        let mut specs = vec![spec::<i32>(), spec::<i32>(), spec::<i32>(), spec::<i32>()];
        specs[0].flags.insert("a".into(), FlagAction::TakesValue);
        specs[2].default = Some(ArgValue::from("0"));
        let bindings = ArgumentBinder::new(&specs, &reg).assign(&["-a", "1", "2"]).unwrap();
        assert!(matches!(&bindings.slots[0], SlotBinding::Flag(ArgValue::Literal(s)) if s == "1"));
        assert!(matches!(&bindings.slots[1], SlotBinding::Literal(s) if s == "2"));
        assert!(matches!(&bindings.slots[2], SlotBinding::Default(_)));
        assert!(matches!(&bindings.slots[3], SlotBinding::Unbound));
        assert!(bindings.excess.is_empty());
    }

    #[test]
    fn zero_arity_accepts_no_tokens() {
        let reg = ConversionRegistry::with_builtins();
        let binder = ArgumentBinder::new(&[], &reg);
        let empty: [&str; 0] = [];
        assert!(binder.bind(&empty).unwrap().is_empty());
        assert!(binder.bind(&["x"]).is_err());
    }
}
