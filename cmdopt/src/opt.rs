//! Option descriptors: declaration plus the state a parse leaves behind.

use crate::error::{ConversionError, ValueError};
use crate::value::{ArgType, FromValue, IntoValue, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Flag; never consumes a value.
    None,
    /// Each occurrence replaces the previous value.
    Single,
    /// Each occurrence appends to the list.
    Multi,
}

/// One declared option.
///
/// Built with the `Opt::new(..).short(..)` chain, owned by the caller and
/// lent to a [`Parser`](crate::Parser) by mutable reference. After the
/// parse, read it back with [`is_set`](Opt::is_set), [`get`](Opt::get) or
/// [`get_all`](Opt::get_all).
#[derive(Debug, Clone)]
pub struct Opt {
    long_name: String,
    short_name: Option<char>,
    arg_type: ArgType,
    arity: Arity,
    mandatory: bool,
    description: String,
    value_name: String,
    /// Default as given to `default_val`.
    given_default: Option<Value>,
    /// `given_default` stored as `arg_type`; `None` if it does not coerce.
    default_value: Option<Value>,

    found: bool,
    count: usize,
    values: Vec<Value>,
    rejected: Vec<String>,
}

impl Opt {
    /// A flag with the given long name (empty for short-only options).
    pub fn new(name: &str) -> Self {
        Opt {
            long_name: name.to_string(),
            short_name: None,
            arg_type: ArgType::None,
            arity: Arity::None,
            mandatory: false,
            description: String::new(),
            value_name: "value".to_string(),
            given_default: None,
            default_value: None,
            found: false,
            count: 0,
            values: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// A flag known only by its short character.
    pub fn short_only(c: char) -> Self {
        Opt::new("").short(c)
    }

    pub fn short(mut self, c: char) -> Self {
        self.short_name = Some(c);
        self
    }

    /// Declare the value type. Anything but `ArgType::None` makes the
    /// option take a single value; `ArgType::None` turns it back into a
    /// flag.
    pub fn arg_type(mut self, t: ArgType) -> Self {
        self.arg_type = t;
        self.arity = match (t.takes_arg(), self.arity) {
            (false, _) => Arity::None,
            (true, Arity::Multi) => Arity::Multi,
            (true, _) => Arity::Single,
        };
        self.coerce_default();
        self
    }

    /// Accumulate every occurrence. Implies `ArgType::String` if no value
    /// type was declared yet.
    pub fn multi(mut self) -> Self {
        if !self.arg_type.takes_arg() {
            self.arg_type = ArgType::String;
        }
        self.arity = Arity::Multi;
        self.coerce_default();
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Placeholder shown after the option in usage text.
    pub fn value_name(mut self, name: &str) -> Self {
        self.value_name = name.to_string();
        self
    }

    /// Value reported while the option is unset. It is stored as the
    /// declared value type, so `default_val(0.5)` on a `Float` option reads
    /// back as `f32`. A default that cannot be stored that way fails the
    /// parse with `ParseError::InvalidDefault`.
    pub fn default_val<T: IntoValue>(mut self, v: T) -> Self {
        self.given_default = Some(v.into_value());
        self.coerce_default();
        self
    }

    fn coerce_default(&mut self) {
        self.default_value = self
            .given_default
            .as_ref()
            .and_then(|v| v.coerce(self.arg_type));
    }

    // -- declaration accessors --

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn short_name(&self) -> Option<char> {
        self.short_name
    }

    pub fn has_long(&self) -> bool {
        !self.long_name.is_empty()
    }

    pub fn value_type(&self) -> ArgType {
        self.arg_type
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn takes_arg(&self) -> bool {
        self.arity != Arity::None
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_value_name(&self) -> &str {
        &self.value_name
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// The default as given, when it does not fit the declared value type.
    pub fn invalid_default(&self) -> Option<&Value> {
        match (&self.given_default, &self.default_value) {
            (Some(given), None) => Some(given),
            _ => None,
        }
    }

    /// `-s|--long`, `-s` or `--long`, joined by `separator`.
    pub fn display_name(&self, separator: &str) -> String {
        let mut name = String::new();
        if let Some(c) = self.short_name {
            name.push('-');
            name.push(c);
        }
        if self.has_long() {
            if self.short_name.is_some() {
                name.push_str(separator);
            }
            name.push_str("--");
            name.push_str(&self.long_name);
        }
        name
    }

    // -- parse results --

    /// Was the option given at least once?
    pub fn is_set(&self) -> bool {
        self.found
    }

    /// How many times the option was given.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Raw texts that failed conversion and were dropped.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Current value if one was stored, else the default. For multi-value
    /// options this is the last stored value.
    pub fn value(&self) -> Option<&Value> {
        self.values.last().or(self.default_value.as_ref())
    }

    /// Typed value. Flags report whether they were found.
    pub fn get<T: FromValue>(&self) -> std::result::Result<T, ValueError> {
        if self.arity == Arity::None {
            return self.typed(&Value::Bool(self.found));
        }
        match self.value() {
            Some(v) => self.typed(v),
            None => Err(ValueError::NotSet {
                name: self.display_name("|"),
            }),
        }
    }

    /// Every stored value in order; the default as a one-element list when
    /// nothing was stored.
    pub fn get_all<T: FromValue>(&self) -> std::result::Result<Vec<T>, ValueError> {
        if self.values.is_empty() {
            return match &self.default_value {
                Some(v) => Ok(vec![self.typed(v)?]),
                None => Ok(Vec::new()),
            };
        }
        self.values.iter().map(|v| self.typed(v)).collect()
    }

    fn typed<T: FromValue>(&self, v: &Value) -> std::result::Result<T, ValueError> {
        T::from_value(v).ok_or_else(|| ValueError::TypeMismatch {
            name: self.display_name("|"),
            expected: std::any::type_name::<T>(),
        })
    }

    // -- mutation, driven by the parser --

    /// Back to the never-parsed state, declaration untouched.
    pub(crate) fn reset(&mut self) {
        self.found = false;
        self.count = 0;
        self.values.clear();
        self.rejected.clear();
    }

    pub(crate) fn mark_found(&mut self) {
        self.found = true;
        self.count += 1;
    }

    pub(crate) fn store(&mut self, value: Value) {
        self.mark_found();
        if self.arity != Arity::Multi {
            self.values.clear();
        }
        self.values.push(value);
    }

    /// Lenient conversion failure: the option counts as given but holds no
    /// value of its own, so reads fall back to the default. Earlier values
    /// of a multi-value option are kept.
    pub(crate) fn reject(&mut self, err: ConversionError) {
        self.mark_found();
        if self.arity != Arity::Multi {
            self.values.clear();
        }
        self.rejected.push(err.raw);
    }
}
