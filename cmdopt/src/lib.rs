//! Declarative command-line option parsing.
//!
//! Options are declared as [`Opt`] values owned by the caller, lent to a
//! [`Parser`] by mutable reference, and filled in place by one pass over
//! argv:
//! - `-x`, `-xVALUE`, `-x VALUE` for short options
//! - `--name`, `--name=VALUE`, `--name VALUE` for long options, where any
//!   unambiguous prefix of a long name (case-insensitive) is accepted
//! - every token not starting with `-` is returned as a positional
//!
//! A parse ends either with the positional list or with a [`Failure`]
//! carrying the error and the rendered usage text. Printing and exiting
//! are left to the caller.

mod error;
mod opt;
mod parser;
mod table;
pub mod usage;
mod value;

pub use error::{ConversionError, Failure, ParseError, Result, ValueError};
pub use opt::{Arity, Opt};
pub use parser::Parser;
pub use table::{prefix_score, MatchOutcome, OptionTable};
pub use value::{ArgType, Convert, FromValue, IntoValue, StdConvert, Value};
