//! The tokenizer/resolver: one pass over argv against an `OptionTable`.

use tracing::{debug, warn};

use crate::error::{Failure, ParseError, Result};
use crate::opt::Opt;
use crate::table::{MatchOutcome, OptionTable};
use crate::usage;
use crate::value::{Convert, StdConvert};

/// Registered options plus parse settings.
///
/// The parser borrows every descriptor mutably; read the descriptors back
/// once it is gone (a temporary chain as below, or an inner block).
///
/// ```
/// use cmdopt::{ArgType, Opt, Parser};
///
/// let mut debug = Opt::new("debug").short('d');
/// let mut user = Opt::new("username").short('u').arg_type(ArgType::String).mandatory();
///
/// let rest = Parser::new()
///     .option(&mut debug)
///     .option(&mut user)
///     .parse(["prog", "-d", "-u", "Mariano", "extra"])
///     .unwrap();
///
/// assert!(debug.is_set());
/// assert_eq!(user.get::<String>().unwrap(), "Mariano");
/// assert_eq!(rest, vec!["extra"]);
/// ```
pub struct Parser<'a> {
    name: Option<String>,
    argv0: String,
    table: OptionTable<'a>,
    strict: bool,
    converter: Box<dyn Convert + 'a>,
}

impl<'a> Parser<'a> {
    pub fn new() -> Self {
        Parser {
            name: None,
            argv0: String::new(),
            table: OptionTable::new(),
            strict: false,
            converter: Box::new(StdConvert),
        }
    }

    /// Name shown in usage text. Defaults to argv[0].
    pub fn program_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Drop the built-in `-h`/`--help` option.
    pub fn without_help(mut self) -> Self {
        self.table.set_help(false);
        self
    }

    /// Fail the parse on values that do not convert, instead of falling
    /// back to the default.
    pub fn strict_values(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn converter<C: Convert + 'a>(mut self, converter: C) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn option(mut self, opt: &'a mut Opt) -> Self {
        self.table.push(opt);
        self
    }

    pub fn table(&self) -> &OptionTable<'a> {
        &self.table
    }

    pub fn usage(&self) -> String {
        usage::render(self.name.as_deref().unwrap_or(&self.argv0), &self.table)
    }

    /// Parse the process arguments.
    pub fn parse_env(&mut self) -> Result<Vec<String>> {
        self.parse(std::env::args())
    }

    /// Parse `argv` (element 0 is the program) into the registered
    /// descriptors and return the positional arguments.
    ///
    /// Every descriptor starts the pass unset, so a parser can be reused.
    pub fn parse<I, S>(&mut self, argv: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = argv.into_iter().map(Into::into).collect();
        self.argv0 = args.first().cloned().unwrap_or_default();
        for idx in 0..self.table.len() {
            if let Some(opt) = self.table.get_mut(idx) {
                opt.reset();
            }
        }
        self.run(&args).map_err(|error| Failure {
            error,
            usage: self.usage(),
        })
    }

    fn run(&mut self, args: &[String]) -> std::result::Result<Vec<String>, ParseError> {
        self.check_definitions()?;

        let mut positionals = Vec::new();
        let mut next = 1;
        while next < args.len() {
            let position = next;
            let arg = &args[position];
            next += 1;

            if arg.is_empty() {
                continue;
            }
            if !arg.starts_with('-') {
                debug!(position, arg = %arg, "positional argument");
                positionals.push(arg.clone());
                continue;
            }

            let (idx, inline) = self.resolve(arg, position)?;
            let takes_arg = self.table.get(idx).is_some_and(Opt::takes_arg);

            if !takes_arg {
                if let Some(value) = inline {
                    warn!(option = %arg, value = %value, "flag does not take a value, ignoring it");
                }
                if let Some(opt) = self.table.get_mut(idx) {
                    debug!(position, option = %opt.display_name("|"), "flag");
                    opt.mark_found();
                }
                continue;
            }

            // the value token is taken verbatim, even if it looks like an option
            let raw = match inline {
                Some(value) => value,
                None => match args.get(next) {
                    Some(value) => {
                        next += 1;
                        value.clone()
                    }
                    None => {
                        return Err(ParseError::MissingValue { token: arg.clone() });
                    }
                },
            };
            self.apply(idx, arg, &raw)?;
        }

        if let Some(help) = self.table.help_index() {
            if self.table.get(help).is_some_and(Opt::is_set) {
                return Err(ParseError::HelpRequested);
            }
        }

        let missing: Vec<String> = self
            .table
            .iter()
            .filter(|o| o.is_mandatory() && !o.is_set())
            .map(|o| o.display_name("|"))
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingMandatory { options: missing });
        }

        Ok(positionals)
    }

    fn check_definitions(&self) -> std::result::Result<(), ParseError> {
        for (index, opt) in self.table.iter().enumerate() {
            if opt.short_name().is_none() && !opt.has_long() {
                return Err(ParseError::InvalidDefinition { index });
            }
            if let Some(value) = opt.invalid_default() {
                return Err(ParseError::InvalidDefault {
                    option: opt.display_name("|"),
                    value: value.clone(),
                    expected: opt.value_type(),
                });
            }
        }
        for name in self.table.shadowed() {
            warn!(option = %name, "option registered twice, the first registration wins");
        }
        Ok(())
    }

    /// Classify an option token and find its descriptor. Returns the
    /// descriptor index and the inline value, if any.
    fn resolve(
        &self,
        arg: &str,
        position: usize,
    ) -> std::result::Result<(usize, Option<String>), ParseError> {
        let body = &arg[1..];
        let mut chars = body.chars();
        match chars.next() {
            None => Err(ParseError::MalformedToken { position }),
            Some('-') => self.resolve_long(arg, &body[1..], position),
            Some(c) => {
                let idx = self
                    .table
                    .find_by_short(c)
                    .ok_or_else(|| ParseError::UnknownOption {
                        token: arg.to_string(),
                        position,
                    })?;
                let rest = chars.as_str();
                Ok((idx, (!rest.is_empty()).then(|| rest.to_string())))
            }
        }
    }

    fn resolve_long(
        &self,
        arg: &str,
        long: &str,
        position: usize,
    ) -> std::result::Result<(usize, Option<String>), ParseError> {
        if long.is_empty() {
            return Err(ParseError::MalformedToken { position });
        }
        let (name, inline) = match long.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (long, None),
        };

        match self.table.find_by_long(name) {
            MatchOutcome::Exact(idx) => Ok((idx, inline)),
            MatchOutcome::Prefix(idx) => {
                debug!(position, prefix = %name, "abbreviated long option");
                Ok((idx, inline))
            }
            MatchOutcome::NotFound => Err(ParseError::UnknownOption {
                token: arg.to_string(),
                position,
            }),
            MatchOutcome::Ambiguous(candidates) => Err(ParseError::AmbiguousOption {
                token: arg.to_string(),
                position,
                candidates: candidates
                    .iter()
                    .filter_map(|&i| self.table.get(i))
                    .map(|o| o.long_name().to_string())
                    .collect(),
            }),
        }
    }

    fn apply(&mut self, idx: usize, token: &str, raw: &str) -> std::result::Result<(), ParseError> {
        let Some(opt) = self.table.get_mut(idx) else {
            return Ok(());
        };
        match self.converter.convert(opt.value_type(), raw) {
            Ok(value) => {
                debug!(option = %opt.display_name("|"), value = %value, "option value");
                opt.store(value);
            }
            Err(source) if self.strict => {
                return Err(ParseError::InvalidValue {
                    token: token.to_string(),
                    source,
                });
            }
            Err(err) => {
                warn!(option = %opt.display_name("|"), "{}, falling back to the default", err);
                opt.reject(err);
            }
        }
        Ok(())
    }
}

impl Default for Parser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use crate::value::{ArgType, Value};

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("prog")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    // -- positionals and flags --

    #[test]
    fn debug_username_scenario() {
        let mut debug = Opt::new("debug").short('d');
        let mut user = Opt::new("username")
            .short('u')
            .arg_type(ArgType::String)
            .mandatory();
        let rest = Parser::new()
            .option(&mut debug)
            .option(&mut user)
            .parse(argv(&["-d", "-u", "Mariano", "extra"]))
            .unwrap();
        assert!(debug.is_set());
        assert_eq!(user.get::<String>(), Ok("Mariano".to_string()));
        assert_eq!(rest, vec!["extra"]);
    }

    #[test]
    fn positionals_keep_order_and_duplicates() {
        let mut debug = Opt::new("debug").short('d');
        let rest = Parser::new()
            .option(&mut debug)
            .parse(argv(&["b", "a", "-d", "b", "", "c"]))
            .unwrap();
        assert_eq!(rest, vec!["b", "a", "b", "c"]);
        assert!(debug.is_set());
    }

    #[test]
    fn positionals_leave_descriptors_untouched() {
        let mut debug = Opt::new("debug").short('d');
        let mut name = Opt::new("name").short('n').arg_type(ArgType::String);
        let rest = Parser::new()
            .option(&mut debug)
            .option(&mut name)
            .parse(argv(&["debug", "name", "d"]))
            .unwrap();
        assert_eq!(rest, vec!["debug", "name", "d"]);
        assert!(!debug.is_set());
        assert!(!name.is_set());
    }

    #[test]
    fn flag_does_not_change_positionals() {
        let mut verbose = Opt::new("verbose").short('v');
        let rest = Parser::new()
            .option(&mut verbose)
            .parse(argv(&["-v", "--verbose"]))
            .unwrap();
        assert!(rest.is_empty());
        assert!(verbose.is_set());
        assert_eq!(verbose.count(), 2);
    }

    #[test]
    fn flag_ignores_inline_value() {
        let mut debug = Opt::new("debug").short('d');
        let rest = Parser::new()
            .option(&mut debug)
            .parse(argv(&["--debug=yes", "-dx", "next"]))
            .unwrap();
        assert!(debug.is_set());
        assert_eq!(rest, vec!["next"]);
    }

    #[test]
    fn argv0_only() {
        let mut debug = Opt::new("debug").short('d');
        let rest = Parser::new().option(&mut debug).parse(["prog"]).unwrap();
        assert!(rest.is_empty());
        assert!(!debug.is_set());
        let rest = Parser::new().parse(Vec::<String>::new()).unwrap();
        assert!(rest.is_empty());
    }

    // -- value forms --

    #[test]
    fn four_value_forms_agree() {
        for args in [
            &["-pvalue"][..],
            &["-p", "value"][..],
            &["--path=value"][..],
            &["--path", "value"][..],
            &["--pa=value"][..],
        ] {
            let mut path = Opt::new("path").short('p').arg_type(ArgType::String);
            let rest = Parser::new().option(&mut path).parse(argv(args)).unwrap();
            assert!(rest.is_empty(), "{:?}", args);
            assert_eq!(path.get::<String>(), Ok("value".to_string()), "{:?}", args);
        }
    }

    #[test]
    fn short_inline_value_is_verbatim() {
        let mut path = Opt::new("path").short('p').arg_type(ArgType::String);
        Parser::new()
            .option(&mut path)
            .parse(argv(&["-p=x"]))
            .unwrap();
        assert_eq!(path.get::<String>(), Ok("=x".to_string()));
    }

    #[test]
    fn long_inline_splits_at_first_equals() {
        let mut define = Opt::new("define").arg_type(ArgType::String);
        Parser::new()
            .option(&mut define)
            .parse(argv(&["--define=a=b"]))
            .unwrap();
        assert_eq!(define.get::<String>(), Ok("a=b".to_string()));
    }

    #[test]
    fn empty_inline_value_is_a_value() {
        let mut name = Opt::new("name").arg_type(ArgType::String).default_val("dflt");
        let rest = Parser::new()
            .option(&mut name)
            .parse(argv(&["--name=", "after"]))
            .unwrap();
        assert_eq!(name.get::<String>(), Ok(String::new()));
        assert_eq!(rest, vec!["after"]);
    }

    #[test]
    fn consumed_value_is_never_reinterpreted() {
        let mut name = Opt::new("name").short('n').arg_type(ArgType::String);
        let mut debug = Opt::new("debug").short('d');
        let rest = Parser::new()
            .option(&mut name)
            .option(&mut debug)
            .parse(argv(&["-n", "-d", "pos"]))
            .unwrap();
        assert_eq!(name.get::<String>(), Ok("-d".to_string()));
        assert!(!debug.is_set());
        assert_eq!(rest, vec!["pos"]);
    }

    #[test]
    fn last_single_value_wins() {
        let mut port = Opt::new("port").short('p').arg_type(ArgType::Int).default_val(23);
        Parser::new()
            .option(&mut port)
            .parse(argv(&["-p", "80", "--port=8080"]))
            .unwrap();
        assert_eq!(port.get::<i32>(), Ok(8080));
    }

    #[test]
    fn default_when_absent() {
        let mut port = Opt::new("port").short('p').arg_type(ArgType::Int).default_val(23);
        Parser::new().option(&mut port).parse(argv(&[])).unwrap();
        assert!(!port.is_set());
        assert_eq!(port.get::<i32>(), Ok(23));
    }

    #[test]
    fn default_reads_as_declared_type() {
        let mut ratio = Opt::new("ratio").arg_type(ArgType::Float).default_val(0.5);
        Parser::new().option(&mut ratio).parse(argv(&[])).unwrap();
        assert!(!ratio.is_set());
        assert_eq!(ratio.get::<f32>(), Ok(0.5));

        let mut ratio = Opt::new("ratio").arg_type(ArgType::Float).default_val(0.5);
        Parser::new()
            .option(&mut ratio)
            .parse(argv(&["--ratio", "0.25"]))
            .unwrap();
        assert_eq!(ratio.get::<f32>(), Ok(0.25));
    }

    #[test]
    fn default_of_wrong_kind_fails_the_parse() {
        let mut name = Opt::new("name").short('n').arg_type(ArgType::String).default_val(23);
        let failure = Parser::new()
            .option(&mut name)
            .parse(argv(&["-n", "x"]))
            .unwrap_err();
        assert_eq!(
            failure.error,
            ParseError::InvalidDefault {
                option: "-n|--name".into(),
                value: Value::Int(23),
                expected: ArgType::String,
            }
        );
        assert!(!name.is_set());
    }

    #[test]
    fn multi_value_accumulates_in_order() {
        let mut book = Opt::new("book").short('b').multi();
        Parser::new()
            .option(&mut book)
            .parse(argv(&["--book=a", "--book=b", "-bc", "-b", "d"]))
            .unwrap();
        assert_eq!(
            book.get_all::<String>(),
            Ok(vec!["a".into(), "b".into(), "c".into(), "d".into()])
        );
        assert_eq!(book.count(), 4);
    }

    #[test]
    fn typed_values() {
        let mut ratio = Opt::new("ratio").arg_type(ArgType::Float);
        let mut big = Opt::new("big").arg_type(ArgType::Long);
        let mut precise = Opt::new("precise").arg_type(ArgType::Double);
        Parser::new()
            .option(&mut ratio)
            .option(&mut big)
            .option(&mut precise)
            .parse(argv(&["--ratio", "0.5", "--big=5000000000", "--precise", "1.25"]))
            .unwrap();
        assert_eq!(ratio.get::<f32>(), Ok(0.5));
        assert_eq!(big.get::<i64>(), Ok(5_000_000_000));
        assert_eq!(precise.get::<f64>(), Ok(1.25));
    }

    // -- errors --

    #[test]
    fn ambiguous_prefix() {
        let mut port = Opt::new("port").short('p').arg_type(ArgType::Int).default_val(23);
        let mut portability = Opt::new("portability").short('n').arg_type(ArgType::Float);
        let failure = Parser::new()
            .option(&mut port)
            .option(&mut portability)
            .parse(argv(&["--por=80"]))
            .unwrap_err();
        assert_eq!(
            failure.error,
            ParseError::AmbiguousOption {
                token: "--por=80".into(),
                position: 1,
                candidates: vec!["port".into(), "portability".into()],
            }
        );
        assert!(!port.is_set());
        assert!(!portability.is_set());
    }

    #[test]
    fn unique_abbreviation_resolves() {
        let mut port = Opt::new("port").short('p').arg_type(ArgType::Int);
        let mut portability = Opt::new("portability").short('n').arg_type(ArgType::Float);
        Parser::new()
            .option(&mut port)
            .option(&mut portability)
            .parse(argv(&["--PORTA", "2.5", "--Port", "80"]))
            .unwrap();
        assert_eq!(portability.get::<f32>(), Ok(2.5));
        assert_eq!(port.get::<i32>(), Ok(80));
    }

    #[test]
    fn malformed_tokens() {
        for (args, position) in [(&["-"][..], 1), (&["x", "--"][..], 2)] {
            let failure = Parser::new().parse(argv(args)).unwrap_err();
            assert_eq!(failure.error, ParseError::MalformedToken { position });
        }
    }

    #[test]
    fn unknown_short_and_long() {
        let failure = Parser::new().parse(argv(&["-x"])).unwrap_err();
        assert_eq!(
            failure.error,
            ParseError::UnknownOption {
                token: "-x".into(),
                position: 1
            }
        );
        let failure = Parser::new().parse(argv(&["a", "--nope=1"])).unwrap_err();
        assert_eq!(
            failure.error,
            ParseError::UnknownOption {
                token: "--nope=1".into(),
                position: 2
            }
        );
        let failure = Parser::new().parse(argv(&["--=1"])).unwrap_err();
        assert!(matches!(failure.error, ParseError::UnknownOption { .. }));
    }

    #[test]
    fn missing_value() {
        let mut user = Opt::new("username").short('u').arg_type(ArgType::String);
        let failure = Parser::new()
            .option(&mut user)
            .parse(argv(&["-u"]))
            .unwrap_err();
        assert_eq!(
            failure.error,
            ParseError::MissingValue { token: "-u".into() }
        );
        assert!(failure.to_string().contains("needs an additional argument"));
    }

    #[test]
    fn first_error_stops_the_pass() {
        let mut debug = Opt::new("debug").short('d');
        let failure = Parser::new()
            .option(&mut debug)
            .parse(argv(&["-x", "-d"]))
            .unwrap_err();
        assert!(matches!(failure.error, ParseError::UnknownOption { .. }));
        assert!(!debug.is_set());
    }

    #[test]
    fn missing_mandatory_lists_all_in_order() {
        let mut user = Opt::new("username").short('u').arg_type(ArgType::String).mandatory();
        let mut host = Opt::new("host").arg_type(ArgType::String).mandatory();
        let mut key = Opt::short_only('k').mandatory();
        let failure = Parser::new()
            .option(&mut user)
            .option(&mut host)
            .option(&mut key)
            .parse(argv(&["-k", "pos"]))
            .unwrap_err();
        assert_eq!(
            failure.error,
            ParseError::MissingMandatory {
                options: vec!["-u|--username".into(), "--host".into()]
            }
        );
        assert!(key.is_set());
    }

    #[test]
    fn help_is_reported_before_missing_mandatory() {
        let mut user = Opt::new("username").short('u').arg_type(ArgType::String).mandatory();
        let failure = Parser::new()
            .program_name("tool")
            .option(&mut user)
            .parse(argv(&["--help"]))
            .unwrap_err();
        assert!(failure.is_help());
        assert!(failure.to_string().starts_with("Usage: tool [-h|--help] -u|--username value\n"));
    }

    #[test]
    fn without_help_h_is_unknown() {
        let failure = Parser::new().without_help().parse(argv(&["-h"])).unwrap_err();
        assert!(matches!(failure.error, ParseError::UnknownOption { .. }));
    }

    #[test]
    fn user_h_is_shadowed_by_help() {
        let mut host = Opt::new("host").short('h').arg_type(ArgType::String);
        let failure = Parser::new()
            .option(&mut host)
            .parse(argv(&["-h", "example.org"]))
            .unwrap_err();
        assert!(failure.is_help());
        assert!(!host.is_set());
    }

    #[test]
    fn nameless_definition_rejected() {
        let mut nameless = Opt::new("");
        let failure = Parser::new()
            .option(&mut nameless)
            .parse(argv(&[]))
            .unwrap_err();
        assert_eq!(failure.error, ParseError::InvalidDefinition { index: 1 });
    }

    #[test]
    fn parser_is_reusable_after_help() {
        let mut debug = Opt::new("debug").short('d');
        let mut parser = Parser::new().option(&mut debug);
        assert!(parser.parse(argv(&["--help", "-d"])).unwrap_err().is_help());
        assert_eq!(parser.parse(argv(&["pos"])), Ok(vec!["pos".to_string()]));
        assert!(parser.table().iter().all(|o| !o.is_set()));

        let failure = parser.parse(["/bin/other", "-x"]).unwrap_err();
        assert!(failure.usage.starts_with("Usage: /bin/other [-h|--help]"));
    }

    #[test]
    fn failure_carries_usage_with_argv0() {
        let mut debug = Opt::new("debug").short('d');
        let failure = Parser::new()
            .option(&mut debug)
            .parse(["/usr/bin/tool", "-q"])
            .unwrap_err();
        assert!(failure.usage.starts_with("Usage: /usr/bin/tool [-h|--help] [-d|--debug]\n"));
        assert!(failure
            .to_string()
            .starts_with("Unknown option '-q' (see arg number 1)\nUsage: "));
    }

    // -- conversion policy --

    #[test]
    fn lenient_conversion_keeps_default() {
        let mut port = Opt::new("port").short('p').arg_type(ArgType::Int).default_val(23);
        let rest = Parser::new()
            .option(&mut port)
            .parse(argv(&["--port", "eighty", "x"]))
            .unwrap();
        assert_eq!(rest, vec!["x"]);
        assert!(port.is_set());
        assert_eq!(port.get::<i32>(), Ok(23));
        assert_eq!(port.rejected(), ["eighty".to_string()]);
    }

    #[test]
    fn strict_conversion_fails() {
        let mut port = Opt::new("port").short('p').arg_type(ArgType::Int);
        let failure = Parser::new()
            .strict_values()
            .option(&mut port)
            .parse(argv(&["-peighty"]))
            .unwrap_err();
        match failure.error {
            ParseError::InvalidValue { token, source } => {
                assert_eq!(token, "-peighty");
                assert_eq!(source.raw, "eighty");
                assert_eq!(source.expected, ArgType::Int);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn custom_converter() {
        let hex = |ty: ArgType, raw: &str| match ty {
            ArgType::Int => i32::from_str_radix(raw.trim_start_matches("0x"), 16)
                .map(Value::Int)
                .map_err(|e| ConversionError {
                    raw: raw.to_string(),
                    expected: ty,
                    reason: e.to_string(),
                }),
            _ => StdConvert.convert(ty, raw),
        };
        let mut mask = Opt::new("mask").arg_type(ArgType::Int);
        let mut label = Opt::new("label").arg_type(ArgType::String);
        Parser::new()
            .converter(hex)
            .option(&mut mask)
            .option(&mut label)
            .parse(argv(&["--mask=0xff", "--label", "ff"]))
            .unwrap();
        assert_eq!(mask.get::<i32>(), Ok(255));
        assert_eq!(label.get::<String>(), Ok("ff".to_string()));
    }
}
