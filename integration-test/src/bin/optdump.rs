// Test runner binary: declares a fixed option set, parses argv with cmdopt
// and prints one `name: ...` line per option plus the positionals.
//
// RUST_LOG filters the library's tracing output (stderr).
// OPTDUMP_STRICT makes values that do not convert fail the parse.

use cmdopt::{ArgType, Arity, Opt, Parser, Value};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let strict = std::env::var_os("OPTDUMP_STRICT").is_some();

    let mut debug = Opt::new("debug")
        .short('d')
        .description("enables the debug mode");
    let mut input = Opt::new("input-script")
        .short('i')
        .arg_type(ArgType::String)
        .description("set the inputs script to be read");
    let mut username = Opt::new("username")
        .short('u')
        .arg_type(ArgType::String)
        .mandatory()
        .value_name("name")
        .description("user to run as");
    let mut port = Opt::new("port")
        .short('p')
        .arg_type(ArgType::Int)
        .default_val(23)
        .description("port to connect to");
    let mut portability = Opt::new("portability")
        .short('n')
        .arg_type(ArgType::Float)
        .description("portability factor");
    let mut book = Opt::new("book")
        .short('b')
        .multi()
        .description("book to read, can be repeated");
    let mut verbose = Opt::short_only('v').description("more output");

    let parsed = {
        let mut parser = Parser::new()
            .program_name("optdump")
            .option(&mut debug)
            .option(&mut input)
            .option(&mut username)
            .option(&mut port)
            .option(&mut portability)
            .option(&mut book)
            .option(&mut verbose);
        if strict {
            parser = parser.strict_values();
        }
        parser.parse_env()
    };

    let positionals = match parsed {
        Ok(rest) => rest,
        Err(failure) => failure.exit(),
    };

    for opt in [&debug, &input, &username, &port, &portability, &book, &verbose] {
        println!("{}", report(opt));
    }
    println!("positionals: [{}]", positionals.join(", "));
}

fn report(opt: &Opt) -> String {
    let label = if opt.has_long() {
        opt.long_name().to_string()
    } else {
        opt.display_name("|")
    };
    let mut line = match opt.arity() {
        Arity::None => format!("{}: set={} count={}", label, opt.is_set(), opt.count()),
        Arity::Single => format!(
            "{}: set={} value={}",
            label,
            opt.is_set(),
            opt.value().map(Value::to_string).unwrap_or_default()
        ),
        Arity::Multi => {
            let values: Vec<String> = opt
                .get_all::<Value>()
                .unwrap_or_default()
                .iter()
                .map(Value::to_string)
                .collect();
            format!("{}: set={} values=[{}]", label, opt.is_set(), values.join(", "))
        }
    };
    if !opt.rejected().is_empty() {
        line.push_str(&format!(" rejected=[{}]", opt.rejected().join(", ")));
    }
    line
}
