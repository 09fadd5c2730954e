//! Usage text: a one-line summary and a per-option description table.
//!
//! ```text
//! Usage: prog [-h|--help] [-d|--debug] -u|--username value
//! Options:
//!  -h, --help		print this help
//!  -d, --debug		enables the debug mode
//!  -u, --username value		user to log in as
//! ```

use std::fmt::Write;

use crate::opt::Opt;
use crate::table::OptionTable;

pub fn render(program: &str, table: &OptionTable<'_>) -> String {
    let mut out = String::new();

    let _ = write!(out, "Usage: {}", program);
    for opt in table.iter() {
        let _ = write!(out, " {}", summary_item(opt));
    }
    out.push('\n');

    out.push_str("Options:\n");
    for opt in table.iter() {
        let _ = write!(
            out,
            " {}\t\t{}\n",
            with_value_name(opt, opt.display_name(", ")),
            opt.get_description()
        );
    }
    out
}

/// `[-s|--long value]`, brackets dropped for mandatory options.
fn summary_item(opt: &Opt) -> String {
    let item = with_value_name(opt, opt.display_name("|"));
    if opt.is_mandatory() {
        item
    } else {
        format!("[{}]", item)
    }
}

fn with_value_name(opt: &Opt, mut text: String) -> String {
    if opt.takes_arg() {
        text.push(' ');
        text.push_str(opt.get_value_name());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArgType;

    #[test]
    fn summary_brackets_optional_options() {
        let debug = Opt::new("debug").short('d');
        let user = Opt::new("username")
            .short('u')
            .arg_type(ArgType::String)
            .mandatory();
        assert_eq!(summary_item(&debug), "[-d|--debug]");
        assert_eq!(summary_item(&user), "-u|--username value");
    }

    #[test]
    fn summary_uses_value_name() {
        let port = Opt::new("port").arg_type(ArgType::Int).value_name("PORT");
        assert_eq!(summary_item(&port), "[--port PORT]");
        let x = Opt::short_only('x').arg_type(ArgType::String);
        assert_eq!(summary_item(&x), "[-x value]");
    }

    #[test]
    fn render_full_usage() {
        let mut debug = Opt::new("debug").short('d').description("enables the debug mode");
        let mut user = Opt::new("username")
            .short('u')
            .arg_type(ArgType::String)
            .mandatory()
            .description("user to log in as");
        let mut table = OptionTable::new();
        table.push(&mut debug);
        table.push(&mut user);

        let text = render("prog", &table);
        assert_eq!(
            text,
            "Usage: prog [-h|--help] [-d|--debug] -u|--username value\n\
             Options:\n \
             -h, --help\t\tprint this help\n \
             -d, --debug\t\tenables the debug mode\n \
             -u, --username value\t\tuser to log in as\n"
        );
    }

    #[test]
    fn render_without_options() {
        let table = OptionTable::without_help();
        assert_eq!(render("prog", &table), "Usage: prog\nOptions:\n");
    }
}
