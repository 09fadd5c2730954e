//! The option registry: registered descriptors in order, plus lookups.

use crate::opt::Opt;

/// Result of resolving a long option name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    NotFound,
    Exact(usize),
    Prefix(usize),
    /// Every descriptor tied at the best score, in registration order.
    Ambiguous(Vec<usize>),
}

/// Ordered descriptor references.
///
/// Indices are registration order, with the built-in help option at 0
/// when it is enabled. Lookups return the first match, so a later
/// descriptor reusing a name is shadowed.
pub struct OptionTable<'a> {
    help: Option<Opt>,
    options: Vec<&'a mut Opt>,
}

impl<'a> OptionTable<'a> {
    pub fn new() -> Self {
        OptionTable {
            help: Some(help_option()),
            options: Vec::new(),
        }
    }

    /// A table without the built-in `-h`/`--help`.
    pub fn without_help() -> Self {
        OptionTable {
            help: None,
            options: Vec::new(),
        }
    }

    pub fn push(&mut self, opt: &'a mut Opt) {
        self.options.push(opt);
    }

    pub fn set_help(&mut self, enabled: bool) {
        match (enabled, self.help.is_some()) {
            (true, false) => self.help = Some(help_option()),
            (false, true) => self.help = None,
            _ => {}
        }
    }

    pub fn help_index(&self) -> Option<usize> {
        self.help.as_ref().map(|_| 0)
    }

    pub fn len(&self) -> usize {
        self.options.len() + usize::from(self.help.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Opt> + '_ {
        self.help.iter().chain(self.options.iter().map(|o| &**o))
    }

    pub fn get(&self, idx: usize) -> Option<&Opt> {
        match (&self.help, idx) {
            (Some(help), 0) => Some(help),
            (Some(_), i) => self.options.get(i - 1).map(|o| &**o),
            (None, i) => self.options.get(i).map(|o| &**o),
        }
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Opt> {
        match (&mut self.help, idx) {
            (Some(help), 0) => Some(help),
            (Some(_), i) => self.options.get_mut(i - 1).map(|o| &mut **o),
            (None, i) => self.options.get_mut(i).map(|o| &mut **o),
        }
    }

    /// First descriptor whose short character is exactly `c`.
    pub fn find_by_short(&self, c: char) -> Option<usize> {
        self.iter().position(|o| o.short_name() == Some(c))
    }

    /// Resolve a long name: exact (case-insensitive) match first, then the
    /// best prefix match.
    pub fn find_by_long(&self, name: &str) -> MatchOutcome {
        if name.is_empty() {
            return MatchOutcome::NotFound;
        }

        if let Some(idx) = self
            .iter()
            .position(|o| o.has_long() && eq_ignore_case(o.long_name(), name))
        {
            return MatchOutcome::Exact(idx);
        }

        let mut best = 0;
        let mut tied: Vec<usize> = Vec::new();
        for (idx, opt) in self.iter().enumerate() {
            if !opt.has_long() {
                continue;
            }
            let score = prefix_score(name, opt.long_name());
            if score == 0 || score < best {
                continue;
            }
            if score > best {
                best = score;
                tied.clear();
            }
            // a shadowed duplicate is not a second candidate
            let duplicate = tied.iter().any(|&i| {
                self.get(i)
                    .is_some_and(|o| eq_ignore_case(o.long_name(), opt.long_name()))
            });
            if !duplicate {
                tied.push(idx);
            }
        }

        match tied.len() {
            0 => MatchOutcome::NotFound,
            1 => MatchOutcome::Prefix(tied[0]),
            _ => MatchOutcome::Ambiguous(tied),
        }
    }

    /// Names that repeat an earlier registration and so can never match.
    pub fn shadowed(&self) -> Vec<String> {
        let mut shadowed = Vec::new();
        let opts: Vec<&Opt> = self.iter().collect();
        for (i, opt) in opts.iter().enumerate() {
            let earlier = &opts[..i];
            if let Some(c) = opt.short_name() {
                if earlier.iter().any(|o| o.short_name() == Some(c)) {
                    shadowed.push(format!("-{}", c));
                }
            }
            if opt.has_long()
                && earlier
                    .iter()
                    .any(|o| o.has_long() && eq_ignore_case(o.long_name(), opt.long_name()))
            {
                shadowed.push(format!("--{}", opt.long_name()));
            }
        }
        shadowed
    }
}

impl Default for OptionTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn help_option() -> Opt {
    Opt::new("help").short('h').description("print this help")
}

/// Number of leading characters of `candidate` that match `long_name`,
/// ignoring case. Zero unless the whole candidate is a prefix of the name.
pub fn prefix_score(candidate: &str, long_name: &str) -> usize {
    let mut name = long_name.chars();
    let mut score = 0;
    for c in candidate.chars() {
        match name.next() {
            Some(n) if chars_eq_ignore_case(c, n) => score += 1,
            _ => return 0,
        }
    }
    score
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
