// crates/t2-core/src/parser.rs - Argv parsing against a command definition
//
// Parsing is delegated to clap's builder API: each CommandSpec becomes one
// `Arg`. Values come back as raw strings; coercion, defaults and enumerated
// validation belong to the resolver so that every diagnostic has the
// "<flag> Invalid" shape regardless of which stage rejected the input.
//
// Flags accept an optional `=value` (`--full=true`, `--generate=1`) and are
// `true` whenever present. `require_equals` keeps `--on --test` from being
// read as `--on=--test`.

use clap::error::{ContextKind, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indexmap::IndexMap;

use crate::error::{CliError, CliResult};
use crate::registry::{CommandDef, CommandSpec, OptionKind};

/// Option name -> raw text for every option given on the command line
pub type RawValues = IndexMap<&'static str, String>;

/// Build the clap command for one definition
pub fn build_command(def: &CommandDef) -> Command {
    let mut command = Command::new(def.name.as_str())
        .about(def.name.about())
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true);

    for spec in def.specs() {
        command = command.arg(build_arg(spec));
    }

    command
}

fn build_arg(spec: &CommandSpec) -> Arg {
    let mut arg = Arg::new(spec.name).help(spec.help);

    if let Some(position) = spec.position {
        arg = arg.index(position).action(ArgAction::Set);
    } else {
        arg = arg.long(spec.name);
        if let Some(abbr) = spec.abbr {
            arg = arg.short(abbr);
        }
    }

    if let Some(metavar) = spec.metavar {
        arg = arg.value_name(metavar);
    }

    match spec.kind {
        OptionKind::Flag => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        OptionKind::Number => arg
            .action(ArgAction::Set)
            .num_args(1)
            .allow_negative_numbers(true),
        OptionKind::List => arg
            .action(ArgAction::Set)
            .num_args(1)
            .allow_hyphen_values(true),
        OptionKind::Boolean | OptionKind::Text => arg.action(ArgAction::Set).num_args(1),
    }
}

/// Parse `argv` (command name first) into raw option text
pub fn parse(def: &CommandDef, argv: &[String]) -> CliResult<RawValues> {
    let matches = build_command(def)
        .try_get_matches_from(argv)
        .map_err(map_clap_error)?;

    Ok(collect(def, &matches))
}

fn collect(def: &CommandDef, matches: &ArgMatches) -> RawValues {
    def.specs()
        .filter_map(|spec| {
            matches
                .get_one::<String>(spec.name)
                .map(|value| (spec.name, value.clone()))
        })
        .collect()
}

fn map_clap_error(err: clap::Error) -> CliError {
    let arg = err
        .get(ContextKind::InvalidArg)
        .map(|value| value.to_string())
        .map(|value| {
            // "--timeout <TIMEOUT>" -> "--timeout"
            value
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        });

    match (err.kind(), arg) {
        (ErrorKind::UnknownArgument, Some(arg)) => {
            CliError::Parse(format!("Unrecognized argument: {}", arg))
        }
        (
            ErrorKind::InvalidValue
            | ErrorKind::NoEquals
            | ErrorKind::WrongNumberOfValues
            | ErrorKind::TooFewValues
            | ErrorKind::TooManyValues
            | ErrorKind::ValueValidation,
            Some(flag),
        ) => CliError::validation(
            flag,
            err.kind().as_str().unwrap_or("bad value").to_lowercase(),
        ),
        _ => CliError::Parse(err.render().to_string().trim().to_string()),
    }
}
