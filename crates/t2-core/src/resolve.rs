// crates/t2-core/src/resolve.rs - Option resolution
//
// Turns raw parser output into the immutable ResolvedOptions record:
//
// 1. coerce every option given on the command line to its declared kind
// 2. fill declared defaults for everything not given
// 3. check enumerated values (`--type`, `--security`, `--loglevel`, ...)
// 4. consult fallbacks for options that are still empty
// 5. attach command-fixed values (`push`) and passthrough arguments
//
// Fallbacks are lazy: the preference store is only read when the option
// is missing, and at most once per option.

use tracing::debug;

use crate::error::{CliError, CliResult};
use crate::options::{OptionValue, ResolvedOptions};
use crate::parser::{self, RawValues};
use crate::preferences::{ENTRY_POINT_KEY, PreferenceStore};
use crate::registry::{CommandDef, CommandName, CommandSpec, OptionKind};

/// Resolve one invocation's options
///
/// `argv` starts with the command name and has had any bracket group
/// removed already; `subargs` is that bracket group's content.
pub async fn resolve(
    def: &CommandDef,
    argv: &[String],
    subargs: Vec<String>,
    preferences: &dyn PreferenceStore,
) -> CliResult<ResolvedOptions> {
    let raw = parser::parse(def, argv)?;
    let mut options = apply_specs(def, &raw)?;

    apply_fallbacks(def.name, &mut options, preferences).await?;

    match def.name {
        CommandName::Run => options.insert("push", false),
        CommandName::Push => options.insert("push", true),
        CommandName::Install => options.insert("argv", argv.to_vec()),
        _ => {}
    }

    if def.name.takes_subargs() {
        options.insert("subargs", subargs);
    } else if !subargs.is_empty() {
        return Err(CliError::Parse(format!(
            "`{}` does not accept [ ... ] arguments",
            def.name
        )));
    }

    Ok(options)
}

/// Coercion, defaults and enumerated validation (steps 1-3)
pub fn apply_specs(def: &CommandDef, raw: &RawValues) -> CliResult<ResolvedOptions> {
    let mut options = ResolvedOptions::new();

    for spec in def.specs() {
        let value = match raw.get(spec.name) {
            Some(text) => Some(coerce(spec, text)?),
            None => spec.default.clone(),
        };

        if let Some(value) = value {
            check_choices(spec, &value)?;
            options.insert(spec.name, value);
        }
    }

    Ok(options)
}

fn coerce(spec: &CommandSpec, text: &str) -> CliResult<OptionValue> {
    let text = strip_quotes(text.trim());

    match spec.kind {
        OptionKind::Flag => Ok(OptionValue::Bool(true)),
        OptionKind::Boolean => match text {
            "true" => Ok(OptionValue::Bool(true)),
            "false" => Ok(OptionValue::Bool(false)),
            other => Err(CliError::validation(
                spec.string(),
                format!("expected true or false, got `{}`", other),
            )),
        },
        OptionKind::Number => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(OptionValue::Number)
            .ok_or_else(|| {
                CliError::validation(spec.string(), format!("`{}` is not a number", text))
            }),
        OptionKind::Text => Ok(OptionValue::Str(text.to_string())),
        OptionKind::List => Ok(OptionValue::List(
            text.split(',')
                .map(|item| strip_quotes(item.trim()))
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )),
    }
}

fn check_choices(spec: &CommandSpec, value: &OptionValue) -> CliResult<()> {
    if spec.choices.is_empty() {
        return Ok(());
    }
    match value.as_str() {
        Some(text) if spec.choices.contains(&text) => Ok(()),
        _ => Err(CliError::InvalidValue {
            flag: spec.string(),
            value: value.to_string(),
        }),
    }
}

/// Remove one layer of matching surrounding quotes
fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

async fn apply_fallbacks(
    command: CommandName,
    options: &mut ResolvedOptions,
    preferences: &dyn PreferenceStore,
) -> CliResult<()> {
    let wants_entry_point = matches!(
        command,
        CommandName::Restart | CommandName::Run | CommandName::Push
    );

    if wants_entry_point && options.get_str("entryPoint").is_none_or(str::is_empty) {
        match preferences.read(ENTRY_POINT_KEY).await? {
            Some(previous) if !previous.trim().is_empty() => {
                debug!(entry_point = %previous, "using previously deployed entry point");
                options.insert("entryPoint", previous);
            }
            _ => return Err(CliError::Unresolved("entry point file name")),
        }
    }

    Ok(())
}
