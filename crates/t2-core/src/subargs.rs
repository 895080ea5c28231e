// crates/t2-core/src/subargs.rs - Bracket-delimited passthrough arguments
//
// `t2 run index.js [--port 8080 -v]` hands everything between the brackets
// to the program running on the device. The group is cut out of argv before
// the option parser sees it, so flags inside it are never interpreted here.
//
// The shell may split the group any way it likes:
//   [0]          one token
//   [0 ]  /  [0  ]   opening bracket fused, closing bracket standalone
//   [ 0 ]        both standalone
//   []  /  [ ]   empty group
//
// Only one group is accepted. A second group, a nested `[`, a stray `]`
// or an unterminated `[` are parse errors.

use crate::error::{CliError, CliResult};

/// Argv split into the part the option parser sees and the passthrough run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitArgs {
    pub argv: Vec<String>,
    pub subargs: Vec<String>,
}

/// Cut the bracket group out of `args`
pub fn extract(args: &[String]) -> CliResult<SplitArgs> {
    let mut open: Option<usize> = None;
    let mut close: Option<usize> = None;

    for (index, token) in args.iter().enumerate() {
        let opens = token.trim_start().starts_with('[');
        let closes = token.trim_end().ends_with(']');

        if opens {
            if open.is_some() {
                return Err(CliError::Parse(format!(
                    "Only one [ ... ] argument group is allowed (found another at `{}`)",
                    token
                )));
            }
            open = Some(index);
        }

        if closes {
            if open.is_none() || close.is_some() {
                return Err(CliError::Parse(format!(
                    "Unmatched `]` in argument `{}`",
                    token
                )));
            }
            close = Some(index);
        }
    }

    let (start, end) = match (open, close) {
        (None, None) => {
            return Ok(SplitArgs {
                argv: args.to_vec(),
                subargs: Vec::new(),
            });
        }
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(CliError::Parse(
                "Unterminated [ ... ] argument group".to_string(),
            ));
        }
    };

    let mut subargs = Vec::with_capacity(end - start + 1);
    for (index, token) in args[start..=end].iter().enumerate() {
        let mut token = token.trim();
        if index == 0 {
            token = token.strip_prefix('[').unwrap_or(token);
        }
        if start + index == end {
            token = token.strip_suffix(']').unwrap_or(token);
        }
        let token = token.trim();
        if !token.is_empty() {
            subargs.push(token.to_string());
        }
    }

    let argv = args[..start]
        .iter()
        .chain(args[end + 1..].iter())
        .cloned()
        .collect();

    Ok(SplitArgs { argv, subargs })
}
