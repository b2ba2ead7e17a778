//! Version probing and normalization.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::core::error::{ExecutorError, ExecutorResult};
use crate::exec::runner::RunCommand;

/// Deadline for a version query, so a wedged program cannot hang discovery.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

// Dotted numeric token with an optional pre-release tail.
fn version_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"\d+(?:\.\d+)+(?:-[0-9A-Za-z.]+)?").expect("version pattern is valid")
    })
}

/// Pulls a normalized version out of whatever a program printed.
///
/// A clean semver string (optionally `v`-prefixed) passes through intact,
/// pre-release tags and all. Anything noisier, like `"Demo Program 4.5.1
/// (build 7)"` or a two-part `"9.4"`, is reduced to its first dotted
/// numeric token. Idempotent: feeding a result back returns it unchanged.
///
/// # Returns
/// The normalized string, or [`ExecutorError::VersionParse`] carrying the
/// offending output when no version-shaped token exists.
pub fn normalize_version(program: &str, raw: &str) -> ExecutorResult<String> {
    let trimmed = raw.trim();

    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if semver::Version::parse(bare).is_ok() {
        return Ok(bare.to_string());
    }

    version_token()
        .find(trimmed)
        .map(|token| token.as_str().to_string())
        .ok_or_else(|| ExecutorError::VersionParse {
            program: program.to_string(),
            output: truncate(trimmed),
        })
}

/// Runs `program` with `args` under a short deadline and normalizes whatever
/// it prints, checking stdout first and stderr second (plenty of tools report
/// their version on stderr). The exit status is deliberately ignored: some
/// programs exit nonzero from their version flag.
pub async fn probe_version(program: &str, args: &[&str]) -> ExecutorResult<String> {
    let output = RunCommand::new(std::iter::once(program).chain(args.iter().copied()))
        .timeout(PROBE_TIMEOUT)
        .run()
        .await?;

    let raw = if output.stdout.trim().is_empty() {
        &output.stderr
    } else {
        &output.stdout
    };
    normalize_version(program, raw)
}

// Keeps unparsable output loggable without dragging a whole transcript
// into the error.
fn truncate(output: &str) -> String {
    const LIMIT: usize = 200;
    if output.len() <= LIMIT {
        return output.to_string();
    }
    let mut cut = LIMIT;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &output[..cut])
}
