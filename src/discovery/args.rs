//! Command-line argument parsing.

use std::collections::HashMap;

/// Parse `--key=value` arguments into a map.
///
/// The first two characters of each argument are dropped and the rest is
/// split on the first `=`. Arguments without `=` are ignored; a repeated key
/// keeps its last value.
pub fn parse_args<I, S>(argv: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    argv.into_iter()
        .filter_map(|arg| {
            let arg = arg.as_ref();
            if !arg.contains('=') {
                return None;
            }
            // Char-wise so a non-ASCII argument never splits mid-character.
            let stripped: String = arg.chars().skip(2).collect();
            let (key, value) = stripped.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
