use crate::error::UnparsableName;
use lazy_regex::regex;

/// Turns `"Last, First (annotation)"` into `"First Last"`.
///
/// Only raw listing text is accepted; a name without the comma separator is
/// rejected, so the function is deliberately not idempotent.
pub fn normalize(raw: &str) -> Result<String, UnparsableName> {
    let unparsable = || UnparsableName {
        raw: raw.to_string(),
    };

    let captures = regex!(r"\A([^,]+?), ([^(]+?)(?: \(.+\))?\z")
        .captures(raw.trim())
        .ok_or_else(unparsable)?;

    let last = squeeze(&captures[1]);
    let first = squeeze(&captures[2]);
    if last.is_empty() || first.is_empty() {
        return Err(unparsable());
    }

    Ok(format!("{} {}", first, last))
}

fn squeeze(component: &str) -> String {
    regex!(r"\s+")
        .replace_all(component.trim(), " ")
        .into_owned()
}
