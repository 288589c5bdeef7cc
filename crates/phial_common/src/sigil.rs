//! The embedded-reference token syntax and its scanner.
//!
//! Three reference kinds can be embedded in definition values:
//!
//! - a *service reference* is a whole string prefixed with `@`, e.g. `@mailer`
//! - a *parameter reference* is a `%`-delimited substring, e.g. `url: "%host%/api"`
//! - a *constant reference* is a whole `^`-delimited string, e.g. `^Json::PRETTY^`
//!
//! A doubled delimiter (`%%`, `^^`) is a literal character and never opens a
//! token; the scanner treats "sigil not preceded by the same sigil" as the
//! only valid open boundary.

/// Prefix marking a whole string as a service reference.
pub const SERVICE_SIGIL: char = '@';

/// Paired delimiter marking an embedded parameter reference.
pub const PARAMETER_SIGIL: char = '%';

/// Paired delimiter marking a constant reference.
pub const CONSTANT_SIGIL: char = '^';

/// Prefix marking a tag-collection reference.
pub const TAG_SIGIL: char = '#';

/// Separator between a namespace (or alias) and the local part of a key.
pub const NAMESPACE_SEPARATOR: char = '.';

/// Returns `true` if `value` is shaped like a service reference (`@key`).
pub fn is_service_reference(value: &str) -> bool {
    value.len() > 1 && value.starts_with(SERVICE_SIGIL)
}

/// Returns `true` if `value` is shaped like a tag-collection reference (`#name`).
pub fn is_tag_reference(value: &str) -> bool {
    value.len() > 1 && value.starts_with(TAG_SIGIL)
}

/// Strips the service sigil from a reference, returning the bare key.
///
/// Passing a bare key through is a no-op, so this is safe to apply to
/// values that may or may not carry the sigil.
pub fn service_key(reference: &str) -> &str {
    reference.trim_start_matches(SERVICE_SIGIL)
}

/// Prefixes a key with the service sigil.
///
/// Runs [`service_key`] first so an already-prefixed reference is returned
/// unchanged rather than gaining a second sigil.
pub fn service_reference(key: &str) -> String {
    format!("{}{}", SERVICE_SIGIL, service_key(key))
}

/// Finds the first unescaped parameter token at or after `offset`.
///
/// Returns the token contents without the surrounding delimiters, or `None`
/// if no complete token remains. `offset` is a byte index and must lie on a
/// character boundary.
pub fn find_next_parameter(string: &str, offset: usize) -> Option<&str> {
    find_next_embedded(string, PARAMETER_SIGIL as u8, offset)
}

/// Finds the first unescaped constant token at or after `offset`.
pub fn find_next_constant(string: &str, offset: usize) -> Option<&str> {
    find_next_embedded(string, CONSTANT_SIGIL as u8, offset)
}

/// Replaces the first occurrence of the parameter token `%reference%`.
///
/// With `strip_sigils` the replacement is inserted bare; otherwise it is
/// re-wrapped in the parameter delimiters.
pub fn replace_parameter_reference(
    string: &str,
    reference: &str,
    replacement: &str,
    strip_sigils: bool,
) -> String {
    replace_embedded(string, reference, PARAMETER_SIGIL, replacement, strip_sigils)
}

/// Replaces the first occurrence of the constant token `^reference^`.
pub fn replace_constant_reference(
    string: &str,
    reference: &str,
    replacement: &str,
    strip_sigils: bool,
) -> String {
    replace_embedded(string, reference, CONSTANT_SIGIL, replacement, strip_sigils)
}

/// Scans for the first delimited token whose opening sigil is not escaped.
///
/// The sigils are all ASCII, so the scan works on bytes; any byte equal to a
/// sigil is necessarily a standalone character in valid UTF-8.
fn find_next_embedded(string: &str, sigil: u8, offset: usize) -> Option<&str> {
    let bytes = string.as_bytes();
    let mut i = offset;
    while i < bytes.len() {
        if bytes[i] == sigil && (i == offset || bytes[i - 1] != sigil) {
            let j = match bytes[i + 1..].iter().position(|&b| b == sigil) {
                Some(rel) => i + 1 + rel,
                None => return None,
            };
            if j > i + 1 {
                return Some(&string[i + 1..j]);
            }
            // doubled sigil is a literal; resume after the pair
            i = j + 1;
            continue;
        }
        i += 1;
    }
    None
}

fn replace_embedded(
    string: &str,
    reference: &str,
    sigil: char,
    replacement: &str,
    strip_sigils: bool,
) -> String {
    let token = format!("{sigil}{reference}{sigil}");
    let replacement = if strip_sigils {
        replacement.to_string()
    } else {
        format!("{sigil}{replacement}{sigil}")
    };
    string.replacen(&token, &replacement, 1)
}
