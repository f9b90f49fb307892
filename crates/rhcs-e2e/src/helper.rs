//! Small fixture helpers.

use uuid::Uuid;

/// Random alphanumeric string of `len` characters containing at least one
/// upper-case letter, usable as an IDP client id, secret or password.
pub fn rand_string_with_upper(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        out.extend(Uuid::new_v4().simple().to_string().chars());
    }
    out.truncate(len);

    // Upper-case every other letter; the first letter found is always upper.
    let mut upper = true;
    let mut out: String = out
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                let mapped = if upper { c.to_ascii_uppercase() } else { c };
                upper = !upper;
                mapped
            } else {
                c
            }
        })
        .collect();

    if len > 0 && !out.chars().any(|c| c.is_ascii_uppercase()) {
        out.replace_range(0..1, "A");
    }
    out
}

/// Name with a random suffix, e.g. `mp-3f9a1c`.
pub fn unique_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..6])
}
