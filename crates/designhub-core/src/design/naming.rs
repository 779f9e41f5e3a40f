//! Name collision resolution shared by duplication and import.
//!
//! The first candidate is tried as-is; on a clash an incrementing counter
//! starting at [`FIRST_COLLISION_SUFFIX`] is appended until a free name is
//! found. The un-numbered candidate counts as the first copy, so numbering
//! continues at 2.

/// Counter used for the first suffixed candidate.
pub const FIRST_COLLISION_SUFFIX: u32 = 2;

/// Returns the name a duplicate of `original` should get.
///
/// Without `desired` the candidates are `"<original> (Copy)"`,
/// `"<original> (Copy 2)"`, `"<original> (Copy 3)"`, ... With `desired` they are
/// `"<desired>"`, `"<desired> (2)"`, `"<desired> (3)"`, ...
pub fn duplicate_name<F>(original: &str, desired: Option<&str>, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    match desired {
        Some(desired) => unique_name(desired, is_taken),
        None => first_available(
            format!("{} (Copy)", original),
            |n| format!("{} (Copy {})", original, n),
            is_taken,
        ),
    }
}

/// Returns `base` if free, else `"<base> (2)"`, `"<base> (3)"`, ...
pub fn unique_name<F>(base: &str, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    first_available(base.to_string(), |n| format!("{} ({})", base, n), is_taken)
}

fn first_available<N, F>(first: String, nth: N, is_taken: F) -> String
where
    N: Fn(u32) -> String,
    F: Fn(&str) -> bool,
{
    if !is_taken(&first) {
        return first;
    }

    let mut counter = FIRST_COLLISION_SUFFIX;
    loop {
        let candidate = nth(counter);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
