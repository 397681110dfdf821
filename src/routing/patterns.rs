//! Named parameter patterns.
//!
//! Placeholders may reference these by alias (`{id:num}`) instead of
//! spelling the regex inline. Anything that is not a known alias is used
//! verbatim as a regex.

/// Any single path segment. Used when a placeholder has no pattern.
pub const ANY: &str = "[^/]+";
pub const NUM: &str = r"\d+";
pub const ALPHA: &str = "[a-zA-Z]+";
pub const ALPHA_LOWER: &str = "[a-z]+";
pub const ALPHA_UPPER: &str = "[A-Z]+";
pub const ALPHA_NUM: &str = "[a-zA-Z0-9]+";
pub const ALPHA_NUM_UNDERSCORE: &str = "[a-zA-Z0-9_]+";
pub const SLUG: &str = "[a-zA-Z0-9-]+";
pub const UUID: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";
pub const ULID: &str = "[0-7][0-9A-HJKMNP-TV-Z]{25}";
/// Rest of the path, slashes included.
pub const PATH: &str = ".+";

/// Resolve an alias to its regex, or return the input unchanged.
pub fn resolve(pattern: &str) -> &str {
    match pattern {
        "any" => ANY,
        "num" => NUM,
        "alpha" => ALPHA,
        "alpha_lower" => ALPHA_LOWER,
        "alpha_upper" => ALPHA_UPPER,
        "alpha_num" => ALPHA_NUM,
        "alpha_num_underscore" => ALPHA_NUM_UNDERSCORE,
        "slug" => SLUG,
        "uuid" => UUID,
        "ulid" => ULID,
        "path" => PATH,
        other => other,
    }
}
