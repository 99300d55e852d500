//! XPath 1.0 helpers: literal escaping and case folding.
//!
//! XPath 1.0 has no escape sequences inside string literals, so a value that
//! contains an apostrophe is split on `'` and reassembled with `concat()`.

/// Upper-case table for `translate()`: Latin plus extended Latin
pub const UPPERCASE_ALL: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖØÙÚÛÜÝÞŸŽŠŒ";

/// Lower-case counterpart of [`UPPERCASE_ALL`], position for position
pub const LOWERCASE_ALL: &str = "abcdefghijklmnopqrstuvwxyzàáâãäåæçèéêëìíîïðñòóôõöøùúûüýþÿžšœ";

/// Build an XPath expression that evaluates to `value`.
///
/// ```
/// use watir::xpath::escape;
///
/// assert_eq!(escape("plain"), "'plain'");
/// assert_eq!(escape("it's a test"), "concat('it',\"'\",'s a test')");
/// ```
#[must_use]
pub fn escape(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }

    let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
    format!("concat({})", parts.join(",\"'\","))
}

/// Wrap an expression so it compares case-insensitively (full table).
#[must_use]
pub fn downcase(expr: &str) -> String {
    format!("translate({expr},'{UPPERCASE_ALL}','{LOWERCASE_ALL}')")
}

/// `[@class]` token test for a single class name
#[must_use]
pub fn class_contains(class: &str) -> String {
    format!(
        "contains(concat(' ',@class,' '),{})",
        escape(&format!(" {class} "))
    )
}

/// Case-insensitive local-name test
#[must_use]
pub fn tag_equals(tag: &str) -> String {
    format!(
        "{}={}",
        downcase("local-name()"),
        escape(&tag.to_ascii_lowercase())
    )
}

/// Join predicate fragments into a single `[...]` step.
#[must_use]
pub fn and_all(conditions: &[String]) -> String {
    match conditions.len() {
        0 => String::new(),
        _ => format!("[{}]", conditions.join(" and ")),
    }
}
