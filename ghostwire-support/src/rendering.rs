//! Text rendering utilities for human-friendly diagnostics.
//!
//! Provides helpers to format resolution chains, lists of alternatives,
//! and "did you mean?" suggestions in error output.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use ghostwire_support::rendering::render_chain;
///
/// let chain = vec!["Mailer", "Transport", "Mailer"];
/// assert_eq!(render_chain(&chain), "Mailer → Transport → Mailer");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders a list of alternatives in prose form.
///
/// ```
/// use ghostwire_support::rendering::render_alternatives;
///
/// assert_eq!(render_alternatives(&["primary"]), "\"primary\"");
/// assert_eq!(render_alternatives(&["a", "b", "c"]), "\"a\", \"b\" or \"c\"");
/// let empty: [&str; 0] = [];
/// assert_eq!(render_alternatives(&empty), "none");
/// ```
pub fn render_alternatives(items: &[impl AsRef<str>]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("{:?}", item.as_ref()))
        .collect();

    match quoted.as_slice() {
        [] => "none".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

/// Returns the last segment of a namespaced class name.
///
/// Both `\` and `::` separators are understood.
///
/// ```
/// use ghostwire_support::rendering::short_name;
///
/// assert_eq!(short_name("App\\Mail\\Mailer"), "Mailer");
/// assert_eq!(short_name("app::mail::Mailer"), "Mailer");
/// assert_eq!(short_name("Mailer"), "Mailer");
/// ```
pub fn short_name(name: &str) -> &str {
    let after_backslash = name.rsplit('\\').next().unwrap_or(name);
    after_backslash.rsplit("::").next().unwrap_or(after_backslash)
}

/// Generates "did you mean?" suggestions for a requested name.
///
/// Compares the requested name against the available ones and returns
/// at most `max_suggestions` close matches, best first.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = short_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = short_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    // Stable ordering for equal scores keeps output deterministic.
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
