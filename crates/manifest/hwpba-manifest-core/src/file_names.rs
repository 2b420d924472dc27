//! File naming shared by the exporter and the runtime.

/// Collapse every run of characters outside `[A-Za-z0-9_-]` into a single `_`
/// and trim leading/trailing underscores.
pub fn clean(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// `<clean(character)>_Animations.json`
pub fn animations_file_name(character: &str) -> String {
    format!("{}_Animations.json", clean(character))
}

/// True for `*_animations.json` and the legacy `animations.json` (case-insensitive).
pub fn is_animations_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "animations.json" || lower.ends_with("_animations.json")
}
