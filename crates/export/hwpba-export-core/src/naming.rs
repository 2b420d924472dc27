//! Part and file naming helpers.

use indexmap::IndexSet;
use log::{info, warn};

use hwpba_manifest::clean;

const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace characters that are illegal in file names and trim trailing spaces/dots.
pub fn safe_filename_component(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim_end_matches([' ', '.']).to_string()
}

/// Split a trailing `.L`/`.R` side suffix (case-insensitive) off `s`.
fn split_side(s: &str) -> (&str, Option<&str>) {
    let n = s.len();
    if n >= 2 && s.is_char_boundary(n - 2) {
        let (core, suffix) = s.split_at(n - 2);
        if suffix.eq_ignore_ascii_case(".l") || suffix.eq_ignore_ascii_case(".r") {
            return (core, Some(suffix));
        }
    }
    (s, None)
}

/// `clean` that keeps a mirrored `.L`/`.R` suffix intact.
pub fn safe_bone_name(s: &str) -> String {
    let (core, side) = split_side(s.trim());
    let core = clean(core);
    match side {
        Some(side) => format!("{core}{side}"),
        None => core,
    }
}

/// Warnings for duplicate cleaned names and `.L`/`.R` parts missing their mirror.
pub fn name_sanity<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen = IndexSet::new();
    let mut left = IndexSet::new();
    let mut right = IndexSet::new();

    for name in names {
        let cleaned = safe_bone_name(name);
        if !seen.insert(cleaned.clone()) {
            let msg = format!("Duplicate part name after cleaning: '{cleaned}'");
            warn!("{msg}");
            warnings.push(msg);
        }
        if let (core, Some(side)) = split_side(&cleaned) {
            let base = core.to_ascii_lowercase();
            if side.eq_ignore_ascii_case(".l") {
                left.insert(base);
            } else {
                right.insert(base);
            }
        }
    }

    let mut unmatched: Vec<&String> = left.symmetric_difference(&right).collect();
    unmatched.sort();
    for base in unmatched {
        let msg = format!("Unmatched side for '{base}': only one of .L/.R present");
        info!("{msg}");
        warnings.push(msg);
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_component_replaces_illegal_and_trims_tail() {
        assert_eq!(safe_filename_component("a<b>:c?. "), "a_b__c_");
        assert_eq!(safe_filename_component("Goblin King"), "Goblin King");
    }

    #[test]
    fn bone_name_keeps_side_suffix() {
        assert_eq!(safe_bone_name(" Upper Arm.L "), "Upper_Arm.L");
        assert_eq!(safe_bone_name("leg.r"), "leg.r");
        assert_eq!(safe_bone_name("Arm.Left"), "Arm_Left");
    }

    #[test]
    fn sanity_reports_duplicates_and_unmatched_sides() {
        let w = name_sanity(["Arm L", "Arm_L", "Hand.L", "Hand.R", "Foot.L"]);
        assert_eq!(w.len(), 2, "{w:?}");
        assert!(w[0].contains("Duplicate") && w[0].contains("Arm_L"));
        assert!(w[1].contains("'foot'"));
    }
}
