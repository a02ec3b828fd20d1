//! Label handling shared by ingest, the model builder and the page builders.
//!
//! Column headers carry unit suffixes in parentheses (`Volume (ml)`); the
//! attribute they address is the text before the first `(`, trimmed. The
//! same rule is applied when reading sheets and when filling report tables,
//! so a table header always finds its data by label.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Characters that cannot appear in a file name on common platforms.
static FILE_NAME_RESERVED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).unwrap());

/// Strip a parenthesised unit suffix from a column label.
///
/// `"Concentration (mg/ml)"` becomes `"Concentration"`, `"Recovery(%)"`
/// becomes `"Recovery"` and labels without a suffix are only trimmed.
pub fn strip_unit_suffix(label: &str) -> &str {
    label.split('(').next().unwrap_or(label).trim()
}

/// Build the key used to join chromatography steps with per-step purity.
///
/// Both sides of the join must go through this function: the step number
/// and the step name are joined with `_`, and spaces inside the step name
/// become `_` as well (`"1"`, `"Protein A"` gives `"1_Protein_A"`).
pub fn purity_key(step_no: &str, step_name: &str) -> String {
    format!("{}_{}", step_no, step_name.replace(' ', "_"))
}

/// Compare two identifiers numerically when both are integers, otherwise
/// lexicographically.
///
/// Step and protein numbers are read as text; this keeps `"10"` after `"9"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Turn a sample name into something safe to use as a file stem.
///
/// Empty names become `"sample"` so that a file can still be written.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned = FILE_NAME_RESERVED_REGEX.replace_all(name.trim(), "_");
    if cleaned.is_empty() {
        "sample".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Split a conclusion cell into its sentences (separated by `|`).
pub fn conclusion_sentences(text: &str) -> Vec<String> {
    text.split('|').map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_unit_suffix() {
        assert_eq!(strip_unit_suffix("Concentration (mg/ml)"), "Concentration");
        assert_eq!(strip_unit_suffix("Recovery(%)"), "Recovery");
        assert_eq!(strip_unit_suffix("Purity by SEC-HPLC (%)"), "Purity by SEC-HPLC");
        assert_eq!(strip_unit_suffix("  Buffer "), "Buffer");
        assert_eq!(strip_unit_suffix("PI"), "PI");
        assert_eq!(strip_unit_suffix(""), "");
    }

    #[test]
    fn test_purity_key() {
        assert_eq!(purity_key("1", "Protein A"), "1_Protein_A");
        assert_eq!(purity_key("2", "Dialysis"), "2_Dialysis");
        assert_eq!(purity_key("3", "Protein A & Ni"), "3_Protein_A_&_Ni");
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("9", "10"), Ordering::Less);
        assert_eq!(natural_cmp("10", "10"), Ordering::Equal);
        assert_eq!(natural_cmp("b", "a"), Ordering::Greater);
        assert_eq!(natural_cmp("2", "a"), Ordering::Less);
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("WXXX-T6U9.E17-1.uIgG1"), "WXXX-T6U9.E17-1.uIgG1");
        assert_eq!(sanitize_file_stem("a/b:c"), "a_b_c");
        assert_eq!(sanitize_file_stem("   "), "sample");
    }

    #[test]
    fn test_conclusion_sentences() {
        assert_eq!(
            conclusion_sentences("Bands visible.|Minor bands in lane 1."),
            vec!["Bands visible.", "Minor bands in lane 1."]
        );
        assert_eq!(conclusion_sentences(""), vec![""]);
    }
}
