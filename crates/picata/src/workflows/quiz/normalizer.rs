/// Shortens an exported column header to the identifier before its first `:`.
pub(crate) fn normalize_column(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let head = cleaned.split(':').next().unwrap_or_default().trim();
    head.replace([' ', '.'], "_")
}

pub(crate) fn is_question_id(column: &str) -> bool {
    !column.is_empty() && column.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_question_text_after_colon() {
        assert_eq!(
            normalize_column("\u{feff}48213: Which sort is stable?"),
            "48213"
        );
        assert_eq!(normalize_column("n correct"), "n_correct");
        assert_eq!(normalize_column("section.sis id"), "section_sis_id");
    }

    #[test]
    fn question_ids_are_all_digits() {
        assert!(is_question_id("48213"));
        assert!(!is_question_id("1_0"));
        assert!(!is_question_id("sis_id"));
        assert!(!is_question_id(""));
    }
}
