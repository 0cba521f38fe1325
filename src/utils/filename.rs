/// Reduce an untrusted file name to a safe single path component
///
/// Path separators become spaces, runs of whitespace become `_`, and only
/// ASCII letters, digits, `_`, `.` and `-` survive. Leading and trailing
/// dots and underscores are stripped. May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Name under which a signup attachment is stored
///
/// The millisecond stamp keeps two uploads with the same student id and
/// file name from overwriting each other.
pub fn attachment_filename(student_id: &str, millis: i64, original: &str) -> String {
    let name = secure_filename(&format!("{}_{}_{}", student_id, millis, original));
    if name.is_empty() {
        format!("{}_attachment", millis)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_unchanged() {
        assert_eq!(secure_filename("My_RAF-2024.pdf"), "My_RAF-2024.pdf");
    }

    #[test]
    fn test_whitespace_joined() {
        assert_eq!(secure_filename("my  raf\tfile.pdf"), "my_raf_file.pdf");
    }

    #[test]
    fn test_path_traversal_flattened() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(secure_filename("/"), "");
    }

    #[test]
    fn test_unsafe_characters_dropped() {
        assert_eq!(secure_filename("résumé (final)!.pdf"), "rsum_final.pdf");
        assert_eq!(secure_filename("a;rm -rf *.pdf"), "arm_-rf_.pdf");
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename("2021-001", 1718000000123, "RAF form.pdf"),
            "2021-001_1718000000123_RAF_form.pdf"
        );
        assert_eq!(
            attachment_filename("../x", 5, "../../y.pdf"),
            "x_5_.._.._y.pdf"
        );
    }
}
