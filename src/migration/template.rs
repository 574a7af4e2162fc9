//! Splits a migration file into its up and down SQL sections.

use crate::constants::{DOWN_MARKER, UP_MARKER};
use crate::error::MigrateError;

/// The two halves of a migration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Up,
    Down,
}

/// Extract one section from migration file text.
///
/// The up section is everything before the down marker (the up-marker line
/// included); the down section is everything after the down marker. Both
/// markers must be present, with the up marker strictly first. Nothing
/// else is validated: an empty section is legal and runs as a no-op.
pub fn extract_section(content: &str, section: Section) -> Result<&str, MigrateError> {
    let up_at = content
        .find(UP_MARKER)
        .ok_or(MigrateError::MalformedTemplate)?;
    let down_at = content
        .find(DOWN_MARKER)
        .ok_or(MigrateError::MalformedTemplate)?;
    if up_at >= down_at {
        return Err(MigrateError::MalformedTemplate);
    }

    Ok(match section {
        Section::Up => &content[..down_at],
        Section::Down => &content[down_at + DOWN_MARKER.len()..],
    })
}

/// Body written into a freshly created migration file: an empty up section
/// followed by an empty down section.
pub fn blank_template() -> String {
    [UP_MARKER, "", DOWN_MARKER, ""].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        [
            UP_MARKER,
            r#"CREATE TABLE IF NOT EXISTS "user" (id INT);"#,
            "",
            DOWN_MARKER,
            r#"DROP TABLE IF EXISTS "user";"#,
            "",
        ]
        .join("\n")
    }

    #[test]
    fn extracts_up_section() {
        let template = sample();
        let up = extract_section(&template, Section::Up).unwrap();
        assert!(up.starts_with(UP_MARKER));
        assert!(up.contains("CREATE TABLE"));
        assert!(!up.contains("DROP TABLE"));
    }

    #[test]
    fn extracts_down_section() {
        let template = sample();
        let down = extract_section(&template, Section::Down).unwrap();
        assert!(down.contains("DROP TABLE"));
        assert!(!down.contains(DOWN_MARKER));
        assert!(!down.contains("CREATE TABLE"));
    }

    #[test]
    fn sections_round_trip_to_the_original_text() {
        for template in [sample(), blank_template()] {
            let up = extract_section(&template, Section::Up).unwrap();
            let down = extract_section(&template, Section::Down).unwrap();
            assert_eq!(format!("{up}{DOWN_MARKER}{down}"), template);
        }
    }

    #[test]
    fn missing_up_marker_is_malformed() {
        let err = extract_section("-- +down\nDROP TABLE x;", Section::Up).unwrap_err();
        assert!(matches!(err, MigrateError::MalformedTemplate));
    }

    #[test]
    fn missing_down_marker_is_malformed() {
        let err = extract_section("-- +up\nCREATE TABLE x (id INT);", Section::Down).unwrap_err();
        assert!(matches!(err, MigrateError::MalformedTemplate));
    }

    #[test]
    fn down_marker_before_up_marker_is_malformed() {
        let text = format!("{DOWN_MARKER}\nDROP TABLE x;\n{UP_MARKER}\nCREATE TABLE x;");
        for section in [Section::Up, Section::Down] {
            let err = extract_section(&text, section).unwrap_err();
            assert!(matches!(err, MigrateError::MalformedTemplate));
        }
    }

    #[test]
    fn blank_template_has_empty_sections() {
        let template = blank_template();
        assert_eq!(template, "-- +up\n\n-- +down\n");

        let up = extract_section(&template, Section::Up).unwrap();
        let down = extract_section(&template, Section::Down).unwrap();
        assert_eq!(up, "-- +up\n\n");
        assert_eq!(down, "\n");
    }
}
