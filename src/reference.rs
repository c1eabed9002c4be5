//! Reference global values
//!
//! Plain text, whitespace-delimited floats. Values may be spread over any
//! number of lines and are read in order; `#` starts a comment.

use std::path::Path;

use crate::error::{Error, Result};

/// Parse reference values from text.
pub fn parse_reference(text: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let content = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        for token in content.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| Error::Reference {
                line: index + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
    }
    Ok(values)
}

/// Read reference values from a file.
pub fn read_reference_file(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let values = parse_reference(&text)?;
    tracing::debug!(path = %path.display(), count = values.len(), "read reference values");
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_one_per_line() {
        let values = parse_reference("1.5\n2.25\n-3e2\n").unwrap();
        assert_eq!(values, vec![1.5, 2.25, -300.0]);
    }

    #[test]
    fn test_parse_flattens_rows() {
        let values = parse_reference("1 2 3\n4\t5  6\n").unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_parse_comments_and_blank_lines() {
        let text = "# SPM globals\n\n1.0  # first\n   \n2.0\n";
        assert_eq!(parse_reference(text).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_parse_nan() {
        let values = parse_reference("8.0\nnan\n16.0").unwrap();
        assert_eq!(values.len(), 3);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_reference("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_bad_token_reports_line() {
        match parse_reference("1.0\n2.0 abc\n") {
            Err(Error::Reference { line, token }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "abc");
            }
            other => panic!("expected a reference error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_reference_file(Path::new("/tmp/nonexistent_reference_12345.txt"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
