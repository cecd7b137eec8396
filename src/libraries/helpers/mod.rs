//! Helper functions that don't belong elsewhere

use std::{num::ParseIntError, time::Duration};

/// Splits the input string into two parts at the first occurence of the separator
pub fn split_into_two(input: &str, separator: &'static str) -> Option<(String, String)> {
    let parts: Vec<&str> = input.splitn(2, separator).collect();

    if parts.len() != 2 {
        return None;
    }

    Some((parts[0].to_string(), parts[1].to_string()))
}

/// Parses a Duration from a string containing seconds.
/// Useful for command line parsing
pub fn parse_seconds(src: &str) -> Result<Duration, ParseIntError> {
    let seconds = src.parse::<u64>()?;
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_at_first_separator() {
        assert_eq!(
            split_into_two("room=subject:{subject}", "="),
            Some(("room".to_string(), "subject:{subject}".to_string()))
        );
        assert_eq!(
            split_into_two("a=b=c", "="),
            Some(("a".to_string(), "b=c".to_string()))
        );
        assert_eq!(split_into_two("no-separator", "="), None);
    }

    #[test]
    fn parses_seconds() {
        assert_eq!(parse_seconds("5"), Ok(Duration::from_secs(5)));
        assert!(parse_seconds("five").is_err());
    }
}
