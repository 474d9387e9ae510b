use crate::error::{ImporterError, Result};
use crate::traits::ProviderPunch;

/// Parses the ROC feed body: one `id;code;siac;YYYY-MM-DD HH:MM:SS` record
/// per line. Blank lines are ignored; any other malformed line fails the
/// whole batch so the cursor never skips records.
pub fn parse_punches(body: &str) -> Result<Vec<ProviderPunch>> {
    let mut punches = Vec::new();

    for (index, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        let [id, code, siac, timestamp] = fields.as_slice() else {
            return Err(malformed(index, line, "expected 4 fields"));
        };

        let id = id
            .parse::<i64>()
            .map_err(|_| malformed(index, line, "record id is not a number"))?;
        let control_code = code
            .parse::<i64>()
            .map_err(|_| malformed(index, line, "control code is not a number"))?;
        if siac.is_empty() {
            return Err(malformed(index, line, "transponder id is empty"));
        }

        punches.push(ProviderPunch {
            id,
            control_code,
            siac: siac.to_string(),
            timestamp: timestamp.to_string(),
        });
    }

    punches.sort_by_key(|p| p.id);
    Ok(punches)
}

fn malformed(index: usize, line: &str, reason: &str) -> ImporterError {
    ImporterError::ParseError(format!("line {}: {reason}: '{line}'", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed() {
        let body = "1202;31;8001234;2025-06-14 10:00:01\n\n1201;32;8001234;2025-06-14 09:58:40\r\n";
        let punches = parse_punches(body).unwrap();

        assert_eq!(punches.len(), 2);
        assert_eq!(punches[0].id, 1201);
        assert_eq!(punches[0].control_code, 32);
        assert_eq!(punches[1].siac, "8001234");
        assert_eq!(punches[1].timestamp, "2025-06-14 10:00:01");
    }

    #[test]
    fn test_malformed_line_fails_batch() {
        let err = parse_punches("1;31;8001;2025-06-14 10:00:00\n2;xx;8001;2025-06-14 10:00:05").unwrap_err();
        assert!(matches!(err, ImporterError::ParseError(ref msg) if msg.starts_with("line 2")));
    }

    #[test]
    fn test_empty_body_is_no_punches() {
        assert!(parse_punches("").unwrap().is_empty());
    }
}
