// src/utils/roster.rs

/// Parses the legacy comma-separated participant-ID format into a
/// normalized roster: positive integer IDs, deduplicated, sorted ascending.
///
/// Tokens are trimmed before parsing. Empty, non-numeric and non-positive
/// tokens are dropped with a warning. The output does not depend on the
/// input order.
pub fn parse_roster(raw: &str) -> Vec<i64> {
    let mut ids: Vec<i64> = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<i64>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                tracing::warn!("Dropping malformed roster token: {:?}", token);
                None
            }
        })
        .collect();

    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Renders a roster back into the legacy comma-separated format,
/// e.g. for exports consumed by older tooling.
pub fn join_roster(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_messy_input() {
        assert_eq!(parse_roster(" 3, 1,1,abc,2,"), vec![1, 2, 3]);
    }

    #[test]
    fn empty_input_gives_empty_roster() {
        assert_eq!(parse_roster(""), Vec::<i64>::new());
        assert_eq!(parse_roster("   "), Vec::<i64>::new());
        assert_eq!(parse_roster(",,,"), Vec::<i64>::new());
    }

    #[test]
    fn drops_non_positive_ids() {
        assert_eq!(parse_roster("0,-4,5"), vec![5]);
    }

    #[test]
    fn order_independent() {
        assert_eq!(parse_roster("9,2,7"), parse_roster("7,9,2"));
    }

    #[test]
    fn roundtrip_is_canonical() {
        let ids = parse_roster("12, 7,7,3");
        assert_eq!(join_roster(&ids), "3,7,12");
    }
}
