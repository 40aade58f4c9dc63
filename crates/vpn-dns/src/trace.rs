use vpn_proto::DnsProbeRecord;

/// Tolerantly parse a Cloudflare trace body (`key=value` pairs, separated
/// by newlines or whitespace, values possibly quoted) into loc/colo.
///
/// Unknown keys are ignored. If a key appears more than once, the last
/// occurrence wins. Missing keys yield an empty string in the result.
pub fn parse_trace(body: &str) -> DnsProbeRecord {
    let mut loc = String::new();
    let mut colo = String::new();

    for token in body.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let value = value.trim_matches(['"', '\'']);
        match key {
            "loc" => loc = value.to_uppercase(),
            "colo" => colo = value.to_uppercase(),
            _ => {}
        }
    }

    DnsProbeRecord { loc, colo }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_newline_separated_trace() {
        let body = "fl=123f1\nh=1.1.1.1\nloc=GB\ncolo=LHR\nwarp=off\n";
        let record = parse_trace(body);
        assert_eq!(record.loc, "GB");
        assert_eq!(record.colo, "LHR");
    }

    #[test]
    fn parses_whitespace_separated_trace() {
        let record = parse_trace("loc=US colo=ORD warp=on");
        assert_eq!(record.loc, "US");
        assert_eq!(record.colo, "ORD");
    }

    #[test]
    fn strips_surrounding_quotes() {
        let record = parse_trace("loc=\"gb\" colo='lhr'");
        assert_eq!(record.loc, "GB");
        assert_eq!(record.colo, "LHR");
    }

    #[test]
    fn last_occurrence_wins_on_duplicate_keys() {
        let record = parse_trace("loc=GB loc=FR colo=LHR colo=CDG");
        assert_eq!(record.loc, "FR");
        assert_eq!(record.colo, "CDG");
    }

    #[test]
    fn missing_keys_yield_empty_strings() {
        let record = parse_trace("fl=123 h=1.1.1.1");
        assert!(record.loc.is_empty());
        assert!(record.colo.is_empty());
    }

    #[test]
    fn idempotent_round_trip_through_reserialization() {
        let body = "loc=GB colo=LHR";
        let once = parse_trace(body);
        let reserialized = format!("loc={} colo={}", once.loc, once.colo);
        let twice = parse_trace(&reserialized);
        assert_eq!(once, twice);
    }
}
