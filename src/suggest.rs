//! "Did you mean" suggestions for typo'd parameter and command names

const MIN_SIMILARITY: f64 = 0.8;

/// The closest candidate to `input` by Jaro-Winkler similarity, when it is
/// close enough to be a plausible typo.
pub fn closest<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for candidate in candidates {
        let score = strsim::jaro_winkler(input, candidate);
        if score >= MIN_SIMILARITY && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, c)| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_typo_is_suggested() {
        let got = closest("securitygorup", ["securitygroup", "subnet", "image"]);
        assert_eq!(got.as_deref(), Some("securitygroup"));
    }

    #[test]
    fn distant_input_yields_nothing() {
        assert_eq!(closest("zzz", ["image", "subnet"]), None);
    }
}
