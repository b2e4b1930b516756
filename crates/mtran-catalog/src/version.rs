//! Model version ordering.
//!
//! Versions are dotted-numeric with an optional `-<tag>` suffix (e.g. `1.2`,
//! `1.0.0-alpha.3`). Ordering: compare the numeric parts segment-by-segment
//! (missing segments treated as 0); if those tie, the absence of a
//! pre-release tag outranks its presence; if both have tags, compare the
//! tags part-by-part (split on `.`), numerically where both parts parse as
//! integers, lexically otherwise.

use std::cmp::Ordering;

/// Compares two version strings, returning the same ordering as `Ord::cmp`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (numeric_a, pre_a) = split_prerelease(a);
    let (numeric_b, pre_b) = split_prerelease(b);

    let numeric_cmp = compare_numeric(numeric_a, numeric_b);
    if numeric_cmp != Ordering::Equal {
        return numeric_cmp;
    }

    match (pre_a, pre_b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(pa), Some(pb)) => compare_prerelease(pa, pb),
    }
}

/// Returns the largest version in `versions`, or `None` if empty.
pub fn largest_version<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    versions
        .into_iter()
        .max_by(|a, b| compare_versions(a, b))
}

fn split_prerelease(version: &str) -> (&str, Option<&str>) {
    match version.split_once('-') {
        Some((numeric, tag)) => (numeric, Some(tag)),
        None => (version, None),
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let mut segments_a = a.split('.').map(|s| s.parse::<u64>().unwrap_or(0));
    let mut segments_b = b.split('.').map(|s| s.parse::<u64>().unwrap_or(0));

    loop {
        match (segments_a.next(), segments_b.next()) {
            (None, None) => return Ordering::Equal,
            (sa, sb) => {
                let cmp = sa.unwrap_or(0).cmp(&sb.unwrap_or(0));
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
        }
    }
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut parts_a = a.split('.');
    let mut parts_b = b.split('.');

    loop {
        match (parts_a.next(), parts_b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(pa), Some(pb)) => {
                let cmp = match (pa.parse::<u64>(), pb.parse::<u64>()) {
                    (Ok(na), Ok(nb)) => na.cmp(&nb),
                    _ => pa.cmp(pb),
                };
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_beats_prerelease_at_same_numeric_version() {
        assert_eq!(compare_versions("1.0.0", "1.0.0-alpha"), Ordering::Greater);
    }

    #[test]
    fn prerelease_numeric_parts_compare_numerically() {
        assert_eq!(
            compare_versions("1.0.0-alpha.10", "1.0.0-alpha.2"),
            Ordering::Greater
        );
    }

    #[test]
    fn missing_minor_segment_treated_as_zero() {
        assert_eq!(compare_versions("2.1", "2.0"), Ordering::Greater);
    }

    #[test]
    fn numeric_segments_compare_as_integers_not_strings() {
        assert_eq!(compare_versions("10", "9"), Ordering::Greater);
    }

    #[test]
    fn largest_version_is_order_independent() {
        let forward = largest_version(["1.0.0", "1.0.1", "1.1.0"]);
        let shuffled = largest_version(["1.1.0", "1.0.0", "1.0.1"]);
        assert_eq!(forward, Some("1.1.0"));
        assert_eq!(shuffled, Some("1.1.0"));
    }

    #[test]
    fn largest_version_prefers_latest_alpha_tag() {
        assert_eq!(
            largest_version(["1.0.0-alpha.1", "1.0.0-alpha.2", "1.0.0-alpha.3"]),
            Some("1.0.0-alpha.3")
        );
    }

    #[test]
    fn largest_version_of_empty_iterator_is_none() {
        assert_eq!(largest_version(Vec::<&str>::new()), None);
    }
}
