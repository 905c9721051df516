use std::collections::BTreeSet;

use crate::point::Attributes;

/// Attribute predicates applied to catalog points.
///
/// Each set is an any-of match against the point's tags; populated predicates
/// combine with AND. An empty set or missing region means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    pub amendments: BTreeSet<String>,
    pub participants: BTreeSet<String>,
    pub region: Option<String>,
}

impl AttributeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from the raw `amendments`, `participants` and `state`
    /// query values. Empty tokens are ignored.
    pub fn from_params(
        amendments: Option<&str>,
        participants: Option<&str>,
        region: Option<&str>,
    ) -> Self {
        Self {
            amendments: amendments.map(parse_tag_list).unwrap_or_default(),
            participants: participants.map(parse_tag_list).unwrap_or_default(),
            region: region.map(normalize_tag).filter(|r| !r.is_empty()),
        }
    }

    pub fn with_amendments<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.amendments.extend(normalize_all(tags));
        self
    }

    pub fn with_participants<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.participants.extend(normalize_all(tags));
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(normalize_tag(region)).filter(|r| !r.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.amendments.is_empty() && self.participants.is_empty() && self.region.is_none()
    }

    pub fn matches(&self, attributes: &Attributes) -> bool {
        any_of(&self.amendments, &attributes.amendments)
            && any_of(&self.participants, &attributes.participants)
            && self
                .region
                .as_ref()
                .map_or(true, |wanted| attributes.region.as_ref() == Some(wanted))
    }
}

fn any_of(wanted: &BTreeSet<String>, present: &BTreeSet<String>) -> bool {
    wanted.is_empty() || !wanted.is_disjoint(present)
}

/// Trimmed, upper-cased tag. Tags and region codes compare in this form.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

pub(crate) fn normalize_all<I, S>(tags: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| normalize_tag(t.as_ref()))
        .filter(|t| !t.is_empty())
}

fn parse_tag_list(raw: &str) -> BTreeSet<String> {
    normalize_all(raw.split(',')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(amendments: &[&str], participants: &[&str], region: Option<&str>) -> Attributes {
        Attributes::default()
            .with_amendments(amendments)
            .with_participants(participants)
            .with_region(region)
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = AttributeFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&Attributes::default()));
        assert!(filter.matches(&attrs(&["FIRST"], &["POLICE"], Some("CA"))));
    }

    #[test]
    fn list_values_are_any_of() {
        let filter = AttributeFilter::from_params(None, Some("POLICE,SECURITY"), None);
        assert!(filter.matches(&attrs(&[], &["SECURITY"], None)));
        assert!(filter.matches(&attrs(&[], &["POLICE", "GOVERNMENT"], None)));
        assert!(!filter.matches(&attrs(&[], &["GOVERNMENT"], None)));
        assert!(!filter.matches(&attrs(&[], &[], None)));
    }

    #[test]
    fn predicates_combine_with_and() {
        let filter = AttributeFilter::from_params(Some("FIRST"), Some("GOVERNMENT"), Some("ca"));
        assert!(filter.matches(&attrs(&["FIRST"], &["POLICE", "GOVERNMENT"], Some("CA"))));
        assert!(!filter.matches(&attrs(&["FIRST"], &["POLICE"], Some("CA"))));
        assert!(!filter.matches(&attrs(&["FOURTH"], &["GOVERNMENT"], Some("CA"))));
        assert!(!filter.matches(&attrs(&["FIRST"], &["GOVERNMENT"], Some("TX"))));
        assert!(!filter.matches(&attrs(&["FIRST"], &["GOVERNMENT"], None)));
    }

    #[test]
    fn params_are_normalized_and_blank_tokens_dropped() {
        let filter = AttributeFilter::from_params(Some(" first, ,fourth,"), Some(""), Some("  "));
        assert_eq!(
            filter.amendments.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["FIRST", "FOURTH"]
        );
        assert!(filter.participants.is_empty());
        assert_eq!(filter.region, None);
    }

    #[test]
    fn builder_matches_param_parsing() {
        let built = AttributeFilter::new()
            .with_amendments(["first"])
            .with_participants(["police", "security"])
            .with_region("az");
        let parsed = AttributeFilter::from_params(Some("FIRST"), Some("POLICE,SECURITY"), Some("AZ"));
        assert_eq!(built, parsed);
    }
}
