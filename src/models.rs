use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub company_name: String,
    pub title: String,
    #[serde(deserialize_with = "deserialize_locations", default)]
    pub locations: Vec<String>,
    pub url: String,
    pub date_posted: i64,
    #[serde(default)]
    pub date_updated: i64,
    pub active: bool,
    #[serde(default)]
    pub sponsorship: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub terms: Vec<String>,
    #[serde(default)]
    pub is_visible: Option<bool>,
}

// The feed sends either `"Austin, TX"` or `["Austin, TX", "Remote"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLocations {
    One(String),
    Many(Vec<String>),
}

fn deserialize_locations<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<RawLocations> = Option::deserialize(deserializer)?;
    let locations = match raw {
        None => Vec::new(),
        Some(RawLocations::One(s)) => vec![s],
        Some(RawLocations::Many(v)) => v,
    };
    Ok(locations
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Listing {
    pub fn is_eligible(&self) -> bool {
        self.active && self.is_visible != Some(false)
    }

    pub fn key(&self) -> ListingKey {
        ListingKey::new(&self.company_name, &self.title)
    }

    pub fn locations_display(&self) -> String {
        self.locations.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingKey(String);

impl ListingKey {
    pub fn new(company: &str, title: &str) -> Self {
        Self(format!("{}-{}", company, title))
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ListingKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ListingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedListing {
    pub listing: Listing,
    pub match_score: u8,
    pub region_eligible: bool,
}

impl AnnotatedListing {
    pub fn key(&self) -> ListingKey {
        self.listing.key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Like,
    Pass,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Like => f.write_str("like"),
            Decision::Pass => f.write_str("pass"),
        }
    }
}

fn default_favorited() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeAction {
    pub job_key: ListingKey,
    pub action: Decision,
    // epoch ms
    pub timestamp: i64,
    // Older entries predate the field; every like used to add the favorite.
    #[serde(default = "default_favorited")]
    pub favorited: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Listing {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_locations_string_and_array_normalize() {
        let one = parse(
            r#"{"company_name":"Acme","title":"SWE Intern","locations":"Austin, TX",
                "url":"https://a","date_posted":1,"date_updated":2,"active":true}"#,
        );
        assert_eq!(one.locations, vec!["Austin, TX"]);

        let many = parse(
            r#"{"company_name":"Acme","title":"SWE Intern","locations":["NYC", " ", "Remote"],
                "url":"https://a","date_posted":1,"date_updated":2,"active":true}"#,
        );
        assert_eq!(many.locations, vec!["NYC", "Remote"]);
    }

    #[test]
    fn test_missing_optional_fields() {
        let listing = parse(
            r#"{"company_name":"Acme","title":"SWE Intern","locations":null,
                "url":"https://a","date_posted":1,"active":false,"terms":null,"extra":42}"#,
        );
        assert!(listing.locations.is_empty());
        assert_eq!(listing.date_updated, 0);
        assert!(listing.terms.is_empty());
        assert_eq!(listing.is_visible, None);
        assert!(!listing.is_eligible());
    }

    #[test]
    fn test_visibility_gates_eligibility() {
        let mut listing = parse(
            r#"{"company_name":"Acme","title":"SWE Intern","locations":"Remote",
                "url":"https://a","date_posted":1,"active":true}"#,
        );
        assert!(listing.is_eligible());
        listing.is_visible = Some(true);
        assert!(listing.is_eligible());
        listing.is_visible = Some(false);
        assert!(!listing.is_eligible());
    }

    #[test]
    fn test_listing_key_format() {
        assert_eq!(ListingKey::new("Acme", "SWE Intern").as_str(), "Acme-SWE Intern");
    }

    #[test]
    fn test_swipe_action_legacy_entry_defaults_favorited() {
        let action: SwipeAction =
            serde_json::from_str(r#"{"jobKey":"Acme-SWE","action":"like","timestamp":5}"#).unwrap();
        assert!(action.favorited);
        assert_eq!(action.action, Decision::Like);
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"jobKey\":\"Acme-SWE\""));
    }
}
