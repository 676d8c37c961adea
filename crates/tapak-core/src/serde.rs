use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Deserializes an optional string into an optional i64.
///
/// Query strings deliver numbers as text and empty values (`?page=`) are
/// treated as absent.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Deserializes an optional string, mapping empty or whitespace-only input to `None`.
pub fn deserialize_optional_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
        search: Option<String>,
    }

    #[test]
    fn test_empty_uuid_is_none() {
        let q: Query = serde_json::from_str(r#"{"id":""}"#).unwrap();
        assert!(q.id.is_none());
    }

    #[test]
    fn test_valid_uuid_parses() {
        let id = Uuid::new_v4();
        let q: Query = serde_json::from_str(&format!(r#"{{"id":"{id}"}}"#)).unwrap();
        assert_eq!(q.id, Some(id));
    }

    #[test]
    fn test_invalid_uuid_errors() {
        assert!(serde_json::from_str::<Query>(r#"{"id":"nope"}"#).is_err());
    }

    #[test]
    fn test_search_trimmed() {
        let q: Query = serde_json::from_str(r#"{"search":"  alpha "}"#).unwrap();
        assert_eq!(q.search.as_deref(), Some("alpha"));

        let q: Query = serde_json::from_str(r#"{"search":"   "}"#).unwrap();
        assert!(q.search.is_none());
    }
}
