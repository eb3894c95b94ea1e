use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::FetchError;

/// Stable identifier of a record, used only to key list rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record of a remote collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ItemId(id.into()),
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Normalize a raw JSON record. The id comes from `_id` or `id`, the
    /// display name from `name` or `title`; everything else is kept as-is.
    pub fn from_record(record: Value) -> Result<Self, FetchError> {
        let Value::Object(mut fields) = record else {
            return Err(FetchError::MalformedResponse(format!(
                "expected an object record, got {}",
                json_kind(&record)
            )));
        };

        let id = ["_id", "id"]
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some((*key, s.clone())),
                Some(Value::Number(n)) => Some((*key, n.to_string())),
                _ => None,
            })
            .map(|(key, id)| {
                fields.remove(key);
                id
            })
            .ok_or_else(|| FetchError::MalformedResponse("record has no id".to_string()))?;

        let name = ["name", "title"]
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(s)) => Some((*key, s.clone())),
                _ => None,
            })
            .map(|(key, name)| {
                fields.remove(key);
                name
            })
            .unwrap_or_default();

        Ok(Self {
            id: ItemId(id),
            name,
            fields,
        })
    }

    /// External page for this record, if the source provides one
    pub fn link(&self) -> Option<&str> {
        ["sourceUrl", "url"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(Value::as_str))
            .filter(|url| !url.is_empty())
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.fields.get("updatedAt")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// String entries of an array field; empty when absent or not an array.
    pub fn list_field(&self, key: &str) -> Vec<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// One batch of items returned by a single page request
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub number: u32,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(number: u32, items: Vec<T>) -> Self {
        Self { number, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Fewer items than requested. Only meaningful as an end-of-data hint.
    pub fn is_short(&self, page_size: u32) -> bool {
        self.items.len() < page_size as usize
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_with_numeric_underscore_id() {
        let item = Item::from_record(json!({
            "_id": 112,
            "name": "Achilles",
            "films": ["Hercules (film)"],
            "sourceUrl": "https://disney.fandom.com/wiki/Achilles_(Hercules)"
        }))
        .unwrap();

        assert_eq!(item.id, ItemId("112".to_string()));
        assert_eq!(item.name, "Achilles");
        assert_eq!(item.list_field("films"), vec!["Hercules (film)"]);
        assert_eq!(
            item.link(),
            Some("https://disney.fandom.com/wiki/Achilles_(Hercules)")
        );
        assert!(!item.fields.contains_key("_id"));
        assert!(!item.fields.contains_key("name"));
    }

    #[test]
    fn record_falls_back_to_id_and_title() {
        let item = Item::from_record(json!({"id": "job-3", "title": "Product Manager"})).unwrap();
        assert_eq!(item.id.to_string(), "job-3");
        assert_eq!(item.name, "Product Manager");
    }

    #[test]
    fn record_without_id_is_malformed() {
        let err = Item::from_record(json!({"name": "nobody"})).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn non_object_record_is_malformed() {
        let err = Item::from_record(json!("just a string")).unwrap_err();
        assert_eq!(
            err,
            FetchError::MalformedResponse("expected an object record, got a string".to_string())
        );
    }

    #[test]
    fn missing_name_is_empty() {
        let item = Item::from_record(json!({"_id": 1})).unwrap();
        assert_eq!(item.name, "");
    }

    #[test]
    fn updated_at_parses_rfc3339() {
        let item = Item::from_record(json!({
            "_id": 6,
            "name": "'Olu Mel",
            "updatedAt": "2021-12-20T20:39:18.033Z"
        }))
        .unwrap();
        let ts = item.updated_at().unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-12-20T20:39:18.033+00:00");
    }

    #[test]
    fn updated_at_invalid_is_none() {
        let mut item = Item::new("1", "x");
        item.fields
            .insert("updatedAt".to_string(), json!("yesterday"));
        assert!(item.updated_at().is_none());
    }

    #[test]
    fn empty_link_is_none() {
        let mut item = Item::new("1", "x");
        item.fields.insert("sourceUrl".to_string(), json!(""));
        assert!(item.link().is_none());
    }

    #[test]
    fn short_page_detection() {
        let page = Page::new(2, vec![Item::new("1", "a"), Item::new("2", "b")]);
        assert!(page.is_short(20));
        assert!(!page.is_short(2));
        assert!(Page::<Item>::new(3, vec![]).is_short(1));
    }
}
