//! Page envelope decoding
//!
//! Paginated endpoints answer with
//! `{ "data": { "<items_key>": [...], "next_page_token": "..." } }`.
//! Only those two structural fields are read here; item decoding is left to
//! the item type's `Deserialize` impl.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::constants::{DATA_KEY, NEXT_PAGE_TOKEN_KEY};
use crate::errors::{RednitError, Result};
use crate::types::response::RawResponse;

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the following page; `None` marks the terminal page.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a page envelope, reading items from `data.<items_key>`.
    ///
    /// A missing or `null` items array is an empty page; an empty token is
    /// treated as absent.
    ///
    /// # Errors
    /// Returns `RednitError::Parsing` for a body that is not an envelope, a
    /// non-array items field, a non-string token, or items that fail to
    /// deserialize.
    pub fn decode(response: &RawResponse, items_key: &str) -> Result<Self> {
        let mut envelope: Value = response.json()?;
        let data = envelope
            .get_mut(DATA_KEY)
            .filter(|data| data.is_object())
            .ok_or_else(|| RednitError::Parsing(format!("page envelope has no {DATA_KEY} object")))?;

        let items = match data.get_mut(items_key).map(Value::take) {
            None | Some(Value::Null) => Vec::new(),
            Some(array @ Value::Array(_)) => serde_json::from_value(array).map_err(|e| {
                RednitError::Parsing(format!("failed to decode {items_key}: {e}"))
            })?,
            Some(other) => {
                return Err(RednitError::Parsing(format!(
                    "expected {items_key} to be an array, found {other}"
                )))
            }
        };

        let next_page_token = match data.get(NEXT_PAGE_TOKEN_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) if token.is_empty() => None,
            Some(Value::String(token)) => Some(token.clone()),
            Some(other) => {
                return Err(RednitError::Parsing(format!(
                    "expected {NEXT_PAGE_TOKEN_KEY} to be a string, found {other}"
                )))
            }
        };

        Ok(Self { items, next_page_token })
    }
}

/// Decode a single-object `{ "data": { ... } }` envelope.
///
/// # Errors
/// Returns `RednitError::Parsing` when the envelope or the object is malformed.
pub fn decode_data<T: DeserializeOwned>(response: &RawResponse) -> Result<T> {
    let mut envelope: Value = response.json()?;
    let data = envelope
        .get_mut(DATA_KEY)
        .map(Value::take)
        .ok_or_else(|| RednitError::Parsing(format!("response has no {DATA_KEY} object")))?;
    serde_json::from_value(data).map_err(|e| RednitError::Parsing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    #[test]
    fn decodes_items_and_token() {
        let body = r#"{"data":{"matches":[{"id":"a"},{"id":"b"}],"next_page_token":"p1"}}"#;
        let page: Page<Item> = Page::decode(&RawResponse::new(200, body), "matches").unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].id, "b");
        assert_eq!(page.next_page_token.as_deref(), Some("p1"));
        assert!(!page.is_last());
    }

    #[test]
    fn missing_token_marks_terminal_page() {
        let body = r#"{"data":{"messages":[{"id":"a"}]}}"#;
        let page: Page<Item> = Page::decode(&RawResponse::new(200, body), "messages").unwrap();
        assert!(page.is_last());
    }

    #[test]
    fn empty_token_is_treated_as_absent() {
        let body = r#"{"data":{"messages":[],"next_page_token":""}}"#;
        let page: Page<Item> = Page::decode(&RawResponse::new(200, body), "messages").unwrap();
        assert!(page.items.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn missing_data_is_a_parsing_error() {
        let result: Result<Page<Item>> =
            Page::decode(&RawResponse::new(200, r#"{"matches":[]}"#), "matches");
        assert!(matches!(result, Err(RednitError::Parsing(_))));
    }

    #[test]
    fn non_array_items_are_a_parsing_error() {
        let body = r#"{"data":{"matches":{"id":"a"}}}"#;
        let result: Result<Page<Item>> = Page::decode(&RawResponse::new(200, body), "matches");
        assert!(matches!(result, Err(RednitError::Parsing(_))));
    }

    #[test]
    fn decode_data_unwraps_envelope() {
        let item: Item = decode_data(&RawResponse::new(200, r#"{"data":{"id":"x"}}"#)).unwrap();
        assert_eq!(item, Item { id: "x".into() });
    }
}
