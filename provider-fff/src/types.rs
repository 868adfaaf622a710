//! FFF API collection envelopes
//!
//! The API is an API Platform (JSON-LD) backend but is not consistent about
//! how it wraps lists. Depending on the endpoint a collection arrives as:
//!
//! - a bare JSON array
//! - a Hydra object with `hydra:member` and, when paginated,
//!   `hydra:view.hydra:next`
//! - an object keyed by arbitrary strings whose values are the items
//!   (seen on some cup match lists)

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FffError, Result};

const HYDRA_MEMBER: &str = "hydra:member";
const HYDRA_VIEW: &str = "hydra:view";
const HYDRA_NEXT: &str = "hydra:next";

/// One page of a normalized collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage {
    pub items: Vec<Value>,
    /// Link to the next page, as sent by the API (usually a root-relative path)
    pub next: Option<String>,
}

impl CollectionPage {
    /// Normalize a decoded body into a page
    ///
    /// `item_key` names a field every item carries; it is used to pick items
    /// out of a keyed object. `url` is only used in error messages.
    pub fn from_value(value: Value, item_key: &str, url: &str) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(Self { items, next: None }),
            Value::Object(mut map) => {
                if let Some(members) = map.remove(HYDRA_MEMBER) {
                    let items = match members {
                        Value::Array(items) => items,
                        Value::Null => Vec::new(),
                        other => {
                            return Err(FffError::UnexpectedShape {
                                url: url.to_string(),
                                detail: format!("hydra:member is {}", kind(&other)),
                            })
                        }
                    };
                    let next = map
                        .get(HYDRA_VIEW)
                        .and_then(|view| view.get(HYDRA_NEXT))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    return Ok(Self { items, next });
                }

                if map.is_empty() {
                    return Ok(Self {
                        items: Vec::new(),
                        next: None,
                    });
                }

                let items: Vec<Value> = map
                    .into_iter()
                    .map(|(_, v)| v)
                    .filter(|v| v.get(item_key).is_some())
                    .collect();

                if items.is_empty() {
                    return Err(FffError::UnexpectedShape {
                        url: url.to_string(),
                        detail: format!("object without hydra:member or '{}' items", item_key),
                    });
                }

                Ok(Self { items, next: None })
            }
            other => Err(FffError::UnexpectedShape {
                url: url.to_string(),
                detail: format!("expected a collection, got {}", kind(&other)),
            }),
        }
    }

    /// Deserialize every item into `T`
    ///
    /// Items that do not fit `T` are left out and described in `rejected`;
    /// one bad record never costs the rest of the page.
    pub fn decode<T: DeserializeOwned>(self) -> Decoded<T> {
        let mut decoded = Decoded {
            items: Vec::with_capacity(self.items.len()),
            rejected: Vec::new(),
        };

        for (index, item) in self.items.into_iter().enumerate() {
            match serde_json::from_value(item) {
                Ok(value) => decoded.items.push(value),
                Err(e) => decoded.rejected.push(format!("item {}: {}", index, e)),
            }
        }

        decoded
    }
}

/// Result of decoding one page
#[derive(Debug)]
pub struct Decoded<T> {
    pub items: Vec<T>,
    pub rejected: Vec<String>,
}

/// Resolve a pagination link against the configured API base URL
///
/// Absolute links are returned as-is; root-relative links are joined to the
/// base URL's origin; anything else is appended to the base URL.
pub fn resolve_link(base_url: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }

    if link.starts_with('/') {
        let origin_end = base_url
            .find("://")
            .and_then(|scheme| base_url[scheme + 3..].find('/').map(|i| scheme + 3 + i))
            .unwrap_or(base_url.len());
        return format!("{}{}", &base_url[..origin_end], link);
    }

    format!("{}/{}", base_url.trim_end_matches('/'), link)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
