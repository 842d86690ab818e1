//! Entities kept in cache views
//!
//! Only the fields the cache views need (identity, ordering, lookup by name
//! or age) are mapped. Unknown fields are ignored.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An item that can be looked up in a cache view by identity key
pub trait Cacheable {
    fn cache_id(&self) -> &str;
}

/// A match between the authenticated user and another user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub person: Option<MatchedPerson>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: u32,
}

/// The other side of a [`Match`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPerson {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<DateTime<Utc>>,
}

/// A chat message inside a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub match_id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, rename = "message")]
    pub content: String,
    #[serde(default)]
    pub sent_date: Option<DateTime<Utc>>,
}

impl Cacheable for Match {
    fn cache_id(&self) -> &str {
        &self.id
    }
}

impl Cacheable for Message {
    fn cache_id(&self) -> &str {
        &self.id
    }
}

impl Match {
    pub fn name(&self) -> Option<&str> {
        self.person.as_ref().map(|person| person.name.as_str())
    }
}

impl MatchedPerson {
    /// Age in whole years on `today`, if the birth date is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let born = self.birth_date?.date_naive();
        let mut years = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }
}
