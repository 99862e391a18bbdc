use crate::db::{FromRecord, Record};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// A registered platform user.
///
/// `id` is assigned by the repository on insert; whatever the caller puts
/// there is overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub telegram_id: String,
}

impl Subscriber {
    /// Column name the id is read back under.
    pub const COL_ID: &'static str = "subscriber_id";
    pub const COL_TELEGRAM_ID: &'static str = "telegram_id";

    pub fn new(telegram_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            telegram_id: telegram_id.into(),
        }
    }
}

impl FromRecord for Subscriber {
    fn from_record(record: &Record) -> Result<Self, StoreError> {
        Ok(Self {
            id: record.text(Self::COL_ID)?,
            telegram_id: record.text(Self::COL_TELEGRAM_ID)?,
        })
    }
}

/// Links one subscriber to one advert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub subscriber_id: String,
    pub advert_id: String,
}

impl Subscription {
    pub const COL_SUBSCRIBER_ID: &'static str = "subscriber_id";
    pub const COL_ADVERT_ID: &'static str = "advert_id";

    pub fn new(subscriber_id: impl Into<String>, advert_id: impl Into<String>) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            advert_id: advert_id.into(),
        }
    }
}
