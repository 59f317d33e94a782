use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SeatId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
}

/// Внешнее представление места: копия состояния на момент чтения.
///
/// `locked_by` и `lock_expires_at` заполнены только для `Locked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: SeatId,
    pub status: SeatStatus,
    pub locked_by: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub lock_expires_at: Option<DateTime<Utc>>,
}

impl Seat {
    pub fn available(id: SeatId) -> Self {
        Self {
            id,
            status: SeatStatus::Available,
            locked_by: None,
            lock_expires_at: None,
        }
    }
}
