use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// Minimum bookable session length in minutes.
pub const MIN_DURATION_MINUTES: i32 = 30;

/// Session length applied when the client does not ask for one.
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Meditation,
    Yoga,
    Mantra,
    Breathwork,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Private,
    Group,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Esewa,
    Khalti,
    Cash,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Meditation => "meditation",
            SessionType::Yoga => "yoga",
            SessionType::Mantra => "mantra",
            SessionType::Breathwork => "breathwork",
        }
    }
}

impl FromStr for SessionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meditation" => Ok(SessionType::Meditation),
            "yoga" => Ok(SessionType::Yoga),
            "mantra" => Ok(SessionType::Mantra),
            "breathwork" => Ok(SessionType::Breathwork),
            other => Err(CoreError::ValidationError(format!(
                "Unknown session type: {}",
                other
            ))),
        }
    }
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Private => "private",
            SessionMode::Group => "group",
        }
    }
}

impl FromStr for SessionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(SessionMode::Private),
            "group" => Ok(SessionMode::Group),
            other => Err(CoreError::ValidationError(format!(
                "Unknown session mode: {}",
                other
            ))),
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Esewa => "esewa",
            PaymentMethod::Khalti => "khalti",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "esewa" => Ok(PaymentMethod::Esewa),
            "khalti" => Ok(PaymentMethod::Khalti),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(CoreError::ValidationError(format!(
                "Unknown payment method: {}",
                other
            ))),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(CoreError::ValidationError(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Upcoming => "upcoming",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(BookingStatus::Upcoming),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!(
                "Unknown booking status: {}",
                other
            ))),
        }
    }
}

/// A user's reservation of a live wellness session.
///
/// `transaction_uuid` is set at payment initiation and is the only key used
/// to reconcile the gateway's asynchronous callback to this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub session_type: SessionType,
    pub session_mode: SessionMode,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub special_request: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub amount: f64,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    pub instructor: String,
    pub transaction_uuid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for booking creation, after the HTTP layer has parsed
/// the raw request. The owner and instructor are attached by the service.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub session_type: SessionType,
    pub session_mode: SessionMode,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub special_request: Option<String>,
    pub payment_method: PaymentMethod,
    pub amount: f64,
    pub duration_minutes: Option<i32>,
}
