use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq<&str> for BookingStatus {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid booking status: {}", s)),
        }
    }
}

/// Booking as kept in the mock booking store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub tour_package_id: i64,
    pub tour_title: String,
    pub guests: u32,
    pub tour_date: NaiveDate,
    pub message: String,
    pub status: BookingStatus,
    pub estimated_total: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// JSON body of `POST /bookings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub user_id: Option<String>,
    pub tour_package_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub guests: u32,
    pub tour_date: NaiveDate,
    pub message: String,
}

impl Booking {
    pub fn from_request(
        request: &BookingRequest,
        tour_title: &str,
        estimated_total: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            tour_package_id: request.tour_package_id,
            tour_title: tour_title.to_string(),
            guests: request.guests,
            tour_date: request.tour_date,
            message: request.message.clone(),
            status: BookingStatus::Pending,
            estimated_total,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == BookingStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Accepted".parse::<BookingStatus>(), Ok(BookingStatus::Accepted));
        assert!("cancelled".parse::<BookingStatus>().is_err());
        assert_eq!(BookingStatus::default(), "pending");
    }

    #[test]
    fn request_serializes_date_as_iso() {
        let request = BookingRequest {
            user_id: None,
            tour_package_id: 4,
            name: "Nimal".into(),
            email: "nimal@example.com".into(),
            phone: "+94 77 000 0000".into(),
            guests: 2,
            tour_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            message: String::new(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tour_date"], "2026-12-01");
        assert_eq!(json["user_id"], serde_json::Value::Null);
        assert_eq!(json["guests"], 2);
    }
}
