use chrono::NaiveDate;
use serde::Deserialize;

use super::pricing::estimate_for;
use crate::api::Backend;
use crate::common::{FieldErrors, SubmitError, validate_email};
use crate::db::Database;
use crate::log_err;
use crate::models::{Booking, BookingRequest, SessionUser, TourPackage};

pub const MAX_GUESTS: u32 = 50;
const MAX_MESSAGE_CHARS: usize = 1000;

/// Booking form as posted. Kept as text so a rejected form re-renders with
/// exactly what was typed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub tour_package_id: String,
    pub guests: String,
    pub tour_date: String,
    pub message: String,
}

impl BookingForm {
    /// Contact fields prefilled from the signed-in user.
    pub fn for_user(user: Option<&SessionUser>) -> Self {
        match user {
            Some(user) => Self {
                name: user.name.clone(),
                email: user.email.clone(),
                phone: user.phone.clone(),
                ..Default::default()
            },
            None => Self::default(),
        }
    }

    pub fn tour_id(&self) -> Option<i64> {
        self.tour_package_id.trim().parse().ok()
    }

    pub fn guest_count(&self) -> Option<u32> {
        self.guests.trim().parse().ok()
    }

    pub fn selected_tour<'a>(&self, tours: &'a [TourPackage]) -> Option<&'a TourPackage> {
        let id = self.tour_id()?;
        tours.iter().find(|tour| tour.id == Some(id))
    }

    pub fn estimate(&self, tours: &[TourPackage]) -> Option<f64> {
        estimate_for(self.selected_tour(tours), self.guest_count())
    }

    /// Checks every field and builds the request body. `today` bounds the
    /// tour date.
    pub fn validate(
        &self,
        tours: &[TourPackage],
        user_id: Option<&str>,
        today: NaiveDate,
    ) -> Result<BookingRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.chars().count() < 2 {
            errors.insert("name", "Please enter your full name");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email", "Email is required");
        } else if !validate_email(email) {
            errors.insert("email", "Enter a valid email address");
        }

        let phone = self.phone.trim();
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if phone.is_empty() {
            errors.insert("phone", "Phone number is required");
        } else if digits < 7 || phone.len() > 30 {
            errors.insert("phone", "Enter a valid phone number");
        }

        let tour = self.selected_tour(tours);
        if tour.is_none() {
            errors.insert("tour_package_id", "Please choose a tour package");
        }

        let guests = self.guest_count().filter(|g| (1..=MAX_GUESTS).contains(g));
        if guests.is_none() {
            errors.insert(
                "guests",
                format!("Guests must be between 1 and {MAX_GUESTS}"),
            );
        }

        let date = NaiveDate::parse_from_str(self.tour_date.trim(), "%Y-%m-%d").ok();
        match date {
            None => errors.insert("tour_date", "Please choose a tour date"),
            Some(date) if date < today => {
                errors.insert("tour_date", "The tour date cannot be in the past")
            }
            Some(_) => {}
        }

        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            errors.insert(
                "message",
                format!("Message must be at most {MAX_MESSAGE_CHARS} characters"),
            );
        }

        match (tour.and_then(|t| t.id), guests, date) {
            (Some(tour_package_id), Some(guests), Some(tour_date)) if errors.is_empty() => {
                Ok(BookingRequest {
                    user_id: user_id.map(str::to_string),
                    tour_package_id,
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: phone.to_string(),
                    guests,
                    tour_date,
                    message: self.message.trim().to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Posts the booking to the server and, once accepted there, records it in
/// the mock booking store for the admin and profile pages.
pub async fn submit_booking(
    backend: &dyn Backend,
    db: &Database,
    form: &BookingForm,
    tours: &[TourPackage],
    user: Option<&SessionUser>,
    today: NaiveDate,
) -> Result<Booking, SubmitError> {
    let request = form.validate(tours, user.map(|u| u.id.as_str()), today)?;
    let tour_title = form
        .selected_tour(tours)
        .map(|t| t.display_title().to_string())
        .unwrap_or_default();

    backend.create_booking(&request).await?;
    log::info!(
        "Booking sent for tour {} ({} guests on {})",
        request.tour_package_id,
        request.guests,
        request.tour_date
    );

    let booking = Booking::from_request(&request, &tour_title, form.estimate(tours));
    if let Err(err) = db.add_booking(booking.clone()).await {
        log_err!(err, serde_json::json!({ "booking_id": booking.id }));
    }
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tours() -> Vec<TourPackage> {
        vec![TourPackage {
            id: Some(4),
            title: "Yala Safari".into(),
            price: "$135".into(),
            ..Default::default()
        }]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    fn valid_form() -> BookingForm {
        BookingForm {
            name: "Nimal Perera".into(),
            email: "nimal@example.com".into(),
            phone: "+94 77 123 4567".into(),
            tour_package_id: "4".into(),
            guests: "3".into(),
            tour_date: "2026-11-20".into(),
            message: " Vegetarian lunch please ".into(),
        }
    }

    #[test]
    fn valid_form_builds_request() {
        let request = valid_form().validate(&tours(), Some("u-1"), today()).unwrap();
        assert_eq!(request.tour_package_id, 4);
        assert_eq!(request.guests, 3);
        assert_eq!(request.user_id.as_deref(), Some("u-1"));
        assert_eq!(request.message, "Vegetarian lunch please");
    }

    #[test]
    fn estimate_follows_selected_tour() {
        let mut form = valid_form();
        assert_eq!(form.estimate(&tours()), Some(405.0));
        form.tour_package_id = "99".into();
        assert_eq!(form.estimate(&tours()), None);
    }

    #[test]
    fn invalid_fields_are_reported_in_form_order() {
        let form = BookingForm {
            email: "nope".into(),
            guests: "0".into(),
            tour_date: "2026-09-30".into(),
            ..valid_form()
        };
        let errors = form.validate(&tours(), None, today()).unwrap_err();
        let paths: Vec<_> = errors.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["email", "guests", "tour_date"]);
    }

    #[test]
    fn prefill_uses_session_user() {
        let user = SessionUser {
            id: "7".into(),
            name: "Ayesha".into(),
            email: "ayesha@example.com".into(),
            phone: "0771234567".into(),
            ..Default::default()
        };
        let form = BookingForm::for_user(Some(&user));
        assert_eq!(form.email, "ayesha@example.com");
        assert!(form.tour_package_id.is_empty());
    }
}
