use uuid::Uuid;

use super::db::Database;
use super::keys::BookingsKey;
use crate::common::StoreError;
use crate::models::{Booking, BookingStatus};

/// Mock booking store: the `bookings` list that admin and profile pages read
/// instead of the booking server.
impl Database {
    /// Newest first.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let mut bookings = self.get_local::<BookingsKey>().await?.unwrap_or_default();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    pub async fn bookings_for_email(&self, email: &str) -> Result<Vec<Booking>, StoreError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .list_bookings()
            .await?
            .into_iter()
            .filter(|b| b.email.trim().to_lowercase() == email)
            .collect())
    }

    pub async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self
            .get_local::<BookingsKey>()
            .await?
            .unwrap_or_default()
            .into_iter()
            .find(|b| b.id == id))
    }

    pub async fn add_booking(&self, booking: Booking) -> Result<(), StoreError> {
        self.update_local::<BookingsKey, _, _>(|bookings| bookings.push(booking))
            .await
    }

    /// Returns `false` when no booking has that id.
    pub async fn set_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<bool, StoreError> {
        self.update_local::<BookingsKey, _, _>(|bookings| {
            match bookings.iter_mut().find(|b| b.id == id) {
                Some(booking) => {
                    booking.status = status;
                    true
                }
                None => false,
            }
        })
        .await
    }

    pub async fn delete_booking(&self, id: Uuid) -> Result<bool, StoreError> {
        self.update_local::<BookingsKey, _, _>(|bookings| {
            let before = bookings.len();
            bookings.retain(|b| b.id != id);
            bookings.len() != before
        })
        .await
    }
}
