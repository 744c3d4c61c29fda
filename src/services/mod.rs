pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod payment;
pub mod webhook;
