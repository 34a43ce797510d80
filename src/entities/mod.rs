//! sea-orm entities backing the booking schema.

pub mod booking;
pub mod partner;
pub mod schedule;
pub mod service;
pub mod service_point;
pub mod service_point_photo;
pub mod service_point_service;
pub mod service_post;
