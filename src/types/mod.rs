//! Data types shared across the client
//!
//! This module contains the notification records produced by the router and
//! held by the sink.

mod notification;

pub use notification::{NewNotification, Notification, NotificationCategory};
