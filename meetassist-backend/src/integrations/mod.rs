//! External systems (calendar, mail) behind trait seams, with local mock providers

pub mod calendar;
pub mod email;

pub use calendar::{CalendarEvent, CalendarProvider, MockCalendar};
pub use email::{EmailSender, MockMailer};
