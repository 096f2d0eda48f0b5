//! Weekly study timetable: per-user task boards kept in sync with a
//! realtime document store.

pub mod app;
pub mod auth;
pub mod board;
pub mod config;
pub mod export;
pub mod modal;
pub mod session;
pub mod store;
pub mod timeslot;
pub mod ui;
