//! REST API tests

mod health_tests;
mod message_tests;
mod room_tests;
