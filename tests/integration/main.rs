//! Integration tests for the DormHub HTTP and WebSocket surface.

mod helpers;

mod billing_test;
mod housing_test;
mod notification_test;
mod routes_test;
mod ws_test;
