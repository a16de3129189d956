//! Integration tests for Store-Walker
//!
//! These tests serve a small store directory from wiremock and walk it
//! end-to-end with the static markup driver.

mod scrape_tests;
