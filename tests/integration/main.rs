//! Integration tests for quip-export
//!
//! These tests use wiremock to stand in for the source service and the
//! Notion API and drive whole export runs end-to-end.

mod pipeline_tests;
mod sink_tests;
mod support;
