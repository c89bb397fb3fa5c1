//! HTTP handler modules for the bgcut API.
//!
//! Handlers are thin: they parse and validate the request, delegate to the
//! segmentation engine, and shape the response. No inference logic lives
//! here.

pub mod health;
pub mod remove;
