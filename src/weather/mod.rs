//! Weather lookup module
//!
//! A thin proxy in front of the RapidAPI weather service.

pub mod client;

pub use client::{WeatherClient, WeatherQuery};
