//! chat-bubbles - render scripted dialogue transcripts as themed chat bubbles

pub mod bubble;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod settings;
pub mod storage;
pub mod telemetry;
pub mod template;
pub mod transcript;
pub mod upload;
