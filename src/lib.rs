//! camclip - camera and microphone capture sessions
//!
//! This crate records synchronized camera and microphone clips to an MP4
//! file, with live frame observation and mid-session camera switching.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, nokhwa, ffmpeg, config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
