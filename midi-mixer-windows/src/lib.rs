//! # midi-mixer-windows
//!
//! Windows WASAPI backend and MIDI front end for midi-mixer.
//!
//! Provides:
//! - `WasapiBackend`: default endpoints, active devices and change notifications via MMDevice API
//! - `WindowsForeground`: executable name of the foreground window's process
//! - `MidiInputPort`: control change stream from a MIDI input port
//! - `app`: wiring for the `midi-mixer` binary
//!
//! ## Platform Requirements
//! - Windows 10+
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use midi_mixer_core::{Mixer, RefreshTimings};
//! use midi_mixer_windows::{ComGuard, WasapiBackend, WindowsForeground};
//!
//! let _com = ComGuard::init_multithreaded()?;
//! let backend = Arc::new(WasapiBackend::new()?);
//! let mixer = Mixer::start(backend, Arc::new(WindowsForeground), RefreshTimings::default())?;
//! ```

#[cfg(target_os = "windows")]
pub mod app;
#[cfg(target_os = "windows")]
pub mod backend;
#[cfg(target_os = "windows")]
pub mod com;
#[cfg(target_os = "windows")]
pub mod console;
#[cfg(target_os = "windows")]
pub mod endpoint;
#[cfg(target_os = "windows")]
pub mod foreground;
#[cfg(target_os = "windows")]
pub mod midi_input;
#[cfg(target_os = "windows")]
mod notifications;
#[cfg(target_os = "windows")]
pub mod process;
#[cfg(target_os = "windows")]
pub mod session;

#[cfg(target_os = "windows")]
pub use backend::WasapiBackend;
#[cfg(target_os = "windows")]
pub use com::ComGuard;
#[cfg(target_os = "windows")]
pub use foreground::WindowsForeground;
#[cfg(target_os = "windows")]
pub use midi_input::{input_port_names, MidiInputPort};
