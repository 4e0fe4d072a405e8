//! usbaudio
//!
//! Forwards the audio of an Android device to the host over USB:
//! finds the device, switches it to AOA2 audio accessory mode, then finds
//! the PulseAudio input source it exposes so a player can capture it.
//!
//! Data flows strictly downstream:
//! USB device list → matched records → one selected device →
//! accessory mode → PulseAudio source index → player.

pub mod aoa;
pub mod config;
pub mod orchestrator;
pub mod player;
pub mod pulse;
pub mod test_utils;
pub mod usb;

pub use aoa::{forward_audio, negotiate};
pub use config::AppConfig;
pub use orchestrator::{MAX_DEVICES, enable_accessory_audio, needs_settle_delay, select_device};
pub use player::PlayerCommand;
pub use pulse::{find_source_index, lookup_source_index};
pub use usb::{UsbDeviceRecord, find_devices};
