//! Concrete blocks, one module per collaborator.

pub mod battery;
pub mod brightness;
pub mod bspwm;
pub mod date;
pub mod i3;
pub mod mpd;
pub mod network;
pub mod playerctl;
pub mod volume;
pub mod weather;
pub mod window;

pub use battery::BatteryBlock;
pub use brightness::BrightnessBlock;
pub use bspwm::BspwmBlock;
pub use date::DateBlock;
pub use i3::I3Block;
pub use mpd::MpdBlock;
pub use network::NetworkBlock;
pub use playerctl::PlayerctlBlock;
pub use volume::VolumeBlock;
pub use weather::WeatherBlock;
pub use window::WindowBlock;
