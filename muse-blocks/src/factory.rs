use std::sync::Arc;

use muse_core::{BlockSpec, Theme};

use crate::block::Block;
use crate::blocks::{
    BatteryBlock, BrightnessBlock, BspwmBlock, DateBlock, I3Block, MpdBlock, NetworkBlock,
    PlayerctlBlock, VolumeBlock, WeatherBlock, WindowBlock,
};
use crate::error::BlockError;

/// Construct the block a config entry describes. Errors mean the block's
/// resource is unavailable; callers omit the block.
pub fn build(spec: &BlockSpec, theme: &Theme) -> Result<Arc<dyn Block>, BlockError> {
    let block: Arc<dyn Block> = match spec {
        BlockSpec::Date => Arc::new(DateBlock::new()),
        BlockSpec::Window { rapidfire } => Arc::new(WindowBlock::new(*rapidfire)),
        BlockSpec::Playerctl => Arc::new(PlayerctlBlock::new()),
        BlockSpec::Mpd { host, port } => Arc::new(MpdBlock::new(host.as_str(), *port)),
        BlockSpec::Bspwm => Arc::new(BspwmBlock::new()),
        BlockSpec::I3 => Arc::new(I3Block::new()),
        BlockSpec::Brightness { card, notify_only } => {
            Arc::new(BrightnessBlock::new(card, *notify_only, theme)?)
        }
        BlockSpec::Volume {
            control,
            notify_only,
        } => Arc::new(VolumeBlock::new(control.as_str(), *notify_only, theme)),
        BlockSpec::Battery {
            battery,
            warning_level,
            alarm_level,
        } => Arc::new(BatteryBlock::new(battery, *warning_level, *alarm_level)?),
        BlockSpec::Network {
            interface,
            packet_loss_check,
        } => Arc::new(NetworkBlock::new(interface, *packet_loss_check)?),
        BlockSpec::Weather {
            ipstack_key,
            openweathermap_key,
            units,
        } => Arc::new(WeatherBlock::new(
            ipstack_key.as_str(),
            openweathermap_key.as_str(),
            units.as_str(),
        )?),
    };
    Ok(block)
}
