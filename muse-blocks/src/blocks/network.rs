//! Wireless link state for one interface.
//!
//! Link state comes from sysfs, signal level from `/proc/net/wireless`, the
//! SSID from `nmcli`, and packet loss (optionally) from `ping`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use muse_format::BlockContent;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::error::BlockError;
use crate::probe::{command_succeeds, level_index, read_trimmed, run_command};
use crate::schedule::{poll, Cadence};
use crate::signal::SignalStream;

pub const NET_CLASS_ROOT: &str = "/sys/class/net";
pub const WIRELESS_STATS: &str = "/proc/net/wireless";

const CONNECTION_ICONS: [char; 5] = ['\u{f92e}', '\u{f91e}', '\u{f921}', '\u{f924}', '\u{f927}'];
const PACKET_LOSS_ICONS: [char; 5] = ['\u{f92a}', '\u{f91f}', '\u{f922}', '\u{f925}', '\u{f928}'];
const DISCONNECTED_ICON: char = '\u{f92e}';
const POLL: Duration = Duration::from_secs(5);

const SIGNAL_MAX_DBM: f32 = -20.0;
const NOISE_FLOOR_DBM: f32 = -90.0;

/// Map a signal level in dBm onto 0–100, the curve NetworkManager and
/// i3status use.
pub fn dbm_to_percentage(dbm: f32) -> f32 {
    let dbm = dbm.clamp(NOISE_FLOOR_DBM, SIGNAL_MAX_DBM);
    -0.008 * dbm * dbm + 0.2 * dbm + 100.0
}

/// Signal level of `interface` in dBm from `/proc/net/wireless` contents.
pub fn parse_wireless_level(stats: &str, interface: &str) -> Option<f32> {
    stats.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        if fields.next()?.trim_end_matches(':') != interface {
            return None;
        }
        // status, link quality, then level
        fields.nth(2)?.trim_end_matches('.').parse().ok()
    })
}

/// The active SSID from `nmcli -t -f active,ssid dev wifi list` output.
/// Terse mode escapes colons in values as `\:`.
pub fn parse_active_ssid(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("yes:"))
        .map(|ssid| ssid.replace("\\:", ":"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    PacketLoss,
}

impl LinkStatus {
    fn from_operstate(operstate: &str) -> Self {
        match operstate {
            "up" => LinkStatus::Connected,
            "dormant" => LinkStatus::Connecting,
            _ => LinkStatus::Disconnected,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LinkStatus::Disconnected => "Disconnected",
            LinkStatus::Connecting => "Connecting",
            LinkStatus::Connected => "",
            LinkStatus::PacketLoss => "Packet loss",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NetworkState {
    status: LinkStatus,
    ssid: String,
    strength: u32,
}

#[derive(Debug)]
pub struct NetworkBlock {
    interface: String,
    iface_dir: PathBuf,
    wireless_stats: PathBuf,
    packet_loss_check: bool,
    state: Mutex<NetworkState>,
}

impl NetworkBlock {
    pub fn new(interface: &str, packet_loss_check: bool) -> Result<Self, BlockError> {
        Self::with_paths(
            Path::new(NET_CLASS_ROOT),
            Path::new(WIRELESS_STATS),
            interface,
            packet_loss_check,
        )
    }

    pub fn with_paths(
        net_root: &Path,
        wireless_stats: &Path,
        interface: &str,
        packet_loss_check: bool,
    ) -> Result<Self, BlockError> {
        let iface_dir = net_root.join(interface);
        if !iface_dir.exists() {
            return Err(BlockError::MissingPath { path: iface_dir });
        }
        Ok(Self {
            interface: interface.to_string(),
            iface_dir,
            wireless_stats: wireless_stats.to_path_buf(),
            packet_loss_check,
            state: Mutex::new(NetworkState::default()),
        })
    }

    fn signal_strength(&self) -> Option<u32> {
        let stats = read_trimmed(&self.wireless_stats).ok()?;
        let dbm = parse_wireless_level(&stats, &self.interface)?;
        Some(dbm_to_percentage(dbm).round() as u32)
    }

    fn active_ssid(&self) -> Option<String> {
        let output = run_command(
            "nmcli",
            &["-t", "-f", "active,ssid", "dev", "wifi", "list", "ifname", &self.interface],
        );
        match output {
            Ok(output) => parse_active_ssid(&output),
            Err(err) => {
                tracing::debug!(error = %err, "ssid query failed");
                None
            }
        }
    }

    fn has_packet_loss(&self) -> bool {
        !command_succeeds(
            "ping",
            &["-c", "2", "-W", "2", "-I", &self.interface, "8.8.8.8"],
        )
    }
}

impl Block for NetworkBlock {
    fn name(&self) -> &str {
        "network"
    }

    fn update(&self) {
        let operstate = match read_trimmed(&self.iface_dir.join("operstate")) {
            Ok(operstate) => operstate,
            Err(err) => {
                tracing::debug!(error = %err, "network probe failed");
                return;
            }
        };

        let mut next = lock(&self.state).clone();
        next.status = LinkStatus::from_operstate(&operstate);
        if next.status == LinkStatus::Disconnected {
            *lock(&self.state) = NetworkState::default();
            return;
        }

        if let Some(strength) = self.signal_strength() {
            next.strength = strength;
        }
        if let Some(ssid) = self.active_ssid() {
            next.ssid = ssid;
        }
        if next.status == LinkStatus::Connected && self.packet_loss_check && self.has_packet_loss()
        {
            next.status = LinkStatus::PacketLoss;
        }
        *lock(&self.state) = next;
    }

    fn content(&self) -> BlockContent {
        let state = lock(&self.state).clone();
        let icon = match state.status {
            LinkStatus::Disconnected | LinkStatus::Connecting => DISCONNECTED_ICON,
            LinkStatus::Connected => {
                CONNECTION_ICONS[level_index(state.strength, CONNECTION_ICONS.len())]
            }
            LinkStatus::PacketLoss => {
                PACKET_LOSS_ICONS[level_index(state.strength, PACKET_LOSS_ICONS.len())]
            }
        };
        BlockContent {
            icon: Some(icon),
            primary: state.ssid,
            secondary: state.status.label().to_string(),
            hidden: state.status == LinkStatus::Disconnected,
            ..BlockContent::default()
        }
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        poll(self, Cadence::every(POLL), shutdown)
    }
}
