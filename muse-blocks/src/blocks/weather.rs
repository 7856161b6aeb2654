//! Current conditions: external IP → location (ipstack) → OpenWeatherMap.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use muse_format::BlockContent;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::error::BlockError;
use crate::schedule::{poll, Cadence};
use crate::signal::SignalStream;

const IP_URL: &str = "http://checkip.amazonaws.com";
const IPSTACK_URL: &str = "http://api.ipstack.com";
const OPENWEATHERMAP_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
const POLL: Duration = Duration::from_secs(20 * 60);
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_ICON: char = '\u{f50f}';

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Readings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Readings {
    pub temp: f64,
}

impl Report {
    pub fn temperature_text(&self) -> String {
        format!("{}°", self.main.temp.round() as i64)
    }

    pub fn description(&self) -> String {
        self.weather
            .first()
            .map(|condition| capitalize(&condition.description))
            .unwrap_or_default()
    }

    pub fn icon(&self) -> char {
        self.weather
            .first()
            .map(|condition| icon_for(&condition.icon))
            .unwrap_or(DEFAULT_ICON)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Glyph for an OpenWeatherMap icon code such as `10d`.
pub fn icon_for(code: &str) -> char {
    match code {
        "01d" => '\u{e30d}',
        "01n" => '\u{e32b}',
        "02d" => '\u{e30c}',
        "02n" => '\u{e379}',
        "03d" => '\u{e302}',
        "03n" => '\u{e37e}',
        "04d" | "04n" => '\u{e33d}',
        "09d" => '\u{e309}',
        "09n" => '\u{e326}',
        "10d" => '\u{e308}',
        "10n" => '\u{e325}',
        "11d" => '\u{e305}',
        "11n" => '\u{e322}',
        "13d" => '\u{e30a}',
        "13n" => '\u{e327}',
        "50d" => '\u{e303}',
        "50n" => '\u{e313}',
        _ => DEFAULT_ICON,
    }
}

pub struct WeatherBlock {
    ipstack_key: String,
    openweathermap_key: String,
    units: String,
    agent: ureq::Agent,
    location: Mutex<Option<Location>>,
    report: Mutex<Option<Report>>,
}

impl WeatherBlock {
    pub fn new(
        ipstack_key: impl Into<String>,
        openweathermap_key: impl Into<String>,
        units: impl Into<String>,
    ) -> Result<Self, BlockError> {
        let ipstack_key = ipstack_key.into();
        let openweathermap_key = openweathermap_key.into();
        if ipstack_key.trim().is_empty() {
            return Err(BlockError::MissingSetting("ipstack_key"));
        }
        if openweathermap_key.trim().is_empty() {
            return Err(BlockError::MissingSetting("openweathermap_key"));
        }

        Ok(Self {
            ipstack_key,
            openweathermap_key,
            units: units.into(),
            agent: ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build(),
            location: Mutex::new(None),
            report: Mutex::new(None),
        })
    }

    /// Show a report directly, bypassing the network.
    pub fn set_report(&self, report: Report) {
        *lock(&self.report) = Some(report);
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BlockError> {
        let http_err = |reason: String| BlockError::Http {
            url: url.to_string(),
            reason,
        };
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        request
            .call()
            .map_err(|err| http_err(err.to_string()))?
            .into_json()
            .map_err(|err| http_err(err.to_string()))
    }

    fn locate(&self) -> Result<Location, BlockError> {
        if let Some(location) = *lock(&self.location) {
            return Ok(location);
        }

        let http_err = |reason: String| BlockError::Http {
            url: IP_URL.to_string(),
            reason,
        };
        let ip = self
            .agent
            .get(IP_URL)
            .call()
            .map_err(|err| http_err(err.to_string()))?
            .into_string()
            .map_err(|err| http_err(err.to_string()))?;
        let url = format!("{IPSTACK_URL}/{}", ip.trim());
        let location: Location = self.get_json(&url, &[("access_key", &self.ipstack_key)])?;
        *lock(&self.location) = Some(location);
        Ok(location)
    }

    fn fetch(&self) -> Result<Report, BlockError> {
        let location = self.locate()?;
        let lat = location.latitude.to_string();
        let lon = location.longitude.to_string();
        self.get_json(
            OPENWEATHERMAP_URL,
            &[
                ("lat", &lat),
                ("lon", &lon),
                ("appid", &self.openweathermap_key),
                ("units", &self.units),
            ],
        )
    }
}

impl Block for WeatherBlock {
    fn name(&self) -> &str {
        "weather"
    }

    fn update(&self) {
        match self.fetch() {
            Ok(report) => self.set_report(report),
            Err(err) => tracing::warn!(error = %err, "weather update failed"),
        }
    }

    fn content(&self) -> BlockContent {
        match lock(&self.report).as_ref() {
            Some(report) => BlockContent {
                icon: Some(report.icon()),
                primary: report.temperature_text(),
                secondary: report.description(),
                ..BlockContent::default()
            },
            None => BlockContent {
                hidden: true,
                ..BlockContent::default()
            },
        }
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        poll(self, Cadence::every(POLL), shutdown)
    }
}
