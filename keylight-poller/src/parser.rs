//! Decoding of the device's status document.

use std::sync::Arc;

use keylight_sdk::Recorder;
use keylight_types::DeviceReading;

use crate::ParseError;

/// Decode a status document without recording anything.
///
/// Fails with [`ParseError::NoLights`] when the document has no lights,
/// since there is then nothing to report.
pub fn decode(body: &[u8]) -> Result<DeviceReading, ParseError> {
    let reading: DeviceReading = serde_json::from_slice(body)?;
    if reading.lights.is_empty() {
        return Err(ParseError::NoLights);
    }
    Ok(reading)
}

/// Turns response bodies into device gauges.
#[derive(Clone)]
pub struct Parser {
    recorder: Arc<dyn Recorder>,
}

impl Parser {
    pub fn new(recorder: Arc<dyn Recorder>) -> Self {
        Self { recorder }
    }

    /// Decode `body` and record the first light's on/off, brightness and
    /// temperature, in that order.
    ///
    /// Lights after the first are decoded but not recorded. Nothing is
    /// recorded when decoding fails.
    pub fn parse(&self, body: &[u8]) -> Result<DeviceReading, ParseError> {
        let reading = decode(body)?;

        let light = reading.first_light().ok_or(ParseError::NoLights)?;
        self.recorder.record_on_off(light.on);
        self.recorder.record_brightness(light.brightness);
        self.recorder.record_temperature(light.temperature);

        Ok(reading)
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").finish_non_exhaustive()
    }
}
