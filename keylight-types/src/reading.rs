//! A single decoded status document.

/// One polled snapshot of the device.
///
/// Missing fields decode to their zero value, mirroring how the device's
/// companion tools treat partial documents. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceReading {
    /// Number of lights the device claims to drive.
    #[cfg_attr(feature = "serde", serde(rename = "numberOfLights"))]
    pub light_count: i64,

    /// Per-light state, in device order.
    pub lights: Vec<LightState>,
}

impl DeviceReading {
    /// Create a reading whose count matches the given lights.
    pub fn new(lights: Vec<LightState>) -> Self {
        Self {
            light_count: lights.len() as i64,
            lights,
        }
    }

    /// The first light, which is the only one the exporter reports.
    pub fn first_light(&self) -> Option<&LightState> {
        self.lights.first()
    }
}

/// State of one physical light.
///
/// Values are taken as reported; nothing here checks that brightness or
/// temperature fall inside the ranges the hardware supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LightState {
    /// 1 when the light is on, 0 when off.
    pub on: i64,

    /// Brightness in percent.
    pub brightness: i64,

    /// Colour temperature in device units (143..=344 on current firmware).
    pub temperature: i64,
}

impl LightState {
    pub fn new(on: i64, brightness: i64, temperature: i64) -> Self {
        Self {
            on,
            brightness,
            temperature,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on != 0
    }
}
