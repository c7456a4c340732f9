//! # keylight-types
//!
//! Data model shared by the keylight exporter crates.
//!
//! An Elgato Key Light answers `GET /elgato/lights` with a small JSON
//! document:
//!
//! ```json
//! {"numberOfLights":1,"lights":[{"on":1,"brightness":55,"temperature":198}]}
//! ```
//!
//! [`DeviceReading`] and [`LightState`] model that document, and
//! [`PollOutcome`] buckets the result of a single poll cycle.
//!
//! ## Features
//!
//! - `serde`: derive `Serialize`/`Deserialize` using the device's wire names
//!
//! ## Example
//!
//! ```rust
//! use keylight_types::{DeviceReading, LightState};
//!
//! let reading = DeviceReading::new(vec![LightState::new(1, 55, 198)]);
//!
//! assert_eq!(reading.light_count, 1);
//! assert!(reading.first_light().unwrap().is_on());
//! ```

mod outcome;
mod reading;

pub use outcome::*;
pub use reading::*;
