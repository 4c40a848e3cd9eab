//! # Connection Module
//!
//! Classifies what is on the other end of the link. Remote-controller
//! calibration is only allowed with the controller connected and the aircraft
//! absent ([`ConnectionState::RcOnly`]).

use serde::{Deserialize, Serialize};

/// The product currently reported by the hardware layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Product {
    /// Nothing connected.
    #[default]
    None,
    /// A handheld or other non-aircraft product.
    Other,
    /// An aircraft, with its own link state and that of its remote controller.
    Aircraft { connected: bool, rc_connected: bool },
}

/// Combined aircraft/remote-controller link state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    AircraftOnly,
    AircraftAndRc,
    RcOnly,
    #[default]
    Disconnected,
    Other,
}

impl ConnectionState {
    /// Classifies a product snapshot.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_calibrator::calibration::connection::{ConnectionState, Product};
    ///
    /// let product = Product::Aircraft { connected: false, rc_connected: true };
    /// assert_eq!(ConnectionState::classify(&product), ConnectionState::RcOnly);
    /// assert_eq!(ConnectionState::classify(&Product::None), ConnectionState::Disconnected);
    /// ```
    #[must_use]
    pub fn classify(product: &Product) -> Self {
        match *product {
            Product::None => Self::Disconnected,
            Product::Other => Self::Other,
            Product::Aircraft {
                connected: true,
                rc_connected: true,
            } => Self::AircraftAndRc,
            Product::Aircraft {
                connected: true,
                rc_connected: false,
            } => Self::AircraftOnly,
            Product::Aircraft {
                connected: false,
                rc_connected: true,
            } => Self::RcOnly,
            Product::Aircraft {
                connected: false,
                rc_connected: false,
            } => Self::Disconnected,
        }
    }

    /// Whether calibration may proceed in this state.
    #[must_use]
    pub fn allows_calibration(&self) -> bool {
        *self == Self::RcOnly
    }
}
