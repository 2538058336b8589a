//! 3D-print price and duration estimator.
//!
//! The estimate is a pure function of the model volume and the print
//! settings. All arithmetic is done in [`Decimal`] so identical requests
//! always produce identical quotes.
//!
//! ```
//! use apogee_core::quote::{estimate, Infill, LayerHeight, PrintMaterial, QuoteRequest};
//! use rust_decimal::Decimal;
//!
//! let quote = estimate(&QuoteRequest {
//!     volume_mm3: 100_000.0,
//!     material: PrintMaterial::Pla,
//!     layer_height: LayerHeight::Standard,
//!     infill: Infill::Twenty,
//!     scale_percent: 100,
//!     quantity: 1,
//! })
//! .unwrap();
//! assert_eq!(quote.price, Decimal::new(10000, 2));
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::round_money;

/// Base rate per cubic centimetre of printed material.
pub const RATE_PER_CM3: Decimal = Decimal::ONE;

/// Quotes never go below this amount.
pub const MINIMUM_PRICE: Decimal = Decimal::from_parts(5000, 0, 0, false, 2);

/// Machine minutes per cubic centimetre at the standard layer height.
pub const MINUTES_PER_CM3: Decimal = Decimal::from_parts(6, 0, 0, false, 0);

/// Largest model volume accepted, in mm³ (one cubic metre).
pub const MAX_VOLUME_MM3: f64 = 1.0e9;

/// Accepted scale range in percent.
pub const SCALE_RANGE: core::ops::RangeInclusive<u32> = 1..=1000;

/// Accepted quantity range.
pub const QUANTITY_RANGE: core::ops::RangeInclusive<u32> = 1..=1000;

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("model volume must be a positive number")]
    InvalidVolume,
    #[error("model volume exceeds the printable maximum")]
    VolumeTooLarge,
    #[error("scale must be between 1 and 1000 percent")]
    InvalidScale,
    #[error("quantity must be between 1 and 1000")]
    InvalidQuantity,
    #[error("infill must be one of 10, 20, 50 or 100 percent")]
    InvalidInfill,
}

/// Filament the part is printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintMaterial {
    Pla,
    Petg,
    Abs,
    Asa,
    Tpu,
    Nylon,
    CarbonFiberNylon,
}

impl PrintMaterial {
    pub const ALL: [Self; 7] = [
        Self::Pla,
        Self::Petg,
        Self::Abs,
        Self::Asa,
        Self::Tpu,
        Self::Nylon,
        Self::CarbonFiberNylon,
    ];

    /// Price multiplier relative to PLA.
    #[must_use]
    pub const fn multiplier(self) -> Decimal {
        match self {
            Self::Pla => Decimal::ONE,
            Self::Petg => Decimal::from_parts(12, 0, 0, false, 1),
            Self::Abs => Decimal::from_parts(13, 0, 0, false, 1),
            Self::Asa => Decimal::from_parts(14, 0, 0, false, 1),
            Self::Tpu => Decimal::from_parts(16, 0, 0, false, 1),
            Self::Nylon => Decimal::from_parts(18, 0, 0, false, 1),
            Self::CarbonFiberNylon => Decimal::from_parts(22, 0, 0, false, 1),
        }
    }
}

/// Layer height. Finer layers cost more and take longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerHeight {
    #[serde(rename = "0.1")]
    Fine,
    #[serde(rename = "0.2")]
    Standard,
    #[serde(rename = "0.3")]
    Draft,
}

impl LayerHeight {
    #[must_use]
    pub const fn price_multiplier(self) -> Decimal {
        match self {
            Self::Fine => Decimal::from_parts(14, 0, 0, false, 1),
            Self::Standard => Decimal::ONE,
            Self::Draft => Decimal::from_parts(85, 0, 0, false, 2),
        }
    }

    #[must_use]
    pub const fn time_multiplier(self) -> Decimal {
        match self {
            Self::Fine => Decimal::TWO,
            Self::Standard => Decimal::ONE,
            Self::Draft => Decimal::from_parts(7, 0, 0, false, 1),
        }
    }

    /// Height in millimetres, e.g. `0.2`.
    #[must_use]
    pub const fn millimetres(self) -> Decimal {
        match self {
            Self::Fine => Decimal::from_parts(1, 0, 0, false, 1),
            Self::Standard => Decimal::from_parts(2, 0, 0, false, 1),
            Self::Draft => Decimal::from_parts(3, 0, 0, false, 1),
        }
    }
}

/// Infill density. Sent over the wire as the plain percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Infill {
    Ten,
    Twenty,
    Fifty,
    Solid,
}

impl Infill {
    #[must_use]
    pub const fn multiplier(self) -> Decimal {
        match self {
            Self::Ten => Decimal::from_parts(9, 0, 0, false, 1),
            Self::Twenty => Decimal::ONE,
            Self::Fifty => Decimal::from_parts(125, 0, 0, false, 2),
            Self::Solid => Decimal::from_parts(16, 0, 0, false, 1),
        }
    }

    #[must_use]
    pub const fn percent(self) -> u8 {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
            Self::Solid => 100,
        }
    }
}

impl TryFrom<u8> for Infill {
    type Error = QuoteError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        match percent {
            10 => Ok(Self::Ten),
            20 => Ok(Self::Twenty),
            50 => Ok(Self::Fifty),
            100 => Ok(Self::Solid),
            _ => Err(QuoteError::InvalidInfill),
        }
    }
}

impl From<Infill> for u8 {
    fn from(infill: Infill) -> Self {
        infill.percent()
    }
}

/// What the customer wants printed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Volume of the uploaded model at 100 % scale.
    pub volume_mm3: f64,
    pub material: PrintMaterial,
    pub layer_height: LayerHeight,
    pub infill: Infill,
    #[serde(default = "default_scale")]
    pub scale_percent: u32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_scale() -> u32 {
    100
}

const fn default_quantity() -> u32 {
    1
}

/// The computed quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteEstimate {
    /// Volume of one part after scaling, in cm³, 2 decimals.
    pub volume_cm3: Decimal,
    /// Total for all parts, 2 decimals.
    pub price: Decimal,
    /// Whether [`MINIMUM_PRICE`] replaced the computed price.
    pub minimum_applied: bool,
    /// Estimated machine time for all parts.
    pub duration_minutes: u64,
}

/// Compute price and print time for a request.
///
/// # Errors
///
/// Returns a [`QuoteError`] when the volume is not a positive finite number
/// or is larger than [`MAX_VOLUME_MM3`], or when scale or quantity fall
/// outside [`SCALE_RANGE`] / [`QUANTITY_RANGE`].
pub fn estimate(request: &QuoteRequest) -> Result<QuoteEstimate, QuoteError> {
    if !request.volume_mm3.is_finite() || request.volume_mm3 <= 0.0 {
        return Err(QuoteError::InvalidVolume);
    }
    if request.volume_mm3 > MAX_VOLUME_MM3 {
        return Err(QuoteError::VolumeTooLarge);
    }
    if !SCALE_RANGE.contains(&request.scale_percent) {
        return Err(QuoteError::InvalidScale);
    }
    if !QUANTITY_RANGE.contains(&request.quantity) {
        return Err(QuoteError::InvalidQuantity);
    }

    let volume_mm3 = Decimal::try_from(request.volume_mm3).map_err(|_| QuoteError::InvalidVolume)?;
    let scale = Decimal::from(request.scale_percent) / Decimal::ONE_HUNDRED;
    let volume_cm3 = volume_mm3 * scale * scale * scale / Decimal::ONE_THOUSAND;
    let quantity = Decimal::from(request.quantity);

    let computed = volume_cm3
        * RATE_PER_CM3
        * request.material.multiplier()
        * request.layer_height.price_multiplier()
        * request.infill.multiplier()
        * quantity;
    let minimum_applied = computed < MINIMUM_PRICE;
    let price = round_money(computed.max(MINIMUM_PRICE));

    let minutes = volume_cm3 * MINUTES_PER_CM3 * request.layer_height.time_multiplier() * quantity;
    let duration_minutes = minutes
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(u64::MAX);

    Ok(QuoteEstimate {
        volume_cm3: round_money(volume_cm3),
        price,
        minimum_applied,
        duration_minutes,
    })
}
