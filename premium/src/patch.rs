//! Wire shape of the cart price patch returned to the platform.
//!
//! Both the sandbox function and the HTTP callback serialize these exact
//! types, so their output is byte-identical for the same decision.

use serde::{Deserialize, Serialize};

use crate::Premium;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CartPatch {
    pub operations: Operations,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Operations {
    pub update: Vec<LineUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineUpdate {
    pub id: String,
    pub price: PriceAdjustment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    /// Decimal string with exactly two fractional digits.
    pub adjustment_fixed_price: String,
}

impl CartPatch {
    /// A patch that changes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set one line's price to the premium.
    pub fn set_price(line_id: impl Into<String>, premium: Premium) -> Self {
        Self {
            operations: Operations {
                update: vec![LineUpdate {
                    id: line_id.into(),
                    price: PriceAdjustment {
                        adjustment_fixed_price: premium.to_string(),
                    },
                }],
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.update.is_empty()
    }
}
