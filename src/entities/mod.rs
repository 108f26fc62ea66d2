//! SeaORM entities for the back-office schema.

/// Implements `Display`, `FromStr` (ASCII case-insensitive) and [`Labeled`]
/// for an enumeration stored as short string codes.
macro_rules! stored_codes {
    ($ty:ident { $($variant:ident => ($code:literal, $label:literal)),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let code = match self {
                    $($ty::$variant => $code,)+
                };
                f.write_str(code)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = crate::entities::UnknownCode;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $(
                    if value.eq_ignore_ascii_case($code) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(crate::entities::UnknownCode(value.to_string()))
            }
        }

        impl crate::entities::Labeled for $ty {
            fn label(&self) -> &'static str {
                match self {
                    $($ty::$variant => $label,)+
                }
            }
        }
    };
}

pub mod address;
pub mod applied_promotion;
pub mod brand;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod customer;
pub mod member;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_image;
pub mod product_variant;
pub mod promotion;
pub mod review;
pub mod wishlist;

use sea_orm::Iterable;
use std::fmt::Display;

use crate::forms::Choice;

pub use address::AddressType;
pub use order::{OrderStatus, PaymentStatus};
pub use product::Gender;
pub use promotion::DiscountType;

/// A submitted code that matches no enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown code: {0}")]
pub struct UnknownCode(pub String);

/// Human readable label of a stored enumeration code.
pub trait Labeled {
    fn label(&self) -> &'static str;
}

/// Every value of a stored enumeration as form choices, in declaration order.
pub fn choices<E>() -> Vec<Choice>
where
    E: Iterable + Display + Labeled,
{
    E::iter()
        .map(|value| Choice::new(value.to_string(), value.label()))
        .collect()
}
