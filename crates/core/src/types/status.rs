//! Status and classification enums.
//!
//! Every enum here is stored as a Postgres enum in the `shop` schema and
//! travels over the wire as its `snake_case` name.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an enum from an unknown string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Declares a `snake_case` string enum with serde, sqlx, `Display` and
/// `FromStr` support.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $type_name:literal, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type))]
        #[cfg_attr(
            feature = "postgres",
            sqlx(type_name = $type_name, rename_all = "snake_case")
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire and database name of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Catalog visibility of a product.
    #[derive(Default)]
    ProductStatus, "shop.product_status", "product status" {
        #[default]
        Active => "active",
        Inactive => "inactive",
        Discontinued => "discontinued",
    }
}

string_enum! {
    /// The dosha a product is formulated for.
    #[derive(Default)]
    ProductDosha, "shop.product_dosha", "product dosha" {
        Vata => "vata",
        Pitta => "pitta",
        Kapha => "kapha",
        #[default]
        Tridosha => "tridosha",
    }
}

string_enum! {
    /// The dosha recorded on a consultation booking.
    #[derive(Default)]
    BookingDosha, "shop.booking_dosha", "booking dosha" {
        Vata => "vata",
        Pitta => "pitta",
        Kapha => "kapha",
        #[default]
        Unknown => "unknown",
    }
}

string_enum! {
    /// Fulfillment lifecycle of an order.
    #[derive(Default)]
    OrderStatus, "shop.order_status", "order status" {
        #[default]
        Pending => "pending",
        Confirmed => "confirmed",
        Processing => "processing",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
        Refunded => "refunded",
    }
}

string_enum! {
    /// Payment state of an order.
    ///
    /// Only ever changed through [`crate::reconcile`].
    #[derive(Default)]
    PaymentStatus, "shop.payment_status", "payment status" {
        #[default]
        Pending => "pending",
        Paid => "paid",
        Failed => "failed",
    }
}

string_enum! {
    /// How the customer pays for an order.
    PaymentMethod, "shop.payment_method", "payment method" {
        CreditCard => "credit_card",
        DebitCard => "debit_card",
        Upi => "upi",
        Wallet => "wallet",
        Cod => "cod",
        Cashfree => "cashfree",
    }
}

string_enum! {
    /// Kind of consultation being booked.
    #[derive(Default)]
    ConsultationType, "shop.consultation_type", "consultation type" {
        #[default]
        General => "general",
        DoshaAnalysis => "dosha_analysis",
        DietPlan => "diet_plan",
        Skincare => "skincare",
        Immunity => "immunity",
        Custom => "custom",
    }
}

string_enum! {
    /// Lifecycle of a consultation booking.
    #[derive(Default)]
    RebookingStatus, "shop.rebooking_status", "rebooking status" {
        #[default]
        Requested => "requested",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
        Rescheduled => "rescheduled",
    }
}

impl RebookingStatus {
    /// Whether the booking has reached a final state.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a customer may still cancel or reschedule the booking.
    #[must_use]
    pub const fn is_modifiable(self) -> bool {
        !self.is_closed()
    }
}

string_enum! {
    /// Topic of a contact message.
    #[derive(Default)]
    ContactCategory, "shop.contact_category", "contact category" {
        #[default]
        General => "general",
        Complaint => "complaint",
        Feedback => "feedback",
        Partnership => "partnership",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_fromstr_agree() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), *status);
        }
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), *method);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ConsultationType::DoshaAnalysis).unwrap();
        assert_eq!(json, "\"dosha_analysis\"");
        let parsed: PaymentMethod = serde_json::from_str("\"credit_card\"").unwrap();
        assert_eq!(parsed, PaymentMethod::CreditCard);
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = "shipped-ish".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "order status");
        assert_eq!(err.to_string(), "invalid order status: shipped-ish");
        assert!("Paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ProductDosha::default(), ProductDosha::Tridosha);
        assert_eq!(BookingDosha::default(), BookingDosha::Unknown);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(RebookingStatus::default(), RebookingStatus::Requested);
    }

    #[test]
    fn test_rebooking_modifiable() {
        assert!(RebookingStatus::Requested.is_modifiable());
        assert!(RebookingStatus::Rescheduled.is_modifiable());
        assert!(!RebookingStatus::Cancelled.is_modifiable());
        assert!(!RebookingStatus::Completed.is_modifiable());
    }
}
