use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    HealthCenter => "health_center",
    Admin => "admin",
});

str_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(PaymentStatus {
    Pending => "pending",
    Success => "success",
    Failed => "failed",
    UserDropped => "user_dropped",
    Cancelled => "cancelled",
    Flagged => "flagged",
});

str_enum!(ConsultStatus {
    Scheduled => "scheduled",
    Live => "live",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(DocumentKind {
    Report => "report",
    Bill => "bill",
    Prescription => "prescription",
});

impl PaymentStatus {
    /// Map a payment vendor status string (e.g. `SUCCESS`, `USER_DROPPED`).
    /// Unknown statuses are treated as still pending.
    pub fn from_vendor(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" | "PAID" => Self::Success,
            "FAILED" => Self::Failed,
            "USER_DROPPED" => Self::UserDropped,
            "CANCELLED" | "VOID" | "EXPIRED" => Self::Cancelled,
            "FLAGGED" => Self::Flagged,
            _ => Self::Pending,
        }
    }
}

impl DocumentKind {
    /// Column on the appointment row holding documents of this kind.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Report => "reports",
            Self::Bill => "bills",
            Self::Prescription => "prescriptions",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trip() {
        for (variant, s) in [
            (Role::Patient, "patient"),
            (Role::Doctor, "doctor"),
            (Role::HealthCenter, "health_center"),
            (Role::Admin, "admin"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Role::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&AppointmentStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        let parsed: ConsultStatus = serde_json::from_str("\"live\"").unwrap();
        assert_eq!(parsed, ConsultStatus::Live);
    }

    #[test]
    fn vendor_status_mapping() {
        assert_eq!(PaymentStatus::from_vendor("SUCCESS"), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_vendor("success"), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_vendor("USER_DROPPED"), PaymentStatus::UserDropped);
        assert_eq!(PaymentStatus::from_vendor("NOT_ATTEMPTED"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_vendor(""), PaymentStatus::Pending);
    }

    #[test]
    fn document_kind_columns() {
        assert_eq!(DocumentKind::Report.column(), "reports");
        assert_eq!(DocumentKind::Bill.column(), "bills");
        assert_eq!(DocumentKind::Prescription.column(), "prescriptions");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Role::from_str("superuser").is_err());
        assert!(AppointmentStatus::from_str("Pending").is_err());
        assert!(DocumentKind::from_str("").is_err());
    }
}
