pub mod enums;
pub mod appointment;
pub mod center;
pub mod consult;
pub mod doctor;
pub mod payment;

pub use appointment::*;
pub use center::*;
pub use consult::*;
pub use doctor::*;
pub use enums::*;
pub use payment::*;

use serde::{Deserialize, Deserializer};

/// Decode an explicit `null` column the same as a missing one.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
