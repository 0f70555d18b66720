pub mod frequency;
pub mod money;
pub mod period;
pub mod transaction;

pub use frequency::Frequency;
pub use money::Amount;
pub use period::{date_from_mjd, month_key, DateRange};
pub use transaction::{IdentityKey, Posting, Transaction};
