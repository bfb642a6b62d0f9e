pub mod money;
pub mod locale;
pub mod pii;
pub mod models;

pub use money::{Money, MoneyParseError};
pub use locale::Locale;
pub use pii::Masked;
