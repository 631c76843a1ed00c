pub mod dates;
pub mod error;

pub use dates::normalize_date;
pub use error::{BannerError, Result};
