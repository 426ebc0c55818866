mod budget;
mod category;
mod record;

pub use budget::Budget;
pub use category::Category;
pub use record::{parse_date, parse_month, Record, TxnType};
