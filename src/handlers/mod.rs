pub mod equipment_status;
pub mod health;
pub mod metrics;

pub use equipment_status::*;
pub use health::*;
pub use metrics::*;
