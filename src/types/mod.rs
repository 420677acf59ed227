pub mod app_state;
pub mod nf_profile;
pub mod problem_details;
pub mod status;

pub use app_state::*;
pub use nf_profile::*;
pub use problem_details::*;
pub use status::*;
