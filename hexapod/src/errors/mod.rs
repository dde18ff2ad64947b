mod hexapod_error;
pub use hexapod_error::*;
