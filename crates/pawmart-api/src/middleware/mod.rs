pub mod rate_limit;

pub use rate_limit::{GateState, REJECTION_MESSAGE, rate_limit_middleware};
