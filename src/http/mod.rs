//! Request templating, the shared client, request execution and pacing.
mod client;
mod executor;
mod rate;
mod template;


pub use client::{MAX_IDLE_CONNS_PER_HOST, build_client};
pub use executor::{execute, execute_and_send};
pub use rate::Pacer;
pub use template::{
    DEFAULT_USER_AGENT, RequestTemplate, clone_request, parse_header, parse_method,
};

#[cfg(test)]
pub(crate) use rate::{TickPlan, TokenCarry};
