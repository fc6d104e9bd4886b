// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler here runs behind `require_caller` and reads the verified
// caller from request extensions.
pub mod bookings;
