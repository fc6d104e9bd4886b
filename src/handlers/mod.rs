// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) → Protected (bearer token) → Elevated (admin when
// HOSPITALITY_ADMIN_ONLY is set). Route wiring lives in lib.rs.
pub mod elevated;
pub mod protected;
pub mod public;
