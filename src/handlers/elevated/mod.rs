// handlers/elevated/mod.rs - Listing writes
//
// Guarded by `require_caller` + `require_admin` when HOSPITALITY_ADMIN_ONLY
// is set, open otherwise.
pub mod form;
pub mod hospitality;
