// Background jobs

pub mod session_cleanup;
