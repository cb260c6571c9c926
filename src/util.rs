pub(crate) mod redact;
pub mod retry;
