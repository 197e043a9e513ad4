pub mod classify;
pub mod manual_entry;
