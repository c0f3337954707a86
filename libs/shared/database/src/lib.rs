pub mod accounts;
pub mod supabase;

pub use supabase::{StoredObject, SupabaseClient, SupabaseError};
