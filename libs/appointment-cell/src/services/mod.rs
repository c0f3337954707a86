pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod store;

pub use booking::AppointmentBookingService;
pub use conflict::{AppointmentDirectory, ConflictValidator};
pub use lifecycle::AppointmentLifecycleService;
pub use store::SupabaseAppointmentStore;
