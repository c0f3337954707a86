pub mod avatar;
pub mod patient;

pub use avatar::AvatarService;
pub use patient::PatientService;
