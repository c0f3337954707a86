pub mod login;

pub use login::AuthService;
