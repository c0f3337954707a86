pub mod adoption;
pub mod physician;

pub use adoption::AdoptionService;
pub use physician::PhysicianService;
