pub mod availability;
pub mod professional;
pub mod slots;
pub mod slot_query;

pub use availability::AvailabilityService;
pub use professional::ProfessionalService;
pub use slots::{day_of_week, generate_slots};
pub use slot_query::SlotQueryService;
