/// H.264 SVC unit types, PACSI and SEI parsing
pub mod svc;

// Re-export common types and functions
pub use svc::parse_pacsi;
pub use svc::NalUnit;
pub use svc::PacsiRecord;
pub use svc::SeiMessage;
pub use svc::UnitType;
