//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod acquisition;
pub mod clock;
pub mod storage;

pub use acquisition::{AcquisitionRoutine, Reading};
pub use clock::{Clock, SystemClock};
pub use storage::{
    DataProviderRepository, EquipmentRepository, FieldObjectRepository, FieldRepository,
    TaskRepository,
};
