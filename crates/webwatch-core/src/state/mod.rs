// # State
//
// The shared in-memory record store used during a cycle, plus the
// implementations of the SiteStore persistence trait.

pub mod file;
pub mod memory;
pub mod records;

pub use file::{FileFormat, FileSiteStore};
pub use memory::MemorySiteStore;
pub use records::RecordStore;
