pub mod walk;

pub use walk::{scan_base, scan_folder, ScanOutcome};
