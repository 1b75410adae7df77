//! Repair and persistence of generated test code.
//!
//! Model output is rarely runnable as-is. [`repair_response`] applies a fixed
//! sequence of text repairs (payload extraction, import fixes, target import,
//! fuzz splitting, an assertion backstop and settings normalization) and
//! [`TestWriter`] writes the result under `<root>/tests`, flagging code that
//! still does not parse.

pub mod assertions;
pub mod errors;
pub mod imports;
pub mod payload;
pub mod persist;
pub mod pipeline;
pub mod settings;
pub mod split;
pub mod target;
pub mod validate;

mod text;

pub use assertions::ensure_assertions;
pub use errors::{RepairError, Result};
pub use imports::{HALLUCINATED_MODULES, repair_imports};
pub use payload::extract_payload;
pub use persist::{TESTS_DIR, TestWriter, test_file_name};
pub use pipeline::{ArtifactOutcome, GeneratedArtifact, repair_response};
pub use settings::normalize_settings;
pub use split::split_tests;
pub use target::{canonical_block, inject_target_import};
pub use validate::{Validation, validate};
