pub mod logging;
pub mod output;
pub mod progress;
pub mod types;
pub mod utils;

pub use logging::*;
pub use output::{derive_output_path, document_stem, write_atomically};
pub use types::*;
pub use utils::*;

pub use progress::{create_count_progress_bar, create_document_progress_bar};
