pub mod collect;
pub mod identifier;
pub mod record;
pub mod substitute;

pub use collect::{collect, CitationIndex, Collection};
pub use identifier::{identify, Identifier};
pub use record::{resolve_title, CitationRecord};
pub use substitute::{substitute, SubstitutionOptions};
