mod parser;
pub mod scraper;
pub mod types;

pub use parser::{
    INDEX_SECTIONS, PEP_CONTENT_ID, PEP_PATH_PREFIX, parse_pep_index, parse_pep_status,
};
pub use scraper::{Execution, PepScraper};
pub use types::{PepReference, StatusTable, StatusTally, TallyBuilder, Verification};
