mod parser;
pub mod scraper;
pub mod types;

pub use parser::{
    parse_latest_versions, parse_pdf_a4_link, parse_whats_new_article, parse_whats_new_index,
};
pub use scraper::DocsScraper;
pub use types::{VersionEntry, WhatsNewArticle};

pub const WHATS_NEW_PATH: &str = "whatsnew/";
pub const DOWNLOAD_PATH: &str = "download.html";
pub const DOWNLOADS_DIR: &str = "downloads";
