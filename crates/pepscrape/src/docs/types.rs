#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsNewArticle {
    pub link: String,
    pub title: String,
    pub editors: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub link: String,
    pub version: String,
    pub status: String,
}
