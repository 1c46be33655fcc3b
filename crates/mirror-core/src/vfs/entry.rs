use mirror_content::{Classification, classify};

/// An entry of the [`VirtualFileTable`](super::VirtualFileTable).
///
/// Binary files carry empty content; their bytes are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEntry {
    File { content: String, is_binary: bool },
    Folder,
}

impl FileEntry {
    pub fn text(content: impl Into<String>) -> Self {
        Self::File {
            content: content.into(),
            is_binary: false,
        }
    }

    pub fn binary() -> Self {
        Self::File {
            content: String::new(),
            is_binary: true,
        }
    }

    /// Classify a raw watcher buffer into a file entry.
    pub fn from_buffer(buffer: &[u8]) -> Self {
        match classify(buffer) {
            Classification::Text(content) => Self::text(content),
            Classification::Binary => Self::binary(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::File { is_binary: true, .. })
    }

    /// Text content of a non-binary file.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            Self::File {
                content,
                is_binary: false,
            } => Some(content.as_str()),
            _ => None,
        }
    }
}
