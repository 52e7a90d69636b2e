mod directory;
mod pdf;

pub use directory::{DirectoryLoad, DirectoryLoader};
pub use pdf::PdfLoader;
