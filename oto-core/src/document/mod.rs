mod html;
mod memory;
mod traits;

pub use html::HtmlDocument;
pub use memory::MemoryDocument;
pub use traits::{Document, ElementRef};
