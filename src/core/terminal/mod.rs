// Terminal module - Console line assembly and cleaning
pub mod assembler;
pub mod cleaner;
pub mod monitor;

pub use assembler::LineAssembler;
pub use cleaner::clean_line;
pub use monitor::{ByteSource, MonitorSession};
