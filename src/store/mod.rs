mod file;
mod memory;

pub use file::FileSceneStore;
pub use memory::MemorySceneStore;
