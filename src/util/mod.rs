
/// Helper functions for read/writing JSON via serde
pub mod json_io;
/// Persistent singly-linked history shared between search paths
pub mod linked_list;
/// Helper functions for generating the progress bars
pub mod progress_bar;
