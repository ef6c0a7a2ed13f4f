// Reversible command log
//
// Edit commands are tagged variants carrying their own inversion data; the
// log keeps done/undone stacks with no branching redo history.

pub mod log;
pub mod types;

pub use log::{CommandLog, HistoryConfig, HistoryStep};
pub use types::EditCommand;
