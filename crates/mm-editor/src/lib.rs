pub mod autosave;
pub mod clock;
pub mod history;
pub mod notice;
pub mod session;

pub use autosave::{AutoSave, AutoSaveSettings, AutoSaveState, TickOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use history::{GraphSnapshot, History, MAX_HISTORY_LENGTH};
pub use notice::{Notice, NoticeLevel};
pub use session::{Session, SessionOptions};
