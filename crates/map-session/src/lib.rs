//! Map Session
//!
//! Interaction state for one viewer of the sample map: which dataset is
//! shown, which country is hovered or selected, and which page of the
//! selected country's rows is visible. Every transition is a synchronous
//! method on owned data; callers that share a session across tasks wrap it
//! in a lock.

pub mod paginator;
pub mod selection;
pub mod session;
pub mod table;

pub use paginator::{TablePaginator, MAX_PAGE_BUTTONS, PAGE_SIZE};
pub use selection::{SelectionController, SelectionState};
pub use session::{DatasetSession, LoadedDataset, Overview, RequestTicket, ViewState, NO_DATASET_NOTICE};
pub use table::{Popup, TablePage, EMPTY_TABLE_NOTICE};
