//! SheetDrop Upload Widget
//!
//! Client-side intake of a single tabular data file: drag/drop and picker
//! interaction state, pre-flight validation, reading the file into memory,
//! and handing the result to a caller-supplied callback. The widget never
//! talks to the network; callers pair it with a transport.
//!
//! The interaction state is an explicit [`UploadSession`] value advanced by
//! the pure [`transition`] function. [`UploadWidget`] drives it and exposes a
//! rendering-free [`WidgetView`].

pub mod intake;
pub mod source;
pub mod state;
pub mod view;
pub mod widget;

// Re-export commonly used types
pub use intake::{FileIntake, IntakeError, IntakeErrorKind};
pub use source::{FileSource, LocalFile, MemoryFile};
pub use state::{transition, SelectedFile, TransitionError, UploadEvent, UploadSession, UploadStatus};
pub use view::{
    format_size_mb, BorderTone, FileSummary, InlineMessage, Prompt, StatusIndicator, WidgetView,
};
pub use widget::{FileUploadCallback, PickerInput, SelectionOutcome, UploadWidget};
