mod start_dialog;

pub use start_dialog::{
    run_start_dialog, StartDialogState, StartSelection, EMPTY_URL_WARNING,
};
