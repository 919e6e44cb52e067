use std::path::PathBuf;

/// Settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub state_file: Option<PathBuf>,
}

impl GlobalArgs {
    #[must_use]
    pub const fn new(api_url: String) -> Self {
        Self {
            api_url,
            state_file: None,
        }
    }
}
