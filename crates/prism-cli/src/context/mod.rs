pub mod app_context;
pub mod project_root;

pub use app_context::{AppContext, load_config};
