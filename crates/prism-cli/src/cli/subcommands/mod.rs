mod entity;
mod evidence;
mod insight;
mod link;
mod project;
mod review;
mod schema;

pub use entity::EntityCommands;
pub use evidence::EvidenceCommands;
pub use insight::InsightCommands;
pub use link::LinkCommands;
pub use project::ProjectCommands;
pub use review::ReviewCommands;
pub use schema::SchemaCommands;
