pub mod audit;
pub mod diff;
pub mod dispatch;
pub mod entity;
pub mod evidence;
pub mod init;
pub mod insight;
pub mod link;
pub mod project;
pub mod review;
pub mod schema;
pub mod shared;
pub mod sync;
