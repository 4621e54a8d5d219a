pub mod notification;
pub mod pipeline;
pub mod record;
