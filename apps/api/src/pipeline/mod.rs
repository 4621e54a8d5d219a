// Interview and hiring pipelines: stage registries and the transition function.
// All status changes on a record go through `transition::transition`.

pub mod handlers;
pub mod progress;
pub mod registry;
pub mod transition;
