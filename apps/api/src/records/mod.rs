// Entity records: candidates, CVs and employees moving through a pipeline.

pub mod handlers;
pub mod lifecycle;
pub mod query;
pub mod service;
