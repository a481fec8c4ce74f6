// Debug utilities

pub mod pipeline_tracer;
