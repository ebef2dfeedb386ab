pub mod image_set;
pub mod input_source;
pub mod workspace;
