pub mod config;
pub mod errors;
pub mod file_types;
pub mod image_converter;
pub mod media_types;
pub mod metadata_extractor;
pub mod organizer;
pub mod relocator;
pub mod track_log;
pub mod video_processor;
