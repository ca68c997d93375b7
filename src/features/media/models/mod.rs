mod media;

pub use media::MEDIA_SCHEMA;
