mod media_service;
mod upload_form;
mod upload_pipeline;

pub use media_service::MediaService;
pub use upload_form::{read_upload_form, UploadForm};
pub use upload_pipeline::{FileUpload, MediaCatalog, MediaStore, UploadFields, UploadPipeline};
