mod appointment;
mod document;
mod lecture;
mod user;

pub use appointment::APPOINTMENT_SCHEMA;
pub use document::{project, StoredDocument};
pub use lecture::LECTURE_SCHEMA;
pub use user::USER_SCHEMA;

use crate::features::documents::schema::ModelSchema;

/// Collections served by the generic CRUD router alone
///
/// `media` is mounted by the media feature, which overrides the reads.
pub fn generic_collections() -> [&'static ModelSchema; 3] {
    [&USER_SCHEMA, &APPOINTMENT_SCHEMA, &LECTURE_SCHEMA]
}
