use crate::features::documents::schema::{FieldDef, FieldType, ModelSchema, QueryOptions};

/// Public profile data of a user
///
/// `contactDetails` and `bio` are declared last so they render after the
/// flat profile fields.
pub static USER_SCHEMA: ModelSchema = ModelSchema {
    name: "User",
    collection: "users",
    fields: &[
        FieldDef::new("userName", FieldType::String),
        FieldDef::new("email", FieldType::String),
        FieldDef::new("roles", FieldType::Array),
        FieldDef::new("isAdmin", FieldType::Boolean),
        FieldDef::new("profilePicture", FieldType::ObjectId),
        FieldDef::new("degrees", FieldType::Array),
        FieldDef::new("awards", FieldType::Array),
        FieldDef::new("contactDetails.phoneNumber", FieldType::String),
        FieldDef::new("contactDetails.socialMedia.facebook", FieldType::String),
        FieldDef::new("contactDetails.socialMedia.twitter", FieldType::String),
        FieldDef::new("contactDetails.socialMedia.instagram", FieldType::String),
        FieldDef::new("contactDetails.socialMedia.linkedIn", FieldType::String),
        FieldDef::new("contactDetails.socialMedia.whatsapp", FieldType::String),
        FieldDef::new("bio.by", FieldType::ObjectId),
        FieldDef::new("bio.section.about", FieldType::String),
        FieldDef::new("bio.section.description", FieldType::String),
        FieldDef::new("bio.section.vision", FieldType::String),
    ],
    timestamps: true,
    options: QueryOptions::DEFAULT,
};
