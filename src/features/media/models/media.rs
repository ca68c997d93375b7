use crate::features::documents::schema::{FieldDef, FieldType, ModelSchema, QueryOptions};

pub static MEDIA_SCHEMA: ModelSchema = ModelSchema {
    name: "Media",
    collection: "media",
    fields: &[
        FieldDef::new("fileName", FieldType::String),
        FieldDef::new("altText", FieldType::String),
        FieldDef::new("slug", FieldType::String),
        FieldDef::new("url", FieldType::String),
        FieldDef::new("owner", FieldType::ObjectId),
        FieldDef::new("mediaType", FieldType::String),
    ],
    timestamps: true,
    options: QueryOptions::DEFAULT,
};
