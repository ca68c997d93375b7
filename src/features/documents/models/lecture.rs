use crate::features::documents::schema::{FieldDef, FieldType, ModelSchema, QueryOptions};

pub static LECTURE_SCHEMA: ModelSchema = ModelSchema {
    name: "Lecture",
    collection: "lectures",
    fields: &[
        FieldDef::new("title", FieldType::String),
        FieldDef::new("description", FieldType::String),
        FieldDef::new("language", FieldType::String),
        FieldDef::new("media", FieldType::ObjectId),
        FieldDef::new("slug", FieldType::String),
        FieldDef::new("imageUrl", FieldType::String),
        FieldDef::new("content", FieldType::String),
        FieldDef::new("owner", FieldType::ObjectId),
        FieldDef::new("lectureType", FieldType::String),
        FieldDef::new("published", FieldType::Boolean),
    ],
    timestamps: true,
    options: QueryOptions::DEFAULT,
};
