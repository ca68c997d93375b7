use crate::features::documents::schema::{FieldDef, FieldType, ModelSchema, QueryOptions};

pub static APPOINTMENT_SCHEMA: ModelSchema = ModelSchema {
    name: "Appointment",
    collection: "appointments",
    fields: &[
        FieldDef::new("name", FieldType::String),
        FieldDef::new("phone", FieldType::String),
        FieldDef::new("email", FieldType::String),
        FieldDef::new("appointmentDate", FieldType::Date),
        FieldDef::new("organization", FieldType::String),
        FieldDef::new("estimatedAttendees", FieldType::Number),
        FieldDef::new("message", FieldType::String),
        // pending | accepted | rejected
        FieldDef::new("status", FieldType::String),
    ],
    timestamps: true,
    options: QueryOptions::DEFAULT,
};
