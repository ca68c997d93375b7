//! Generic document CRUD.
//!
//! Every collection in [`models::generic_collections`] gets the same routes
//! under `/api/v1/{collection}`:
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/` | Filtered, sorted, paginated list |
//! | POST | `/` | Create |
//! | POST | `/bulk` | Create many |
//! | PUT, PATCH | `/bulk` | Update many |
//! | DELETE | `/bulk` | Delete many |
//! | GET | `/{id}` | Read by id, or by slug |
//! | PUT, PATCH | `/{id}` | Update |
//! | DELETE | `/{id}` | Delete |
//! | GET | `/{key}/{value}` | Read one field, or find by field |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod query;
pub mod routes;
pub mod schema;
pub mod services;

pub use services::DocumentService;
