//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly.

diesel::table! {
    /// Contact and account records.
    ///
    /// `verification_token` is NULL exactly when `verified` is true; a check
    /// constraint enforces it.
    contacts (id) {
        id -> Int4,
        #[max_length = 50]
        first_name -> Varchar,
        #[max_length = 50]
        last_name -> Varchar,
        /// Unique login email.
        #[max_length = 120]
        email -> Varchar,
        #[max_length = 12]
        phone -> Varchar,
        birth_day -> Date,
        /// Free-form JSON object.
        data -> Nullable<Jsonb>,
        /// Encoded Argon2 PHC string. Never selected outside login.
        #[max_length = 255]
        password_hash -> Varchar,
        #[max_length = 255]
        avatar_url -> Nullable<Varchar>,
        verified -> Bool,
        #[max_length = 64]
        verification_token -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
