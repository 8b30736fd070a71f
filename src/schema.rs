//! Diesel table definitions, kept in step with `migrations/`.

diesel::table! {
    reservations (id) {
        id -> Uuid,
        date -> Date,
        slot_start -> Time,
        holder_name -> Text,
        holder_contact -> Text,
        service -> Text,
        created_at -> Timestamptz,
    }
}
