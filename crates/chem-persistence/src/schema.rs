// Declaración Diesel de la tabla de resultados (ver `migrations/`).

diesel::table! {
    calculations (hashkey) {
        hashkey -> Text,
        created -> Timestamptz,
        payload -> Jsonb,
    }
}
