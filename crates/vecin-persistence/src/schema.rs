//! Esquema Diesel (mantenido a mano, equivalente a `diesel print-schema`).

diesel::table! {
    workflow_entities (kind, id) {
        kind -> Text,
        id -> Uuid,
        requester_id -> Uuid,
        estado -> Text,
        reviewer_id -> Nullable<Uuid>,
        fecha_respuesta -> Nullable<Timestamptz>,
        fecha_aprobacion -> Nullable<Timestamptz>,
        fecha_cierre -> Nullable<Timestamptz>,
        motivo_rechazo -> Nullable<Text>,
        fecha_fin_actividad -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    entity_transitions (seq) {
        seq -> BigInt,
        kind -> Text,
        entity_id -> Uuid,
        from_estado -> Text,
        to_estado -> Text,
        actor_id -> Uuid,
        actor_role -> Text,
        motivo_rechazo -> Nullable<Text>,
        event_id -> Text,
        at -> Timestamptz,
    }
}

diesel::table! {
    actor_roles (actor_id) {
        actor_id -> Uuid,
        role -> Text,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(workflow_entities, entity_transitions, actor_roles,);
