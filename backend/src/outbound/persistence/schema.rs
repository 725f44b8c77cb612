//! Diesel table definitions, kept in lockstep with `migrations/`.

diesel::table! {
    users (id) {
        id -> Uuid,
        external_id -> Text,
        email -> Text,
        name -> Text,
        phone -> Nullable<Text>,
        blood_type -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
        country -> Nullable<Text>,
        lat -> Nullable<Float8>,
        lng -> Nullable<Float8>,
        donation_count -> Int4,
        last_donation -> Nullable<Timestamptz>,
        is_eligible -> Bool,
        is_admin -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    blood_requests (id) {
        id -> Uuid,
        requester_id -> Uuid,
        patient_name -> Text,
        patient_blood_type -> Text,
        patient_age -> Nullable<Int4>,
        patient_gender -> Nullable<Text>,
        hospital_name -> Text,
        hospital_address -> Nullable<Text>,
        hospital_city -> Nullable<Text>,
        hospital_state -> Nullable<Text>,
        hospital_country -> Nullable<Text>,
        hospital_lat -> Nullable<Float8>,
        hospital_lng -> Nullable<Float8>,
        units_needed -> Int4,
        urgency -> Text,
        status -> Text,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    matched_donors (request_id, donor_id) {
        request_id -> Uuid,
        donor_id -> Uuid,
        status -> Text,
        matched_at -> Timestamptz,
    }
}

diesel::table! {
    donations (id) {
        id -> Uuid,
        donor_id -> Uuid,
        request_id -> Nullable<Uuid>,
        hospital_name -> Text,
        hospital_address -> Nullable<Text>,
        hospital_city -> Nullable<Text>,
        hospital_state -> Nullable<Text>,
        hospital_country -> Nullable<Text>,
        hospital_lat -> Nullable<Float8>,
        hospital_lng -> Nullable<Float8>,
        donation_date -> Timestamptz,
        units -> Int4,
        verified -> Bool,
        verification_document -> Nullable<Text>,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(matched_donors -> blood_requests (request_id));
diesel::joinable!(matched_donors -> users (donor_id));
diesel::joinable!(donations -> users (donor_id));

diesel::allow_tables_to_appear_in_same_query!(users, blood_requests, matched_donors, donations);
