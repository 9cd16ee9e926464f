diesel::table! {
    categories (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        icon -> Nullable<Varchar>,
        icon_file -> Nullable<Varchar>,
        parent_id -> Nullable<Int4>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        description -> Text,
        price -> Numeric,
        brand -> Varchar,
        image -> Nullable<Varchar>,
        category_id -> Int4,
        in_stock -> Bool,
        featured -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    product_images (id) {
        id -> Int4,
        product_id -> Int4,
        image -> Varchar,
        uploaded_at -> Timestamp,
    }
}

diesel::table! {
    site_settings (id) {
        id -> Int4,
        whatsapp_number -> Varchar,
        contact_email -> Varchar,
        contact_phone -> Varchar,
        contact_address -> Varchar,
        company_name -> Varchar,
        company_description -> Text,
        updated_at -> Timestamp,
        updated_by -> Nullable<Int4>,
    }
}

diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        password -> Varchar,
        role -> Varchar,
    }
}

diesel::joinable!(products -> categories (category_id));
diesel::joinable!(product_images -> products (product_id));
diesel::joinable!(site_settings -> users (updated_by));

diesel::allow_tables_to_appear_in_same_query!(
    categories,
    products,
    product_images,
    site_settings,
    users,
);
